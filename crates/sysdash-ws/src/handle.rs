//! Connection handle for outbound frames and teardown.
//!
//! [`ConnectionHandle`] is the seam the dashboard depends on; [`WsHandle`]
//! is the implementation backed by a running [`ConnectionManager`].
//!
//! [`ConnectionManager`]: crate::ConnectionManager

use crate::connection::{ConnectionLifecycle, ConnectionState};
use crate::error::SendError;
use crate::message::OutboundRequest;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Outbound side of a connection, as seen by the dashboard.
pub trait ConnectionHandle: Send + Sync {
    /// Hand a request to the transport. Fails with `NotConnected` unless the
    /// connection is Connected; nothing is queued for later.
    fn send(&self, request: OutboundRequest) -> Result<(), SendError>;

    /// Stop the connection for good.
    fn teardown(&self);
}

/// Cloneable handle onto a [`ConnectionManager`](crate::ConnectionManager).
#[derive(Clone)]
pub struct WsHandle {
    tx: mpsc::UnboundedSender<OutboundRequest>,
    lifecycle: Arc<RwLock<ConnectionLifecycle>>,
    shutdown_token: CancellationToken,
}

impl WsHandle {
    pub fn new(
        tx: mpsc::UnboundedSender<OutboundRequest>,
        lifecycle: Arc<RwLock<ConnectionLifecycle>>,
        shutdown_token: CancellationToken,
    ) -> Self {
        Self {
            tx,
            lifecycle,
            shutdown_token,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.lifecycle.read().state() == ConnectionState::Connected && !self.tx.is_closed()
    }
}

impl ConnectionHandle for WsHandle {
    fn send(&self, request: OutboundRequest) -> Result<(), SendError> {
        if self.shutdown_token.is_cancelled() {
            return Err(SendError::ChannelClosed);
        }
        if !self.is_connected() {
            return Err(SendError::NotConnected);
        }

        let kind = request.kind();
        self.tx.send(request).map_err(|_| SendError::ChannelClosed)?;
        debug!(kind, "Frame queued for sending");
        Ok(())
    }

    fn teardown(&self) {
        if self.lifecycle.write().teardown() {
            info!("Teardown requested via handle");
        }
        self.shutdown_token.cancel();
    }
}
