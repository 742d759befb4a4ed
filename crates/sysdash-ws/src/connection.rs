//! WebSocket connection manager.
//!
//! Owns the single live connection to the monitoring backend. Every close
//! schedules one reconnect after a fixed delay; `teardown()` is the only way
//! out of the Disconnected → Connecting → Connected cycle.
//!
//! Transitions are decided by [`ConnectionLifecycle`], a synchronous state
//! machine. [`ConnectionManager::connect`] is the async loop that drives it
//! from transport events.

use crate::error::{WsError, WsResult};
use crate::handle::WsHandle;
use crate::heartbeat::HeartbeatManager;
use crate::message::{decode, Frame, InboundMessage, OutboundRequest};
use futures_util::{SinkExt, StreamExt};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex as TokioMutex};
use tokio_tungstenite::{connect_async_tls_with_config, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Default backend endpoint.
pub const DEFAULT_WS_URL: &str = "ws://localhost:8000/ws";

/// Default fixed reconnect delay.
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 3000;

/// RFC 6455 normal closure.
const NORMAL_CLOSE_CODE: u16 = 1000;

/// Connection configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// WebSocket URL.
    pub url: String,
    /// Fixed delay between a close and the next connect attempt.
    pub reconnect_delay_ms: u64,
    /// Keepalive quiet interval (0 = disabled).
    pub keepalive_interval_ms: u64,
    /// Keepalive pong timeout.
    pub keepalive_timeout_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_WS_URL.to_string(),
            reconnect_delay_ms: DEFAULT_RECONNECT_DELAY_MS,
            keepalive_interval_ms: 0,
            keepalive_timeout_ms: 10_000,
        }
    }
}

impl ConnectionConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event delivered to the dashboard's event queue.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    Connecting,
    Connected,
    Disconnected { reason: String },
    Message(InboundMessage),
    /// A frame was dropped because it could not be decoded.
    DecodeFailed { error: String },
}

/// Connection lifecycle state machine.
///
/// Invariants:
/// - at most one reconnect is pending at any time
/// - once torn down, every transition is refused
#[derive(Debug, Clone, Default)]
pub struct ConnectionLifecycle {
    state: ConnectionState,
    reconnect_pending: bool,
    torn_down: bool,
    connect_attempts: u64,
    errors: u64,
}

impl ConnectionLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_reconnect_pending(&self) -> bool {
        self.reconnect_pending
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn connect_attempts(&self) -> u64 {
        self.connect_attempts
    }

    pub fn errors(&self) -> u64 {
        self.errors
    }

    /// Disconnected → Connecting. Consumes the pending reconnect, if any.
    pub fn begin_connect(&mut self) -> bool {
        if self.torn_down || self.state != ConnectionState::Disconnected {
            return false;
        }
        self.state = ConnectionState::Connecting;
        self.reconnect_pending = false;
        self.connect_attempts += 1;
        true
    }

    /// Connecting → Connected.
    pub fn opened(&mut self) -> bool {
        if self.torn_down || self.state != ConnectionState::Connecting {
            return false;
        }
        self.state = ConnectionState::Connected;
        true
    }

    /// Transport closed (or failed to open).
    ///
    /// Returns `true` when the caller must schedule the reconnect. A close
    /// while already Disconnected is a duplicate and returns `false`.
    pub fn closed(&mut self) -> bool {
        if self.torn_down || self.state == ConnectionState::Disconnected {
            return false;
        }
        self.state = ConnectionState::Disconnected;
        self.reconnect_pending = true;
        true
    }

    /// Transport error. Counted only; the following close drives the state.
    pub fn errored(&mut self) {
        self.errors += 1;
    }

    /// Leave the cycle for good. Returns `false` if already torn down.
    pub fn teardown(&mut self) -> bool {
        if self.torn_down {
            return false;
        }
        self.torn_down = true;
        self.state = ConnectionState::Disconnected;
        self.reconnect_pending = false;
        true
    }
}

/// WebSocket connection manager.
pub struct ConnectionManager {
    config: ConnectionConfig,
    lifecycle: Arc<RwLock<ConnectionLifecycle>>,
    heartbeat: HeartbeatManager,
    event_tx: mpsc::UnboundedSender<ConnectionEvent>,
    /// Outbound sender (for WsHandle).
    outbound_tx: mpsc::UnboundedSender<OutboundRequest>,
    /// Outbound receiver (consumed by the session loop).
    outbound_rx: TokioMutex<mpsc::UnboundedReceiver<OutboundRequest>>,
    /// Cancelled by teardown; stops the session loop and the reconnect timer.
    shutdown_token: CancellationToken,
}

impl ConnectionManager {
    pub fn new(config: ConnectionConfig, event_tx: mpsc::UnboundedSender<ConnectionEvent>) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let heartbeat =
            HeartbeatManager::new(config.keepalive_interval_ms, config.keepalive_timeout_ms);
        Self {
            config,
            lifecycle: Arc::new(RwLock::new(ConnectionLifecycle::new())),
            heartbeat,
            event_tx,
            outbound_tx,
            outbound_rx: TokioMutex::new(outbound_rx),
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Cloneable handle for sending and teardown.
    pub fn handle(&self) -> WsHandle {
        WsHandle::new(
            self.outbound_tx.clone(),
            self.lifecycle.clone(),
            self.shutdown_token.clone(),
        )
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        self.lifecycle.read().state()
    }

    /// Copy of the lifecycle counters and flags.
    pub fn lifecycle(&self) -> ConnectionLifecycle {
        self.lifecycle.read().clone()
    }

    /// Cancel the pending reconnect and close the transport.
    /// No event is emitted afterwards.
    pub fn teardown(&self) {
        if self.lifecycle.write().teardown() {
            info!("ConnectionManager teardown requested");
        }
        self.shutdown_token.cancel();
    }

    pub fn is_torn_down(&self) -> bool {
        self.shutdown_token.is_cancelled() || self.lifecycle.read().is_torn_down()
    }

    /// Connect and keep reconnecting until teardown.
    pub async fn connect(&self) -> WsResult<()> {
        loop {
            if !self.lifecycle.write().begin_connect() {
                info!("Torn down, exiting connect loop");
                return Ok(());
            }
            self.emit(ConnectionEvent::Connecting);

            let reason = match self.run_session().await {
                Ok(()) => "connection closed".to_string(),
                Err(e) => {
                    self.lifecycle.write().errored();
                    error!(?e, "WebSocket connection error");
                    e.to_string()
                }
            };

            if !self.lifecycle.write().closed() {
                info!("Torn down after disconnect, not reconnecting");
                return Ok(());
            }
            self.emit(ConnectionEvent::Disconnected { reason });

            let delay = self.config.reconnect_delay();
            warn!(delay_ms = delay.as_millis() as u64, "Reconnecting");

            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                () = self.shutdown_token.cancelled() => {
                    info!("Torn down during reconnect delay, exiting");
                    return Ok(());
                }
            }
        }
    }

    /// One connection attempt plus its message loop. Returns when the
    /// transport closes or teardown is requested.
    async fn run_session(&self) -> WsResult<()> {
        info!(url = %self.config.url, "Connecting to WebSocket");

        let (ws_stream, _response) = tokio::select! {
            res = connect_async_tls_with_config(&self.config.url, None, true, None) => res?,
            () = self.shutdown_token.cancelled() => return Ok(()),
        };

        if !self.open_session().await {
            return Ok(());
        }
        let (mut write, mut read) = ws_stream.split();

        self.heartbeat.reset();
        info!("WebSocket connected");
        self.emit(ConnectionEvent::Connected);

        let mut outbound_rx = self.outbound_rx.lock().await;

        loop {
            tokio::select! {
                () = self.shutdown_token.cancelled() => {
                    info!("Teardown signal received in message loop");
                    if let Err(e) = write.send(Message::Close(None)).await {
                        warn!(?e, "Failed to send Close frame during teardown");
                    }
                    return Ok(());
                }

                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            self.handle_text_frame(&text);
                        }
                        Some(Ok(Message::Ping(data))) => {
                            debug!("Received ping, sending pong");
                            write.send(Message::Pong(data)).await?;
                        }
                        Some(Ok(Message::Pong(_))) => {
                            self.heartbeat.record_message();
                        }
                        Some(Ok(Message::Close(frame))) => {
                            let (code, reason) = frame
                                .map(|f| (f.code.into(), f.reason.to_string()))
                                .unwrap_or((NORMAL_CLOSE_CODE, "Normal close".to_string()));
                            if code == NORMAL_CLOSE_CODE {
                                info!(%reason, "WebSocket closed by server");
                                return Ok(());
                            }
                            warn!(code, %reason, "WebSocket closed by server");
                            return Err(WsError::ConnectionClosed { code, reason });
                        }
                        Some(Err(e)) => {
                            error!(?e, "WebSocket read error");
                            return Err(e.into());
                        }
                        None => {
                            warn!("WebSocket stream ended");
                            return Ok(());
                        }
                        _ => {}
                    }
                }

                outbound = outbound_rx.recv() => {
                    if let Some(request) = outbound {
                        write.send(Message::Text(request.encode())).await?;
                        debug!(kind = request.kind(), "Frame sent");
                    }
                }

                () = self.heartbeat.wait_for_check() => {
                    if self.heartbeat.is_timed_out() {
                        error!("Keepalive timeout");
                        return Err(WsError::HeartbeatTimeout);
                    }
                    if self.heartbeat.should_send_ping() {
                        write.send(Message::Text(OutboundRequest::Ping.encode())).await?;
                        self.heartbeat.record_ping();
                        debug!("Sent keepalive ping");
                    }
                }
            }
        }
    }

    fn handle_text_frame(&self, text: &str) {
        self.heartbeat.record_message();

        match decode(text) {
            Ok(Frame::Inbound(msg)) => {
                debug!(kind = msg.kind(), "Inbound message");
                self.emit(ConnectionEvent::Message(msg));
            }
            Ok(Frame::Pong) => {
                self.heartbeat.record_pong();
            }
            Ok(Frame::Unknown(kind)) => {
                debug!(%kind, "Ignoring frame with unrecognized type");
            }
            Err(e) => {
                warn!(error = %e, "Dropping undecodable frame");
                self.emit(ConnectionEvent::DecodeFailed {
                    error: e.to_string(),
                });
            }
        }
    }

    /// Connecting → Connected, dropping frames queued while the previous
    /// session was dying. The queue is drained before the state flips, so a
    /// frame accepted by [`WsHandle`] is never among the discarded ones.
    async fn open_session(&self) -> bool {
        let mut rx = self.outbound_rx.lock().await;
        while let Ok(request) = rx.try_recv() {
            warn!(kind = request.kind(), "Discarding frame queued before reconnect");
        }
        self.lifecycle.write().opened()
    }

    fn emit(&self, event: ConnectionEvent) {
        if self.is_torn_down() {
            return;
        }
        if self.event_tx.send(event).is_err() {
            debug!("Event receiver dropped");
        }
    }
}
