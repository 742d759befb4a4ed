//! WebSocket client for the sysdash monitoring backend.
//!
//! Provides the live connection the dashboard synchronizes from:
//! - Fixed-delay reconnection with a single cancellable timer
//! - Wire codec for `system_data` / `chat_response` / `chat` frames
//! - Optional application-level keepalive (ping/pong)
//! - Channel-based event delivery to a single consumer

pub mod connection;
pub mod error;
pub mod handle;
pub mod heartbeat;
pub mod message;

pub use connection::{
    ConnectionConfig, ConnectionEvent, ConnectionLifecycle, ConnectionManager, ConnectionState,
    DEFAULT_RECONNECT_DELAY_MS, DEFAULT_WS_URL,
};
pub use error::{DecodeError, SendError, WsError, WsResult};
pub use handle::{ConnectionHandle, WsHandle};
pub use heartbeat::HeartbeatManager;
pub use message::{decode, decode_at, Frame, InboundMessage, OutboundRequest};

use std::sync::Once;

static INIT_CRYPTO: Once = Once::new();

/// Install the rustls crypto provider used for `wss://` endpoints.
/// Must be called before the first connection is made.
pub fn init_crypto() {
    INIT_CRYPTO.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}
