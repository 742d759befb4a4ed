//! WebSocket error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WsError {
    #[error("Connection closed: code={code}, reason={reason}")]
    ConnectionClosed { code: u16, reason: String },

    #[error("Heartbeat timeout")]
    HeartbeatTimeout,

    #[error("Tungstenite error: {0}")]
    Tungstenite(#[from] tokio_tungstenite::tungstenite::Error),
}

pub type WsResult<T> = Result<T, WsError>;

/// Inbound frame could not be turned into a message.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("frame is not a JSON object")]
    NotAnObject,

    #[error("frame has no \"type\" discriminator")]
    MissingType,

    #[error("{kind} frame is missing \"{field}\"")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },
}

/// Outbound frame was not handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    /// Connection is not in the Connected state.
    #[error("not connected")]
    NotConnected,
    /// Connection manager has been torn down.
    #[error("channel closed")]
    ChannelClosed,
}
