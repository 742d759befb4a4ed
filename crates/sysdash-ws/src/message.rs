//! Wire codec for the monitoring stream.
//!
//! One JSON object per text frame, discriminated by its `type` field:
//! - `system_data`: `{"type", "data", "timestamp"}` telemetry snapshot
//! - `chat_response`: `{"type", "response", "timestamp"}` assistant reply
//! - `pong`: keepalive reply, consumed by the connection
//!
//! Unknown discriminators decode to `Frame::Unknown` so the backend can add
//! message types without breaking older clients.

use crate::error::DecodeError;
use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use sysdash_core::{timestamp_or, SystemSnapshot};

/// Discriminator values.
pub const TYPE_SYSTEM_DATA: &str = "system_data";
pub const TYPE_CHAT_RESPONSE: &str = "chat_response";
pub const TYPE_CHAT: &str = "chat";
pub const TYPE_PING: &str = "ping";
pub const TYPE_PONG: &str = "pong";

// ============================================================================
// Inbound
// ============================================================================

/// Message routed to the dashboard state.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// New telemetry snapshot.
    SystemData {
        snapshot: SystemSnapshot,
        timestamp: DateTime<Utc>,
    },
    /// Assistant reply to a chat request.
    ChatResponse {
        response: String,
        timestamp: DateTime<Utc>,
    },
}

impl InboundMessage {
    /// Wire discriminator of this message.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SystemData { .. } => TYPE_SYSTEM_DATA,
            Self::ChatResponse { .. } => TYPE_CHAT_RESPONSE,
        }
    }

    /// Backend timestamp, or arrival time if the frame carried none.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::SystemData { timestamp, .. } | Self::ChatResponse { timestamp, .. } => {
                *timestamp
            }
        }
    }
}

/// Result of decoding one inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Message for the dashboard.
    Inbound(InboundMessage),
    /// Keepalive reply.
    Pong,
    /// Well-formed frame with an unrecognized `type`; ignored.
    Unknown(String),
}

/// Decode a text frame, stamping untimed messages with the current time.
pub fn decode(raw: &str) -> Result<Frame, DecodeError> {
    decode_at(raw, Utc::now())
}

/// Decode a text frame. `received_at` stands in for a missing or
/// unparseable `timestamp`.
pub fn decode_at(raw: &str, received_at: DateTime<Utc>) -> Result<Frame, DecodeError> {
    let value: Value = serde_json::from_str(raw)?;
    let obj = value.as_object().ok_or(DecodeError::NotAnObject)?;
    let kind = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or(DecodeError::MissingType)?;

    let frame = match kind {
        TYPE_SYSTEM_DATA => {
            let data = present(obj, "data").ok_or(DecodeError::MissingField {
                kind: TYPE_SYSTEM_DATA,
                field: "data",
            })?;
            Frame::Inbound(InboundMessage::SystemData {
                snapshot: SystemSnapshot::new(data.clone()),
                timestamp: timestamp_or(obj.get("timestamp"), received_at),
            })
        }
        TYPE_CHAT_RESPONSE => {
            let response = present(obj, "response")
                .and_then(Value::as_str)
                .ok_or(DecodeError::MissingField {
                    kind: TYPE_CHAT_RESPONSE,
                    field: "response",
                })?;
            Frame::Inbound(InboundMessage::ChatResponse {
                response: response.to_string(),
                timestamp: timestamp_or(obj.get("timestamp"), received_at),
            })
        }
        TYPE_PONG => Frame::Pong,
        other => Frame::Unknown(other.to_string()),
    };

    Ok(frame)
}

/// Field lookup treating explicit `null` as absent.
fn present<'a>(obj: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    obj.get(field).filter(|v| !v.is_null())
}

// ============================================================================
// Outbound
// ============================================================================

/// Request sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundRequest {
    /// Chat question: `{"type":"chat","message":...}`.
    Chat { message: String },
    /// Keepalive: `{"type":"ping"}`.
    Ping,
}

impl OutboundRequest {
    pub fn chat(message: impl Into<String>) -> Self {
        Self::Chat {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Chat { .. } => TYPE_CHAT,
            Self::Ping => TYPE_PING,
        }
    }

    /// Serialize to the wire representation.
    pub fn encode(&self) -> String {
        match self {
            Self::Chat { message } => json!({ "type": TYPE_CHAT, "message": message }),
            Self::Ping => json!({ "type": TYPE_PING }),
        }
        .to_string()
    }
}
