//! Core data model for the sysdash realtime client.
//!
//! This crate provides the value types shared by every other crate:
//! - `SystemSnapshot`: opaque telemetry reading, with a typed `SystemMetrics` view
//! - `ChatEntry`, `ChatRole`: immutable transcript entries
//! - `parse_timestamp`: lenient wire timestamp parsing (epoch ms or ISO-8601)

pub mod chat;
pub mod error;
pub mod snapshot;
pub mod time;

pub use chat::{ChatEntry, ChatRole};
pub use error::{CoreError, Result};
pub use snapshot::{
    CpuMetrics, DiskMetrics, MemoryMetrics, PlatformInfo, SystemMetrics, SystemSnapshot,
};
pub use time::{parse_timestamp, timestamp_or};
