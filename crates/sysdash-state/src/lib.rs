//! In-memory dashboard state for sysdash.
//!
//! Holds the latest telemetry snapshot and the session's chat transcript.
//! Both are owned by a single consumer and mutated from one event queue,
//! so neither carries its own locking.

pub mod snapshot_store;
pub mod transcript;

pub use snapshot_store::{ObservedSnapshot, SnapshotStore};
pub use transcript::ChatTranscript;
