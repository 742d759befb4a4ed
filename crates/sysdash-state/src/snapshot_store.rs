//! Latest-snapshot store.
//!
//! Replace-on-arrival: each snapshot fully overwrites the previous one, in
//! arrival order. Timestamps are recorded but never compared, so a late
//! delivery of an older reading wins over a newer one.

use chrono::{DateTime, Utc};
use sysdash_core::SystemSnapshot;
use tracing::debug;

/// Snapshot together with the time it was observed.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservedSnapshot {
    pub snapshot: SystemSnapshot,
    pub observed_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct SnapshotStore {
    latest: Option<ObservedSnapshot>,
    updates: u64,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the held snapshot unconditionally.
    pub fn replace(&mut self, snapshot: SystemSnapshot, observed_at: DateTime<Utc>) {
        if let Some(prev) = &self.latest {
            if observed_at < prev.observed_at {
                debug!(
                    previous = %prev.observed_at,
                    incoming = %observed_at,
                    "Snapshot older than the one it replaces"
                );
            }
        }
        self.latest = Some(ObservedSnapshot {
            snapshot,
            observed_at,
        });
        self.updates += 1;
    }

    /// `None` until the first snapshot arrives.
    pub fn current(&self) -> Option<&SystemSnapshot> {
        self.latest.as_ref().map(|o| &o.snapshot)
    }

    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        self.latest.as_ref().map(|o| o.observed_at)
    }

    pub fn latest(&self) -> Option<&ObservedSnapshot> {
        self.latest.as_ref()
    }

    /// Number of snapshots received this session.
    pub fn updates(&self) -> u64 {
        self.updates
    }
}
