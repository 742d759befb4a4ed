//! Application-level keepalive.
//!
//! The monitoring backend answers `{"type":"ping"}` with `{"type":"pong"}`.
//! When enabled, a ping is sent after one quiet interval and the session is
//! considered dead if the pong does not arrive within the timeout.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
struct HeartbeatInner {
    last_ping: Option<DateTime<Utc>>,
    last_pong: Option<DateTime<Utc>>,
    last_message: DateTime<Utc>,
    waiting_for_pong: bool,
}

impl HeartbeatInner {
    fn fresh() -> Self {
        Self {
            last_ping: None,
            last_pong: None,
            last_message: Utc::now(),
            waiting_for_pong: false,
        }
    }
}

/// Keepalive bookkeeping for one connection.
pub struct HeartbeatManager {
    /// Quiet period before a ping is sent. 0 disables the keepalive.
    interval_ms: u64,
    /// How long to wait for the pong.
    timeout_ms: u64,
    inner: RwLock<HeartbeatInner>,
}

impl HeartbeatManager {
    pub fn new(interval_ms: u64, timeout_ms: u64) -> Self {
        Self {
            interval_ms,
            timeout_ms,
            inner: RwLock::new(HeartbeatInner::fresh()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.interval_ms > 0
    }

    /// Reset state at the start of a session.
    pub fn reset(&self) {
        *self.inner.write() = HeartbeatInner::fresh();
    }

    pub fn record_ping(&self) {
        let mut inner = self.inner.write();
        inner.last_ping = Some(Utc::now());
        inner.waiting_for_pong = true;
    }

    pub fn record_pong(&self) {
        let now = Utc::now();
        let mut inner = self.inner.write();
        inner.last_pong = Some(now);
        inner.waiting_for_pong = false;

        if let Some(ping_time) = inner.last_ping {
            debug!(rtt_ms = (now - ping_time).num_milliseconds(), "Received pong");
        }
    }

    /// Any inbound frame counts as liveness.
    pub fn record_message(&self) {
        self.inner.write().last_message = Utc::now();
    }

    pub fn is_timed_out(&self) -> bool {
        let inner = self.inner.read();
        if !inner.waiting_for_pong {
            return false;
        }
        inner
            .last_ping
            .map(|ping| (Utc::now() - ping).num_milliseconds() > self.timeout_ms as i64)
            .unwrap_or(false)
    }

    pub fn should_send_ping(&self) -> bool {
        if !self.is_enabled() {
            return false;
        }
        let inner = self.inner.read();
        !inner.waiting_for_pong
            && (Utc::now() - inner.last_message).num_milliseconds() >= self.interval_ms as i64
    }

    pub fn last_pong(&self) -> Option<DateTime<Utc>> {
        self.inner.read().last_pong
    }

    /// Wait until the next keepalive check. Never resolves when disabled.
    pub async fn wait_for_check(&self) {
        if !self.is_enabled() {
            std::future::pending::<()>().await;
        }
        tokio::time::sleep(Duration::from_millis((self.interval_ms / 2).max(1))).await;
    }
}
