//! Prometheus metrics for sysdash.
//!
//! Covers:
//! - Connection state and reconnects
//! - Inbound frames by type, decode failures
//! - Chat traffic by direction and outcome
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`. Registration only fails on duplicate
//! metric names, which is a programming error caught on first access.

use crate::error::TelemetryResult;
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge, register_gauge_vec, register_int_counter,
    register_int_gauge, CounterVec, Encoder, Gauge, GaugeVec, IntCounter, IntGauge, TextEncoder,
};

/// WebSocket connection state (1 = connected, 0 = not connected).
pub static WS_CONNECTED: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!(
        "sysdash_ws_connected",
        "WebSocket connection state (1=connected)"
    )
    .unwrap()
});

/// WebSocket state machine current state.
/// Labels: state (disconnected/connecting/connected)
pub static WS_STATE: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "sysdash_ws_state",
        "WebSocket state machine current state (1=active, 0=inactive)",
        &["state"]
    )
    .unwrap()
});

/// Disconnects that scheduled a reconnect.
pub static WS_RECONNECT_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "sysdash_ws_reconnect_total",
        "Total reconnects scheduled after a disconnect"
    )
    .unwrap()
});

/// Inbound frames routed to the dashboard.
pub static FRAMES_RECEIVED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "sysdash_frames_received_total",
        "Inbound frames routed to the dashboard",
        &["type"]
    )
    .unwrap()
});

/// Inbound frames dropped as undecodable.
pub static DECODE_ERRORS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "sysdash_decode_errors_total",
        "Inbound frames dropped because they could not be decoded"
    )
    .unwrap()
});

/// Chat messages. Labels: direction (user/assistant), outcome (sent/dropped/received)
pub static CHAT_MESSAGES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "sysdash_chat_messages_total",
        "Chat messages by direction and outcome",
        &["direction", "outcome"]
    )
    .unwrap()
});

/// Transcript length.
pub static TRANSCRIPT_ENTRIES: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "sysdash_transcript_entries",
        "Number of entries in the chat transcript"
    )
    .unwrap()
});

/// Metrics helper.
pub struct Metrics;

impl Metrics {
    /// Set WebSocket state. Only the active state is 1.
    pub fn ws_state_set(state: &str) {
        for s in &["disconnected", "connecting", "connected"] {
            WS_STATE.with_label_values(&[s]).set(0.0);
        }
        WS_STATE.with_label_values(&[state]).set(1.0);
        WS_CONNECTED.set(if state == "connected" { 1.0 } else { 0.0 });
    }

    pub fn ws_reconnect() {
        WS_RECONNECT_TOTAL.inc();
    }

    pub fn frame_received(kind: &str) {
        FRAMES_RECEIVED_TOTAL.with_label_values(&[kind]).inc();
    }

    pub fn decode_error() {
        DECODE_ERRORS_TOTAL.inc();
    }

    pub fn chat_sent() {
        CHAT_MESSAGES_TOTAL.with_label_values(&["user", "sent"]).inc();
    }

    pub fn chat_dropped() {
        CHAT_MESSAGES_TOTAL
            .with_label_values(&["user", "dropped"])
            .inc();
    }

    pub fn chat_received() {
        CHAT_MESSAGES_TOTAL
            .with_label_values(&["assistant", "received"])
            .inc();
    }

    pub fn transcript_len(len: usize) {
        TRANSCRIPT_ENTRIES.set(len as i64);
    }

    /// Render every registered metric in the Prometheus text format.
    pub fn render() -> TelemetryResult<String> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&prometheus::gather(), &mut buf)?;
        Ok(String::from_utf8(buf)?)
    }
}
