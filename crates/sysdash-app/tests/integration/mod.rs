//! Integration tests for sysdash-app.
//!
//! These tests run the client against a local mock backend:
//! - WebSocket connection lifecycle and reconnects
//! - Snapshot and chat flow into the dashboard view
//! - Teardown

pub mod common;
