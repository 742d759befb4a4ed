//! sysdash: realtime system-telemetry dashboard client.
//!
//! Wires the pieces together:
//! - WebSocket connection to the monitoring backend (auto-reconnect)
//! - Latest-snapshot store and chat transcript
//! - Observable dashboard view for the presentation layer

pub mod app;
pub mod config;
pub mod core;
pub mod error;

pub use app::{AppCommand, AppHandle, Application};
pub use config::AppConfig;
pub use core::{ChatSubmission, DashboardCore, DashboardView, QuickAction};
pub use error::{AppError, AppResult};
