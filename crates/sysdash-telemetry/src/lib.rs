//! Prometheus metrics and structured logging for sysdash.
//!
//! - Structured logging with tracing (pretty in development, JSON in production)
//! - Prometheus counters/gauges for connection lifecycle, frames and chat traffic

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
