//! System telemetry snapshot.
//!
//! The snapshot travels as an opaque JSON value: the client never merges or
//! validates it, it only replaces the previous one. `SystemMetrics` is a
//! best-effort typed view over the shape the monitoring backend publishes.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Point-in-time telemetry reading as received from the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SystemSnapshot(Value);

impl SystemSnapshot {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Raw JSON payload.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Error reported by the backend in place of metrics (`{"error": "..."}`).
    pub fn error(&self) -> Option<&str> {
        self.0.get("error").and_then(Value::as_str)
    }

    /// Typed view of the payload. `None` if the payload does not have the
    /// expected shape.
    pub fn metrics(&self) -> Option<SystemMetrics> {
        SystemMetrics::deserialize(&self.0).ok()
    }
}

impl From<Value> for SystemSnapshot {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Typed telemetry view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemMetrics {
    pub system: PlatformInfo,
    pub uptime_hours: f64,
    pub cpu: CpuMetrics,
    pub memory: MemoryMetrics,
    #[serde(default)]
    pub disks: Vec<DiskMetrics>,
}

impl SystemMetrics {
    /// Highest disk usage percentage across all reported disks.
    pub fn max_disk_percentage(&self) -> Option<f64> {
        self.disks
            .iter()
            .map(|d| d.percentage)
            .fold(None, |acc, p| Some(acc.map_or(p, |a: f64| a.max(p))))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformInfo {
    pub platform: String,
    #[serde(default)]
    pub release: String,
    #[serde(default)]
    pub machine: String,
    #[serde(default)]
    pub processor: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuMetrics {
    #[serde(default)]
    pub cores: Option<u32>,
    pub usage_percent: f64,
    /// `None` when the backend reports "N/A".
    #[serde(default, deserialize_with = "number_or_none")]
    pub frequency_mhz: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryMetrics {
    pub total_gb: f64,
    pub used_gb: f64,
    #[serde(default)]
    pub available_gb: f64,
    pub usage_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskMetrics {
    pub device: String,
    pub total_gb: f64,
    pub used_gb: f64,
    pub free_gb: f64,
    pub percentage: f64,
}

fn number_or_none<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_f64())
}
