//! Application configuration.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use sysdash_ws::{ConnectionConfig, DEFAULT_RECONNECT_DELAY_MS, DEFAULT_WS_URL};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "SYSDASH_CONFIG";
/// Environment variable overriding the endpoint.
pub const URL_ENV: &str = "SYSDASH_URL";
/// Config file used when neither CLI nor env names one.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Monitoring backend WebSocket endpoint.
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
    /// Assistant greeting seeded into the transcript. Empty disables it.
    #[serde(default = "default_greeting")]
    pub greeting: String,
    #[serde(default)]
    pub websocket: WsConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

fn default_ws_url() -> String {
    DEFAULT_WS_URL.to_string()
}

fn default_greeting() -> String {
    "Hi! I'm your system assistant. Ask me anything about your computer's performance!"
        .to_string()
}

/// WebSocket configuration subset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WsConfig {
    /// Fixed reconnect delay (ms).
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    /// Keepalive quiet interval (ms). 0 disables the keepalive.
    #[serde(default)]
    pub keepalive_interval_ms: u64,
    /// Keepalive pong timeout (ms).
    #[serde(default = "default_keepalive_timeout_ms")]
    pub keepalive_timeout_ms: u64,
}

fn default_reconnect_delay_ms() -> u64 {
    DEFAULT_RECONNECT_DELAY_MS
}

fn default_keepalive_timeout_ms() -> u64 {
    10_000
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            reconnect_delay_ms: default_reconnect_delay_ms(),
            keepalive_interval_ms: 0,
            keepalive_timeout_ms: default_keepalive_timeout_ms(),
        }
    }
}

/// Telemetry configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log level for sysdash crates (RUST_LOG overrides).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ws_url: default_ws_url(),
            greeting: default_greeting(),
            websocket: WsConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from `path` if it exists, defaults otherwise.
    pub fn load_or_default(path: &str) -> AppResult<Self> {
        if Path::new(path).exists() {
            Self::from_file(path)
        } else {
            tracing::warn!(path = %path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply the `SYSDASH_URL` override, if set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(URL_ENV) {
            self.ws_url = url;
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if !(self.ws_url.starts_with("ws://") || self.ws_url.starts_with("wss://")) {
            return Err(AppError::Config(format!(
                "ws_url must start with ws:// or wss://, got {:?}",
                self.ws_url
            )));
        }
        if self.websocket.reconnect_delay_ms == 0 {
            return Err(AppError::Config(
                "websocket.reconnect_delay_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Connection settings for the WebSocket client.
    pub fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            url: self.ws_url.clone(),
            reconnect_delay_ms: self.websocket.reconnect_delay_ms,
            keepalive_interval_ms: self.websocket.keepalive_interval_ms,
            keepalive_timeout_ms: self.websocket.keepalive_timeout_ms,
        }
    }
}
