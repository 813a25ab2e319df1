//! Configuration loading and management.
//!
//! The relay endpoint and session tuning knobs live in a TOML file; the
//! per-client overrides (callbacks, user id) are supplied programmatically
//! via [`ClientOptions`](crate::client::ClientOptions).

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Client configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// Relay endpoint.
    pub relay: RelayEndpoint,
    /// Session tuning (heartbeat, reconnection).
    #[serde(default)]
    pub session: SessionTuning,
}

impl RelayConfig {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: RelayConfig = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Relay endpoint configuration.
///
/// The bearer token is appended as a `token` query parameter at connect
/// time; it is never part of the static configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayEndpoint {
    /// URL scheme, `ws` or `wss` (default: `wss`).
    #[serde(default = "default_scheme")]
    pub scheme: String,
    /// Relay host name or address.
    pub host: String,
    /// Optional explicit port.
    #[serde(default)]
    pub port: Option<u16>,
    /// Endpoint path (default: `/ws`).
    #[serde(default = "default_path")]
    pub path: String,
}

impl RelayEndpoint {
    /// The WebSocket URL for this endpoint, without credentials.
    pub fn url(&self) -> String {
        match self.port {
            Some(port) => format!("{}://{}:{}{}", self.scheme, self.host, port, self.path),
            None => format!("{}://{}{}", self.scheme, self.host, self.path),
        }
    }
}

/// Session tuning for keepalive and reconnection.
///
/// Reconnection uses a fixed delay with a bounded attempt count; there is
/// no exponential backoff or jitter. The attempt counter resets on every
/// successful open, so a healthy connection that later drops gets a full
/// fresh budget.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionTuning {
    /// Seconds between keep-alive pings while connected (default: 10).
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_secs: u64,

    /// Milliseconds to wait before each reconnection attempt (default: 3000).
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_ms: u64,

    /// Maximum consecutive reconnection attempts before giving up
    /// (default: 5).
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,

    /// Whether to reconnect automatically after an unexpected close
    /// (default: true).
    #[serde(default = "default_auto_reconnect")]
    pub auto_reconnect: bool,
}

impl SessionTuning {
    /// Heartbeat interval as a [`Duration`].
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    /// Reconnect delay as a [`Duration`].
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

impl Default for SessionTuning {
    fn default() -> Self {
        Self {
            heartbeat_interval_secs: default_heartbeat_interval(),
            reconnect_delay_ms: default_reconnect_delay(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
            auto_reconnect: default_auto_reconnect(),
        }
    }
}

fn default_scheme() -> String {
    "wss".to_string()
}

fn default_path() -> String {
    "/ws".to_string()
}

fn default_heartbeat_interval() -> u64 {
    10
}

fn default_reconnect_delay() -> u64 {
    3000
}

fn default_max_reconnect_attempts() -> u32 {
    5
}

fn default_auto_reconnect() -> bool {
    true
}
