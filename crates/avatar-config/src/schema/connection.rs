//! Channel and liveness configuration types.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Backend channel settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// WebSocket URL of the backend.
    pub url: String,
    /// Delay before reconnecting after the channel closed (valid range: 50-60000).
    pub reconnect_delay_ms: u32,
    /// Delay before retrying after the channel could not be created (valid range: 50-60000).
    pub connect_failure_delay_ms: u32,
    /// Upper bound on a single connect attempt (valid range: 1-120).
    pub connect_timeout_secs: u32,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:6123".into(),
            reconnect_delay_ms: 500,
            connect_failure_delay_ms: 2000,
            connect_timeout_secs: 15,
        }
    }
}

impl ConnectionConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms.into())
    }

    pub fn connect_failure_delay(&self) -> Duration {
        Duration::from_millis(self.connect_failure_delay_ms.into())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs.into())
    }
}

/// Avatar liveness probing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Interval between `get_avatar_status` probes (valid range: 100-60000).
    pub probe_interval_ms: u32,
    /// Time a probe may stay unanswered before the avatar is considered down
    /// (valid range: 100-120000).
    pub probe_timeout_ms: u32,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            probe_interval_ms: 2000,
            probe_timeout_ms: 5000,
        }
    }
}

impl HealthConfig {
    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms.into())
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms.into())
    }
}
