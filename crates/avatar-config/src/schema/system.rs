//! System configuration types: publish-status polling, credentials, logging.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Video publish-status polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    pub status_url: String,
    pub check_interval_ms: u32,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            status_url: "https://api.openmind.org/api/core/teleops/video/publish/status".into(),
            check_interval_ms: 5000,
        }
    }
}

impl PublishConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms.into())
    }
}

/// API credentials. Never serialized back out.
#[derive(Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CredentialsConfig {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    #[serde(skip_serializing)]
    pub api_key_id: Option<String>,
}

impl CredentialsConfig {
    /// Both halves needed to open the video stream are present.
    pub fn has_stream_credentials(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
            && self.api_key_id.as_deref().is_some_and(|k| !k.is_empty())
    }
}

impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_key_id", &self.api_key_id.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level for the `avatar` targets when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}
