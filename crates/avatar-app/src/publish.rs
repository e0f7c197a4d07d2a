//! Periodic check of the video publish status.
//!
//! Runs on its own task so a slow or failing HTTP call never holds up the
//! session. The session only ever sees the resulting boolean, and only when
//! it changes.

use std::time::Duration;

use avatar_common::AvatarError;
use avatar_config::AvatarConfig;
use avatar_session::ClientHandle;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Status reported while the stream is being published.
const STATUS_LIVE: &str = "live";

pub struct PublishPoller {
    http: reqwest::Client,
    status_url: String,
    api_key: String,
    interval: Duration,
}

impl PublishPoller {
    /// `None` when no API key is configured; there is nothing to poll then.
    pub fn from_config(config: &AvatarConfig) -> Result<Option<Self>, AvatarError> {
        let Some(api_key) = config
            .credentials
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
        else {
            return Ok(None);
        };
        let poller = Self::new(
            config.publish.status_url.clone(),
            api_key,
            config.publish.check_interval(),
        )?;
        Ok(Some(poller))
    }

    pub fn new(status_url: String, api_key: String, interval: Duration) -> Result<Self, AvatarError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(interval.max(Duration::from_secs(1)))
            .build()
            .map_err(|e| AvatarError::Network(e.to_string()))?;
        Ok(Self {
            http,
            status_url,
            api_key,
            interval,
        })
    }

    /// Poll until `client` stops, starting immediately, pushing changes into it.
    pub fn spawn(self, client: ClientHandle) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            let mut publishing = false;
            loop {
                ticker.tick().await;
                let live = self.check().await;
                if live != publishing {
                    publishing = live;
                    info!(publishing, "Publish status changed");
                    if client.set_publishing(live).await.is_err() {
                        info!("Avatar client stopped, publish status check ending");
                        break;
                    }
                }
            }
        })
    }

    /// One status request. Any failure counts as not publishing.
    pub async fn check(&self) -> bool {
        let response = match self
            .http
            .get(&self.status_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                debug!(error = %e, "Publish status request failed");
                return false;
            }
        };

        let status = response.status();
        if !status.is_success() {
            debug!(%status, "Publish status request rejected");
            return false;
        }

        match response.json::<Value>().await {
            Ok(body) => is_live(&body),
            Err(e) => {
                debug!(error = %e, "Publish status body unreadable");
                false
            }
        }
    }
}

pub fn is_live(body: &Value) -> bool {
    body.get("status").and_then(Value::as_str) == Some(STATUS_LIVE)
}
