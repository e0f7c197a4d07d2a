//! Environment variable overrides, applied on top of the file.

use crate::schema::AvatarConfig;
use tracing::debug;

pub const ENV_WEBSOCKET_URL: &str = "AVATAR_WEBSOCKET_URL";
pub const ENV_API_KEY: &str = "AVATAR_API_KEY";
pub const ENV_API_KEY_ID: &str = "AVATAR_API_KEY_ID";
pub const ENV_PUBLISH_STATUS_URL: &str = "AVATAR_PUBLISH_STATUS_URL";

/// Overlay environment values onto `config`.
///
/// `lookup` abstracts `std::env::var` so tests do not touch the process
/// environment. Empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut AvatarConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = get(ENV_WEBSOCKET_URL) {
        debug!(var = ENV_WEBSOCKET_URL, "overriding connection.url");
        config.connection.url = url;
    }
    if let Some(key) = get(ENV_API_KEY) {
        config.credentials.api_key = Some(key);
    }
    if let Some(key_id) = get(ENV_API_KEY_ID) {
        config.credentials.api_key_id = Some(key_id);
    }
    if let Some(url) = get(ENV_PUBLISH_STATUS_URL) {
        debug!(var = ENV_PUBLISH_STATUS_URL, "overriding publish.status_url");
        config.publish.status_url = url;
    }
}
