//! Avatar controller configuration.
//!
//! TOML-based configuration with environment overrides and validation.
//! Every section uses serde defaults so a partial (or missing) file works
//! out of the box.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use avatar_config::{load_config, config_to_json};
//!
//! let config = load_config().expect("failed to load config");
//! let json = config_to_json(&config);
//! println!("{json}");
//! ```

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{AvatarConfig, CONFIG_SCHEMA_VERSION};
pub use toml_loader::{apply_env_overrides, load_default, load_from_path};

use avatar_common::ConfigError;
use std::path::Path;

/// Load config from the platform default path and apply environment
/// overrides. Validation problems are logged, never fatal.
pub fn load_config() -> Result<AvatarConfig, ConfigError> {
    let config = toml_loader::load_default()?;
    Ok(settle(config, |key| std::env::var(key).ok()))
}

/// Same as [`load_config`] but reads an explicit file instead of the default path.
pub fn load_config_from(path: &Path) -> Result<AvatarConfig, ConfigError> {
    let config = toml_loader::load_from_path(path)?;
    Ok(settle(config, |key| std::env::var(key).ok()))
}

/// Apply overrides from `lookup`, then check the merged result. An invalid
/// field only warns: the rest of the file and the overrides are kept.
fn settle<F>(mut config: AvatarConfig, lookup: F) -> AvatarConfig
where
    F: Fn(&str) -> Option<String>,
{
    apply_env_overrides(&mut config, lookup);
    if let Err(e) = validation::validate(&config) {
        tracing::warn!("config validation warning after overrides: {e}");
    }
    config
}

/// Serialize a config to a pretty-printed JSON string.
pub fn config_to_json(config: &AvatarConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_to_json_contains_all_sections() {
        let config = AvatarConfig::default();
        let json = config_to_json(&config);
        assert!(json.contains("\"connection\""));
        assert!(json.contains("\"health\""));
        assert!(json.contains("\"mode_poll\""));
        assert!(json.contains("\"subtitle\""));
        assert!(json.contains("\"countdown\""));
        assert!(json.contains("\"publish\""));
        assert!(json.contains("\"logging\""));
    }

    #[test]
    fn config_to_json_never_leaks_credentials() {
        let mut config = AvatarConfig::default();
        config.credentials.api_key = Some("sk-secret".into());
        let json = config_to_json(&config);
        assert!(!json.contains("sk-secret"));
    }

    #[test]
    fn config_schema_version_is_1() {
        assert_eq!(CONFIG_SCHEMA_VERSION, 1);
    }

    #[test]
    fn load_config_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[connection]\nurl = \"ws://robot.local:6123\"\n").unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.health.probe_interval_ms, 2000);
    }

    #[test]
    fn out_of_range_field_keeps_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[connection]
url = "ws://robot.local:6123"

[health]
probe_timeout_ms = 50

[credentials]
api_key = "om-key"
"#,
        )
        .unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.health.probe_timeout_ms, 50);
        assert_eq!(config.credentials.api_key.as_deref(), Some("om-key"));

        let file_only = settle(load_from_path(&path).unwrap(), |_| None);
        assert_eq!(file_only.connection.url, "ws://robot.local:6123");
    }

    #[test]
    fn out_of_range_field_keeps_env_overrides() {
        let mut config = AvatarConfig::default();
        config.health.probe_timeout_ms = 50;

        let config = settle(config, |key| match key {
            "AVATAR_WEBSOCKET_URL" => Some("ws://10.0.0.5:6123".into()),
            "AVATAR_API_KEY" => Some("env-key".into()),
            _ => None,
        });

        assert_eq!(config.connection.url, "ws://10.0.0.5:6123");
        assert_eq!(config.credentials.api_key.as_deref(), Some("env-key"));
        assert_eq!(config.health.probe_timeout_ms, 50);
    }
}
