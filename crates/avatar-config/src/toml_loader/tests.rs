//! Tests for TOML config loading, creation and env overrides.

use super::*;
use std::collections::HashMap;
use std::path::Path;

#[test]
fn load_from_nonexistent_returns_file_not_found() {
    let result = load_from_path(Path::new("/tmp/nonexistent_avatar_config.toml"));
    let err = result.unwrap_err();
    assert!(matches!(err, avatar_common::ConfigError::FileNotFound(_)));
}

#[test]
fn unreadable_path_is_io_not_missing() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_from_path(dir.path()).unwrap_err();
    assert!(matches!(err, avatar_common::ConfigError::Io { .. }));
}

#[test]
fn load_valid_partial_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[connection]
url = "wss://robot.example:6123"

[countdown]
dismiss_ms = 3000
"#,
    )
    .unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.connection.url, "wss://robot.example:6123");
    assert_eq!(config.countdown.dismiss_ms, 3000);
    // Defaults preserved
    assert_eq!(config.countdown.tick_ms, 1000);
    assert_eq!(config.connection.reconnect_delay_ms, 500);
}

#[test]
fn load_invalid_toml_returns_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "this is not valid toml {{{").unwrap();

    let err = load_from_path(&path).unwrap_err();
    assert!(matches!(err, avatar_common::ConfigError::ParseError(_)));
    assert!(err.to_string().contains("config.toml"));
}

#[test]
fn load_config_with_invalid_values_still_returns_parsed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[health]
probe_timeout_ms = 0
"#,
    )
    .unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.health.probe_timeout_ms, 0);
}

#[test]
fn credentials_are_read_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[credentials]
api_key = "om-key"
api_key_id = "om-key-id"
"#,
    )
    .unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.credentials.api_key.as_deref(), Some("om-key"));
    assert!(config.credentials.has_stream_credentials());
}

#[test]
fn create_and_load_default_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("avatar").join("config.toml");

    create_default_config(&path).unwrap();
    assert!(path.exists());

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.connection.url, "ws://localhost:6123");
    assert_eq!(config.health.probe_interval_ms, 2000);
    assert!(config.credentials.api_key.is_none());
}

#[test]
fn default_config_path_ends_with_avatar() {
    if let Ok(path) = default_config_path() {
        assert!(path.ends_with("avatar/config.toml"));
    }
}

#[test]
fn env_overrides_replace_file_values() {
    let env: HashMap<&str, &str> = HashMap::from([
        ("AVATAR_WEBSOCKET_URL", "ws://10.0.0.5:6123"),
        ("AVATAR_API_KEY", "env-key"),
        ("AVATAR_API_KEY_ID", "env-key-id"),
        ("AVATAR_PUBLISH_STATUS_URL", "https://status.local/publish"),
    ]);
    let mut config = crate::AvatarConfig::default();

    apply_env_overrides(&mut config, |k| env.get(k).map(|v| v.to_string()));

    assert_eq!(config.connection.url, "ws://10.0.0.5:6123");
    assert_eq!(config.credentials.api_key.as_deref(), Some("env-key"));
    assert_eq!(config.credentials.api_key_id.as_deref(), Some("env-key-id"));
    assert_eq!(config.publish.status_url, "https://status.local/publish");
}

#[test]
fn empty_env_values_are_ignored() {
    let mut config = crate::AvatarConfig::default();
    apply_env_overrides(&mut config, |k| {
        (k == "AVATAR_WEBSOCKET_URL").then(|| "   ".to_string())
    });
    assert_eq!(config.connection.url, "ws://localhost:6123");
}
