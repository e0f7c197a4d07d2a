//! Reading the config file into an [`AvatarConfig`].

use crate::schema::AvatarConfig;
use avatar_common::ConfigError;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{info, warn};

use super::paths::{create_default_config, default_config_path};

/// Parse the TOML file at `path`. Missing fields take their serde defaults.
///
/// Values are not range-checked here; [`crate::load_config_from`] does that
/// after environment overrides are applied.
pub fn load_from_path(path: &Path) -> Result<AvatarConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ConfigError::FileNotFound(path.to_path_buf()),
        _ => ConfigError::io(path, e),
    })?;

    let config = parse(&content)
        .map_err(|e| ConfigError::ParseError(format!("{}: {e}", path.display())))?;

    info!(path = %path.display(), "Loaded avatar config");
    Ok(config)
}

fn parse(content: &str) -> Result<AvatarConfig, toml::de::Error> {
    toml::from_str(content)
}

/// Load `<platform config dir>/avatar/config.toml`.
///
/// The first run finds no file and seeds one from the documented template.
/// Failing to write that seed only warns; the defaults are returned anyway.
pub fn load_default() -> Result<AvatarConfig, ConfigError> {
    let path = default_config_path()?;

    match load_from_path(&path) {
        Err(ConfigError::FileNotFound(_)) => {
            if let Err(e) = create_default_config(&path) {
                warn!(error = %e, "Could not write default avatar config");
            }
            Ok(AvatarConfig::default())
        }
        loaded => loaded,
    }
}
