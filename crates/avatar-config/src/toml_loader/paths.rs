//! Where the config file lives, and seeding it with the documented default.

use avatar_common::ConfigError;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use super::template::default_config_toml;

const APP_DIR: &str = "avatar";
const FILE_NAME: &str = "config.toml";

/// `<platform config dir>/avatar/config.toml`.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|base| config_path_in(&base))
        .ok_or(ConfigError::NoConfigDir)
}

fn config_path_in(base: &Path) -> PathBuf {
    base.join(APP_DIR).join(FILE_NAME)
}

/// Write the documented default config to `path`, creating parent
/// directories. A file that already exists is left untouched.
pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::io(parent, e))?;
    }

    let mut file = match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
    {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(()),
        Err(e) => return Err(ConfigError::io(path, e)),
    };
    file.write_all(default_config_toml().as_bytes())
        .map_err(|e| ConfigError::io(path, e))?;

    info!(path = %path.display(), "Wrote default avatar config");
    Ok(())
}
