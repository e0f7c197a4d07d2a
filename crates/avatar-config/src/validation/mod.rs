//! Full configuration validation.
//!
//! Each domain has its own submodule; this orchestrator calls them all
//! and collects errors into a single `ConfigError`.

mod connection;
mod helpers;
mod projections;


use crate::schema::AvatarConfig;
use avatar_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &AvatarConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    connection::validate_connection(&mut errors, config);
    connection::validate_health(&mut errors, config);
    projections::validate_mode_poll(&mut errors, config);
    projections::validate_subtitle(&mut errors, config);
    projections::validate_countdown(&mut errors, config);
    projections::validate_publish(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
