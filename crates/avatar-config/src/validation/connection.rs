//! Validation for the channel and liveness sections.

use crate::schema::AvatarConfig;

use super::helpers::{validate_range, validate_scheme};

/// Validate connection constraints.
pub(crate) fn validate_connection(errors: &mut Vec<String>, config: &AvatarConfig) {
    let c = &config.connection;
    validate_scheme(errors, "connection.url", &c.url, &["ws", "wss"]);
    validate_range(errors, "connection.reconnect_delay_ms", c.reconnect_delay_ms, 50, 60_000);
    validate_range(
        errors,
        "connection.connect_failure_delay_ms",
        c.connect_failure_delay_ms,
        50,
        60_000,
    );
    validate_range(errors, "connection.connect_timeout_secs", c.connect_timeout_secs, 1, 120);
}

/// Validate health probe constraints.
pub(crate) fn validate_health(errors: &mut Vec<String>, config: &AvatarConfig) {
    let h = &config.health;
    validate_range(errors, "health.probe_interval_ms", h.probe_interval_ms, 100, 60_000);
    validate_range(errors, "health.probe_timeout_ms", h.probe_timeout_ms, 100, 120_000);
}
