//! Validation for mode polling, subtitle, countdown and publish settings.

use crate::schema::AvatarConfig;

use super::helpers::{validate_range, validate_scheme};

pub(crate) fn validate_mode_poll(errors: &mut Vec<String>, config: &AvatarConfig) {
    let m = &config.mode_poll;
    validate_range(errors, "mode_poll.unknown_interval_ms", m.unknown_interval_ms, 500, 600_000);
    validate_range(errors, "mode_poll.known_interval_ms", m.known_interval_ms, 500, 600_000);
    validate_range(errors, "mode_poll.request_ttl_ms", m.request_ttl_ms, 1_000, 3_600_000);
    if m.known_interval_ms < m.unknown_interval_ms {
        errors.push(format!(
            "mode_poll.known_interval_ms = {} must not be shorter than mode_poll.unknown_interval_ms = {}",
            m.known_interval_ms, m.unknown_interval_ms
        ));
    }
}

pub(crate) fn validate_subtitle(errors: &mut Vec<String>, config: &AvatarConfig) {
    let s = &config.subtitle;
    validate_range(errors, "subtitle.char_delay_ms", s.char_delay_ms, 1, 2_000);
    validate_range(errors, "subtitle.punctuation_delay_ms", s.punctuation_delay_ms, 1, 5_000);
    validate_range(errors, "subtitle.idle_clear_ms", s.idle_clear_ms, 100, 600_000);
    if s.punctuation.is_empty() {
        errors.push("subtitle.punctuation must not be empty".into());
    }
}

pub(crate) fn validate_countdown(errors: &mut Vec<String>, config: &AvatarConfig) {
    let c = &config.countdown;
    validate_range(errors, "countdown.tick_ms", c.tick_ms, 10, 10_000);
    validate_range(errors, "countdown.dismiss_ms", c.dismiss_ms, 0, 600_000);
}

pub(crate) fn validate_publish(errors: &mut Vec<String>, config: &AvatarConfig) {
    let p = &config.publish;
    validate_scheme(errors, "publish.status_url", &p.status_url, &["http", "https"]);
    validate_range(errors, "publish.check_interval_ms", p.check_interval_ms, 500, 600_000);
}
