//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> &'static str {
    r##"# Avatar Controller Configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[connection]
url = "ws://localhost:6123"
# reconnect_delay_ms = 500          # after the channel closed
# connect_failure_delay_ms = 2000   # after the channel could not be created
# connect_timeout_secs = 15

[health]
# probe_interval_ms = 2000
# probe_timeout_ms = 5000

[mode_poll]
# unknown_interval_ms = 5000        # while no mode is known
# known_interval_ms = 30000         # once a mode is known
# request_ttl_ms = 60000

[subtitle]
# char_delay_ms = 50
# punctuation_delay_ms = 150
# idle_clear_ms = 5000
# punctuation = ".,!?;:"

[countdown]
# tick_ms = 1000
# dismiss_ms = 5000

[publish]
# status_url = "https://api.openmind.org/api/core/teleops/video/publish/status"
# check_interval_ms = 5000

[credentials]
# Prefer the AVATAR_API_KEY / AVATAR_API_KEY_ID environment variables.
# api_key = ""
# api_key_id = ""

[logging]
# level = "info"
"##
}
