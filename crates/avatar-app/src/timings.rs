//! Mapping from the file configuration to session and client options.

use avatar_config::AvatarConfig;
use avatar_session::projections::{CountdownTimings, ModePollTimings, SubtitleTimings};
use avatar_session::{ClientOptions, ReconnectDelays, SessionTimings};

pub fn session_timings(config: &AvatarConfig) -> SessionTimings {
    SessionTimings {
        reconnect: ReconnectDelays {
            after_close: config.connection.reconnect_delay(),
            after_failure: config.connection.connect_failure_delay(),
        },
        probe_interval: config.health.probe_interval(),
        probe_timeout: config.health.probe_timeout(),
        mode_poll: ModePollTimings {
            unknown_interval: config.mode_poll.unknown_interval(),
            known_interval: config.mode_poll.known_interval(),
        },
        request_ttl: config.mode_poll.request_ttl(),
        subtitle: SubtitleTimings {
            char_delay: config.subtitle.char_delay(),
            punctuation_delay: config.subtitle.punctuation_delay(),
            idle_clear: config.subtitle.idle_clear(),
            punctuation: config.subtitle.punctuation.clone(),
        },
        countdown: CountdownTimings {
            tick: config.countdown.tick(),
            dismiss: config.countdown.dismiss(),
        },
    }
}

pub fn client_options(config: &AvatarConfig) -> ClientOptions {
    ClientOptions {
        url: config.connection.url.clone(),
        timings: session_timings(config),
        connect_timeout: config.connection.connect_timeout(),
        stream_credentials: config.credentials.has_stream_credentials(),
    }
}
