//! Timing for the derived UI state: mode polling, subtitles and the countdown.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Periodic `get_mode` polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModePollConfig {
    /// Poll interval while no mode is known yet.
    pub unknown_interval_ms: u32,
    /// Poll interval once a mode is known.
    pub known_interval_ms: u32,
    /// Pending mode requests older than this are forgotten.
    pub request_ttl_ms: u32,
}

impl Default for ModePollConfig {
    fn default() -> Self {
        Self {
            unknown_interval_ms: 5000,
            known_interval_ms: 30000,
            request_ttl_ms: 60000,
        }
    }
}

impl ModePollConfig {
    pub fn unknown_interval(&self) -> Duration {
        Duration::from_millis(self.unknown_interval_ms.into())
    }

    pub fn known_interval(&self) -> Duration {
        Duration::from_millis(self.known_interval_ms.into())
    }

    pub fn request_ttl(&self) -> Duration {
        Duration::from_millis(self.request_ttl_ms.into())
    }
}

/// Subtitle typewriter reveal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubtitleConfig {
    pub char_delay_ms: u32,
    /// Pause after a punctuation mark.
    pub punctuation_delay_ms: u32,
    /// Idle time after the full text is shown before it is cleared.
    pub idle_clear_ms: u32,
    /// Characters treated as punctuation.
    pub punctuation: String,
}

impl Default for SubtitleConfig {
    fn default() -> Self {
        Self {
            char_delay_ms: 50,
            punctuation_delay_ms: 150,
            idle_clear_ms: 5000,
            punctuation: ".,!?;:".into(),
        }
    }
}

impl SubtitleConfig {
    pub fn char_delay(&self) -> Duration {
        Duration::from_millis(self.char_delay_ms.into())
    }

    pub fn punctuation_delay(&self) -> Duration {
        Duration::from_millis(self.punctuation_delay_ms.into())
    }

    pub fn idle_clear(&self) -> Duration {
        Duration::from_millis(self.idle_clear_ms.into())
    }
}

/// Greeting countdown overlay.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CountdownConfig {
    pub tick_ms: u32,
    /// How long a finished countdown stays visible.
    pub dismiss_ms: u32,
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            tick_ms: 1000,
            dismiss_ms: 5000,
        }
    }
}

impl CountdownConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.into())
    }

    pub fn dismiss(&self) -> Duration {
        Duration::from_millis(self.dismiss_ms.into())
    }
}
