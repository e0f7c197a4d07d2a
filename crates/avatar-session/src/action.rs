//! Actions carried by the session's timers.

use avatar_common::RequestId;

/// What to do when a session timer comes due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerAction {
    /// Open a fresh channel.
    Reconnect,
    /// Send the next liveness probe.
    HealthProbe,
    /// The probe with this id went unanswered.
    ProbeTimeout(RequestId),
    /// Ask the backend for its current mode.
    ModePoll,
    /// Reveal the next subtitle character.
    SubtitleReveal,
    /// Clear an idle subtitle.
    SubtitleClear,
    /// Decrement the countdown.
    CountdownTick,
    /// Remove a finished countdown.
    CountdownDismiss,
}
