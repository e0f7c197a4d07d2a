//! Operating mode state and the adaptive `get_mode` poll.

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::info;

use crate::action::TimerAction;
use crate::protocol::ModeSnapshot;
use crate::timers::{TimerHandle, TimerRegistry};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModeState {
    pub current_mode: Option<String>,
    /// In the order the server sent them.
    pub available_modes: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ModePollTimings {
    /// Poll interval while no mode is known.
    pub unknown_interval: Duration,
    /// Poll interval once a mode is known.
    pub known_interval: Duration,
}

impl Default for ModePollTimings {
    fn default() -> Self {
        Self {
            unknown_interval: Duration::from_secs(5),
            known_interval: Duration::from_secs(30),
        }
    }
}

pub struct ModeProjection {
    timings: ModePollTimings,
    state: ModeState,
    poll: Option<TimerHandle>,
}

impl ModeProjection {
    pub fn new(timings: ModePollTimings) -> Self {
        Self {
            timings,
            state: ModeState::default(),
            poll: None,
        }
    }

    pub fn state(&self) -> &ModeState {
        &self.state
    }

    pub fn current_mode(&self) -> Option<&str> {
        self.state.current_mode.as_deref()
    }

    pub fn is_polling(&self) -> bool {
        self.poll.is_some()
    }

    /// Interval matching the current state: fast while unknown, slow once known.
    pub fn poll_interval(&self) -> Duration {
        if self.state.current_mode.is_some() {
            self.timings.known_interval
        } else {
            self.timings.unknown_interval
        }
    }

    /// (Re)start polling at the interval matching the current state.
    pub fn start_polling(&mut self, now: Instant, timers: &mut TimerRegistry<TimerAction>) {
        self.stop_polling(timers);
        self.poll = Some(timers.every(now, self.poll_interval(), TimerAction::ModePoll));
    }

    pub fn stop_polling(&mut self, timers: &mut TimerRegistry<TimerAction>) {
        if let Some(h) = self.poll.take() {
            timers.cancel(h);
        }
    }

    /// Merge a snapshot from the backend.
    ///
    /// If the current mode went from unknown to known (or back) while polling,
    /// the poll is re-armed at the new interval. Returns `true` if the state
    /// changed.
    pub fn apply(
        &mut self,
        now: Instant,
        snapshot: ModeSnapshot,
        timers: &mut TimerRegistry<TimerAction>,
    ) -> bool {
        let before = self.state.clone();
        let was_known = before.current_mode.is_some();

        if let Some(modes) = snapshot.all_modes {
            self.state.available_modes = modes;
        }
        if let Some(current) = snapshot.current_mode {
            self.state.current_mode = Some(current);
        }

        if was_known != self.state.current_mode.is_some() && self.poll.is_some() {
            let interval = self.poll_interval();
            info!(
                interval_ms = interval.as_millis() as u64,
                "Mode known state changed, rescheduling mode poll"
            );
            self.start_polling(now, timers);
        }

        info!(
            current = ?self.state.current_mode,
            all = ?self.state.available_modes,
            "Updated modes"
        );
        before != self.state
    }
}
