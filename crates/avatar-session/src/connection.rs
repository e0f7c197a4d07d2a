//! Channel lifecycle state machine.
//!
//! `Idle -> Connecting -> Open -> Reconnecting -> Connecting -> ...`, ending
//! only in `TornDown`. Each connect attempt gets a fresh [`ChannelId`]; events
//! from any other id belong to a superseded channel and are refused. At most
//! one reconnect timer is armed at any time.

use std::fmt;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::info;

use crate::action::TimerAction;
use crate::timers::{TimerHandle, TimerRegistry};

/// Identity of one connect attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ChannelId(u64);

impl ChannelId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionPhase {
    Idle,
    Connecting,
    Open,
    Reconnecting,
    TornDown,
}

#[derive(Debug, Clone)]
pub struct ReconnectDelays {
    /// After an established channel closed.
    pub after_close: Duration,
    /// After a channel could not be created.
    pub after_failure: Duration,
}

impl Default for ReconnectDelays {
    fn default() -> Self {
        Self {
            after_close: Duration::from_millis(500),
            after_failure: Duration::from_secs(2),
        }
    }
}

pub struct ConnectionManager {
    delays: ReconnectDelays,
    phase: ConnectionPhase,
    current: Option<ChannelId>,
    next_id: u64,
    reconnect: Option<TimerHandle>,
}

impl ConnectionManager {
    pub fn new(delays: ReconnectDelays) -> Self {
        Self {
            delays,
            phase: ConnectionPhase::Idle,
            current: None,
            next_id: 1,
            reconnect: None,
        }
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    pub fn current(&self) -> Option<ChannelId> {
        self.current
    }

    pub fn is_open(&self) -> bool {
        self.phase == ConnectionPhase::Open
    }

    /// The channel is live (connecting or open) and `channel` is it.
    pub fn is_current(&self, channel: ChannelId) -> bool {
        self.current == Some(channel)
    }

    pub fn reconnect_pending(&self) -> bool {
        self.reconnect.is_some()
    }

    /// Begin the first connect attempt. `None` unless idle.
    pub fn start(&mut self) -> Option<ChannelId> {
        (self.phase == ConnectionPhase::Idle).then(|| self.begin_attempt())
    }

    /// The reconnect timer fired: begin the next attempt.
    pub fn on_reconnect_timer(&mut self) -> Option<ChannelId> {
        if self.phase != ConnectionPhase::Reconnecting {
            return None;
        }
        self.reconnect = None;
        info!("Attempting to reconnect avatar channel");
        Some(self.begin_attempt())
    }

    /// Returns `false` for a stale or unexpected open.
    pub fn on_opened(&mut self, channel: ChannelId) -> bool {
        if self.phase != ConnectionPhase::Connecting || !self.is_current(channel) {
            return false;
        }
        self.phase = ConnectionPhase::Open;
        true
    }

    /// The channel could not be created. Schedules the (longer) retry.
    pub fn on_connect_failed(
        &mut self,
        now: Instant,
        channel: ChannelId,
        timers: &mut TimerRegistry<TimerAction>,
    ) -> bool {
        if self.phase != ConnectionPhase::Connecting || !self.is_current(channel) {
            return false;
        }
        self.schedule_reconnect(now, self.delays.after_failure, timers);
        true
    }

    /// The channel closed. Schedules the (short) retry.
    pub fn on_closed(
        &mut self,
        now: Instant,
        channel: ChannelId,
        timers: &mut TimerRegistry<TimerAction>,
    ) -> bool {
        let live = matches!(
            self.phase,
            ConnectionPhase::Connecting | ConnectionPhase::Open
        );
        if !live || !self.is_current(channel) {
            return false;
        }
        self.schedule_reconnect(now, self.delays.after_close, timers);
        true
    }

    /// Enter the terminal state. Returns the channel that must be closed, if any.
    pub fn teardown(&mut self, timers: &mut TimerRegistry<TimerAction>) -> Option<ChannelId> {
        if let Some(h) = self.reconnect.take() {
            timers.cancel(h);
        }
        self.phase = ConnectionPhase::TornDown;
        self.current.take()
    }

    fn begin_attempt(&mut self) -> ChannelId {
        let id = ChannelId(self.next_id);
        self.next_id += 1;
        self.current = Some(id);
        self.phase = ConnectionPhase::Connecting;
        id
    }

    fn schedule_reconnect(
        &mut self,
        now: Instant,
        delay: Duration,
        timers: &mut TimerRegistry<TimerAction>,
    ) {
        if let Some(h) = self.reconnect.take() {
            timers.cancel(h);
        }
        self.current = None;
        self.phase = ConnectionPhase::Reconnecting;
        info!(delay_ms = delay.as_millis() as u64, "Scheduling avatar channel reconnect");
        self.reconnect = Some(timers.after(now, delay, TimerAction::Reconnect));
    }
}
