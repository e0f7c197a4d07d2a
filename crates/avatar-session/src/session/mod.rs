//! The avatar session: one owned struct holding every timer, correlation and
//! projection, driven by explicit events.
//!
//! Nothing here performs I/O. Callers feed [`SessionEvent`]s and the current
//! time in, and get back the [`Effect`]s the transport must carry out. The
//! tokio runtime in [`crate::runtime`] is one such caller; tests are another.

mod handlers;


use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::info;

use crate::action::TimerAction;
use crate::connection::{ChannelId, ConnectionManager, ConnectionPhase, ReconnectDelays};
use crate::correlator::{Correlator, RequestKind};
use crate::face::Face;
use crate::health::HealthMonitor;
use crate::projections::{
    CountdownProjection, CountdownTimings, ModePollTimings, ModeProjection, SubtitleProjection,
    SubtitleTimings,
};
use crate::protocol::OutboundMessage;
use crate::timers::TimerRegistry;

// ---------------------------------------------------------------------------
// Inputs and outputs
// ---------------------------------------------------------------------------

/// Something the transport observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    ChannelOpened(ChannelId),
    ChannelClosed { channel: ChannelId, reason: String },
    /// The channel could not be created at all.
    ConnectFailed { channel: ChannelId, error: String },
    /// One inbound text frame.
    Message { channel: ChannelId, text: String },
}

/// Something the transport must do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Connect(ChannelId),
    Send(ChannelId, OutboundMessage),
    Close(ChannelId),
}

/// Errors returned to UI-facing callers. Transport and protocol failures are
/// absorbed by the session and never show up here.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("channel is not open")]
    ChannelNotOpen,

    #[error("session has been torn down")]
    TornDown,

    #[error("failed to encode outbound message: {0}")]
    Encode(String),

    #[error("avatar client has stopped")]
    ClientStopped,
}

// ---------------------------------------------------------------------------
// Timings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SessionTimings {
    pub reconnect: ReconnectDelays,
    pub probe_interval: Duration,
    pub probe_timeout: Duration,
    pub mode_poll: ModePollTimings,
    /// Unanswered mode requests older than this are forgotten.
    pub request_ttl: Duration,
    pub subtitle: SubtitleTimings,
    pub countdown: CountdownTimings,
}

impl Default for SessionTimings {
    fn default() -> Self {
        Self {
            reconnect: ReconnectDelays::default(),
            probe_interval: Duration::from_secs(2),
            probe_timeout: Duration::from_secs(5),
            mode_poll: ModePollTimings::default(),
            request_ttl: Duration::from_secs(60),
            subtitle: SubtitleTimings::default(),
            countdown: CountdownTimings::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Counters for events the session absorbed instead of acting on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    /// Inbound frames that were not a JSON object.
    pub dropped_messages: u64,
    /// Face names outside the known set.
    pub unknown_faces: u64,
    /// Events from a superseded channel.
    pub stale_events: u64,
}

/// What the display should render right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "scene", content = "face", rename_all = "snake_case")]
pub enum Scene {
    VideoStream,
    Loading,
    Avatar(Face),
}

/// Read-only view of the session for the UI layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub animation: Face,
    pub loaded: bool,
    /// Currently revealed subtitle prefix.
    pub subtitle: String,
    pub countdown: Option<u32>,
    pub current_mode: Option<String>,
    pub available_modes: Vec<String>,
    pub publishing: bool,
    pub stream_credentials: bool,
    pub connection: ConnectionPhase,
    pub diagnostics: Diagnostics,
}

impl Snapshot {
    pub fn scene(&self) -> Scene {
        if self.publishing && self.stream_credentials {
            Scene::VideoStream
        } else if !self.loaded {
            Scene::Loading
        } else {
            Scene::Avatar(self.animation)
        }
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Session::new(SessionTimings::default()).snapshot()
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

pub struct Session {
    timers: TimerRegistry<TimerAction>,
    correlator: Correlator,
    connection: ConnectionManager,
    health: HealthMonitor,
    subtitle: SubtitleProjection,
    countdown: CountdownProjection,
    mode: ModeProjection,
    request_ttl: Duration,
    animation: Face,
    publishing: bool,
    stream_credentials: bool,
    diagnostics: Diagnostics,
}

impl Session {
    pub fn new(timings: SessionTimings) -> Self {
        Self {
            timers: TimerRegistry::new(),
            correlator: Correlator::new(),
            connection: ConnectionManager::new(timings.reconnect),
            health: HealthMonitor::new(timings.probe_interval, timings.probe_timeout),
            subtitle: SubtitleProjection::new(timings.subtitle),
            countdown: CountdownProjection::new(timings.countdown),
            mode: ModeProjection::new(timings.mode_poll),
            request_ttl: timings.request_ttl,
            animation: Face::NEUTRAL,
            publishing: false,
            stream_credentials: false,
            diagnostics: Diagnostics::default(),
        }
    }

    /// Whether credentials for the video stream are configured.
    pub fn with_stream_credentials(mut self, configured: bool) -> Self {
        self.stream_credentials = configured;
        self
    }

    /// Open the first channel.
    pub fn start(&mut self) -> Vec<Effect> {
        match self.connection.start() {
            Some(channel) => {
                info!(channel = %channel, "Connecting avatar channel");
                vec![Effect::Connect(channel)]
            }
            None => Vec::new(),
        }
    }

    /// Single entry point for transport events.
    pub fn handle(&mut self, now: Instant, event: SessionEvent) -> Vec<Effect> {
        match event {
            SessionEvent::ChannelOpened(channel) => self.on_opened(now, channel),
            SessionEvent::ChannelClosed { channel, reason } => {
                self.on_closed(now, channel, &reason)
            }
            SessionEvent::ConnectFailed { channel, error } => {
                self.on_connect_failed(now, channel, &error)
            }
            SessionEvent::Message { channel, text } => self.on_message(now, channel, &text),
        }
    }

    /// Fire every timer due at or before `now`.
    ///
    /// Handlers run at `now`, however late that is. A repeating timer fires at
    /// most once per call, so a stalled caller sees one probe rather than a
    /// burst, and anything the handlers arm lands after `now`.
    pub fn advance(&mut self, now: Instant) -> Vec<Effect> {
        let mut effects = Vec::new();
        while let Some((_, action)) = self.timers.pop_due(now) {
            effects.extend(self.on_timer(now, action));
        }
        effects
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// Ask the backend to switch to `mode`.
    ///
    /// Switching to the mode already in effect issues nothing.
    pub fn request_mode_switch(
        &mut self,
        now: Instant,
        mode: &str,
    ) -> Result<Vec<Effect>, SessionError> {
        let channel = match self.connection.phase() {
            ConnectionPhase::TornDown => return Err(SessionError::TornDown),
            ConnectionPhase::Open => self.connection.current(),
            _ => None,
        };
        let Some(channel) = channel else {
            return Err(SessionError::ChannelNotOpen);
        };

        if self.mode.current_mode() == Some(mode) {
            info!(mode, "Already in requested mode");
            return Ok(Vec::new());
        }

        let request_id = self.correlator.issue(RequestKind::SwitchMode, now);
        info!(mode, request_id = %request_id, "Requesting mode switch");
        Ok(vec![Effect::Send(
            channel,
            OutboundMessage::SwitchMode {
                request_id,
                parameters: mode.to_string(),
            },
        )])
    }

    /// Latest value from the external publish-status check.
    pub fn set_publishing(&mut self, publishing: bool) {
        self.publishing = publishing;
    }

    /// Release every timer and the live channel. Terminal.
    pub fn teardown(&mut self) -> Vec<Effect> {
        self.health.stop(&mut self.timers, &mut self.correlator);
        self.mode.stop_polling(&mut self.timers);
        self.subtitle.cancel(&mut self.timers);
        self.countdown.cancel(&mut self.timers);
        self.correlator.clear();

        let closing = self.connection.teardown(&mut self.timers);
        info!(armed = self.timers.len(), "Avatar session torn down");
        closing.map(Effect::Close).into_iter().collect()
    }

    pub fn snapshot(&self) -> Snapshot {
        let mode = self.mode.state();
        Snapshot {
            animation: self.animation,
            loaded: self.health.loaded(),
            subtitle: self.subtitle.displayed(),
            countdown: self.countdown.remaining(),
            current_mode: mode.current_mode.clone(),
            available_modes: mode.available_modes.clone(),
            publishing: self.publishing,
            stream_credentials: self.stream_credentials,
            connection: self.connection.phase(),
            diagnostics: self.diagnostics,
        }
    }

    /// Number of timers currently armed.
    pub fn armed_timers(&self) -> usize {
        self.timers.len()
    }

    /// Number of requests still awaiting a response.
    pub fn pending_requests(&self) -> usize {
        self.correlator.len()
    }
}
