//! Event and timer handlers for [`Session`].

use std::time::Instant;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::{Effect, Session};
use crate::action::TimerAction;
use crate::connection::ChannelId;
use crate::correlator::RequestKind;
use crate::dispatcher::{self, Route};
use crate::face::Face;
use crate::health::LoadedTransition;
use crate::protocol::{self, ModeSnapshot, OutboundMessage};

impl Session {
    // -----------------------------------------------------------------------
    // Channel lifecycle
    // -----------------------------------------------------------------------

    pub(super) fn on_opened(&mut self, now: Instant, channel: ChannelId) -> Vec<Effect> {
        if !self.connection.on_opened(channel) {
            return self.stale(channel, "open");
        }
        info!(channel = %channel, "Avatar channel connected");

        let mut effects = Vec::new();
        effects.extend(self.send_get_mode(now));
        self.health.start(now, &mut self.timers);
        effects.extend(self.send_probe(now));
        self.mode.start_polling(now, &mut self.timers);
        effects
    }

    pub(super) fn on_closed(&mut self, now: Instant, channel: ChannelId, reason: &str) -> Vec<Effect> {
        if !self.connection.on_closed(now, channel, &mut self.timers) {
            return self.stale(channel, "close");
        }
        info!(channel = %channel, reason, "Avatar channel closed");
        self.reset_after_disconnect();
        Vec::new()
    }

    pub(super) fn on_connect_failed(
        &mut self,
        now: Instant,
        channel: ChannelId,
        reason: &str,
    ) -> Vec<Effect> {
        if !self.connection.on_connect_failed(now, channel, &mut self.timers) {
            return self.stale(channel, "connect failure");
        }
        error!(channel = %channel, error = reason, "Failed to connect avatar channel");
        self.reset_after_disconnect();
        Vec::new()
    }

    fn reset_after_disconnect(&mut self) {
        self.health.stop(&mut self.timers, &mut self.correlator);
        self.mode.stop_polling(&mut self.timers);
        self.correlator.clear();
        self.animation = Face::NEUTRAL;
    }

    fn stale(&mut self, channel: ChannelId, what: &str) -> Vec<Effect> {
        self.diagnostics.stale_events += 1;
        debug!(channel = %channel, event = what, "Ignoring event from superseded channel");
        Vec::new()
    }

    // -----------------------------------------------------------------------
    // Inbound messages
    // -----------------------------------------------------------------------

    pub(super) fn on_message(&mut self, now: Instant, channel: ChannelId, text: &str) -> Vec<Effect> {
        if !self.connection.is_open() || !self.connection.is_current(channel) {
            return self.stale(channel, "message");
        }
        debug!(channel = %channel, text, "Received avatar message");

        let msg = match protocol::parse_inbound(text) {
            Ok(msg) => msg,
            Err(e) => {
                error!(error = %e, "Error parsing avatar message");
                self.diagnostics.dropped_messages += 1;
                return Vec::new();
            }
        };

        let route = dispatcher::classify(&msg, self.health.outstanding());
        if !matches!(route, Route::HealthResponse { .. }) {
            self.resolve_echo(&msg);
        }

        match route {
            Route::Face(name) => {
                self.apply_face(&name);
                Vec::new()
            }
            Route::Subtitle(text) => {
                self.subtitle.show(now, &text, &mut self.timers);
                Vec::new()
            }
            Route::Countdown(value) => {
                self.countdown.on_value(now, value, &mut self.timers);
                Vec::new()
            }
            Route::HealthResponse { request_id, active } => {
                let transition = self.health.on_response(
                    &request_id,
                    active,
                    &mut self.timers,
                    &mut self.correlator,
                );
                if transition == LoadedTransition::BecameLoaded {
                    self.animation = Face::NEUTRAL;
                }
                Vec::new()
            }
            Route::ModeSwitched { message } => {
                info!(ack = %message, "Mode switch acknowledged");
                self.send_get_mode(now).into_iter().collect()
            }
            Route::ModeMessage(message) => {
                match ModeSnapshot::parse(&message) {
                    Ok(snapshot) => {
                        self.mode.apply(now, snapshot, &mut self.timers);
                    }
                    Err(e) => warn!(error = %e, "Ignoring malformed mode payload"),
                }
                Vec::new()
            }
            Route::Ignored => Vec::new(),
        }
    }

    fn apply_face(&mut self, name: &str) {
        self.animation = match name.parse::<Face>() {
            Ok(face) => face,
            Err(e) => {
                warn!(error = %e, fallback = Face::NEUTRAL.as_str(), "Unknown avatar face");
                self.diagnostics.unknown_faces += 1;
                Face::NEUTRAL
            }
        };
    }

    /// Settle a pending mode request whose id this response echoes.
    /// Probe ids are owned by the health monitor and left alone.
    fn resolve_echo(&mut self, msg: &Value) {
        let Some(request_id) = dispatcher::response_request_id(msg) else {
            return;
        };
        let is_mode_request = self
            .correlator
            .peek(&request_id)
            .is_some_and(|p| p.kind != RequestKind::HealthProbe);
        if is_mode_request {
            if let Some(pending) = self.correlator.resolve(&request_id) {
                debug!(request_id = %request_id, kind = %pending.kind, "Response matched request");
            }
        }
    }

    // -----------------------------------------------------------------------
    // Timers
    // -----------------------------------------------------------------------

    pub(super) fn on_timer(&mut self, now: Instant, action: TimerAction) -> Vec<Effect> {
        match action {
            TimerAction::Reconnect => self
                .connection
                .on_reconnect_timer()
                .map(Effect::Connect)
                .into_iter()
                .collect(),
            TimerAction::HealthProbe => self.send_probe(now).into_iter().collect(),
            TimerAction::ProbeTimeout(request_id) => {
                self.health.on_timeout(&request_id, &mut self.correlator);
                Vec::new()
            }
            TimerAction::ModePoll => {
                let pruned = self.correlator.prune_older_than(
                    now,
                    self.request_ttl,
                    &[RequestKind::GetMode, RequestKind::SwitchMode],
                );
                if pruned > 0 {
                    debug!(pruned, "Dropped unanswered mode requests");
                }
                self.send_get_mode(now).into_iter().collect()
            }
            TimerAction::SubtitleReveal => {
                self.subtitle.on_reveal_tick(now, &mut self.timers);
                Vec::new()
            }
            TimerAction::SubtitleClear => {
                self.subtitle.on_clear();
                Vec::new()
            }
            TimerAction::CountdownTick => {
                self.countdown.on_tick(now, &mut self.timers);
                Vec::new()
            }
            TimerAction::CountdownDismiss => {
                self.countdown.on_dismiss();
                Vec::new()
            }
        }
    }

    // -----------------------------------------------------------------------
    // Outbound requests
    // -----------------------------------------------------------------------

    fn open_channel(&self) -> Option<ChannelId> {
        if self.connection.is_open() {
            self.connection.current()
        } else {
            None
        }
    }

    fn send_get_mode(&mut self, now: Instant) -> Option<Effect> {
        let channel = self.open_channel()?;
        let request_id = self.correlator.issue(RequestKind::GetMode, now);
        Some(Effect::Send(channel, OutboundMessage::GetMode { request_id }))
    }

    fn send_probe(&mut self, now: Instant) -> Option<Effect> {
        let channel = self.open_channel()?;
        let request_id = self
            .health
            .probe(now, &mut self.timers, &mut self.correlator);
        Some(Effect::Send(channel, OutboundMessage::GetAvatarStatus { request_id }))
    }
}
