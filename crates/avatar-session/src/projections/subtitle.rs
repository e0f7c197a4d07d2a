//! Typewriter subtitle reveal with idle auto-clear.

use std::time::{Duration, Instant};

use crate::action::TimerAction;
use crate::timers::{TimerHandle, TimerRegistry};

#[derive(Debug, Clone)]
pub struct SubtitleTimings {
    pub char_delay: Duration,
    pub punctuation_delay: Duration,
    pub idle_clear: Duration,
    pub punctuation: String,
}

impl Default for SubtitleTimings {
    fn default() -> Self {
        Self {
            char_delay: Duration::from_millis(50),
            punctuation_delay: Duration::from_millis(150),
            idle_clear: Duration::from_secs(5),
            punctuation: ".,!?;:".into(),
        }
    }
}

/// Subtitle text and how much of it is currently revealed.
///
/// One character is revealed per tick. The pause before the next tick is
/// longer when the character just revealed is punctuation. Once the whole
/// text is visible an idle timer clears it unless new text arrives first.
pub struct SubtitleProjection {
    timings: SubtitleTimings,
    chars: Vec<char>,
    shown: usize,
    reveal: Option<TimerHandle>,
    clear: Option<TimerHandle>,
}

impl SubtitleProjection {
    pub fn new(timings: SubtitleTimings) -> Self {
        Self {
            timings,
            chars: Vec::new(),
            shown: 0,
            reveal: None,
            clear: None,
        }
    }

    /// Replace the subtitle. Any reveal in progress is abandoned, not queued.
    pub fn show(&mut self, now: Instant, text: &str, timers: &mut TimerRegistry<TimerAction>) {
        self.cancel(timers);
        self.chars = text.chars().collect();
        self.shown = 0;
        if !self.chars.is_empty() {
            self.reveal_next(now, timers);
        }
    }

    pub fn on_reveal_tick(&mut self, now: Instant, timers: &mut TimerRegistry<TimerAction>) {
        self.reveal = None;
        self.reveal_next(now, timers);
    }

    pub fn on_clear(&mut self) {
        self.clear = None;
        self.chars.clear();
        self.shown = 0;
    }

    /// Currently visible prefix.
    pub fn displayed(&self) -> String {
        self.chars[..self.shown].iter().collect()
    }

    pub fn full_text(&self) -> String {
        self.chars.iter().collect()
    }

    pub fn displayed_len(&self) -> usize {
        self.shown
    }

    pub fn is_revealing(&self) -> bool {
        self.reveal.is_some()
    }

    pub fn clear_pending(&self) -> bool {
        self.clear.is_some()
    }

    /// Disarm both timers without touching the text.
    pub fn cancel(&mut self, timers: &mut TimerRegistry<TimerAction>) {
        if let Some(h) = self.reveal.take() {
            timers.cancel(h);
        }
        if let Some(h) = self.clear.take() {
            timers.cancel(h);
        }
    }

    fn reveal_next(&mut self, now: Instant, timers: &mut TimerRegistry<TimerAction>) {
        if self.shown < self.chars.len() {
            let revealed = self.chars[self.shown];
            self.shown += 1;
            let delay = if self.timings.punctuation.contains(revealed) {
                self.timings.punctuation_delay
            } else {
                self.timings.char_delay
            };
            self.reveal = Some(timers.after(now, delay, TimerAction::SubtitleReveal));
        } else {
            self.clear = Some(timers.after(now, self.timings.idle_clear, TimerAction::SubtitleClear));
        }
    }
}
