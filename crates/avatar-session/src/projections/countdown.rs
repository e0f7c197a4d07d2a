//! Greeting countdown overlay: tick-down and delayed dismissal.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::action::TimerAction;
use crate::timers::{TimerHandle, TimerRegistry};

/// Largest value the countdown accepts.
pub const FULL_SECONDS: u32 = 20;
/// The half-way restart value.
pub const HALF_SECONDS: u32 = 10;

/// Collapse a raw greeting-status value onto {20, 10, 0}.
///
/// Anything other than exactly 20 or 10 (negatives, fractions, out-of-range
/// numbers) means "clear".
pub fn normalize_value(value: f64) -> u32 {
    if value == f64::from(FULL_SECONDS) {
        FULL_SECONDS
    } else if value == f64::from(HALF_SECONDS) {
        HALF_SECONDS
    } else {
        0
    }
}

#[derive(Debug, Clone)]
pub struct CountdownTimings {
    pub tick: Duration,
    pub dismiss: Duration,
}

impl Default for CountdownTimings {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
            dismiss: Duration::from_secs(5),
        }
    }
}

pub struct CountdownProjection {
    timings: CountdownTimings,
    remaining: Option<u32>,
    decay: Option<TimerHandle>,
    dismiss: Option<TimerHandle>,
}

impl CountdownProjection {
    pub fn new(timings: CountdownTimings) -> Self {
        Self {
            timings,
            remaining: None,
            decay: None,
            dismiss: None,
        }
    }

    /// Seconds left, or `None` when no countdown is shown.
    pub fn remaining(&self) -> Option<u32> {
        self.remaining
    }

    pub fn is_decaying(&self) -> bool {
        self.decay.is_some()
    }

    pub fn dismiss_pending(&self) -> bool {
        self.dismiss.is_some()
    }

    /// Apply a greeting-status value. Returns `false` if it was ignored.
    pub fn on_value(
        &mut self,
        now: Instant,
        value: f64,
        timers: &mut TimerRegistry<TimerAction>,
    ) -> bool {
        let target = normalize_value(value);

        if target == 0 && (self.dismiss.is_some() || self.remaining.is_none()) {
            debug!(value, "Ignoring countdown clear: nothing to clear");
            return false;
        }

        self.remaining = Some(target);
        if let Some(h) = self.decay.take() {
            timers.cancel(h);
        }

        if target > 0 {
            if let Some(h) = self.dismiss.take() {
                timers.cancel(h);
            }
            self.decay = Some(timers.every(now, self.timings.tick, TimerAction::CountdownTick));
        } else {
            self.arm_dismiss(now, timers);
        }
        true
    }

    pub fn on_tick(&mut self, now: Instant, timers: &mut TimerRegistry<TimerAction>) {
        let Some(remaining) = self.remaining.filter(|r| *r > 0) else {
            return;
        };
        let remaining = remaining - 1;
        self.remaining = Some(remaining);

        if remaining == 0 {
            if let Some(h) = self.decay.take() {
                timers.cancel(h);
            }
            self.arm_dismiss(now, timers);
        }
    }

    pub fn on_dismiss(&mut self) {
        self.dismiss = None;
        self.remaining = None;
    }

    /// Disarm both timers without touching the value.
    pub fn cancel(&mut self, timers: &mut TimerRegistry<TimerAction>) {
        if let Some(h) = self.decay.take() {
            timers.cancel(h);
        }
        if let Some(h) = self.dismiss.take() {
            timers.cancel(h);
        }
    }

    fn arm_dismiss(&mut self, now: Instant, timers: &mut TimerRegistry<TimerAction>) {
        if let Some(h) = self.dismiss.take() {
            timers.cancel(h);
        }
        self.dismiss = Some(timers.after(now, self.timings.dismiss, TimerAction::CountdownDismiss));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Rig {
        t0: Instant,
        timers: TimerRegistry<TimerAction>,
        countdown: CountdownProjection,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                t0: Instant::now(),
                timers: TimerRegistry::new(),
                countdown: CountdownProjection::new(CountdownTimings::default()),
            }
        }

        fn at(&self, ms: u64) -> Instant {
            self.t0 + Duration::from_millis(ms)
        }

        fn value(&mut self, ms: u64, value: f64) -> bool {
            let now = self.at(ms);
            self.countdown.on_value(now, value, &mut self.timers)
        }

        /// Run timers up to `ms`, recording `remaining` after each firing.
        fn run_until(&mut self, ms: u64) -> Vec<Option<u32>> {
            let end = self.at(ms);
            let mut seen = Vec::new();
            while let Some(deadline) = self.timers.next_deadline().filter(|d| *d <= end) {
                while let Some((_, action)) = self.timers.pop_due(deadline) {
                    match action {
                        TimerAction::CountdownTick => {
                            self.countdown.on_tick(deadline, &mut self.timers)
                        }
                        TimerAction::CountdownDismiss => self.countdown.on_dismiss(),
                        other => panic!("unexpected timer {other:?}"),
                    }
                    seen.push(self.countdown.remaining());
                }
            }
            seen
        }
    }

    #[test]
    fn normalizes_to_three_values() {
        assert_eq!(normalize_value(20.0), 20);
        assert_eq!(normalize_value(10.0), 10);
        for v in [0.0, 15.0, -20.0, 10.5, 21.0, 1e9] {
            assert_eq!(normalize_value(v), 0, "value {v}");
        }
    }

    #[test]
    fn counts_down_one_per_tick_then_dismisses() {
        let mut rig = Rig::new();
        assert!(rig.value(0, 20.0));
        assert_eq!(rig.countdown.remaining(), Some(20));

        let seen = rig.run_until(20_000);
        let expected: Vec<Option<u32>> = (0..20).rev().map(Some).collect();
        assert_eq!(seen, expected);
        assert!(!rig.countdown.is_decaying());
        assert!(rig.countdown.dismiss_pending());

        assert_eq!(rig.run_until(24_999), vec![]);
        assert_eq!(rig.run_until(25_000), vec![None]);
        assert!(rig.timers.is_empty());
    }

    #[test]
    fn never_goes_below_zero() {
        let mut rig = Rig::new();
        rig.value(0, 10.0);
        rig.run_until(10_000);
        assert_eq!(rig.countdown.remaining(), Some(0));

        let now = rig.at(10_500);
        rig.countdown.on_tick(now, &mut rig.timers);
        assert_eq!(rig.countdown.remaining(), Some(0));
    }

    #[test]
    fn sequence_twenty_ten_zero() {
        let mut rig = Rig::new();
        rig.value(0, 20.0);
        rig.run_until(3_000);
        assert_eq!(rig.countdown.remaining(), Some(17));

        assert!(rig.value(3_200, 10.0));
        assert_eq!(rig.countdown.remaining(), Some(10));
        // The restarted interval ticks relative to the new value's arrival.
        assert_eq!(rig.run_until(4_199), vec![]);
        assert_eq!(rig.run_until(4_200), vec![Some(9)]);

        // Early clear while decrementing.
        assert!(rig.value(5_000, 0.0));
        assert_eq!(rig.countdown.remaining(), Some(0));
        assert!(!rig.countdown.is_decaying());
        assert!(rig.countdown.dismiss_pending());

        // A stray clear while the dismiss is pending is ignored.
        assert!(!rig.value(6_000, 0.0));
        assert_eq!(rig.run_until(9_999), vec![]);
        assert_eq!(rig.run_until(10_000), vec![None]);
    }

    #[test]
    fn clear_without_countdown_is_ignored() {
        let mut rig = Rig::new();
        assert!(!rig.value(0, 0.0));
        assert!(!rig.value(0, 7.0));
        assert_eq!(rig.countdown.remaining(), None);
        assert!(rig.timers.is_empty());
    }

    #[test]
    fn restart_cancels_pending_dismiss() {
        let mut rig = Rig::new();
        rig.value(0, 10.0);
        rig.run_until(10_000);
        assert!(rig.countdown.dismiss_pending());

        assert!(rig.value(12_000, 20.0));
        assert!(!rig.countdown.dismiss_pending());
        assert_eq!(rig.run_until(15_000), vec![Some(19), Some(18), Some(17)]);
        assert_eq!(
            rig.timers.count_where(|a| matches!(a, TimerAction::CountdownDismiss)),
            0
        );
    }

    #[test]
    fn cancel_disarms_everything() {
        let mut rig = Rig::new();
        rig.value(0, 20.0);
        rig.countdown.cancel(&mut rig.timers);
        assert!(rig.timers.is_empty());
        assert!(!rig.countdown.is_decaying());
    }
}
