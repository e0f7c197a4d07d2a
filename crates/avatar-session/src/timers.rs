//! Timer registry: one-shot and repeating deadlines with typed handles.
//!
//! The registry never sleeps and never runs anything itself. Callers arm
//! timers against an explicit `now`, ask for [`TimerRegistry::next_deadline`],
//! and drain due actions with [`TimerRegistry::pop_due`]. Handles are never
//! reused, so cancelling a handle that already fired (or was already
//! cancelled) is a harmless no-op.

use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

/// Opaque handle to an armed timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

struct Timer<A> {
    deadline: Instant,
    period: Option<Duration>,
    action: A,
}

/// Registry of pending timers carrying an action of type `A`.
///
/// The action is opaque to the registry; it is handed back verbatim when the
/// timer comes due.
pub struct TimerRegistry<A> {
    next_handle: u64,
    timers: BTreeMap<TimerHandle, Timer<A>>,
}

impl<A: Clone> TimerRegistry<A> {
    pub fn new() -> Self {
        Self {
            next_handle: 1,
            timers: BTreeMap::new(),
        }
    }

    /// Arm a one-shot timer firing `delay` after `now`.
    pub fn after(&mut self, now: Instant, delay: Duration, action: A) -> TimerHandle {
        self.insert(now + delay, None, action)
    }

    /// Arm a repeating timer firing every `interval`, first at `now + interval`.
    ///
    /// A zero interval is clamped to one millisecond so a repeating timer can
    /// never starve the caller's drain loop.
    pub fn every(&mut self, now: Instant, interval: Duration, action: A) -> TimerHandle {
        let interval = interval.max(Duration::from_millis(1));
        self.insert(now + interval, Some(interval), action)
    }

    /// Disarm a timer. Returns `true` if it was still armed.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.timers.remove(&handle).is_some()
    }

    pub fn is_armed(&self, handle: TimerHandle) -> bool {
        self.timers.contains_key(&handle)
    }

    /// Earliest deadline among armed timers.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.values().map(|t| t.deadline).min()
    }

    /// Pop the earliest timer due at or before `now`.
    ///
    /// Ties are broken by arming order. One-shot timers are removed. Repeating
    /// timers fire once per call however far behind the caller is, and are
    /// re-armed on their original phase at the first tick after `now`.
    pub fn pop_due(&mut self, now: Instant) -> Option<(TimerHandle, A)> {
        let (handle, _) = self
            .timers
            .iter()
            .filter(|(_, t)| t.deadline <= now)
            .min_by_key(|(handle, t)| (t.deadline, **handle))?;
        let handle = *handle;

        let timer = self.timers.get_mut(&handle)?;
        match timer.period {
            Some(period) => {
                timer.deadline = next_tick_after(timer.deadline, period, now);
                Some((handle, timer.action.clone()))
            }
            None => self.timers.remove(&handle).map(|t| (handle, t.action)),
        }
    }

    /// Number of armed timers.
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Number of armed timers whose action satisfies `pred`.
    pub fn count_where<F>(&self, pred: F) -> usize
    where
        F: Fn(&A) -> bool,
    {
        self.timers.values().filter(|t| pred(&t.action)).count()
    }

    /// Disarm everything.
    pub fn clear(&mut self) {
        self.timers.clear();
    }

    fn insert(&mut self, deadline: Instant, period: Option<Duration>, action: A) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        self.timers.insert(
            handle,
            Timer {
                deadline,
                period,
                action,
            },
        );
        handle
    }
}

/// First tick of the `deadline + k * period` series strictly after `now`.
fn next_tick_after(deadline: Instant, period: Duration, now: Instant) -> Instant {
    let next = deadline + period;
    if next > now {
        return next;
    }
    let into_period = now.duration_since(deadline).as_nanos() % period.as_nanos();
    now + period - Duration::from_nanos(into_period as u64)
}

impl<A: Clone> Default for TimerRegistry<A> {
    fn default() -> Self {
        Self::new()
    }
}
