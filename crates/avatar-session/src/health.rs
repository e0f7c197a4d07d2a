//! Avatar liveness monitoring.
//!
//! The backend's avatar subsystem can stop answering without the channel
//! closing, so a bare socket read never notices. While the channel is open a
//! `get_avatar_status` probe goes out on a fixed interval, each with its own
//! timeout. Only the most recent probe is "outstanding"; earlier probes keep
//! their timeouts until a success clears them all.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use avatar_common::RequestId;
use tracing::{error, info, warn};

use crate::action::TimerAction;
use crate::correlator::{Correlator, RequestKind};
use crate::timers::{TimerHandle, TimerRegistry};

/// Edge of the loaded flag produced by a health event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadedTransition {
    BecameLoaded,
    BecameUnloaded,
    Unchanged,
}

pub struct HealthMonitor {
    interval: Duration,
    timeout: Duration,
    ticker: Option<TimerHandle>,
    outstanding: Option<RequestId>,
    timeouts: HashMap<RequestId, TimerHandle>,
    loaded: bool,
}

impl HealthMonitor {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self {
            interval,
            timeout,
            ticker: None,
            outstanding: None,
            timeouts: HashMap::new(),
            loaded: false,
        }
    }

    pub fn loaded(&self) -> bool {
        self.loaded
    }

    /// Id of the probe whose answer is currently awaited.
    pub fn outstanding(&self) -> Option<&RequestId> {
        self.outstanding.as_ref()
    }

    /// Number of probe timeouts still armed.
    pub fn armed_timeouts(&self) -> usize {
        self.timeouts.len()
    }

    pub fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    /// Start periodic probing. Replaces any previous ticker.
    pub fn start(&mut self, now: Instant, timers: &mut TimerRegistry<TimerAction>) {
        if let Some(old) = self.ticker.take() {
            timers.cancel(old);
        }
        self.ticker = Some(timers.every(now, self.interval, TimerAction::HealthProbe));
    }

    /// Issue one probe and arm its timeout. Returns the id to embed in the
    /// outbound request.
    pub fn probe(
        &mut self,
        now: Instant,
        timers: &mut TimerRegistry<TimerAction>,
        correlator: &mut Correlator,
    ) -> RequestId {
        let request_id = correlator.issue(RequestKind::HealthProbe, now);
        let handle = timers.after(
            now,
            self.timeout,
            TimerAction::ProbeTimeout(request_id.clone()),
        );
        self.timeouts.insert(request_id.clone(), handle);
        self.outstanding = Some(request_id.clone());
        request_id
    }

    /// Handle the backend's answer to the outstanding probe.
    pub fn on_response(
        &mut self,
        request_id: &RequestId,
        active: bool,
        timers: &mut TimerRegistry<TimerAction>,
        correlator: &mut Correlator,
    ) -> LoadedTransition {
        self.outstanding = None;
        correlator.resolve(request_id);

        if active {
            // Superseded probes are covered by this success as well.
            for (id, handle) in self.timeouts.drain() {
                timers.cancel(handle);
                correlator.resolve(&id);
            }
            let transition = self.set_loaded(true);
            if transition == LoadedTransition::BecameLoaded {
                info!(request_id = %request_id, "Avatar system is active");
            }
            transition
        } else {
            warn!(request_id = %request_id, "Avatar health check failed");
            if let Some(handle) = self.timeouts.remove(request_id) {
                timers.cancel(handle);
            }
            self.set_loaded(false)
        }
    }

    /// A probe's timeout fired before any answer.
    pub fn on_timeout(
        &mut self,
        request_id: &RequestId,
        correlator: &mut Correlator,
    ) -> LoadedTransition {
        if self.timeouts.remove(request_id).is_none() {
            return LoadedTransition::Unchanged;
        }
        correlator.resolve(request_id);
        error!(request_id = %request_id, "Avatar health check timed out");
        self.set_loaded(false)
    }

    /// Stop probing and forget every probe in flight.
    pub fn stop(
        &mut self,
        timers: &mut TimerRegistry<TimerAction>,
        correlator: &mut Correlator,
    ) -> LoadedTransition {
        if let Some(ticker) = self.ticker.take() {
            timers.cancel(ticker);
            info!("Stopped avatar health check");
        }
        for (id, handle) in self.timeouts.drain() {
            timers.cancel(handle);
            correlator.resolve(&id);
        }
        self.outstanding = None;
        self.set_loaded(false)
    }

    fn set_loaded(&mut self, loaded: bool) -> LoadedTransition {
        match (self.loaded, loaded) {
            (false, true) => {
                self.loaded = true;
                LoadedTransition::BecameLoaded
            }
            (true, false) => {
                self.loaded = false;
                LoadedTransition::BecameUnloaded
            }
            _ => LoadedTransition::Unchanged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Rig {
        t0: Instant,
        timers: TimerRegistry<TimerAction>,
        correlator: Correlator,
        health: HealthMonitor,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                t0: Instant::now(),
                timers: TimerRegistry::new(),
                correlator: Correlator::new(),
                health: HealthMonitor::new(Duration::from_secs(2), Duration::from_secs(5)),
            }
        }

        fn at(&self, ms: u64) -> Instant {
            self.t0 + Duration::from_millis(ms)
        }

        fn probe(&mut self, ms: u64) -> RequestId {
            let now = self.at(ms);
            self.health
                .probe(now, &mut self.timers, &mut self.correlator)
        }

        fn respond(&mut self, id: &RequestId, active: bool) -> LoadedTransition {
            self.health
                .on_response(id, active, &mut self.timers, &mut self.correlator)
        }

        /// Fire due probe timeouts, returning the transitions produced.
        fn fire(&mut self, ms: u64) -> Vec<LoadedTransition> {
            let now = self.at(ms);
            let mut out = Vec::new();
            while let Some((_, action)) = self.timers.pop_due(now) {
                if let TimerAction::ProbeTimeout(id) = action {
                    out.push(self.health.on_timeout(&id, &mut self.correlator));
                }
            }
            out
        }
    }

    #[test]
    fn success_marks_loaded_once() {
        let mut rig = Rig::new();
        let a = rig.probe(0);
        assert_eq!(rig.respond(&a, true), LoadedTransition::BecameLoaded);
        assert!(rig.health.loaded());

        let b = rig.probe(2000);
        assert_eq!(rig.respond(&b, true), LoadedTransition::Unchanged);
        assert!(rig.health.loaded());
    }

    #[test]
    fn success_clears_all_armed_timeouts() {
        let mut rig = Rig::new();
        rig.probe(0);
        rig.probe(2000);
        let latest = rig.probe(4000);
        assert_eq!(rig.health.armed_timeouts(), 3);
        assert_eq!(rig.timers.len(), 3);

        rig.respond(&latest, true);

        assert_eq!(rig.health.armed_timeouts(), 0);
        assert!(rig.timers.is_empty());
        assert!(rig.correlator.is_empty());
        assert!(rig.health.outstanding().is_none());
    }

    #[test]
    fn only_latest_probe_is_outstanding() {
        let mut rig = Rig::new();
        let first = rig.probe(0);
        let second = rig.probe(2000);
        assert_eq!(rig.health.outstanding(), Some(&second));
        assert_ne!(first, second);
    }

    #[test]
    fn timeout_drops_loaded_exactly_once() {
        let mut rig = Rig::new();
        let a = rig.probe(0);
        rig.respond(&a, true);

        let b = rig.probe(2000);
        assert_eq!(rig.fire(6999), vec![]);
        assert_eq!(rig.fire(7000), vec![LoadedTransition::BecameUnloaded]);
        assert!(!rig.health.loaded());
        assert!(!rig.correlator.is_pending(&b));
        assert_eq!(rig.health.armed_timeouts(), 0);

        // Nothing left to fire.
        assert_eq!(rig.fire(60_000), vec![]);
    }

    #[test]
    fn timeouts_of_unloaded_monitor_do_not_retransition() {
        let mut rig = Rig::new();
        rig.probe(0);
        rig.probe(2000);
        assert_eq!(
            rig.fire(10_000),
            vec![LoadedTransition::Unchanged, LoadedTransition::Unchanged]
        );
        assert!(rig.correlator.is_empty());
    }

    #[test]
    fn failure_cancels_only_its_timeout() {
        let mut rig = Rig::new();
        let a = rig.probe(0);
        rig.respond(&a, true);

        let old = rig.probe(2000);
        let latest = rig.probe(4000);
        assert_eq!(rig.respond(&latest, false), LoadedTransition::BecameUnloaded);

        assert_eq!(rig.health.armed_timeouts(), 1);
        assert!(rig.correlator.is_pending(&old));
        assert!(!rig.correlator.is_pending(&latest));
    }

    #[test]
    fn stop_releases_everything() {
        let mut rig = Rig::new();
        let now = rig.at(0);
        rig.health.start(now, &mut rig.timers);
        let a = rig.probe(0);
        rig.respond(&a, true);
        rig.probe(2000);

        let transition = rig.health.stop(&mut rig.timers, &mut rig.correlator);

        assert_eq!(transition, LoadedTransition::BecameUnloaded);
        assert!(!rig.health.is_running());
        assert!(rig.timers.is_empty());
        assert!(rig.correlator.is_empty());
        assert!(rig.health.outstanding().is_none());
    }

    #[test]
    fn restart_replaces_ticker() {
        let mut rig = Rig::new();
        let now = rig.at(0);
        rig.health.start(now, &mut rig.timers);
        rig.health.start(now, &mut rig.timers);
        assert_eq!(
            rig.timers
                .count_where(|a| matches!(a, TimerAction::HealthProbe)),
            1
        );
    }
}
