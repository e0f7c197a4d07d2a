//! Request/response correlation.
//!
//! Every outbound request carries a fresh [`RequestId`]. The correlator
//! remembers what was asked and when, so inbound responses can be matched
//! (or recognised as late duplicates and ignored).

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use avatar_common::RequestId;

/// What an outbound request asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    GetMode,
    SwitchMode,
    HealthProbe,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::GetMode => "get_mode",
            Self::SwitchMode => "switch_mode",
            Self::HealthProbe => "get_avatar_status",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub request_id: RequestId,
    pub kind: RequestKind,
    pub issued_at: Instant,
}

#[derive(Debug, Default)]
pub struct Correlator {
    pending: HashMap<RequestId, PendingRequest>,
}

impl Correlator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new outbound request and return its token.
    pub fn issue(&mut self, kind: RequestKind, now: Instant) -> RequestId {
        let request_id = RequestId::new();
        self.pending.insert(
            request_id.clone(),
            PendingRequest {
                request_id: request_id.clone(),
                kind,
                issued_at: now,
            },
        );
        request_id
    }

    /// Remove and return the pending entry for `request_id`, if any.
    ///
    /// `None` is the normal answer for late or duplicate responses.
    pub fn resolve(&mut self, request_id: &RequestId) -> Option<PendingRequest> {
        self.pending.remove(request_id)
    }

    /// Look at a pending entry without consuming it.
    pub fn peek(&self, request_id: &RequestId) -> Option<&PendingRequest> {
        self.pending.get(request_id)
    }

    pub fn is_pending(&self, request_id: &RequestId) -> bool {
        self.pending.contains_key(request_id)
    }

    /// Drop entries of `kinds` issued more than `ttl` before `now`.
    /// Returns how many were dropped.
    pub fn prune_older_than(&mut self, now: Instant, ttl: Duration, kinds: &[RequestKind]) -> usize {
        let before = self.pending.len();
        self.pending.retain(|_, p| {
            !kinds.contains(&p.kind) || now.saturating_duration_since(p.issued_at) <= ttl
        });
        before - self.pending.len()
    }

    pub fn pending_of(&self, kind: RequestKind) -> usize {
        self.pending.values().filter(|p| p.kind == kind).count()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
