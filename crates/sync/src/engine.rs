//! Reconciliation state machine for one mounted content player.
//!
//! The engine is pure and synchronous: every operation returns the side
//! effects the caller must execute (issue a fetch, issue a write, cancel
//! the lock-expiry timer). Keeping I/O out of the machine makes the
//! ordering and idempotence rules directly testable.

use player_core::model::{Identity, Percentage, ProgressRecord};

//
// ─── HIGH-WATER MARK ───────────────────────────────────────────────────────────
//

/// Highest completion percentage this client has observed or sent.
///
/// Unknown until a server record is adopted or a first write goes out.
/// Server values may only raise it, never lower it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HighWaterMark(Option<Percentage>);

impl HighWaterMark {
    #[must_use]
    pub fn unknown() -> Self {
        Self(None)
    }

    #[must_use]
    pub fn get(&self) -> Option<Percentage> {
        self.0
    }

    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.0.is_none()
    }

    /// True if the candidate does not exceed the mark.
    #[must_use]
    pub fn covers(&self, candidate: Percentage) -> bool {
        self.0.is_some_and(|mark| candidate <= mark)
    }

    /// Raise the mark; lower values are ignored.
    pub fn raise_to(&mut self, value: Percentage) {
        if self.0.is_none_or(|mark| value > mark) {
            self.0 = Some(value);
        }
    }
}

//
// ─── ENGINE ────────────────────────────────────────────────────────────────────
//

/// Bootstrap phase of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    AwaitingFetch,
    Ready,
}

/// Side effect requested by a transition.
///
/// `Write` implies the caller must also (re)arm the lock-expiry timer for
/// that milestone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Fetch,
    Write(Percentage),
    CancelExpiry,
}

/// Per-mount reconciliation state machine.
///
/// Owns all mutation of the reconciliation state; metric adapters only feed
/// candidate percentages in.
#[derive(Debug, Clone)]
pub struct ReconciliationEngine {
    phase: Phase,
    high_water_mark: HighWaterMark,
    pending_milestone: Option<Percentage>,
    previous_identity: Identity,
}

impl ReconciliationEngine {
    #[must_use]
    pub fn new(identity: Identity) -> Self {
        Self {
            phase: Phase::Uninitialized,
            high_water_mark: HighWaterMark::unknown(),
            pending_milestone: None,
            previous_identity: identity,
        }
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn high_water_mark(&self) -> HighWaterMark {
        self.high_water_mark
    }

    #[must_use]
    pub fn pending_milestone(&self) -> Option<Percentage> {
        self.pending_milestone
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.phase == Phase::Ready
    }

    /// Bootstrap.
    ///
    /// An anonymous session has no server record to adopt, so it is ready
    /// immediately with an unknown mark. An authenticated session waits for
    /// one fetch before accepting candidates.
    pub fn start(&mut self) -> Vec<Effect> {
        if self.phase != Phase::Uninitialized {
            return Vec::new();
        }
        match self.previous_identity {
            Identity::Anonymous => {
                self.phase = Phase::Ready;
                Vec::new()
            }
            Identity::Authenticated => {
                self.phase = Phase::AwaitingFetch;
                vec![Effect::Fetch]
            }
        }
    }

    /// A fetch came back, possibly with no record for this learner.
    pub fn fetch_resolved(&mut self, record: Option<&ProgressRecord>) -> Vec<Effect> {
        match self.phase {
            Phase::Uninitialized => Vec::new(),
            Phase::AwaitingFetch => {
                if let Some(record) = record {
                    self.high_water_mark.raise_to(record.completion_percentage);
                }
                self.phase = Phase::Ready;
                Vec::new()
            }
            Phase::Ready => {
                // A later absent result (cache invalidation refetch) must
                // not reset progress.
                let Some(record) = record else {
                    return Vec::new();
                };
                self.high_water_mark.raise_to(record.completion_percentage);
                if let Some(pending) = self.pending_milestone
                    && record.completion_percentage >= pending
                {
                    // The in-flight write is confirmed redundant.
                    self.pending_milestone = None;
                    return vec![Effect::CancelExpiry];
                }
                Vec::new()
            }
        }
    }

    /// A fetch failed. During bootstrap this must not stall the player.
    pub fn fetch_failed(&mut self) -> Vec<Effect> {
        if self.phase == Phase::AwaitingFetch {
            self.phase = Phase::Ready;
        }
        Vec::new()
    }

    /// A metric adapter recomputed its completion percentage.
    ///
    /// Candidates at or below the high-water mark are no-ops, as are
    /// candidates equal to the milestone already in flight. Anything else
    /// becomes a write and raises the mark (highest observed *or sent*).
    /// Candidates delivered before `Ready` are dropped; the next natural
    /// recomputation re-delivers them.
    pub fn candidate(&mut self, candidate: Percentage) -> Vec<Effect> {
        if self.phase != Phase::Ready {
            return Vec::new();
        }
        if self.high_water_mark.covers(candidate) {
            return Vec::new();
        }
        if self.pending_milestone == Some(candidate) {
            return Vec::new();
        }
        self.pending_milestone = Some(candidate);
        self.high_water_mark.raise_to(candidate);
        vec![Effect::Write(candidate)]
    }

    /// Full completion event (e.g. "quiz submitted"): a forced candidate of
    /// exactly 100, bypassing the adapter.
    pub fn complete(&mut self) -> Vec<Effect> {
        self.candidate(Percentage::COMPLETE)
    }

    /// The 5-second lock for `milestone` expired.
    ///
    /// Clears the lock so a silently failed write can be re-attempted by a
    /// later candidate; the high-water mark is untouched. An expiry for a
    /// superseded milestone is ignored.
    pub fn lock_expired(&mut self, milestone: Percentage) {
        if self.pending_milestone == Some(milestone) {
            self.pending_milestone = None;
        }
    }

    /// The identity signal changed.
    ///
    /// anonymous → authenticated discards the whole session state and
    /// re-bootstraps: the server record for the now-known learner
    /// supersedes any anonymous-session guess. The reverse transition, and
    /// repeated notifications of the same identity, change nothing.
    pub fn identity_changed(&mut self, identity: Identity) -> Vec<Effect> {
        let previous = std::mem::replace(&mut self.previous_identity, identity);
        if previous == identity {
            return Vec::new();
        }
        if !identity.is_authenticated() || self.phase == Phase::Uninitialized {
            return Vec::new();
        }

        let had_lock = self.pending_milestone.take().is_some();
        self.high_water_mark = HighWaterMark::unknown();
        self.phase = Phase::AwaitingFetch;

        let mut effects = Vec::new();
        if had_lock {
            effects.push(Effect::CancelExpiry);
        }
        effects.push(Effect::Fetch);
        effects
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
