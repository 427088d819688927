//! Circuit breaker for upstream protection.
//!
//! # States
//! - Closed: normal operation, calls pass through and feed the sliding window
//! - Open: upstream assumed down, calls are denied without touching the network
//! - Half-Open: a fixed number of trial calls probe whether the upstream recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: window holds >= minimum_calls and failure rate >= threshold
//! Open → Half-Open: first acquire after open_state_duration elapsed
//! Half-Open → Closed: every trial call succeeded
//! Half-Open → Open: any trial call failed
//! ```
//!
//! # Design Decisions
//! - One breaker per upstream, all state behind a single mutex
//! - Time is read before taking the lock
//! - Admission hands out a [`Permit`] that records exactly once. A closed-phase
//!   permit dropped without a result records nothing (the caller went away,
//!   not the upstream); a dropped trial permit records a failure so trial
//!   slots never leak
//! - Every transition bumps an epoch; results from permits issued in an earlier
//!   epoch are discarded as stale

use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::config::CircuitBreakerConfig;
use crate::observability::metrics;
use crate::resilience::clock::{Clock, SystemClock};
use crate::resilience::window::{Outcome, OutcomeWindow};

/// Breaker phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Closed,
    Open,
    HalfOpen,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Closed => "closed",
            Phase::Open => "open",
            Phase::HalfOpen => "half_open",
        }
    }

    /// Value exported on the state gauge.
    pub fn gauge_value(&self) -> f64 {
        match self {
            Phase::Closed => 0.0,
            Phase::Open => 1.0,
            Phase::HalfOpen => 2.0,
        }
    }
}

/// A phase change performed by the breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: Phase,
    pub to: Phase,
}

/// Lifetime counters, exposed through the admin snapshot.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BreakerStats {
    pub permitted: u64,
    pub denied: u64,
    pub stale_results: u64,
    /// Closed-phase permits dropped without a result.
    pub abandoned: u64,
    pub times_opened: u64,
}

/// Point-in-time view of a breaker.
#[derive(Debug, Clone, Serialize)]
pub struct BreakerSnapshot {
    pub name: String,
    pub phase: Phase,
    pub window_len: usize,
    pub window_capacity: usize,
    pub failures: usize,
    pub failure_rate: f64,
    pub trials_issued: u32,
    pub trials_reported: u32,
    pub trials_succeeded: u32,
    /// Time left before the next acquire may probe, when open.
    pub retry_after_ms: Option<u64>,
    pub stats: BreakerStats,
}

/// Result of [`CircuitBreaker::try_acquire`].
#[derive(Debug)]
pub enum Admission {
    Permitted(Permit),
    Denied,
}

impl Admission {
    pub fn is_permitted(&self) -> bool {
        matches!(self, Admission::Permitted(_))
    }
}

/// Proof that a call was admitted.
///
/// Must be resolved with [`Permit::record`]. Dropping an unresolved trial
/// permit counts as a failure; dropping any other permit is only counted as
/// abandoned.
#[derive(Debug)]
#[must_use = "a permit must be resolved with `record`"]
pub struct Permit {
    breaker: Arc<CircuitBreaker>,
    epoch: u64,
    trial: bool,
    recorded: bool,
}

impl Permit {
    /// True when this permit is one of the half-open trial calls.
    pub fn is_trial(&self) -> bool {
        self.trial
    }

    /// Report the outcome of the admitted call.
    pub fn record(mut self, outcome: Outcome) -> Option<Transition> {
        self.recorded = true;
        self.breaker.record_for_epoch(Some(self.epoch), outcome)
    }
}

impl Drop for Permit {
    fn drop(&mut self) {
        if self.recorded {
            return;
        }
        if self.trial {
            tracing::debug!(
                breaker = %self.breaker.name,
                "Trial permit dropped without a result, recording failure"
            );
            self.breaker.record_for_epoch(Some(self.epoch), Outcome::Failure);
        } else {
            tracing::debug!(breaker = %self.breaker.name, "Permit abandoned by caller");
            self.breaker.lock_state().stats.abandoned += 1;
        }
    }
}

/// Circuit breaker guarding one upstream.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    clock: Arc<dyn Clock>,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    /// Create a breaker driven by the system clock.
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self::with_clock(name, config, Arc::new(SystemClock))
    }

    /// Create a breaker driven by the given clock.
    pub fn with_clock(name: impl Into<String>, config: CircuitBreakerConfig, clock: Arc<dyn Clock>) -> Self {
        let name = name.into();
        metrics::record_breaker_state(&name, Phase::Closed.gauge_value());
        Self {
            state: Mutex::new(BreakerState::new(config.sliding_window_size)),
            name,
            config,
            clock,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.lock_state().phase
    }

    /// Ask for permission to call the upstream.
    pub fn try_acquire(self: &Arc<Self>) -> Admission {
        let now = self.clock.now();
        let (grant, transition) = self.lock_state().acquire(now, &self.config);

        if let Some(transition) = transition {
            self.on_transition(transition);
        }

        match grant {
            Some(grant) => Admission::Permitted(Permit {
                breaker: Arc::clone(self),
                epoch: grant.epoch,
                trial: grant.trial,
                recorded: false,
            }),
            None => {
                metrics::record_breaker_denied(&self.name);
                Admission::Denied
            }
        }
    }

    /// Record an outcome without a permit.
    ///
    /// Only applies while closed. Half-open outcomes must come from trial
    /// permits, so here they are ignored and counted as stale; use
    /// [`Permit::record`] for admitted calls.
    pub fn record_result(&self, outcome: Outcome) -> Option<Transition> {
        self.record_for_epoch(None, outcome)
    }

    fn record_for_epoch(&self, epoch: Option<u64>, outcome: Outcome) -> Option<Transition> {
        let now = self.clock.now();
        let transition = self.lock_state().record(epoch, outcome, now, &self.config);

        if let Some(transition) = transition {
            self.on_transition(transition);
        }
        transition
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let now = self.clock.now();
        let state = self.lock_state();

        let retry_after_ms = match (state.phase, state.opened_at) {
            (Phase::Open, Some(opened_at)) => {
                let reopen_at = opened_at + self.config.open_state_duration();
                Some(reopen_at.saturating_duration_since(now).as_millis() as u64)
            }
            _ => None,
        };

        BreakerSnapshot {
            name: self.name.clone(),
            phase: state.phase,
            window_len: state.window.len(),
            window_capacity: state.window.capacity(),
            failures: state.window.failures(),
            failure_rate: state.window.failure_rate(),
            trials_issued: state.trials_issued,
            trials_reported: state.trials_reported,
            trials_succeeded: state.trials_succeeded,
            retry_after_ms,
            stats: state.stats.clone(),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, BreakerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn on_transition(&self, transition: Transition) {
        match transition.to {
            Phase::Open => tracing::warn!(
                breaker = %self.name,
                from = transition.from.as_str(),
                open_for_ms = self.config.open_state_duration_ms,
                "Circuit breaker opened"
            ),
            Phase::HalfOpen => tracing::info!(
                breaker = %self.name,
                trials = self.config.half_open_trial_calls,
                "Circuit breaker half-open, probing upstream"
            ),
            Phase::Closed => tracing::info!(
                breaker = %self.name,
                "Circuit breaker closed, upstream recovered"
            ),
        }
        metrics::record_breaker_transition(
            &self.name,
            transition.from.as_str(),
            transition.to.as_str(),
            transition.to.gauge_value(),
        );
    }
}

struct Grant {
    epoch: u64,
    trial: bool,
}

#[derive(Debug)]
struct BreakerState {
    phase: Phase,
    window: OutcomeWindow,
    opened_at: Option<Instant>,
    trials_issued: u32,
    trials_reported: u32,
    trials_succeeded: u32,
    epoch: u64,
    stats: BreakerStats,
}

impl BreakerState {
    fn new(window_size: usize) -> Self {
        Self {
            phase: Phase::Closed,
            window: OutcomeWindow::new(window_size),
            opened_at: None,
            trials_issued: 0,
            trials_reported: 0,
            trials_succeeded: 0,
            epoch: 0,
            stats: BreakerStats::default(),
        }
    }

    fn acquire(&mut self, now: Instant, config: &CircuitBreakerConfig) -> (Option<Grant>, Option<Transition>) {
        match self.phase {
            Phase::Closed => (Some(self.grant(false)), None),
            Phase::Open => {
                let elapsed = self
                    .opened_at
                    .map(|opened_at| now.saturating_duration_since(opened_at))
                    .unwrap_or(Duration::MAX);

                if elapsed >= config.open_state_duration() {
                    let transition = self.transition(Phase::HalfOpen, now);
                    self.trials_issued = 1;
                    (Some(self.grant(true)), Some(transition))
                } else {
                    self.stats.denied += 1;
                    (None, None)
                }
            }
            Phase::HalfOpen => {
                if self.trials_issued < config.half_open_trial_calls {
                    self.trials_issued += 1;
                    (Some(self.grant(true)), None)
                } else {
                    self.stats.denied += 1;
                    (None, None)
                }
            }
        }
    }

    fn grant(&mut self, trial: bool) -> Grant {
        self.stats.permitted += 1;
        Grant {
            epoch: self.epoch,
            trial,
        }
    }

    fn record(
        &mut self,
        epoch: Option<u64>,
        outcome: Outcome,
        now: Instant,
        config: &CircuitBreakerConfig,
    ) -> Option<Transition> {
        let stale = match epoch {
            Some(epoch) => epoch != self.epoch,
            None => self.phase == Phase::HalfOpen,
        };
        if stale {
            self.stats.stale_results += 1;
            return None;
        }

        match self.phase {
            Phase::Closed => {
                self.window.push(outcome);
                let tripped = self.window.len() >= config.minimum_calls
                    && self.window.failure_rate() >= config.failure_rate_threshold;
                tripped.then(|| self.transition(Phase::Open, now))
            }
            Phase::Open => {
                // No permit is issued while open.
                self.stats.stale_results += 1;
                None
            }
            Phase::HalfOpen => {
                self.trials_reported += 1;
                if outcome == Outcome::Success {
                    self.trials_succeeded += 1;
                }

                if self.trials_reported < config.half_open_trial_calls {
                    return None;
                }

                if self.trials_succeeded == self.trials_reported {
                    Some(self.transition(Phase::Closed, now))
                } else {
                    Some(self.transition(Phase::Open, now))
                }
            }
        }
    }

    fn transition(&mut self, to: Phase, now: Instant) -> Transition {
        let from = self.phase;
        self.phase = to;
        self.epoch += 1;
        self.trials_issued = 0;
        self.trials_reported = 0;
        self.trials_succeeded = 0;

        match to {
            Phase::Open => {
                self.opened_at = Some(now);
                self.stats.times_opened += 1;
            }
            Phase::Closed => {
                self.opened_at = None;
                self.window.clear();
            }
            Phase::HalfOpen => {
                self.opened_at = None;
            }
        }

        Transition { from, to }
    }
}
