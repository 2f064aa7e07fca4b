//! Circuit breaker for the inventory endpoint.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: endpoint assumed down, calls fail fast without I/O
//! - Half-Open: a bounded number of trial calls probe for recovery
//!
//! # State Transitions
//! ```text
//! Closed → Open: failure ratio >= threshold over the sliding window
//! Open → Half-Open: first call after the cooldown has elapsed
//! Half-Open → Closed: a trial call succeeds
//! Half-Open → Open: a trial call fails (cooldown restarts)
//! ```
//!
//! # Design Decisions
//! - One breaker per remote target, shared by every concurrent lookup
//! - All state lives behind one mutex; no lock is held across an await
//! - Every transition bumps a generation so late results from an older
//!   state cannot flip the current one
//! - Trial slots are RAII permits: an abandoned trial frees its slot

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::time::Instant;

use crate::config::CircuitBreakerConfig;
use crate::observability::metrics;
use crate::resilience::types::ResilienceError;

/// Breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

/// Point-in-time view of a breaker, for health reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircuitSnapshot {
    pub target: String,
    pub state: CircuitState,
    /// Outcomes currently in the sliding window.
    pub calls: usize,
    /// Failures currently in the sliding window.
    pub failures: usize,
    pub trials_in_flight: u32,
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    generation: u64,
    /// Most recent outcomes, `true` for a failure.
    window: VecDeque<bool>,
    opened_at: Option<Instant>,
    trials_in_flight: u32,
}

impl BreakerState {
    fn failures(&self) -> usize {
        self.window.iter().filter(|failed| **failed).count()
    }
}

/// Circuit breaker guarding one remote target.
#[derive(Debug)]
pub struct CircuitBreaker {
    target: String,
    inner: Mutex<BreakerState>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PermitKind {
    /// Breaker disabled; nothing is tracked.
    Untracked,
    Closed,
    Trial,
}

/// Admission ticket for one call. Report the outcome with
/// [`CallPermit::record_success`] or [`CallPermit::record_failure`];
/// dropping it unreported (cancellation) records nothing.
#[derive(Debug)]
pub struct CallPermit<'a> {
    breaker: &'a CircuitBreaker,
    generation: u64,
    kind: PermitKind,
    settled: bool,
}

impl CallPermit<'_> {
    /// Whether this call is a half-open trial.
    pub fn is_trial(&self) -> bool {
        self.kind == PermitKind::Trial
    }

    pub fn record_success(mut self, config: &CircuitBreakerConfig) {
        self.settled = true;
        self.breaker.settle(self.generation, self.kind, false, config);
    }

    pub fn record_failure(mut self, config: &CircuitBreakerConfig) {
        self.settled = true;
        self.breaker.settle(self.generation, self.kind, true, config);
    }
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if !self.settled && self.kind == PermitKind::Trial {
            self.breaker.release_trial(self.generation);
        }
    }
}

impl CircuitBreaker {
    /// Create a Closed breaker for `target`.
    pub fn new(target: impl Into<String>) -> Self {
        let target = target.into();
        metrics::record_circuit_state(&target, CircuitState::Closed);
        Self {
            target,
            inner: Mutex::new(BreakerState {
                state: CircuitState::Closed,
                generation: 0,
                window: VecDeque::new(),
                opened_at: None,
                trials_in_flight: 0,
            }),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Current state. An Open breaker whose cooldown has elapsed still reports
    /// Open until the next call moves it to HalfOpen.
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    pub fn snapshot(&self) -> CircuitSnapshot {
        let inner = self.lock();
        CircuitSnapshot {
            target: self.target.clone(),
            state: inner.state,
            calls: inner.window.len(),
            failures: inner.failures(),
            trials_in_flight: inner.trials_in_flight,
        }
    }

    /// Ask to make a call. Fails with `CircuitOpen` without touching the network.
    pub fn try_acquire(
        &self,
        config: &CircuitBreakerConfig,
    ) -> Result<CallPermit<'_>, ResilienceError> {
        if !config.enabled {
            return Ok(self.permit(0, PermitKind::Untracked));
        }

        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => Ok(self.permit(inner.generation, PermitKind::Closed)),
            CircuitState::Open => {
                let cooled = inner
                    .opened_at
                    .map_or(true, |opened| opened.elapsed() >= config.cooldown());
                if !cooled {
                    return Err(self.reject());
                }
                self.transition(&mut inner, CircuitState::HalfOpen);
                inner.trials_in_flight = 1;
                Ok(self.permit(inner.generation, PermitKind::Trial))
            }
            CircuitState::HalfOpen => {
                if inner.trials_in_flight >= config.half_open_trials {
                    return Err(self.reject());
                }
                inner.trials_in_flight += 1;
                Ok(self.permit(inner.generation, PermitKind::Trial))
            }
        }
    }

    fn permit(&self, generation: u64, kind: PermitKind) -> CallPermit<'_> {
        CallPermit {
            breaker: self,
            generation,
            kind,
            settled: false,
        }
    }

    fn reject(&self) -> ResilienceError {
        tracing::debug!(endpoint = %self.target, "Circuit open, rejecting call");
        metrics::record_circuit_rejection(&self.target);
        ResilienceError::CircuitOpen {
            target: self.target.clone(),
        }
    }

    fn settle(&self, generation: u64, kind: PermitKind, failed: bool, config: &CircuitBreakerConfig) {
        if kind == PermitKind::Untracked {
            return;
        }

        let mut inner = self.lock();
        if inner.generation != generation {
            // The breaker moved on while this call was in flight.
            return;
        }

        match (inner.state, kind) {
            (CircuitState::Closed, PermitKind::Closed) => {
                let window_size = config.window_size.max(1);
                inner.window.push_back(failed);
                while inner.window.len() > window_size {
                    inner.window.pop_front();
                }

                if failed && inner.window.len() >= config.minimum_calls {
                    let ratio = inner.failures() as f64 / inner.window.len() as f64;
                    if ratio >= config.failure_threshold {
                        tracing::warn!(
                            endpoint = %self.target,
                            failure_ratio = ratio,
                            calls = inner.window.len(),
                            "Failure threshold reached"
                        );
                        self.transition(&mut inner, CircuitState::Open);
                    }
                }
            }
            (CircuitState::HalfOpen, PermitKind::Trial) => {
                if failed {
                    self.transition(&mut inner, CircuitState::Open);
                } else {
                    self.transition(&mut inner, CircuitState::Closed);
                }
            }
            _ => {}
        }
    }

    fn release_trial(&self, generation: u64) {
        let mut inner = self.lock();
        if inner.generation == generation && inner.state == CircuitState::HalfOpen {
            inner.trials_in_flight = inner.trials_in_flight.saturating_sub(1);
            tracing::debug!(endpoint = %self.target, "Abandoned trial call released");
        }
    }

    fn transition(&self, inner: &mut BreakerState, to: CircuitState) {
        let from = inner.state;
        inner.state = to;
        inner.generation += 1;
        inner.window.clear();
        inner.trials_in_flight = 0;
        inner.opened_at = (to == CircuitState::Open).then(Instant::now);

        tracing::warn!(
            endpoint = %self.target,
            from = from.as_str(),
            to = to.as_str(),
            "Circuit state transition"
        );
        metrics::record_circuit_transition(&self.target, to);
    }

    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
