//! Circuit breaker module.
//!
//! One circuit per execution path plus a distinct global circuit for
//! request-level outcomes. Each circuit is guarded by its own mutex so the
//! half-open state admits exactly one trial call, while unrelated circuits
//! never contend.
//!
//! The gate and the mutators return any state transition they caused; the
//! caller forwards it to the audit sink.

mod error;
mod permit;
mod state;


pub use error::*;
pub use permit::CircuitPermit;
pub use state::{CircuitScope, CircuitSnapshot, CircuitState, CircuitTransition};

use dashmap::DashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::config::{CircuitBreakerConfig, CircuitSettings};
use state::{Admission, CircuitEntry};

/// Per-path (and global) circuit breaker table.
///
/// # Examples
///
/// ```
/// use dualroute::circuit::{CircuitBreaker, CircuitScope, CircuitState};
/// use dualroute::config::CircuitBreakerConfig;
///
/// let config = CircuitBreakerConfig { failure_threshold: 2, ..Default::default() };
/// let breaker = CircuitBreaker::new(config);
/// let scope = CircuitScope::path("direct");
///
/// breaker.record_failure(&scope);
/// breaker.record_failure(&scope);
/// assert_eq!(breaker.state(&scope), CircuitState::Open);
/// assert!(!breaker.can_execute(&scope));
/// ```
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    circuits: DashMap<CircuitScope, Mutex<CircuitEntry>>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            circuits: DashMap::new(),
        }
    }

    /// Effective settings for a circuit that has not been created yet.
    fn initial_settings(&self, scope: &CircuitScope) -> CircuitSettings {
        match scope {
            CircuitScope::Global => self.config.base_settings(),
            CircuitScope::Path(id) => self.config.settings_for(id),
        }
    }

    fn with_entry<R>(&self, scope: &CircuitScope, f: impl FnOnce(&mut CircuitEntry) -> R) -> R {
        if let Some(entry) = self.circuits.get(scope) {
            let mut guard = lock_entry(entry.value(), scope);
            return f(&mut guard);
        }
        let entry = self
            .circuits
            .entry(scope.clone())
            .or_insert_with(|| Mutex::new(CircuitEntry::new(self.initial_settings(scope))))
            .downgrade();
        let mut guard = lock_entry(entry.value(), scope);
        f(&mut guard)
    }

    /// Gate a call against a circuit.
    ///
    /// Closed admits. Open rejects until the cool-down elapses, then moves to
    /// half-open and admits the caller as the single trial. While the trial
    /// is in flight every other caller is rejected, for as long as it takes;
    /// the caller must record a verdict or [`release`](Self::release) it.
    /// [`permit`](Self::permit) does that bookkeeping automatically.
    pub fn acquire(
        &self,
        scope: &CircuitScope,
    ) -> Result<Option<CircuitTransition>, CircuitOpenError> {
        self.admit(scope).map(|admission| admission.transition)
    }

    /// Gate a call and hold the admission as a [`CircuitPermit`].
    ///
    /// Dropping the permit without a verdict hands its half-open trial back,
    /// so a cancelled call never wedges the circuit.
    pub fn permit(&self, scope: &CircuitScope) -> Result<CircuitPermit<'_>, CircuitOpenError> {
        let admission = self.admit(scope)?;
        Ok(CircuitPermit::new(
            self,
            scope.clone(),
            admission.transition,
            admission.trial,
        ))
    }

    fn admit(&self, scope: &CircuitScope) -> Result<Admission, CircuitOpenError> {
        let result = self.with_entry(scope, |entry| entry.acquire(scope, Instant::now()));
        if let Ok(Admission {
            transition: Some(transition),
            ..
        }) = &result
        {
            observe_transition(transition);
        }
        result
    }

    /// Boolean form of [`acquire`](Self::acquire).
    pub fn can_execute(&self, scope: &CircuitScope) -> bool {
        self.acquire(scope).is_ok()
    }

    /// Non-consuming peek at a circuit's state.
    pub fn state(&self, scope: &CircuitScope) -> CircuitState {
        match self.circuits.get(scope) {
            Some(entry) => lock_entry(entry.value(), scope).peek(Instant::now()),
            None => CircuitState::Closed,
        }
    }

    pub fn record_success(&self, scope: &CircuitScope) -> Option<CircuitTransition> {
        let transition = self.with_entry(scope, |entry| entry.record_success(scope));
        if let Some(t) = &transition {
            observe_transition(t);
        }
        transition
    }

    pub fn record_failure(&self, scope: &CircuitScope) -> Option<CircuitTransition> {
        let transition =
            self.with_entry(scope, |entry| entry.record_failure(scope, Instant::now()));
        if let Some(t) = &transition {
            observe_transition(t);
        }
        transition
    }

    /// Return an unused half-open trial (the admitted call ended without
    /// reaching the upstream).
    pub fn release(&self, scope: &CircuitScope) {
        if let Some(entry) = self.circuits.get(scope) {
            lock_entry(entry.value(), scope).release();
        }
    }

    pub(crate) fn release_trial(&self, scope: &CircuitScope, trial: u64) {
        if let Some(entry) = self.circuits.get(scope) {
            lock_entry(entry.value(), scope).release_trial(trial);
        }
    }

    pub fn snapshot(&self, scope: &CircuitScope) -> CircuitSnapshot {
        self.with_entry(scope, |entry| entry.snapshot(scope, Instant::now()))
    }

    /// Snapshots of every circuit created so far, sorted by scope.
    pub fn snapshots(&self) -> Vec<CircuitSnapshot> {
        let now = Instant::now();
        let mut snapshots: Vec<_> = self
            .circuits
            .iter()
            .map(|entry| lock_entry(entry.value(), entry.key()).snapshot(entry.key(), now))
            .collect();
        snapshots.sort_by(|a, b| a.scope.cmp(&b.scope));
        snapshots
    }

    pub fn settings(&self, scope: &CircuitScope) -> CircuitSettings {
        self.with_entry(scope, |entry| entry.settings)
    }

    /// Replace a circuit's failure threshold (minimum 1). Returns the old value.
    pub fn set_failure_threshold(&self, scope: &CircuitScope, threshold: u32) -> u32 {
        let threshold = threshold.max(1);
        let old = self.with_entry(scope, |entry| {
            std::mem::replace(&mut entry.settings.failure_threshold, threshold)
        });
        tracing::info!(circuit = %scope, old, new = threshold, "Circuit failure threshold changed");
        old
    }

    /// Replace a circuit's cool-down. Returns the old value.
    pub fn set_open_duration(&self, scope: &CircuitScope, duration: Duration) -> Duration {
        let old = self.with_entry(scope, |entry| {
            std::mem::replace(&mut entry.settings.open_duration, duration)
        });
        tracing::info!(
            circuit = %scope,
            old_ms = old.as_millis() as u64,
            new_ms = duration.as_millis() as u64,
            "Circuit open duration changed"
        );
        old
    }
}

fn lock_entry<'a>(entry: &'a Mutex<CircuitEntry>, scope: &CircuitScope) -> MutexGuard<'a, CircuitEntry> {
    match entry.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!(circuit = %scope, "Circuit lock poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

fn observe_transition(transition: &CircuitTransition) {
    metrics::counter!("dualroute_circuit_transitions_total",
        "scope" => transition.scope.clone(),
        "to" => transition.to.to_string()
    )
    .increment(1);

    match transition.to {
        CircuitState::Open => tracing::warn!(
            circuit = %transition.scope,
            from = %transition.from,
            failures = transition.consecutive_failures,
            "Circuit breaker opened"
        ),
        CircuitState::HalfOpen => tracing::info!(
            circuit = %transition.scope,
            "Circuit breaker half-open, admitting trial call"
        ),
        CircuitState::Closed => tracing::info!(
            circuit = %transition.scope,
            "Circuit breaker closed"
        ),
    }
}
