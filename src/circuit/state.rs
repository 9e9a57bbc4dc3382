//! Per-circuit state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

use super::error::CircuitOpenError;
use crate::config::CircuitSettings;

/// The current state of a circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CircuitState {
    /// Calls pass through; consecutive failures are counted.
    Closed,
    /// Calls are rejected until the cool-down elapses.
    Open,
    /// One trial call is admitted to probe recovery.
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
            Self::HalfOpen => write!(f, "half-open"),
        }
    }
}

/// Which circuit an operation is recorded against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CircuitScope {
    /// Request-level circuit, independent of the path circuits
    Global,
    /// Circuit guarding one execution path
    Path(String),
}

impl CircuitScope {
    pub fn path(id: impl Into<String>) -> Self {
        CircuitScope::Path(id.into())
    }

    pub fn is_global(&self) -> bool {
        matches!(self, CircuitScope::Global)
    }
}

impl fmt::Display for CircuitScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CircuitScope::Global => write!(f, "global"),
            CircuitScope::Path(id) => write!(f, "{}", id),
        }
    }
}

/// A state change, handed back to the caller for auditing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircuitTransition {
    pub scope: String,
    pub from: CircuitState,
    pub to: CircuitState,
    pub consecutive_failures: u32,
    pub at: DateTime<Utc>,
}

impl CircuitTransition {
    pub fn to_audit_details(&self) -> serde_json::Value {
        serde_json::json!({
            "scope": self.scope,
            "from": self.from.to_string(),
            "to": self.to.to_string(),
            "consecutive_failures": self.consecutive_failures,
        })
    }
}

/// Point-in-time view of one circuit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircuitSnapshot {
    pub scope: String,
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub last_state_change: DateTime<Utc>,
    pub failure_threshold: u32,
    #[serde(with = "duration_ms")]
    pub open_duration: Duration,
}

mod duration_ms {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }
}

/// What the gate handed out: the transition it caused and, in half-open,
/// the trial id.
#[derive(Debug, Default)]
pub(crate) struct Admission {
    pub(crate) transition: Option<CircuitTransition>,
    pub(crate) trial: Option<u64>,
}

/// Mutable state of one circuit, guarded by its own mutex.
#[derive(Debug)]
pub(crate) struct CircuitEntry {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    /// Id of the half-open trial in flight
    trial: Option<u64>,
    next_trial: u64,
    last_change: DateTime<Utc>,
    pub(crate) settings: CircuitSettings,
}

impl CircuitEntry {
    pub(crate) fn new(settings: CircuitSettings) -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            opened_at: None,
            trial: None,
            next_trial: 0,
            last_change: Utc::now(),
            settings,
        }
    }

    fn cooled_down(&self, now: Instant) -> bool {
        self.opened_at
            .is_none_or(|opened| now.saturating_duration_since(opened) >= self.settings.open_duration)
    }

    /// State as observed without consuming the trial permit.
    pub(crate) fn peek(&self, now: Instant) -> CircuitState {
        match self.state {
            CircuitState::Open if self.cooled_down(now) => CircuitState::HalfOpen,
            state => state,
        }
    }

    /// Gate a call. Admitting the half-open trial consumes it until a
    /// verdict is recorded or the trial is released.
    pub(crate) fn acquire(
        &mut self,
        scope: &CircuitScope,
        now: Instant,
    ) -> Result<Admission, CircuitOpenError> {
        match self.state {
            CircuitState::Closed => Ok(Admission::default()),
            CircuitState::Open => {
                if self.cooled_down(now) {
                    let trial = self.start_trial();
                    Ok(Admission {
                        transition: Some(self.transition(scope, CircuitState::HalfOpen)),
                        trial: Some(trial),
                    })
                } else {
                    Err(self.open_error(scope, now))
                }
            }
            CircuitState::HalfOpen if self.trial.is_some() => Err(self.open_error(scope, now)),
            CircuitState::HalfOpen => Ok(Admission {
                transition: None,
                trial: Some(self.start_trial()),
            }),
        }
    }

    fn start_trial(&mut self) -> u64 {
        self.next_trial = self.next_trial.wrapping_add(1);
        self.trial = Some(self.next_trial);
        self.next_trial
    }

    pub(crate) fn record_success(&mut self, scope: &CircuitScope) -> Option<CircuitTransition> {
        match self.state {
            CircuitState::Closed => {
                self.consecutive_failures = 0;
                None
            }
            CircuitState::HalfOpen => {
                self.consecutive_failures = 0;
                self.opened_at = None;
                self.trial = None;
                Some(self.transition(scope, CircuitState::Closed))
            }
            CircuitState::Open => {
                tracing::debug!(circuit = %scope, "Success recorded while circuit is open");
                None
            }
        }
    }

    pub(crate) fn record_failure(
        &mut self,
        scope: &CircuitScope,
        now: Instant,
    ) -> Option<CircuitTransition> {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        match self.state {
            CircuitState::Closed if self.consecutive_failures >= self.settings.failure_threshold => {
                self.opened_at = Some(now);
                Some(self.transition(scope, CircuitState::Open))
            }
            CircuitState::Closed | CircuitState::Open => None,
            CircuitState::HalfOpen => {
                self.opened_at = Some(now);
                self.trial = None;
                Some(self.transition(scope, CircuitState::Open))
            }
        }
    }

    /// Hand back the half-open trial without a verdict.
    pub(crate) fn release(&mut self) {
        if self.state == CircuitState::HalfOpen {
            self.trial = None;
        }
    }

    /// Hand back trial `id`, if it is still the one in flight.
    pub(crate) fn release_trial(&mut self, id: u64) {
        if self.state == CircuitState::HalfOpen && self.trial == Some(id) {
            self.trial = None;
        }
    }

    pub(crate) fn snapshot(&self, scope: &CircuitScope, now: Instant) -> CircuitSnapshot {
        CircuitSnapshot {
            scope: scope.to_string(),
            state: self.peek(now),
            consecutive_failures: self.consecutive_failures,
            last_state_change: self.last_change,
            failure_threshold: self.settings.failure_threshold,
            open_duration: self.settings.open_duration,
        }
    }

    fn open_error(&self, scope: &CircuitScope, now: Instant) -> CircuitOpenError {
        let retry_after = match (self.state, self.opened_at) {
            (CircuitState::Open, Some(opened)) => self
                .settings
                .open_duration
                .saturating_sub(now.saturating_duration_since(opened)),
            _ => Duration::ZERO,
        };
        CircuitOpenError {
            scope: scope.to_string(),
            consecutive_failures: self.consecutive_failures,
            retry_after,
        }
    }

    fn transition(&mut self, scope: &CircuitScope, to: CircuitState) -> CircuitTransition {
        let from = self.state;
        self.state = to;
        self.last_change = Utc::now();
        CircuitTransition {
            scope: scope.to_string(),
            from,
            to,
            consecutive_failures: self.consecutive_failures,
            at: self.last_change,
        }
    }
}
