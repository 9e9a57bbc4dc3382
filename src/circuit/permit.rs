//! Scoped admission through a circuit.

use super::{CircuitBreaker, CircuitScope, CircuitTransition};

/// An admitted call. Record the outcome with [`success`](Self::success) or
/// [`failure`](Self::failure); dropping it unsettled releases a half-open
/// trial it holds.
#[must_use = "dropping a permit releases it without a verdict"]
pub struct CircuitPermit<'a> {
    breaker: &'a CircuitBreaker,
    scope: CircuitScope,
    transition: Option<CircuitTransition>,
    trial: Option<u64>,
    settled: bool,
}

impl<'a> CircuitPermit<'a> {
    pub(crate) fn new(
        breaker: &'a CircuitBreaker,
        scope: CircuitScope,
        transition: Option<CircuitTransition>,
        trial: Option<u64>,
    ) -> Self {
        Self {
            breaker,
            scope,
            transition,
            trial,
            settled: false,
        }
    }

    pub fn scope(&self) -> &CircuitScope {
        &self.scope
    }

    /// Whether this permit carries the half-open trial.
    pub fn is_trial(&self) -> bool {
        self.trial.is_some()
    }

    /// The transition admitting this call caused (open to half-open), once.
    pub fn take_transition(&mut self) -> Option<CircuitTransition> {
        self.transition.take()
    }

    pub fn success(mut self) -> Option<CircuitTransition> {
        self.settled = true;
        self.breaker.record_success(&self.scope)
    }

    pub fn failure(mut self) -> Option<CircuitTransition> {
        self.settled = true;
        self.breaker.record_failure(&self.scope)
    }
}

impl Drop for CircuitPermit<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        if let Some(trial) = self.trial {
            self.breaker.release_trial(&self.scope, trial);
        }
    }
}
