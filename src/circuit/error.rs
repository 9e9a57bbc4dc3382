//! Error types for the circuit breaker.

use std::time::Duration;
use thiserror::Error;

/// Returned by the gate when a circuit rejects a call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "circuit '{scope}' is open (failures: {consecutive_failures}, retry in {retry_after:?})"
)]
pub struct CircuitOpenError {
    /// Scope of the rejecting circuit ("global" or a path id)
    pub scope: String,
    /// Consecutive failures that tripped the circuit
    pub consecutive_failures: u32,
    /// Remaining cool-down; zero while a half-open trial is in flight
    pub retry_after: Duration,
}
