//! Terminal execution errors.

use std::time::Duration;
use thiserror::Error;

use crate::circuit::CircuitOpenError;
use crate::routing::RoutingError;

/// Why a candidate did not serve the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Circuit rejected the attempt
    CircuitOpen,
    /// Health monitor reports the path unroutable
    Unhealthy,
    /// The attempt was made and failed
    Attempt,
}

/// One candidate's failure reason.
#[derive(Debug, Clone, PartialEq)]
pub struct PathFailure {
    pub path_id: String,
    pub kind: FailureKind,
    pub reason: String,
    /// Attempts made against this path (0 when skipped)
    pub attempts: u32,
}

impl std::fmt::Display for PathFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path_id, self.reason)
    }
}

/// Errors surfaced to the caller of `execute`.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// Every candidate was skipped or failed
    #[error("All paths exhausted after {}ms: {}", .elapsed.as_millis(), format_failures(.failures))]
    AllPathsExhausted {
        failures: Vec<PathFailure>,
        elapsed: Duration,
    },

    /// The request's latency budget ran out mid-execution
    #[error(
        "Latency budget of {}ms exceeded after {}ms ({attempts} attempts)",
        .budget.as_millis(),
        .elapsed.as_millis()
    )]
    BudgetExceeded {
        elapsed: Duration,
        budget: Duration,
        attempts: u32,
    },

    /// No path survived filtering
    #[error(transparent)]
    NoCandidate(#[from] RoutingError),

    /// The global circuit is open
    #[error(transparent)]
    CircuitOpen(#[from] CircuitOpenError),

    /// A ranked path has no client bound to it
    #[error("No client registered for path '{0}'")]
    UnknownClient(String),
}

impl ExecutionError {
    /// Label used for the outcome metric.
    pub fn kind(&self) -> &'static str {
        match self {
            ExecutionError::AllPathsExhausted { .. } => "exhausted",
            ExecutionError::BudgetExceeded { .. } => "budget_exceeded",
            ExecutionError::NoCandidate(_) => "no_candidate",
            ExecutionError::CircuitOpen(_) => "circuit_open",
            ExecutionError::UnknownClient(_) => "unknown_client",
        }
    }
}

fn format_failures(failures: &[PathFailure]) -> String {
    if failures.is_empty() {
        return "no attempts".to_string();
    }
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
