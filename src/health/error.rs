//! Error types for health checking.

use thiserror::Error;

/// Why a probe attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HealthCheckError {
    /// Probe did not answer in time
    #[error("health check timed out after {0}ms")]
    Timeout(u64),

    /// Probe returned an error
    #[error("health check failed: {0}")]
    Failed(String),

    /// Probe panicked
    #[error("health check panicked: {0}")]
    Panicked(String),
}
