//! Failover executor configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Failover executor configuration.
///
/// # Example
///
/// ```toml
/// [executor]
/// attempt_timeout_ms = 30000
/// retries_per_path = 1
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Upper bound for a single upstream attempt.
    ///
    /// The effective timeout is the smaller of this and the request's
    /// remaining latency budget.
    pub attempt_timeout_ms: u64,

    /// Extra attempts on the same path before falling back.
    ///
    /// Default: 0 (fail over after the first failure)
    pub retries_per_path: u32,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            attempt_timeout_ms: 30_000,
            retries_per_path: 0,
        }
    }
}

impl ExecutorConfig {
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }
}
