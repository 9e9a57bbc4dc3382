//! Failure pattern analyzer configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for failure pattern mining.
///
/// # Example
///
/// ```toml
/// [analyzer]
/// min_failures = 5
/// window_seconds = 900
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Failures required in the window before any pattern is emitted
    pub min_failures: usize,

    /// How far back failures are considered
    pub window_seconds: u64,

    /// Occurrence count at which the recurrence component of confidence saturates
    pub saturation_count: usize,

    /// Half-life of the recency component of confidence
    pub recency_half_life_seconds: u64,

    /// Mean latency above which a pattern is tagged as slow
    pub slow_latency_ms: u64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            min_failures: 5,
            window_seconds: 900,
            saturation_count: 20,
            recency_half_life_seconds: 300,
            slow_latency_ms: 5000,
        }
    }
}

impl AnalyzerConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }
}
