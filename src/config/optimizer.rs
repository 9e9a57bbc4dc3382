//! Efficiency optimizer configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the adaptive optimization loop.
///
/// # Example
///
/// ```toml
/// [optimizer]
/// interval_seconds = 60
/// min_samples = 10
/// max_changes_per_cycle = 2
/// success_rate_floor = 0.9
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Whether the background optimization loop runs
    pub enabled: bool,

    /// Seconds between optimization cycles
    pub interval_seconds: u64,

    /// Samples a path needs before the optimizer acts on it
    pub min_samples: usize,

    /// Cap on recommendations applied in a single cycle
    pub max_changes_per_cycle: usize,

    /// Success rate below which a breaker tightening is proposed
    pub success_rate_floor: f64,

    /// p95 ratio against the best path that counts as a latency regression
    ///
    /// Default: 1.5 (50% slower than the fastest eligible path)
    pub latency_regression_ratio: f64,

    /// Analyzer confidence required before a pattern drives a recommendation
    pub pattern_confidence_threshold: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: 60,
            min_samples: 10,
            max_changes_per_cycle: 2,
            success_rate_floor: 0.9,
            latency_regression_ratio: 1.5,
            pattern_confidence_threshold: 0.7,
        }
    }
}

impl OptimizerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}
