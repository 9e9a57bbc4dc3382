//! Performance sample retention configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retention policy for per-path performance windows.
///
/// Samples are pruned when older than `retention_seconds` or when a path
/// holds more than `max_samples_per_path` entries, whichever comes first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SampleConfig {
    pub retention_seconds: u64,
    pub max_samples_per_path: usize,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            retention_seconds: 3600,
            max_samples_per_path: 10_000,
        }
    }
}

impl SampleConfig {
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_seconds)
    }
}
