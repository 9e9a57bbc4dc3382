//! Circuit breaker configuration

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Circuit breaker configuration with per-path overrides.
///
/// Overrides are shallow: each field set in an override replaces the base
/// value, unset fields fall through to the base.
///
/// # Example
///
/// ```toml
/// [circuit_breaker]
/// failure_threshold = 5
/// open_duration_ms = 30000
///
/// [circuit_breaker.overrides.broker]
/// failure_threshold = 3
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before a circuit opens
    pub failure_threshold: u32,
    /// Cool-down before an open circuit admits a trial call
    pub open_duration_ms: u64,
    /// Per-path overrides keyed by path id
    pub overrides: HashMap<String, CircuitOverride>,
}

/// Per-path override of circuit breaker parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitOverride {
    pub failure_threshold: Option<u32>,
    pub open_duration_ms: Option<u64>,
}

/// Effective settings of one circuit after merging overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitSettings {
    pub failure_threshold: u32,
    pub open_duration: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_duration_ms: 30_000,
            overrides: HashMap::new(),
        }
    }
}

impl CircuitBreakerConfig {
    /// Settings for circuits without an override (including the global circuit).
    pub fn base_settings(&self) -> CircuitSettings {
        CircuitSettings {
            failure_threshold: self.failure_threshold,
            open_duration: Duration::from_millis(self.open_duration_ms),
        }
    }

    /// Settings for a path, with its override merged over the base.
    pub fn settings_for(&self, path_id: &str) -> CircuitSettings {
        let base = self.base_settings();
        match self.overrides.get(path_id) {
            Some(o) => CircuitSettings {
                failure_threshold: o.failure_threshold.unwrap_or(base.failure_threshold),
                open_duration: o
                    .open_duration_ms
                    .map(Duration::from_millis)
                    .unwrap_or(base.open_duration),
            },
            None => base,
        }
    }
}
