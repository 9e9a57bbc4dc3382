//! Configuration for health monitoring.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Health monitor defaults plus per-component overrides.
///
/// ```toml
/// [health]
/// interval_ms = 10000
/// timeout_ms = 2000
/// retries = 1
///
/// [health.components.broker]
/// interval_ms = 5000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Whether background health checking is enabled
    pub enabled: bool,
    /// Milliseconds between checks of one component
    pub interval_ms: u64,
    /// Timeout for a single probe attempt
    pub timeout_ms: u64,
    /// Extra attempts after a failed probe
    pub retries: u32,
    /// Per-component overrides keyed by component name
    pub components: HashMap<String, ComponentOverride>,
}

/// Shallow override of the health defaults for one component.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentOverride {
    pub interval_ms: Option<u64>,
    pub timeout_ms: Option<u64>,
    pub retries: Option<u32>,
    pub enabled: Option<bool>,
}

/// Effective check settings of one component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentCheckConfig {
    pub interval: Duration,
    pub timeout: Duration,
    pub retries: u32,
    pub enabled: bool,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: 10_000,
            timeout_ms: 2_000,
            retries: 1,
            components: HashMap::new(),
        }
    }
}

impl HealthConfig {
    /// Settings for a component with its override merged over the defaults.
    pub fn settings_for(&self, component: &str) -> ComponentCheckConfig {
        let o = self.components.get(component).cloned().unwrap_or_default();
        ComponentCheckConfig {
            interval: Duration::from_millis(o.interval_ms.unwrap_or(self.interval_ms).max(1)),
            timeout: Duration::from_millis(o.timeout_ms.unwrap_or(self.timeout_ms).max(1)),
            retries: o.retries.unwrap_or(self.retries),
            enabled: o.enabled.unwrap_or(true),
        }
    }
}
