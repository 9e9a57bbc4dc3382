//! Per-component health state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Health of a component, or of the whole system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
    /// Every probe attempt failed
    Critical,
    /// Never checked, or not registered
    Unknown,
}

impl HealthStatus {
    /// Whether the executor may send traffic to a path in this state.
    pub fn is_routable(&self) -> bool {
        !matches!(self, HealthStatus::Unhealthy | HealthStatus::Critical)
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Degraded => write!(f, "degraded"),
            HealthStatus::Unhealthy => write!(f, "unhealthy"),
            HealthStatus::Critical => write!(f, "critical"),
            HealthStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// Status a probe may report about its component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl From<ProbeStatus> for HealthStatus {
    fn from(status: ProbeStatus) -> Self {
        match status {
            ProbeStatus::Healthy => HealthStatus::Healthy,
            ProbeStatus::Degraded => HealthStatus::Degraded,
            ProbeStatus::Unhealthy => HealthStatus::Unhealthy,
        }
    }
}

/// Result of one successful probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthProbe {
    pub status: ProbeStatus,
    pub detail: Option<String>,
}

impl HealthProbe {
    pub fn healthy() -> Self {
        Self {
            status: ProbeStatus::Healthy,
            detail: None,
        }
    }

    pub fn degraded(detail: impl Into<String>) -> Self {
        Self {
            status: ProbeStatus::Degraded,
            detail: Some(detail.into()),
        }
    }

    pub fn unhealthy(detail: impl Into<String>) -> Self {
        Self {
            status: ProbeStatus::Unhealthy,
            detail: Some(detail.into()),
        }
    }
}

/// Latest check result of one component. Overwritten on every check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthRecord {
    pub status: HealthStatus,
    pub last_check: DateTime<Utc>,
    pub response_time_ms: u64,
    pub error: Option<String>,
    /// Checks in a row where every attempt failed
    pub consecutive_failures: u32,
}
