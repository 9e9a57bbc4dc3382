//! # Metrics Types
//!
//! Snapshot pushed to the metrics sink after each optimizer cycle.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::circuit::CircuitSnapshot;
use crate::health::HealthStatus;
use crate::samples::PathStats;

/// Point-in-time view of engine performance.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    /// Per-path aggregates (only paths with enough samples)
    pub paths: Vec<PathStats>,
    /// State of every circuit, including the global one
    pub circuits: Vec<CircuitSnapshot>,
    /// Recommendations produced by the last cycle and not applied
    pub active_recommendations: usize,
    /// Recommendations applied since startup
    pub total_applied: u64,
    pub active_alerts: usize,
    pub system_health: HealthStatus,
}
