//! Optimization recommendations and applied changes.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

use crate::routing::{Priority, WeightKind};

/// The parameter a recommendation adjusts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TuningTarget {
    /// A decision engine scoring weight
    Weight(WeightKind),
    /// A path circuit's failure threshold
    FailureThreshold,
    /// A path circuit's cool-down, in milliseconds
    OpenDuration,
}

impl fmt::Display for TuningTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TuningTarget::Weight(kind) => write!(f, "weight.{}", kind),
            TuningTarget::FailureThreshold => write!(f, "circuit.failure_threshold"),
            TuningTarget::OpenDuration => write!(f, "circuit.open_duration_ms"),
        }
    }
}

impl Serialize for TuningTarget {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A proposed bounded adjustment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationRecommendation {
    pub id: Uuid,
    pub description: String,
    pub target: TuningTarget,
    /// Path whose circuit is targeted (also set for weight changes, naming the trigger)
    pub path_id: Option<String>,
    pub delta: f64,
    pub expected_impact: String,
    pub priority: Priority,
}

impl OptimizationRecommendation {
    pub(crate) fn new(
        target: TuningTarget,
        path_id: Option<&str>,
        delta: f64,
        priority: Priority,
        description: String,
        expected_impact: &str,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            description,
            target,
            path_id: path_id.map(str::to_string),
            delta,
            expected_impact: expected_impact.to_string(),
            priority,
        }
    }

    /// Recommendations that would write the same parameter share a key.
    pub(crate) fn parameter_key(&self) -> String {
        match self.target {
            TuningTarget::Weight(kind) => format!("weight.{}", kind),
            target => format!("{}:{}", target, self.path_id.as_deref().unwrap_or("")),
        }
    }
}

/// A recommendation that was applied, with the values before and after.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedChange {
    pub recommendation_id: Uuid,
    pub target: TuningTarget,
    pub path_id: Option<String>,
    pub old_value: f64,
    pub new_value: f64,
    pub applied_at: DateTime<Utc>,
}

impl AppliedChange {
    pub fn to_audit_details(&self, recommendation: &OptimizationRecommendation) -> serde_json::Value {
        serde_json::json!({
            "recommendation_id": self.recommendation_id.to_string(),
            "parameter": self.target.to_string(),
            "path_id": self.path_id,
            "old_value": self.old_value,
            "new_value": self.new_value,
            "priority": recommendation.priority.to_string(),
            "description": recommendation.description,
        })
    }
}

/// Public view of optimizer progress.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OptimizationStatus {
    /// Recommendations from the last cycle that were not applied
    pub active_recommendations: Vec<OptimizationRecommendation>,
    pub total_applied: u64,
    pub last_cycle: Option<DateTime<Utc>>,
}

/// What one cycle did.
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub recommendations: Vec<OptimizationRecommendation>,
    pub applied: Vec<AppliedChange>,
    /// Paths whose stats were published back to the registry
    pub observed_paths: Vec<String>,
}
