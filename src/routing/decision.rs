//! Routing decisions and ranked candidates

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::error::Exclusion;
use super::scoring::ScoreBreakdown;
use crate::registry::ProviderKind;

/// A candidate that survived filtering, with its score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedPath {
    pub path_id: String,
    pub provider: ProviderKind,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

/// Outcome of ranking for one request
#[derive(Debug, Clone, Serialize)]
pub struct RoutingDecision {
    /// Top-ranked path
    pub path_id: String,
    pub score: f64,
    pub justification: String,
    pub timestamp: DateTime<Utc>,
    /// Every surviving candidate, best first
    pub candidates: Vec<RankedPath>,
    /// Paths filtered out, with the reason
    #[serde(skip)]
    pub exclusions: Vec<Exclusion>,
}

impl RoutingDecision {
    /// Build a decision from a ranking sorted best first. An empty ranking
    /// hands the exclusions back.
    pub(crate) fn from_ranking(
        candidates: Vec<RankedPath>,
        exclusions: Vec<Exclusion>,
    ) -> Result<Self, Vec<Exclusion>> {
        let Some(best) = candidates.first() else {
            return Err(exclusions);
        };
        let b = &best.breakdown;
        let mut justification = format!(
            "{} scored {:.2} (latency {:.2}, cost {:.2}, capability {:.2}, affinity {:.2}, priority {:.2}, reliability {:.2})",
            best.path_id,
            best.score,
            b.latency,
            b.cost,
            b.capability,
            b.affinity,
            b.priority_order,
            b.reliability
        );
        if let Some(runner_up) = candidates.get(1) {
            justification.push_str(&format!(
                "; runner-up {} at {:.2}",
                runner_up.path_id, runner_up.score
            ));
        }
        if !exclusions.is_empty() {
            justification.push_str(&format!("; {} excluded", exclusions.len()));
        }

        Ok(Self {
            path_id: best.path_id.clone(),
            score: best.score,
            justification,
            timestamp: Utc::now(),
            candidates,
            exclusions,
        })
    }

    pub fn to_audit_details(&self, correlation_id: &str) -> serde_json::Value {
        serde_json::json!({
            "correlation_id": correlation_id,
            "path_id": self.path_id,
            "score": self.score,
            "justification": self.justification,
            "candidates": self.candidates.iter().map(|c| &c.path_id).collect::<Vec<_>>(),
            "excluded": self
                .exclusions
                .iter()
                .map(|e| serde_json::json!({"path_id": e.path_id, "reason": e.reason}))
                .collect::<Vec<_>>(),
        })
    }
}
