//! Decision engine for selecting execution paths
//!
//! Filters the registered paths against a request's hard constraints, then
//! scores the survivors and ranks them. Ranking is a pure function of the
//! request, the candidate paths, the current scoring weights and the
//! circuit states (peeked, never consumed).

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub mod decision;
pub mod error;
pub mod request;
pub mod scoring;
pub mod strategies;


pub use decision::{RankedPath, RoutingDecision};
pub use error::{Exclusion, RoutingError};
pub use request::{FallbackStrategy, OperationRequest, Priority, RequiredCapabilities};
pub use scoring::{score_path, ScoreBreakdown, ScoreInputs, ScoringWeights, WeightKind};
pub use strategies::CostTier;

use crate::circuit::{CircuitBreaker, CircuitScope, CircuitState};
use crate::config::RoutingConfig;
use crate::registry::{Path, ProviderKind};

/// Ranks candidate paths for each request
pub struct DecisionEngine {
    /// Circuit states are consulted to drop open paths
    circuits: Arc<CircuitBreaker>,

    /// Tunable weights, retuned by the optimizer
    weights: RwLock<ScoringWeights>,

    /// Cost tier for requests that do not specify one
    cost_tier: CostTier,

    /// SLA for requests without a latency budget
    default_sla_ms: u64,

    /// Domain → preferred provider kind
    domain_affinity: HashMap<String, ProviderKind>,

    /// Domain → disallowed provider kinds
    domain_exclusions: HashMap<String, Vec<ProviderKind>>,
}

impl DecisionEngine {
    pub fn new(config: &RoutingConfig, circuits: Arc<CircuitBreaker>) -> Self {
        Self {
            circuits,
            weights: RwLock::new(config.weights.clone().into()),
            cost_tier: config.cost_tier,
            default_sla_ms: config.default_sla_ms,
            domain_affinity: config.domain_affinity.clone(),
            domain_exclusions: config.domain_exclusions.clone(),
        }
    }

    /// Current scoring weights
    pub fn weights(&self) -> ScoringWeights {
        *self.read_weights()
    }

    /// Set one weight (clamped to bounds). Returns `(old, new)`.
    pub fn set_weight(&self, kind: WeightKind, value: f64) -> (f64, f64) {
        let mut weights = self.write_weights();
        let old = weights.get(kind);
        let new = weights.set(kind, value);
        (old, new)
    }

    /// Shift one weight by `delta` (clamped to bounds). Returns `(old, new)`.
    pub fn adjust_weight(&self, kind: WeightKind, delta: f64) -> (f64, f64) {
        let mut weights = self.write_weights();
        let old = weights.get(kind);
        let new = weights.set(kind, old + delta);
        (old, new)
    }

    /// Rank candidates best first.
    ///
    /// `priority_order` is the caller's provider ranking, if any. An empty
    /// result is reported as [`RoutingError::NoCandidate`] with the reason
    /// each path was dropped.
    pub fn rank(
        &self,
        request: &OperationRequest,
        candidates: &[Path],
        priority_order: Option<&[ProviderKind]>,
    ) -> Result<Vec<RankedPath>, RoutingError> {
        let (ranked, exclusions) = self.rank_with_exclusions(request, candidates, priority_order);
        if ranked.is_empty() {
            return Err(no_candidate(request, exclusions));
        }
        Ok(ranked)
    }

    /// Rank and wrap the result in a [`RoutingDecision`].
    pub fn decide(
        &self,
        request: &OperationRequest,
        candidates: &[Path],
        priority_order: Option<&[ProviderKind]>,
    ) -> Result<RoutingDecision, RoutingError> {
        let (ranked, exclusions) = self.rank_with_exclusions(request, candidates, priority_order);
        RoutingDecision::from_ranking(ranked, exclusions)
            .map_err(|exclusions| no_candidate(request, exclusions))
    }

    fn rank_with_exclusions(
        &self,
        request: &OperationRequest,
        candidates: &[Path],
        priority_order: Option<&[ProviderKind]>,
    ) -> (Vec<RankedPath>, Vec<Exclusion>) {
        let weights = self.weights();
        let tier = request.cost_tier.unwrap_or(self.cost_tier);
        let sla_ms = request.latency_budget_ms.unwrap_or(self.default_sla_ms);
        let preferred = self.domain_affinity.get(&request.domain).copied();

        let mut ranked = Vec::with_capacity(candidates.len());
        let mut exclusions = Vec::new();

        for path in candidates {
            if let Some(reason) = self.exclusion_reason(request, path) {
                tracing::debug!(
                    path_id = %path.id,
                    reason = %reason,
                    correlation_id = %request.correlation_id,
                    "Path excluded"
                );
                exclusions.push(Exclusion {
                    path_id: path.id.clone(),
                    reason,
                });
                continue;
            }

            let priority_position = priority_order.and_then(|order| {
                order
                    .iter()
                    .position(|kind| *kind == path.provider)
                    .map(|index| (index, order.len()))
            });

            let inputs = ScoreInputs {
                latency_ms: path.effective_latency_ms(),
                sla_ms,
                cost_per_unit: path.cost_per_unit,
                cost_tier: tier,
                matched_capabilities: request.requirements.matched(&path.capabilities),
                path_features: path.capabilities.supports_streaming as u32
                    + path.capabilities.supports_tools as u32,
                affinity_match: preferred == Some(path.provider),
                priority_position,
                success_rate: path.observed_success_rate,
            };
            let breakdown = score_path(&inputs, &weights);

            ranked.push(RankedPath {
                path_id: path.id.clone(),
                provider: path.provider,
                score: breakdown.total,
                breakdown,
            });
        }

        let order_index = |kind: ProviderKind| {
            priority_order
                .and_then(|order| order.iter().position(|k| *k == kind))
                .unwrap_or(usize::MAX)
        };
        ranked.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| order_index(a.provider).cmp(&order_index(b.provider)))
                .then_with(|| a.path_id.cmp(&b.path_id))
        });

        (ranked, exclusions)
    }

    fn exclusion_reason(&self, request: &OperationRequest, path: &Path) -> Option<String> {
        let missing = request.requirements.missing(&path.capabilities);
        if !missing.is_empty() {
            return Some(format!("missing capability: {}", missing.join(", ")));
        }

        if let Some(ceiling) = request.cost_ceiling {
            if path.cost_per_unit > ceiling {
                return Some(format!(
                    "cost {:.4} above ceiling {:.4}",
                    path.cost_per_unit, ceiling
                ));
            }
        }

        if self
            .domain_exclusions
            .get(&request.domain)
            .is_some_and(|kinds| kinds.contains(&path.provider))
        {
            return Some(format!(
                "{} provider excluded for domain '{}'",
                path.provider, request.domain
            ));
        }

        if self.circuits.state(&CircuitScope::path(&path.id)) == CircuitState::Open {
            return Some("circuit open".to_string());
        }

        None
    }

    fn read_weights(&self) -> RwLockReadGuard<'_, ScoringWeights> {
        match self.weights.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("Scoring weights lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write_weights(&self) -> RwLockWriteGuard<'_, ScoringWeights> {
        match self.weights.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("Scoring weights lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

fn no_candidate(request: &OperationRequest, exclusions: Vec<Exclusion>) -> RoutingError {
    RoutingError::NoCandidate {
        operation: request.operation.clone(),
        exclusions,
    }
}
