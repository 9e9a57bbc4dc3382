//! Efficiency optimizer.
//!
//! On a fixed interval: aggregates per-path samples, publishes observed
//! latency and success rate back to the registry, turns weak spots into
//! recommendations and applies a bounded number of them to the decision
//! engine and circuit breaker. Every applied change is audited with its
//! old and new value.

mod recommendation;

pub use recommendation::{
    AppliedChange, CycleReport, OptimizationRecommendation, OptimizationStatus, TuningTarget,
};

use chrono::{DateTime, Utc};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::analysis::{ErrorCategory, FailureAnalyzer, FailurePattern};
use crate::circuit::{CircuitBreaker, CircuitScope};
use crate::config::OptimizerConfig;
use crate::health::HealthMonitor;
use crate::metrics::MetricsSnapshot;
use crate::registry::PathRegistry;
use crate::routing::{DecisionEngine, Priority, WeightKind};
use crate::samples::{PathStats, PerformanceStore};
use crate::sink::{self, AuditSink, MetricsSink};

/// Latency weight step for a p95 regression
const LATENCY_WEIGHT_STEP: f64 = 0.25;
/// Fraction of the current cool-down added for a timeout pattern
const OPEN_DURATION_EXTENSION: f64 = 0.5;

#[derive(Debug, Default)]
struct OptimizerState {
    active: Vec<OptimizationRecommendation>,
    total_applied: u64,
    last_cycle: Option<DateTime<Utc>>,
}

/// Components the optimizer reads from and tunes.
pub struct OptimizerDeps {
    pub registry: Arc<PathRegistry>,
    pub samples: Arc<PerformanceStore>,
    pub decision: Arc<DecisionEngine>,
    pub circuits: Arc<CircuitBreaker>,
    pub analyzer: Arc<FailureAnalyzer>,
    pub health: Arc<HealthMonitor>,
    pub audit_sink: Arc<dyn AuditSink>,
    pub metrics_sink: Arc<dyn MetricsSink>,
}

pub struct EfficiencyOptimizer {
    config: OptimizerConfig,
    deps: OptimizerDeps,
    state: RwLock<OptimizerState>,
}

impl EfficiencyOptimizer {
    pub fn new(config: OptimizerConfig, deps: OptimizerDeps) -> Self {
        Self {
            config,
            deps,
            state: RwLock::new(OptimizerState::default()),
        }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn status(&self) -> OptimizationStatus {
        let state = self.read_state();
        OptimizationStatus {
            active_recommendations: state.active.clone(),
            total_applied: state.total_applied,
            last_cycle: state.last_cycle,
        }
    }

    /// Run one optimization cycle.
    pub async fn run_cycle(&self) -> CycleReport {
        let pruned = self.deps.samples.prune();
        if pruned > 0 {
            tracing::debug!(pruned, "Pruned expired performance samples");
        }

        let stats = self.deps.samples.all_stats(self.config.min_samples.max(1));
        let observed_paths = self.publish_observations(&stats);

        let patterns = self.deps.analyzer.analyze_store(&self.deps.samples);
        let mut recommendations = self.recommend(&stats, &patterns);
        recommendations.sort_by_key(|r| r.priority);

        let mut applied = Vec::new();
        let mut remaining = Vec::new();
        for recommendation in recommendations.iter() {
            if applied.len() >= self.config.max_changes_per_cycle {
                remaining.push(recommendation.clone());
                continue;
            }
            match self.apply(recommendation) {
                Some(change) => {
                    sink::record_audit(
                        self.deps.audit_sink.as_ref(),
                        sink::events::OPTIMIZATION_APPLIED,
                        change.to_audit_details(recommendation),
                    )
                    .await;
                    applied.push(change);
                }
                None => tracing::debug!(
                    parameter = %recommendation.target,
                    path_id = ?recommendation.path_id,
                    "Recommendation had no effect (parameter at bound)"
                ),
            }
        }

        {
            let mut state = self.write_state();
            state.total_applied += applied.len() as u64;
            state.active = remaining;
            state.last_cycle = Some(Utc::now());
        }

        let snapshot = self.snapshot(stats);
        sink::push_metrics(self.deps.metrics_sink.as_ref(), &snapshot).await;

        tracing::info!(
            paths = observed_paths.len(),
            recommendations = recommendations.len(),
            applied = applied.len(),
            patterns = patterns.len(),
            "Optimization cycle completed"
        );

        CycleReport {
            recommendations,
            applied,
            observed_paths,
        }
    }

    fn publish_observations(&self, stats: &[PathStats]) -> Vec<String> {
        let mut observed = Vec::with_capacity(stats.len());
        for s in stats {
            let latency = u32::try_from(s.p50_ms).unwrap_or(u32::MAX);
            match self
                .deps
                .registry
                .record_observation(&s.path_id, latency, s.success_rate)
            {
                Ok(()) => observed.push(s.path_id.clone()),
                Err(e) => tracing::warn!(
                    path_id = %s.path_id,
                    error = %e,
                    "Skipping learning feedback for path"
                ),
            }
        }
        observed
    }

    /// Build recommendations from this cycle's stats and patterns.
    pub fn recommend(
        &self,
        stats: &[PathStats],
        patterns: &[FailurePattern],
    ) -> Vec<OptimizationRecommendation> {
        let mut recommendations = Vec::new();

        for s in stats {
            if s.success_rate < self.config.success_rate_floor {
                recommendations.push(OptimizationRecommendation::new(
                    TuningTarget::FailureThreshold,
                    Some(&s.path_id),
                    -1.0,
                    Priority::Critical,
                    format!(
                        "Success rate of '{}' is {:.1}%, below the {:.1}% floor",
                        s.path_id,
                        s.success_rate * 100.0,
                        self.config.success_rate_floor * 100.0
                    ),
                    "Trip the circuit sooner so traffic fails over earlier",
                ));
            }
        }

        // One latency-weight recommendation at most, for the worst regression
        let worst_regression = stats
            .iter()
            .filter_map(|s| {
                let best_alternative = stats
                    .iter()
                    .filter(|other| other.path_id != s.path_id)
                    .map(|other| other.p95_ms)
                    .min()?;
                let ratio = s.p95_ms as f64 / best_alternative.max(1) as f64;
                (ratio > self.config.latency_regression_ratio).then_some((s, best_alternative, ratio))
            })
            .max_by(|a, b| a.2.total_cmp(&b.2));
        if let Some((s, best, ratio)) = worst_regression {
            recommendations.push(OptimizationRecommendation::new(
                TuningTarget::Weight(WeightKind::Latency),
                Some(&s.path_id),
                LATENCY_WEIGHT_STEP,
                Priority::High,
                format!(
                    "p95 of '{}' is {}ms, {:.2}x the best alternative ({}ms)",
                    s.path_id, s.p95_ms, ratio, best
                ),
                "Favor faster paths in ranking",
            ));
        }

        // Patterns only act on paths that met min_samples
        let sampled: std::collections::HashSet<&str> =
            stats.iter().map(|s| s.path_id.as_str()).collect();
        for pattern in patterns {
            if pattern.category != ErrorCategory::Timeout
                || pattern.confidence < self.config.pattern_confidence_threshold
            {
                continue;
            }
            for path_id in pattern
                .affected_paths
                .iter()
                .filter(|id| sampled.contains(id.as_str()))
            {
                let current = self
                    .deps
                    .circuits
                    .settings(&CircuitScope::path(path_id))
                    .open_duration;
                let delta_ms = (current.as_millis() as f64 * OPEN_DURATION_EXTENSION).max(1.0);
                recommendations.push(OptimizationRecommendation::new(
                    TuningTarget::OpenDuration,
                    Some(path_id),
                    delta_ms,
                    Priority::Medium,
                    format!(
                        "Recurring timeouts on '{}' for '{}' ({} occurrences, confidence {:.2})",
                        path_id, pattern.operation, pattern.occurrences, pattern.confidence
                    ),
                    "Give a timing-out path longer to recover before trial calls",
                ));
            }
        }

        // Keep the highest-priority recommendation per parameter
        recommendations.sort_by_key(|r| r.priority);
        let mut seen = std::collections::HashSet::new();
        recommendations.retain(|r| seen.insert(r.parameter_key()));
        recommendations
    }

    /// Apply one recommendation. None when the parameter did not change.
    fn apply(&self, recommendation: &OptimizationRecommendation) -> Option<AppliedChange> {
        let (old_value, new_value) = match (recommendation.target, &recommendation.path_id) {
            (TuningTarget::Weight(kind), _) => {
                self.deps.decision.adjust_weight(kind, recommendation.delta)
            }
            (TuningTarget::FailureThreshold, Some(path_id)) => {
                let scope = CircuitScope::path(path_id);
                let current = self.deps.circuits.settings(&scope).failure_threshold;
                let target = (current as f64 + recommendation.delta).round().max(1.0) as u32;
                let old = self.deps.circuits.set_failure_threshold(&scope, target);
                (old as f64, target.max(1) as f64)
            }
            (TuningTarget::OpenDuration, Some(path_id)) => {
                let scope = CircuitScope::path(path_id);
                let current = self.deps.circuits.settings(&scope).open_duration;
                let extended = current
                    .saturating_add(Duration::from_millis(recommendation.delta.max(0.0) as u64));
                let old = self.deps.circuits.set_open_duration(&scope, extended);
                (old.as_millis() as f64, extended.as_millis() as f64)
            }
            (_, None) => {
                tracing::warn!(
                    parameter = %recommendation.target,
                    "Circuit recommendation without a path, skipped"
                );
                return None;
            }
        };

        if old_value == new_value {
            return None;
        }

        metrics::counter!("dualroute_optimizations_applied_total",
            "parameter" => recommendation.target.to_string()
        )
        .increment(1);
        tracing::info!(
            parameter = %recommendation.target,
            path_id = ?recommendation.path_id,
            old_value,
            new_value,
            priority = %recommendation.priority,
            "Optimization applied"
        );

        Some(AppliedChange {
            recommendation_id: recommendation.id,
            target: recommendation.target,
            path_id: recommendation.path_id.clone(),
            old_value,
            new_value,
            applied_at: Utc::now(),
        })
    }

    fn snapshot(&self, paths: Vec<PathStats>) -> MetricsSnapshot {
        let status = self.status();
        MetricsSnapshot {
            timestamp: Utc::now(),
            paths,
            circuits: self.deps.circuits.snapshots(),
            active_recommendations: status.active_recommendations.len(),
            total_applied: status.total_applied,
            active_alerts: self.deps.health.active_alerts().len(),
            system_health: self.deps.health.system_health(),
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, OptimizerState> {
        match self.state.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("Optimizer state lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, OptimizerState> {
        match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("Optimizer state lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

/// Run the optimizer on its interval until cancelled.
///
/// Each cycle runs in its own task; a cycle that panics is logged and the
/// loop carries on with the next tick.
pub async fn optimizer_loop(optimizer: Arc<EfficiencyOptimizer>, cancel_token: CancellationToken) {
    let interval_secs = optimizer.config().interval_seconds.max(1);
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // The first tick completes immediately; skip it so the first cycle has data
    interval.tick().await;

    tracing::info!(interval_secs, "Optimizer loop started");

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                tracing::info!("Optimizer loop stopping");
                break;
            }
            _ = interval.tick() => {
                let optimizer = Arc::clone(&optimizer);
                if let Err(e) = tokio::spawn(async move { optimizer.run_cycle().await }).await {
                    tracing::warn!(error = %e, "Optimization cycle failed, skipping");
                }
            }
        }
    }
}
