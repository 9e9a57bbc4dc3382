//! Failover executor.
//!
//! Runs one request against the ranked candidate list: each candidate is
//! gated by its circuit and by the health monitor, attempts are bounded by
//! the smaller of the per-attempt timeout and what is left of the request's
//! latency budget, and failures advance to the next candidate unless the
//! request forbids fallback. Budget expiry is terminal.

mod client;
mod error;


pub use client::{PathClient, PathClientError, PathResponse};
pub use error::{ExecutionError, FailureKind, PathFailure};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::circuit::{CircuitBreaker, CircuitPermit, CircuitScope, CircuitTransition};
use crate::config::ExecutorConfig;
use crate::health::HealthMonitor;
use crate::logging::{payload_preview, truncate_detail};
use crate::metrics::sanitize_label;
use crate::registry::{Path, ProviderKind};
use crate::routing::{
    DecisionEngine, FallbackStrategy, OperationRequest, Priority, RankedPath, RoutingDecision,
};
use crate::samples::{PerformanceSample, PerformanceStore};
use crate::sink::{self, AuditSink};

/// Successful execution.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    /// Path that served the request
    pub path_id: String,
    pub payload: serde_json::Value,
    /// Wall time from start of execution to the successful response
    pub latency: Duration,
    /// Attempts made across all paths, including the successful one
    pub attempts: u32,
    /// True when the serving path was not the top-ranked candidate
    pub fallback_used: bool,
    pub decision: RoutingDecision,
}

/// Collaborators shared with the rest of the engine.
pub struct ExecutorDeps {
    pub decision: Arc<DecisionEngine>,
    pub circuits: Arc<CircuitBreaker>,
    pub health: Arc<HealthMonitor>,
    pub samples: Arc<PerformanceStore>,
    pub audit_sink: Arc<dyn AuditSink>,
}

pub struct FailoverExecutor {
    config: ExecutorConfig,
    deps: ExecutorDeps,
    clients: HashMap<String, Arc<dyn PathClient>>,
    /// Include a truncated payload in failed-attempt logs
    log_payloads: bool,
}

/// Result of trying one candidate.
enum CandidateResult {
    Served(PathResponse, u32),
    Failed(PathFailure),
    BudgetExpired(u32),
}

impl FailoverExecutor {
    pub fn new(
        config: ExecutorConfig,
        deps: ExecutorDeps,
        clients: HashMap<String, Arc<dyn PathClient>>,
    ) -> Self {
        Self {
            config,
            deps,
            clients,
            log_payloads: false,
        }
    }

    pub fn with_payload_logging(mut self, enabled: bool) -> Self {
        self.log_payloads = enabled;
        self
    }

    pub fn has_client(&self, path_id: &str) -> bool {
        self.clients.contains_key(path_id)
    }

    /// Execute `request` against `candidates`.
    pub async fn execute(
        &self,
        request: &OperationRequest,
        candidates: &[Path],
        priority_order: Option<&[ProviderKind]>,
    ) -> Result<ExecutionOutcome, ExecutionError> {
        let start = Instant::now();
        let budget = request.latency_budget();

        // Held until the request settles; dropping it unsettled hands back a
        // half-open trial
        let mut global = self.deps.circuits.permit(&CircuitScope::Global)?;
        if let Some(transition) = global.take_transition() {
            self.audit_transition(&transition).await;
        }

        let decision = match self.deps.decision.decide(request, candidates, priority_order) {
            Ok(decision) => decision,
            Err(e) => {
                // Not an upstream outcome
                drop(global);
                self.count_request(request, "none", "no_candidate");
                return Err(e.into());
            }
        };

        tracing::info!(
            correlation_id = %request.correlation_id,
            operation = %request.operation,
            priority = %request.priority,
            path_id = %decision.path_id,
            score = decision.score,
            candidates = decision.candidates.len(),
            "Routing decision"
        );
        if request.priority == Priority::Critical {
            sink::record_audit(
                self.deps.audit_sink.as_ref(),
                sink::events::ROUTING_DECISION,
                decision.to_audit_details(&request.correlation_id),
            )
            .await;
        }

        let attempt_limit = match request.fallback {
            FallbackStrategy::Sequential => decision.candidates.len(),
            FallbackStrategy::None => 1,
        };

        let mut failures = Vec::new();
        let mut total_attempts = 0u32;

        for (index, candidate) in decision.candidates.iter().take(attempt_limit).enumerate() {
            let fallback = index > 0;
            if fallback {
                tracing::info!(
                    correlation_id = %request.correlation_id,
                    from = %decision.path_id,
                    to = %candidate.path_id,
                    "Falling back to next candidate"
                );
            }

            let result = self
                .try_candidate(request, candidate, fallback, start, budget)
                .await?;
            match result {
                CandidateResult::Served(response, attempts) => {
                    total_attempts += attempts;
                    self.record_global(global, true).await;
                    if fallback {
                        metrics::counter!("dualroute_fallbacks_total",
                            "from" => sanitize_label(&decision.path_id),
                            "to" => sanitize_label(&candidate.path_id)
                        )
                        .increment(1);
                    }
                    self.count_request(request, &candidate.path_id, "success");

                    return Ok(ExecutionOutcome {
                        path_id: candidate.path_id.clone(),
                        payload: response.payload,
                        latency: start.elapsed(),
                        attempts: total_attempts,
                        fallback_used: fallback,
                        decision,
                    });
                }
                CandidateResult::Failed(failure) => {
                    total_attempts += failure.attempts;
                    failures.push(failure);
                }
                CandidateResult::BudgetExpired(attempts) => {
                    total_attempts += attempts;
                    let elapsed = start.elapsed();
                    self.record_global(global, false).await;
                    self.count_request(request, &candidate.path_id, "budget_exceeded");
                    tracing::warn!(
                        correlation_id = %request.correlation_id,
                        elapsed_ms = elapsed.as_millis() as u64,
                        attempts = total_attempts,
                        "Latency budget exceeded, aborting remaining candidates"
                    );
                    return Err(ExecutionError::BudgetExceeded {
                        elapsed,
                        budget: budget.unwrap_or(elapsed),
                        attempts: total_attempts,
                    });
                }
            }
        }

        let elapsed = start.elapsed();
        if total_attempts > 0 {
            self.record_global(global, false).await;
        } else {
            drop(global);
        }
        self.count_request(request, "none", "exhausted");
        tracing::warn!(
            correlation_id = %request.correlation_id,
            operation = %request.operation,
            failures = failures.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "All candidate paths exhausted"
        );
        Err(ExecutionError::AllPathsExhausted { failures, elapsed })
    }

    async fn try_candidate(
        &self,
        request: &OperationRequest,
        candidate: &RankedPath,
        fallback: bool,
        start: Instant,
        budget: Option<Duration>,
    ) -> Result<CandidateResult, ExecutionError> {
        let client = self
            .clients
            .get(&candidate.path_id)
            .ok_or_else(|| ExecutionError::UnknownClient(candidate.path_id.clone()))?;
        let scope = CircuitScope::path(candidate.path_id.as_str());
        let max_attempts = self.config.retries_per_path.saturating_add(1);

        let mut attempts = 0u32;
        let mut last_error = String::new();

        while attempts < max_attempts {
            let mut permit = match self.deps.circuits.permit(&scope) {
                Ok(permit) => permit,
                Err(e) => {
                    tracing::debug!(path_id = %candidate.path_id, error = %e, "Circuit rejected attempt");
                    if attempts > 0 {
                        break;
                    }
                    return Ok(CandidateResult::Failed(PathFailure {
                        path_id: candidate.path_id.clone(),
                        kind: FailureKind::CircuitOpen,
                        reason: e.to_string(),
                        attempts: 0,
                    }));
                }
            };
            if let Some(transition) = permit.take_transition() {
                self.audit_transition(&transition).await;
            }

            let health = self.deps.health.status(&candidate.path_id);
            if !health.is_routable() {
                drop(permit);
                tracing::debug!(path_id = %candidate.path_id, status = %health, "Skipping unhealthy path");
                if attempts > 0 {
                    break;
                }
                return Ok(CandidateResult::Failed(PathFailure {
                    path_id: candidate.path_id.clone(),
                    kind: FailureKind::Unhealthy,
                    reason: format!("path health is {}", health),
                    attempts: 0,
                }));
            }

            let attempt_timeout = match remaining(start, budget) {
                Some(remaining) if remaining.is_zero() => {
                    drop(permit);
                    return Ok(CandidateResult::BudgetExpired(attempts));
                }
                Some(remaining) => remaining.min(self.config.attempt_timeout()),
                None => self.config.attempt_timeout(),
            };

            attempts += 1;
            let attempt_start = Instant::now();
            let result =
                match tokio::time::timeout(attempt_timeout, client.invoke(request, attempt_timeout))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(PathClientError::Timeout(attempt_timeout.as_millis() as u64)),
                };
            let latency = attempt_start.elapsed();
            let latency_ms = latency.as_millis() as u64;

            metrics::histogram!("dualroute_attempt_duration_seconds",
                "path" => sanitize_label(&candidate.path_id)
            )
            .record(latency.as_secs_f64());

            match result {
                Ok(response) => {
                    metrics::counter!("dualroute_attempts_total",
                        "path" => sanitize_label(&candidate.path_id),
                        "outcome" => "success"
                    )
                    .increment(1);
                    if let Some(transition) = permit.success() {
                        self.audit_transition(&transition).await;
                    }
                    self.deps.samples.record(
                        PerformanceSample::success(
                            candidate.path_id.as_str(),
                            request.operation.as_str(),
                            latency_ms,
                            response.cost,
                        )
                        .as_fallback(fallback),
                    );
                    tracing::info!(
                        correlation_id = %request.correlation_id,
                        path_id = %candidate.path_id,
                        latency_ms,
                        attempt = attempts,
                        "Attempt succeeded"
                    );
                    return Ok(CandidateResult::Served(response, attempts));
                }
                Err(e) => {
                    metrics::counter!("dualroute_attempts_total",
                        "path" => sanitize_label(&candidate.path_id),
                        "outcome" => "failure"
                    )
                    .increment(1);
                    if let Some(transition) = permit.failure() {
                        self.audit_transition(&transition).await;
                    }
                    last_error = e.to_string();
                    self.deps.samples.record(
                        PerformanceSample::failure(
                            candidate.path_id.as_str(),
                            request.operation.as_str(),
                            latency_ms,
                            last_error.as_str(),
                        )
                        .as_fallback(fallback),
                    );
                    tracing::warn!(
                        correlation_id = %request.correlation_id,
                        path_id = %candidate.path_id,
                        latency_ms,
                        attempt = attempts,
                        error = %truncate_detail(&last_error),
                        payload = ?payload_preview(&request.payload, self.log_payloads),
                        "Attempt failed"
                    );

                    if matches!(remaining(start, budget), Some(r) if r.is_zero()) {
                        return Ok(CandidateResult::BudgetExpired(attempts));
                    }
                }
            }
        }

        Ok(CandidateResult::Failed(PathFailure {
            path_id: candidate.path_id.clone(),
            kind: FailureKind::Attempt,
            reason: last_error,
            attempts,
        }))
    }

    async fn record_global(&self, permit: CircuitPermit<'_>, success: bool) {
        let transition = if success {
            permit.success()
        } else {
            permit.failure()
        };
        if let Some(transition) = transition {
            self.audit_transition(&transition).await;
        }
    }

    async fn audit_transition(&self, transition: &CircuitTransition) {
        sink::record_audit(
            self.deps.audit_sink.as_ref(),
            sink::events::CIRCUIT_TRANSITION,
            transition.to_audit_details(),
        )
        .await;
    }

    fn count_request(&self, request: &OperationRequest, path: &str, outcome: &'static str) {
        metrics::counter!("dualroute_requests_total",
            "operation" => sanitize_label(&request.operation),
            "path" => sanitize_label(path),
            "outcome" => outcome
        )
        .increment(1);
    }
}

/// Time left in the budget; None when the request has no budget.
fn remaining(start: Instant, budget: Option<Duration>) -> Option<Duration> {
    budget.map(|b| b.saturating_sub(start.elapsed()))
}
