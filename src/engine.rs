//! Routing engine facade.
//!
//! Wires every component from one [`DualrouteConfig`], exposes the public
//! operations and owns the lifecycle of the background loops.
//!
//! # Example
//!
//! ```no_run
//! use dualroute::config::DualrouteConfig;
//! use dualroute::engine::EngineBuilder;
//! use dualroute::routing::OperationRequest;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run(config: DualrouteConfig) -> Result<(), Box<dyn std::error::Error>> {
//! let engine = EngineBuilder::new(config).build()?;
//! let handle = engine.start(CancellationToken::new());
//!
//! let decision = engine.route(&OperationRequest::new("chat")).await?;
//! println!("{}", decision.justification);
//!
//! handle.shutdown().await;
//! # Ok(())
//! # }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::analysis::{FailureAnalyzer, FailurePattern};
use crate::circuit::{CircuitBreaker, CircuitScope, CircuitSnapshot, CircuitState};
use crate::config::{ConfigError, DualrouteConfig};
use crate::executor::{ExecutionError, ExecutionOutcome, ExecutorDeps, FailoverExecutor, PathClient};
use crate::health::{
    Alert, HealthCheck, HealthMonitor, HealthMonitorHandle, HealthRecord, HealthStatus,
};
use crate::optimizer::{
    optimizer_loop, CycleReport, EfficiencyOptimizer, OptimizationStatus, OptimizerDeps,
};
use crate::registry::{PathRegistry, ProviderKind, RegistryError};
use crate::routing::{DecisionEngine, OperationRequest, Priority, RoutingDecision, RoutingError};
use crate::samples::PerformanceStore;
use crate::sink::{
    self, AlertSink, AuditSink, MetricsSink, PrometheusMetricsSink, TracingAlertSink,
    TracingAuditSink,
};

/// Errors raised while assembling an engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A client was bound to a path id that is not configured
    #[error("Client registered for unknown path '{0}'")]
    UnknownPath(String),
}

/// Collects the collaborators of a [`RoutingEngine`].
pub struct EngineBuilder {
    config: DualrouteConfig,
    clients: HashMap<String, Arc<dyn PathClient>>,
    health_checks: Vec<(String, Arc<dyn HealthCheck>)>,
    audit_sink: Arc<dyn AuditSink>,
    alert_sink: Arc<dyn AlertSink>,
    metrics_sink: Arc<dyn MetricsSink>,
}

impl EngineBuilder {
    pub fn new(config: DualrouteConfig) -> Self {
        Self {
            config,
            clients: HashMap::new(),
            health_checks: Vec::new(),
            audit_sink: Arc::new(TracingAuditSink),
            alert_sink: Arc::new(TracingAlertSink),
            metrics_sink: Arc::new(PrometheusMetricsSink),
        }
    }

    /// Bind the upstream client for one path.
    pub fn with_client(mut self, path_id: impl Into<String>, client: Arc<dyn PathClient>) -> Self {
        self.clients.insert(path_id.into(), client);
        self
    }

    /// Register a health check. Checks named after a path id gate that path.
    pub fn with_health_check(mut self, name: impl Into<String>, check: Arc<dyn HealthCheck>) -> Self {
        self.health_checks.push((name.into(), check));
        self
    }

    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit_sink = sink;
        self
    }

    pub fn with_alert_sink(mut self, sink: Arc<dyn AlertSink>) -> Self {
        self.alert_sink = sink;
        self
    }

    pub fn with_metrics_sink(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.metrics_sink = sink;
        self
    }

    pub fn build(self) -> Result<RoutingEngine, EngineError> {
        self.config.validate()?;

        let registry = Arc::new(PathRegistry::from_config(&self.config.paths)?);
        if let Some(unknown) = self.clients.keys().find(|id| !registry.contains(id)) {
            return Err(EngineError::UnknownPath(unknown.clone()));
        }
        for id in registry.path_ids() {
            if !self.clients.contains_key(&id) {
                tracing::warn!(path_id = %id, "No client bound to path; executing on it will fail");
            }
        }

        let circuits = Arc::new(CircuitBreaker::new(self.config.circuit_breaker.clone()));
        let decision = Arc::new(DecisionEngine::new(&self.config.routing, Arc::clone(&circuits)));
        let samples = Arc::new(PerformanceStore::new(self.config.samples.clone()));
        let analyzer = Arc::new(FailureAnalyzer::new(self.config.analyzer.clone()));

        let health = Arc::new(HealthMonitor::new(
            self.config.health.clone(),
            Arc::clone(&self.alert_sink),
            Arc::clone(&self.audit_sink),
        ));
        for (name, check) in self.health_checks {
            health.register(name, check);
        }

        let executor = FailoverExecutor::new(
            self.config.executor.clone(),
            ExecutorDeps {
                decision: Arc::clone(&decision),
                circuits: Arc::clone(&circuits),
                health: Arc::clone(&health),
                samples: Arc::clone(&samples),
                audit_sink: Arc::clone(&self.audit_sink),
            },
            self.clients,
        )
        .with_payload_logging(self.config.logging.enable_payload_logging);

        let optimizer = Arc::new(EfficiencyOptimizer::new(
            self.config.optimizer.clone(),
            OptimizerDeps {
                registry: Arc::clone(&registry),
                samples: Arc::clone(&samples),
                decision: Arc::clone(&decision),
                circuits: Arc::clone(&circuits),
                analyzer: Arc::clone(&analyzer),
                health: Arc::clone(&health),
                audit_sink: Arc::clone(&self.audit_sink),
                metrics_sink: self.metrics_sink,
            },
        ));

        tracing::info!(
            paths = registry.path_count(),
            health_components = health.component_names().len(),
            "Routing engine assembled"
        );

        Ok(RoutingEngine {
            config: self.config,
            registry,
            circuits,
            decision,
            samples,
            analyzer,
            health,
            executor,
            optimizer,
            audit_sink: self.audit_sink,
        })
    }
}

/// Entry point for routing and executing operations.
pub struct RoutingEngine {
    config: DualrouteConfig,
    registry: Arc<PathRegistry>,
    circuits: Arc<CircuitBreaker>,
    decision: Arc<DecisionEngine>,
    samples: Arc<PerformanceStore>,
    analyzer: Arc<FailureAnalyzer>,
    health: Arc<HealthMonitor>,
    executor: FailoverExecutor,
    optimizer: Arc<EfficiencyOptimizer>,
    audit_sink: Arc<dyn AuditSink>,
}

impl RoutingEngine {
    pub fn config(&self) -> &DualrouteConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<PathRegistry> {
        &self.registry
    }

    pub fn decision_engine(&self) -> &Arc<DecisionEngine> {
        &self.decision
    }

    pub fn circuits(&self) -> &Arc<CircuitBreaker> {
        &self.circuits
    }

    pub fn samples(&self) -> &Arc<PerformanceStore> {
        &self.samples
    }

    pub fn health(&self) -> &Arc<HealthMonitor> {
        &self.health
    }

    /// Rank the registered paths for `request` without executing.
    ///
    /// Decisions for critical-priority requests go to the audit sink, as they
    /// do on [`execute`](Self::execute).
    pub async fn route(&self, request: &OperationRequest) -> Result<RoutingDecision, RoutingError> {
        self.route_with_order(request, None).await
    }

    /// As [`route`](Self::route), with an explicit provider preference.
    pub async fn route_with_order(
        &self,
        request: &OperationRequest,
        priority_order: Option<&[ProviderKind]>,
    ) -> Result<RoutingDecision, RoutingError> {
        let decision = self
            .decision
            .decide(request, &self.registry.all_paths(), priority_order)?;
        tracing::debug!(
            correlation_id = %request.correlation_id,
            path_id = %decision.path_id,
            justification = %decision.justification,
            "Route computed"
        );
        if request.priority == Priority::Critical {
            sink::record_audit(
                self.audit_sink.as_ref(),
                sink::events::ROUTING_DECISION,
                decision.to_audit_details(&request.correlation_id),
            )
            .await;
        }
        Ok(decision)
    }

    /// Route and execute `request` with failover.
    pub async fn execute(
        &self,
        request: &OperationRequest,
    ) -> Result<ExecutionOutcome, ExecutionError> {
        self.execute_with_order(request, None).await
    }

    pub async fn execute_with_order(
        &self,
        request: &OperationRequest,
        priority_order: Option<&[ProviderKind]>,
    ) -> Result<ExecutionOutcome, ExecutionError> {
        self.executor
            .execute(request, &self.registry.all_paths(), priority_order)
            .await
    }

    /// Health of a path (or any registered component) by name.
    pub fn path_health(&self, name: &str) -> HealthStatus {
        self.health.status(name)
    }

    /// Latest health record of every registered component that has been
    /// checked at least once, keyed by name.
    pub fn path_health_records(&self) -> BTreeMap<String, HealthRecord> {
        self.health.records()
    }

    /// Circuit state of a configured path; None for unknown paths.
    pub fn circuit_state(&self, path_id: &str) -> Option<CircuitState> {
        self.registry
            .contains(path_id)
            .then(|| self.circuits.state(&CircuitScope::path(path_id)))
    }

    /// State of the request-level circuit.
    pub fn global_circuit_state(&self) -> CircuitState {
        self.circuits.state(&CircuitScope::Global)
    }

    pub fn circuit_snapshots(&self) -> Vec<CircuitSnapshot> {
        self.circuits.snapshots()
    }

    pub fn system_health(&self) -> HealthStatus {
        self.health.system_health()
    }

    pub fn active_alerts(&self) -> Vec<Alert> {
        self.health.active_alerts()
    }

    pub async fn resolve_alert(&self, id: Uuid) -> Option<Alert> {
        self.health.resolve_alert(id).await
    }

    pub fn optimization_status(&self) -> OptimizationStatus {
        self.optimizer.status()
    }

    /// Run one optimizer cycle now, outside the background schedule.
    pub async fn run_optimization_cycle(&self) -> CycleReport {
        self.optimizer.run_cycle().await
    }

    /// Recurring failure signatures in the analyzer window.
    pub fn failure_patterns(&self) -> Vec<FailurePattern> {
        self.analyzer.analyze_store(&self.samples)
    }

    /// Start the health monitor and optimizer loops.
    ///
    /// Both loops stop when `cancel_token` (or the returned handle) is
    /// cancelled.
    pub fn start(&self, cancel_token: CancellationToken) -> EngineHandle {
        let health = if self.config.health.enabled {
            Some(self.health.start(cancel_token.child_token()))
        } else {
            tracing::info!("Health monitoring disabled");
            None
        };

        let optimizer = if self.config.optimizer.enabled {
            Some(tokio::spawn(optimizer_loop(
                Arc::clone(&self.optimizer),
                cancel_token.child_token(),
            )))
        } else {
            tracing::info!("Optimizer disabled");
            None
        };

        EngineHandle {
            cancel_token,
            health,
            optimizer,
        }
    }
}

/// Handle over the engine's background loops.
pub struct EngineHandle {
    cancel_token: CancellationToken,
    health: Option<HealthMonitorHandle>,
    optimizer: Option<JoinHandle<()>>,
}

impl EngineHandle {
    pub fn is_health_running(&self) -> bool {
        self.health.is_some()
    }

    pub fn is_optimizer_running(&self) -> bool {
        self.optimizer.is_some()
    }

    /// Cancel the loops and wait for every task to finish.
    pub async fn shutdown(self) {
        self.cancel_token.cancel();

        if let Some(health) = self.health {
            tracing::info!("Waiting for health monitor to stop");
            health.shutdown().await;
        }

        if let Some(optimizer) = self.optimizer {
            tracing::info!("Waiting for optimizer to stop");
            if let Err(e) = optimizer.await {
                tracing::warn!(error = %e, "Optimizer task ended abnormally");
            }
        }

        tracing::info!("Routing engine stopped");
    }
}
