//! Shared test utilities for dualroute integration tests.
//!
//! Provides scripted path clients, configuration builders and engine
//! assembly helpers.

#![allow(dead_code)]

use async_trait::async_trait;
use dualroute::config::{DualrouteConfig, PathConfig};
use dualroute::engine::{EngineBuilder, RoutingEngine};
use dualroute::executor::{PathClient, PathClientError, PathResponse};
use dualroute::registry::ProviderKind;
use dualroute::routing::OperationRequest;
use dualroute::sink::{MemoryAlertSink, MemoryAuditSink, MemoryMetricsSink};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// =============================================================================
// Scripted Path Client
// =============================================================================

/// What a scripted call does.
#[derive(Debug, Clone)]
pub enum Step {
    Succeed,
    Fail(PathClientError),
    /// Sleep, then succeed
    Delay(Duration),
    /// Sleep, then fail
    DelayThenFail(Duration, PathClientError),
}

/// A path client that replays a script, then repeats a default step.
pub struct ScriptedClient {
    name: String,
    script: Mutex<VecDeque<Step>>,
    default: Step,
    calls: AtomicU32,
}

impl ScriptedClient {
    pub fn new(name: &str, default: Step) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            script: Mutex::new(VecDeque::new()),
            default,
            calls: AtomicU32::new(0),
        })
    }

    pub fn healthy(name: &str) -> Arc<Self> {
        Self::new(name, Step::Succeed)
    }

    pub fn failing(name: &str) -> Arc<Self> {
        Self::new(name, Step::Fail(upstream_error()))
    }

    pub fn push(&self, step: Step) {
        self.script.lock().unwrap().push_back(step);
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_step(&self) -> Step {
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.default.clone())
    }

    fn response(&self, request: &OperationRequest) -> PathResponse {
        PathResponse::new(serde_json::json!({
            "served_by": self.name,
            "operation": request.operation,
        }))
        .with_cost(0.01)
    }
}

#[async_trait]
impl PathClient for ScriptedClient {
    async fn invoke(
        &self,
        request: &OperationRequest,
        _timeout: Duration,
    ) -> Result<PathResponse, PathClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.next_step() {
            Step::Succeed => Ok(self.response(request)),
            Step::Fail(e) => Err(e),
            Step::Delay(d) => {
                tokio::time::sleep(d).await;
                Ok(self.response(request))
            }
            Step::DelayThenFail(d, e) => {
                tokio::time::sleep(d).await;
                Err(e)
            }
        }
    }
}

pub fn upstream_error() -> PathClientError {
    PathClientError::Upstream {
        status: 503,
        message: "service unavailable".to_string(),
    }
}

// =============================================================================
// Configuration Builders
// =============================================================================

pub fn path_config(id: &str, provider: ProviderKind, cost: f64, latency_ms: u32) -> PathConfig {
    PathConfig {
        id: id.to_string(),
        provider,
        provider_name: "test".to_string(),
        supports_tools: true,
        supports_streaming: false,
        max_tokens: 8192,
        cost_per_unit: cost,
        default_latency_ms: latency_ms,
    }
}

/// Two paths, direct preferred (faster and cheaper), background loops off.
pub fn two_path_config() -> DualrouteConfig {
    let mut config = DualrouteConfig {
        paths: vec![
            path_config("direct", ProviderKind::Direct, 0.5, 200),
            path_config("broker", ProviderKind::Broker, 1.0, 400),
        ],
        ..Default::default()
    };
    config.health.enabled = false;
    config.optimizer.enabled = false;
    config
}

// =============================================================================
// Engine Assembly
// =============================================================================

pub struct TestEngine {
    pub engine: RoutingEngine,
    pub audit: Arc<MemoryAuditSink>,
    pub alerts: Arc<MemoryAlertSink>,
    pub metrics: Arc<MemoryMetricsSink>,
}

/// Build an engine with memory sinks and the given clients.
pub fn build_engine(
    config: DualrouteConfig,
    clients: Vec<(&str, Arc<ScriptedClient>)>,
) -> TestEngine {
    build_engine_with(config, clients, |b| b)
}

pub fn build_engine_with(
    config: DualrouteConfig,
    clients: Vec<(&str, Arc<ScriptedClient>)>,
    customize: impl FnOnce(EngineBuilder) -> EngineBuilder,
) -> TestEngine {
    let audit = Arc::new(MemoryAuditSink::new());
    let alerts = Arc::new(MemoryAlertSink::new());
    let metrics = Arc::new(MemoryMetricsSink::new());

    let mut builder = EngineBuilder::new(config)
        .with_audit_sink(audit.clone())
        .with_alert_sink(alerts.clone())
        .with_metrics_sink(metrics.clone());
    for (id, client) in clients {
        builder = builder.with_client(id, client);
    }

    TestEngine {
        engine: customize(builder).build().expect("engine builds"),
        audit,
        alerts,
        metrics,
    }
}
