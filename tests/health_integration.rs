//! Health monitoring wired through the engine lifecycle.

mod common;

use common::{build_engine_with, two_path_config, ScriptedClient};
use dualroute::executor::{ExecutionError, FailureKind};
use dualroute::health::{
    AlertEventKind, AlertSeverity, FnHealthCheck, HealthCheckError, HealthProbe, HealthStatus,
};
use dualroute::routing::OperationRequest;
use dualroute::sink::events;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn toggled_check(healthy: Arc<AtomicBool>) -> Arc<dyn dualroute::health::HealthCheck> {
    Arc::new(FnHealthCheck::new(move || {
        let healthy = Arc::clone(&healthy);
        async move {
            if healthy.load(Ordering::SeqCst) {
                Ok::<_, HealthCheckError>(HealthProbe::healthy())
            } else {
                Ok(HealthProbe::unhealthy("upstream refusing connections"))
            }
        }
    }))
}

fn fast_health_config() -> dualroute::config::DualrouteConfig {
    let mut config = two_path_config();
    config.health.enabled = true;
    config.health.interval_ms = 20;
    config.health.timeout_ms = 100;
    config.health.retries = 0;
    config
}

#[tokio::test]
async fn test_background_checks_track_component_status() {
    let broker_up = Arc::new(AtomicBool::new(false));
    let t = build_engine_with(
        fast_health_config(),
        vec![
            ("direct", ScriptedClient::healthy("direct")),
            ("broker", ScriptedClient::healthy("broker")),
        ],
        |b| {
            b.with_health_check("direct", toggled_check(Arc::new(AtomicBool::new(true))))
                .with_health_check("broker", toggled_check(Arc::clone(&broker_up)))
        },
    );

    let handle = t.engine.start(CancellationToken::new());
    assert!(handle.is_health_running());
    assert!(!handle.is_optimizer_running());

    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(t.engine.path_health("direct"), HealthStatus::Healthy);
    assert_eq!(t.engine.path_health("broker"), HealthStatus::Unhealthy);
    assert_eq!(t.engine.system_health(), HealthStatus::Unhealthy);

    let active = t.engine.active_alerts();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].component, "broker");
    assert_eq!(active[0].severity, AlertSeverity::Error);

    broker_up.store(true, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(t.engine.path_health("broker"), HealthStatus::Healthy);
    assert_eq!(t.engine.system_health(), HealthStatus::Healthy);
    assert!(t.engine.active_alerts().is_empty());

    let kinds: Vec<AlertEventKind> = t.alerts.events().iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![AlertEventKind::Created, AlertEventKind::Resolved]);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_unhealthy_path_is_skipped_during_execution() {
    let broker = ScriptedClient::healthy("broker");
    let direct = ScriptedClient::failing("direct");
    let t = build_engine_with(
        two_path_config(),
        vec![("direct", direct.clone()), ("broker", broker.clone())],
        |b| b.with_health_check("broker", toggled_check(Arc::new(AtomicBool::new(false)))),
    );

    t.engine.health().check_component("broker").await;
    let err = t.engine.execute(&OperationRequest::new("chat")).await.unwrap_err();

    match err {
        ExecutionError::AllPathsExhausted { failures, .. } => {
            assert_eq!(failures.len(), 2);
            assert_eq!(failures[0].path_id, "direct");
            assert_eq!(failures[1].path_id, "broker");
            assert_eq!(failures[1].kind, FailureKind::Unhealthy);
        }
        other => panic!("expected AllPathsExhausted, got {other}"),
    }
    assert_eq!(broker.calls(), 0);
}

#[tokio::test]
async fn test_operator_resolution_is_audited() {
    let t = build_engine_with(
        two_path_config(),
        vec![],
        |b| b.with_health_check("broker", toggled_check(Arc::new(AtomicBool::new(false)))),
    );

    t.engine.health().check_component("broker").await;
    let alert = t.engine.active_alerts().pop().expect("alert raised");

    let resolved = t.engine.resolve_alert(alert.id).await.expect("alert resolved");
    assert!(resolved.resolved_at.is_some());
    assert!(t.engine.active_alerts().is_empty());
    assert!(t.engine.resolve_alert(alert.id).await.is_none());

    let audits = t.audit.records_of(events::ALERT_RESOLVED);
    assert_eq!(audits.len(), 1);
    assert_eq!(audits[0].details["component"], "broker");
}

#[tokio::test]
async fn test_unregistered_component_reports_unknown() {
    let t = build_engine_with(two_path_config(), vec![], |b| b);
    assert_eq!(t.engine.path_health("direct"), HealthStatus::Unknown);
    assert!(t.engine.health().check_component("direct").await.is_none());
}
