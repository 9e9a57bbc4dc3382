//! Efficiency optimizer driven through the engine.

mod common;

use common::{build_engine, two_path_config, ScriptedClient};
use dualroute::circuit::CircuitScope;
use dualroute::optimizer::TuningTarget;
use dualroute::samples::PerformanceSample;
use dualroute::sink::events;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn record(t: &common::TestEngine, path: &str, successes: usize, failures: usize) {
    for _ in 0..successes {
        t.engine
            .samples()
            .record(PerformanceSample::success(path, "chat", 180, 0.5));
    }
    for _ in 0..failures {
        t.engine.samples().record(PerformanceSample::failure(
            path,
            "chat",
            40,
            "network error: connection refused",
        ));
    }
}

#[tokio::test]
async fn test_cycle_is_noop_below_min_samples() {
    let t = build_engine(two_path_config(), vec![]);
    record(&t, "direct", 4, 4);
    record(&t, "broker", 8, 0);

    let report = t.engine.run_optimization_cycle().await;

    assert!(report.observed_paths.is_empty());
    assert!(report.recommendations.is_empty());
    assert!(report.applied.is_empty());
    assert_eq!(t.engine.circuits().settings(&CircuitScope::path("direct")).failure_threshold, 5);
    assert!(t.engine.registry().get_path("direct").unwrap().observed_success_rate.is_none());
    assert!(t.audit.records_of(events::OPTIMIZATION_APPLIED).is_empty());
}

#[tokio::test]
async fn test_cycle_tightens_failing_path() {
    let t = build_engine(two_path_config(), vec![]);
    record(&t, "direct", 10, 10);
    record(&t, "broker", 20, 0);

    let report = t.engine.run_optimization_cycle().await;

    assert_eq!(report.observed_paths.len(), 2);
    let change = report
        .applied
        .iter()
        .find(|c| c.target == TuningTarget::FailureThreshold)
        .expect("threshold change applied");
    assert_eq!(change.path_id.as_deref(), Some("direct"));
    assert_eq!(change.old_value, 5.0);
    assert_eq!(change.new_value, 4.0);
    assert_eq!(t.engine.circuits().settings(&CircuitScope::path("direct")).failure_threshold, 4);
    assert_eq!(t.engine.circuits().settings(&CircuitScope::path("broker")).failure_threshold, 5);

    let direct = t.engine.registry().get_path("direct").unwrap();
    assert_eq!(direct.observed_success_rate, Some(0.5));

    let status = t.engine.optimization_status();
    assert_eq!(status.total_applied, report.applied.len() as u64);
    assert!(status.last_cycle.is_some());
    assert_eq!(
        t.audit.records_of(events::OPTIMIZATION_APPLIED).len(),
        report.applied.len()
    );
    assert!(t.metrics.latest().is_some());
}

#[tokio::test]
async fn test_failure_patterns_reported_from_samples() {
    let t = build_engine(two_path_config(), vec![]);
    record(&t, "direct", 0, 6);

    let patterns = t.engine.failure_patterns();
    assert_eq!(patterns.len(), 1);
    assert_eq!(patterns[0].occurrences, 6);
    assert_eq!(patterns[0].affected_paths, vec!["direct".to_string()]);
    assert!(patterns[0].confidence > 0.0 && patterns[0].confidence <= 1.0);
}

#[tokio::test]
async fn test_background_loop_runs_cycles() {
    let mut config = two_path_config();
    config.optimizer.enabled = true;
    config.optimizer.interval_seconds = 1;
    let t = build_engine(
        config,
        vec![
            ("direct", ScriptedClient::healthy("direct")),
            ("broker", ScriptedClient::healthy("broker")),
        ],
    );
    record(&t, "direct", 10, 10);

    let handle = t.engine.start(CancellationToken::new());
    assert!(handle.is_optimizer_running());
    assert!(!handle.is_health_running());

    tokio::time::sleep(Duration::from_millis(1400)).await;
    assert!(t.engine.optimization_status().last_cycle.is_some());

    handle.shutdown().await;
}
