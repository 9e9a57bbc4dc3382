//! Metrics sinks.

use async_trait::async_trait;

use super::{MetricsSink, SinkError};
use crate::circuit::CircuitState;
use crate::metrics::{sanitize_label, MetricsSnapshot};

/// Publishes snapshots as gauges through the `metrics` facade.
///
/// Whatever recorder is installed (see [`crate::metrics::setup_metrics`])
/// exposes them; with no recorder the calls are no-ops.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrometheusMetricsSink;

#[async_trait]
impl MetricsSink for PrometheusMetricsSink {
    async fn push(&self, snapshot: &MetricsSnapshot) -> Result<(), SinkError> {
        for stats in &snapshot.paths {
            let path = sanitize_label(&stats.path_id);
            metrics::gauge!("dualroute_path_success_rate", "path" => path.clone())
                .set(stats.success_rate);
            metrics::gauge!("dualroute_path_latency_p95_ms", "path" => path.clone())
                .set(stats.p95_ms as f64);
            metrics::gauge!("dualroute_path_fallback_rate", "path" => path.clone())
                .set(stats.fallback_rate);
            metrics::gauge!("dualroute_path_samples", "path" => path)
                .set(stats.sample_count as f64);
        }

        for circuit in &snapshot.circuits {
            let value = match circuit.state {
                CircuitState::Closed => 0.0,
                CircuitState::HalfOpen => 1.0,
                CircuitState::Open => 2.0,
            };
            metrics::gauge!("dualroute_circuit_state", "scope" => sanitize_label(&circuit.scope))
                .set(value);
        }

        metrics::gauge!("dualroute_active_recommendations")
            .set(snapshot.active_recommendations as f64);
        metrics::gauge!("dualroute_active_alerts").set(snapshot.active_alerts as f64);
        Ok(())
    }
}

/// Discards every snapshot.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullMetricsSink;

#[async_trait]
impl MetricsSink for NullMetricsSink {
    async fn push(&self, _snapshot: &MetricsSnapshot) -> Result<(), SinkError> {
        Ok(())
    }
}
