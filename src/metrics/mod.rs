//! # Metrics
//!
//! Prometheus recorder setup and the snapshot type pushed to metrics sinks.
//!
//! ## Metrics Emitted
//!
//! **Counters:**
//! - `dualroute_requests_total{operation, path, outcome}` - Requests by final outcome
//! - `dualroute_attempts_total{path, outcome}` - Attempts per path
//! - `dualroute_fallbacks_total{from, to}` - Failovers between paths
//! - `dualroute_circuit_transitions_total{scope, to}` - Circuit state changes
//! - `dualroute_optimizations_applied_total{parameter}` - Applied recommendations
//!
//! **Histograms:**
//! - `dualroute_attempt_duration_seconds{path}` - Attempt latency
//! - `dualroute_health_check_duration_seconds{component}` - Probe latency
//!
//! **Gauges (set by [`crate::sink::PrometheusMetricsSink`]):**
//! - `dualroute_path_success_rate{path}`, `dualroute_path_latency_p95_ms{path}`
//! - `dualroute_circuit_state{scope}` (0 closed, 1 half-open, 2 open)
//! - `dualroute_active_recommendations`, `dualroute_active_alerts`

pub mod types;

pub use types::*;

/// Sanitize a value for use as a Prometheus label.
///
/// Replaces anything outside `[a-zA-Z0-9_]` with an underscore and
/// prefixes an underscore when the first character is a digit.
pub fn sanitize_label(label: &str) -> String {
    let mut sanitized = label
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect::<String>();

    if sanitized.is_empty() || sanitized.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        sanitized.insert(0, '_');
    }

    sanitized
}

/// Initialize Prometheus metrics exporter with custom histogram buckets.
///
/// Buckets: [0.05, 0.1, 0.25, 0.5, 1, 2.5, 5, 10, 30, 60] seconds for attempt durations,
/// [0.01, 0.05, 0.1, 0.5, 1, 5] seconds for health probes.
///
/// Returns a PrometheusHandle that can be used to render metrics.
pub fn setup_metrics(
) -> Result<metrics_exporter_prometheus::PrometheusHandle, Box<dyn std::error::Error>> {
    use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};

    let attempt_buckets = &[0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0];
    let probe_buckets = &[0.01, 0.05, 0.1, 0.5, 1.0, 5.0];

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("dualroute_attempt_duration_seconds".to_string()),
            attempt_buckets,
        )?
        .set_buckets_for_metric(
            Matcher::Full("dualroute_health_check_duration_seconds".to_string()),
            probe_buckets,
        )?
        .install_recorder()?;

    Ok(handle)
}
