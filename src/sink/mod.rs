//! Outbound collaborator interfaces: audit, alert and metrics sinks.
//!
//! The engine never fails an operation because a sink failed; the
//! `record_audit`, `notify_alert` and `push_metrics` helpers log sink
//! errors at `warn` and swallow them.

mod error;
mod memory;
mod prometheus;
mod tracing_sinks;

pub use error::SinkError;
pub use memory::{AuditRecord, MemoryAlertSink, MemoryAuditSink, MemoryMetricsSink};
pub use prometheus::{NullMetricsSink, PrometheusMetricsSink};
pub use tracing_sinks::{TracingAlertSink, TracingAuditSink};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::health::AlertEvent;
use crate::metrics::MetricsSnapshot;

/// Audit event types emitted by the engine
pub mod events {
    pub const ROUTING_DECISION: &str = "routing_decision";
    pub const CIRCUIT_TRANSITION: &str = "circuit_transition";
    pub const OPTIMIZATION_APPLIED: &str = "optimization_applied";
    pub const ALERT_RESOLVED: &str = "alert_resolved";
}

/// Append-only audit trail.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(
        &self,
        event_type: &str,
        details: serde_json::Value,
        timestamp: DateTime<Utc>,
    ) -> Result<(), SinkError>;
}

/// Receives alert lifecycle events.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn notify(&self, event: &AlertEvent) -> Result<(), SinkError>;
}

/// Receives periodic metrics snapshots.
#[async_trait]
pub trait MetricsSink: Send + Sync {
    async fn push(&self, snapshot: &MetricsSnapshot) -> Result<(), SinkError>;
}

/// Record an audit event, logging (not propagating) sink failures.
pub async fn record_audit(sink: &dyn AuditSink, event_type: &str, details: serde_json::Value) {
    if let Err(e) = sink.record(event_type, details, Utc::now()).await {
        tracing::warn!(event_type, error = %e, "Audit sink failed, event dropped");
    }
}

/// Deliver an alert event, logging (not propagating) sink failures.
pub async fn notify_alert(sink: &dyn AlertSink, event: &AlertEvent) {
    if let Err(e) = sink.notify(event).await {
        tracing::warn!(
            alert_id = %event.alert.id,
            component = %event.alert.component,
            error = %e,
            "Alert sink failed, notification dropped"
        );
    }
}

/// Push a metrics snapshot, logging (not propagating) sink failures.
pub async fn push_metrics(sink: &dyn MetricsSink, snapshot: &MetricsSnapshot) {
    if let Err(e) = sink.push(snapshot).await {
        tracing::warn!(error = %e, "Metrics sink failed, snapshot dropped");
    }
}
