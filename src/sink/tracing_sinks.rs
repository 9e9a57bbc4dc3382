//! Sinks that write to the tracing subscriber.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{AlertSink, AuditSink, SinkError};
use crate::health::{AlertEvent, AlertEventKind, AlertSeverity};

/// Writes audit events as structured `info` logs on the `dualroute::audit` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(
        &self,
        event_type: &str,
        details: serde_json::Value,
        timestamp: DateTime<Utc>,
    ) -> Result<(), SinkError> {
        tracing::info!(
            target: "dualroute::audit",
            event_type,
            timestamp = %timestamp.to_rfc3339(),
            details = %details,
            "Audit event"
        );
        Ok(())
    }
}

/// Logs alert events; severity maps onto the log level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAlertSink;

#[async_trait]
impl AlertSink for TracingAlertSink {
    async fn notify(&self, event: &AlertEvent) -> Result<(), SinkError> {
        let alert = &event.alert;
        match (event.kind, alert.severity) {
            (AlertEventKind::Resolved, _) => tracing::info!(
                target: "dualroute::alert",
                alert_id = %alert.id,
                component = %alert.component,
                "Alert resolved"
            ),
            (kind, AlertSeverity::Warning) => tracing::warn!(
                target: "dualroute::alert",
                alert_id = %alert.id,
                component = %alert.component,
                kind = %kind,
                message = %alert.message,
                "Alert"
            ),
            (kind, _) => tracing::error!(
                target: "dualroute::alert",
                alert_id = %alert.id,
                component = %alert.component,
                severity = %alert.severity,
                kind = %kind,
                message = %alert.message,
                "Alert"
            ),
        }
        Ok(())
    }
}
