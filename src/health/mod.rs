//! Health monitoring module.
//!
//! Components register a [`HealthCheck`]; the monitor probes each one on
//! its own interval with a per-attempt timeout and retries, keeps the
//! latest [`HealthRecord`], and raises or resolves alerts as components
//! cross status boundaries.

mod alert;
mod check;
mod config;
mod error;
mod state;


pub use alert::{Alert, AlertEvent, AlertEventKind, AlertSeverity, RESOLVED_HISTORY_LIMIT};
pub use check::{FnHealthCheck, HealthCheck};
pub use config::*;
pub use error::*;
pub use state::*;

use chrono::Utc;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::sink::{self, AlertSink, AuditSink};
use alert::AlertBook;

struct RegisteredComponent {
    check: Arc<dyn HealthCheck>,
    settings: ComponentCheckConfig,
}

/// Background service that periodically probes registered components.
pub struct HealthMonitor {
    config: HealthConfig,
    components: DashMap<String, RegisteredComponent>,
    records: DashMap<String, HealthRecord>,
    alerts: AlertBook,
    alert_sink: Arc<dyn AlertSink>,
    audit_sink: Arc<dyn AuditSink>,
}

/// Handle over the per-component check tasks.
pub struct HealthMonitorHandle {
    cancel_token: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl HealthMonitorHandle {
    /// Number of running check loops.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Cancel every check loop and wait for all of them to finish.
    pub async fn shutdown(self) {
        self.cancel_token.cancel();
        for result in futures::future::join_all(self.tasks).await {
            if let Err(e) = result {
                tracing::warn!(error = %e, "Health check task ended abnormally");
            }
        }
    }
}

impl HealthMonitor {
    pub fn new(
        config: HealthConfig,
        alert_sink: Arc<dyn AlertSink>,
        audit_sink: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            config,
            components: DashMap::new(),
            records: DashMap::new(),
            alerts: AlertBook::default(),
            alert_sink,
            audit_sink,
        }
    }

    pub fn config(&self) -> &HealthConfig {
        &self.config
    }

    /// Register (or replace) a component's probe.
    pub fn register(&self, name: impl Into<String>, check: Arc<dyn HealthCheck>) {
        let name = name.into();
        let settings = self.config.settings_for(&name);
        tracing::debug!(
            component = %name,
            interval_ms = settings.interval.as_millis() as u64,
            timeout_ms = settings.timeout.as_millis() as u64,
            retries = settings.retries,
            enabled = settings.enabled,
            "Health check registered"
        );
        self.components
            .insert(name, RegisteredComponent { check, settings });
    }

    /// Remove a component and its record. Returns whether it was registered.
    pub fn deregister(&self, name: &str) -> bool {
        self.records.remove(name);
        self.components.remove(name).is_some()
    }

    /// Registered component names, sorted.
    pub fn component_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.components.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn record(&self, name: &str) -> Option<HealthRecord> {
        self.records.get(name).map(|r| r.clone())
    }

    /// Records of registered components, sorted by name. Components not yet
    /// checked are absent.
    pub fn records(&self) -> BTreeMap<String, HealthRecord> {
        self.components
            .iter()
            .filter_map(|entry| {
                let name = entry.key();
                self.record(name).map(|record| (name.clone(), record))
            })
            .collect()
    }

    /// Current status; `Unknown` for unregistered or unchecked components.
    pub fn status(&self, name: &str) -> HealthStatus {
        self.records
            .get(name)
            .map(|r| r.status)
            .unwrap_or(HealthStatus::Unknown)
    }

    /// Worst-of aggregate over enabled components.
    pub fn system_health(&self) -> HealthStatus {
        let statuses: Vec<HealthStatus> = self
            .components
            .iter()
            .filter(|e| e.value().settings.enabled)
            .map(|e| self.status(e.key()))
            .collect();
        aggregate(&statuses)
    }

    pub fn active_alerts(&self) -> Vec<Alert> {
        self.alerts.active()
    }

    /// Recently resolved alerts, oldest first.
    pub fn resolved_alerts(&self) -> Vec<Alert> {
        self.alerts.resolved()
    }

    /// Resolve an alert on operator request.
    pub async fn resolve_alert(&self, id: Uuid) -> Option<Alert> {
        let alert = self.alerts.resolve(id)?;
        tracing::info!(alert_id = %id, component = %alert.component, "Alert resolved by operator");
        sink::record_audit(
            self.audit_sink.as_ref(),
            sink::events::ALERT_RESOLVED,
            serde_json::json!({
                "alert_id": id.to_string(),
                "component": alert.component,
                "severity": alert.severity.to_string(),
                "resolved_by": "operator",
            }),
        )
        .await;
        sink::notify_alert(
            self.alert_sink.as_ref(),
            &AlertEvent {
                kind: AlertEventKind::Resolved,
                alert: alert.clone(),
            },
        )
        .await;
        Some(alert)
    }

    /// Probe one component now and apply the result.
    ///
    /// Returns None when the component is not registered.
    pub async fn check_component(&self, name: &str) -> Option<HealthRecord> {
        let (check, settings) = {
            let entry = self.components.get(name)?;
            (Arc::clone(&entry.check), entry.settings)
        };

        let start = Instant::now();
        let outcome = run_probe(name, check, settings).await;
        let elapsed = start.elapsed();

        metrics::histogram!("dualroute_health_check_duration_seconds",
            "component" => crate::metrics::sanitize_label(name)
        )
        .record(elapsed.as_secs_f64());

        Some(self.apply_outcome(name, outcome, elapsed).await)
    }

    /// Probe every enabled component once, concurrently.
    pub async fn check_all(&self) -> Vec<(String, HealthRecord)> {
        let names: Vec<String> = self
            .components
            .iter()
            .filter(|e| e.value().settings.enabled)
            .map(|e| e.key().clone())
            .collect();

        let checks = names.iter().map(|name| self.check_component(name));
        let records = futures::future::join_all(checks).await;

        let mut results: Vec<(String, HealthRecord)> = names
            .into_iter()
            .zip(records)
            .filter_map(|(name, record)| record.map(|r| (name, r)))
            .collect();
        results.sort_by(|a, b| a.0.cmp(&b.0));
        results
    }

    async fn apply_outcome(
        &self,
        name: &str,
        outcome: Result<HealthProbe, HealthCheckError>,
        elapsed: Duration,
    ) -> HealthRecord {
        let previous = self.records.get(name).map(|r| r.clone());
        let previous_failures = previous.as_ref().map_or(0, |r| r.consecutive_failures);

        let record = match outcome {
            Ok(probe) => HealthRecord {
                status: probe.status.into(),
                last_check: Utc::now(),
                response_time_ms: elapsed.as_millis() as u64,
                error: probe.detail.map(|d| crate::logging::truncate_detail(&d)),
                consecutive_failures: 0,
            },
            Err(e) => HealthRecord {
                status: HealthStatus::Critical,
                last_check: Utc::now(),
                response_time_ms: elapsed.as_millis() as u64,
                error: Some(crate::logging::truncate_detail(&e.to_string())),
                consecutive_failures: previous_failures.saturating_add(1),
            },
        };

        let previous_status = previous.map(|r| r.status).unwrap_or(HealthStatus::Unknown);
        if previous_status != record.status {
            tracing::info!(
                component = name,
                old_status = %previous_status,
                new_status = %record.status,
                "Component status changed"
            );
        }

        self.records.insert(name.to_string(), record.clone());

        let message = match &record.error {
            Some(detail) => format!("{} is {}: {}", name, record.status, detail),
            None => format!("{} is {}", name, record.status),
        };
        if let Some(event) = self.alerts.observe(name, record.status, &message) {
            sink::notify_alert(self.alert_sink.as_ref(), &event).await;
        }

        record
    }

    /// Spawn one check loop per enabled component.
    ///
    /// Components registered after this call are not scheduled.
    pub fn start(self: &Arc<Self>, cancel_token: CancellationToken) -> HealthMonitorHandle {
        let mut tasks = Vec::new();

        for entry in self.components.iter() {
            let settings = entry.value().settings;
            if !settings.enabled {
                continue;
            }
            let name = entry.key().clone();
            let monitor = Arc::clone(self);
            let cancel = cancel_token.clone();

            tasks.push(tokio::spawn(async move {
                let mut interval = tokio::time::interval(settings.interval);
                interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

                tracing::info!(
                    component = %name,
                    interval_ms = settings.interval.as_millis() as u64,
                    "Health check loop started"
                );

                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            tracing::info!(component = %name, "Health check loop shutting down");
                            break;
                        }
                        _ = interval.tick() => {
                            if let Some(record) = monitor.check_component(&name).await {
                                tracing::debug!(
                                    component = %name,
                                    status = %record.status,
                                    response_time_ms = record.response_time_ms,
                                    "Health check completed"
                                );
                            }
                        }
                    }
                }
            }));
        }

        HealthMonitorHandle {
            cancel_token,
            tasks,
        }
    }
}

/// Run up to `1 + retries` attempts, each bounded by the timeout.
async fn run_probe(
    name: &str,
    check: Arc<dyn HealthCheck>,
    settings: ComponentCheckConfig,
) -> Result<HealthProbe, HealthCheckError> {
    let attempts = settings.retries.saturating_add(1);
    let mut last_error = HealthCheckError::Failed("no attempt made".to_string());

    for attempt in 1..=attempts {
        let check = Arc::clone(&check);
        // Spawned so a panicking probe surfaces as a JoinError instead of unwinding here
        let mut task = tokio::spawn(async move { check.check().await });

        let result = match tokio::time::timeout(settings.timeout, &mut task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(HealthCheckError::Panicked(join_error.to_string())),
            Err(_) => {
                task.abort();
                Err(HealthCheckError::Timeout(settings.timeout.as_millis() as u64))
            }
        };

        match result {
            Ok(probe) => return Ok(probe),
            Err(e) => {
                tracing::debug!(
                    component = name,
                    attempt,
                    attempts,
                    error = %e,
                    "Health probe attempt failed"
                );
                last_error = e;
            }
        }
    }

    Err(last_error)
}

/// Worst-of aggregation: unhealthy > degraded > unknown > healthy.
///
/// Critical components count as unhealthy; an empty set is unknown.
pub fn aggregate(statuses: &[HealthStatus]) -> HealthStatus {
    if statuses.is_empty() {
        return HealthStatus::Unknown;
    }
    if statuses
        .iter()
        .any(|s| matches!(s, HealthStatus::Unhealthy | HealthStatus::Critical))
    {
        return HealthStatus::Unhealthy;
    }
    if statuses.contains(&HealthStatus::Degraded) {
        return HealthStatus::Degraded;
    }
    if statuses.contains(&HealthStatus::Unknown) {
        return HealthStatus::Unknown;
    }
    HealthStatus::Healthy
}
