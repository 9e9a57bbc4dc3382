//! Alert lifecycle bookkeeping.

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::HealthStatus;

/// Resolved alerts kept for inspection
pub const RESOLVED_HISTORY_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Warning,
    Error,
    Critical,
}

impl AlertSeverity {
    /// Severity raised for a status, None when the status does not alert.
    pub fn for_status(status: HealthStatus) -> Option<Self> {
        match status {
            HealthStatus::Degraded => Some(AlertSeverity::Warning),
            HealthStatus::Unhealthy => Some(AlertSeverity::Error),
            HealthStatus::Critical => Some(AlertSeverity::Critical),
            HealthStatus::Healthy | HealthStatus::Unknown => None,
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertSeverity::Warning => write!(f, "warning"),
            AlertSeverity::Error => write!(f, "error"),
            AlertSeverity::Critical => write!(f, "critical"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub id: Uuid,
    pub component: String,
    pub severity: AlertSeverity,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertEventKind {
    Created,
    Escalated,
    Resolved,
}

impl fmt::Display for AlertEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertEventKind::Created => write!(f, "created"),
            AlertEventKind::Escalated => write!(f, "escalated"),
            AlertEventKind::Resolved => write!(f, "resolved"),
        }
    }
}

/// Delivered to the alert sink
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertEvent {
    pub kind: AlertEventKind,
    pub alert: Alert,
}

/// Active alerts (at most one per component) and bounded resolved history.
#[derive(Debug, Default)]
pub(crate) struct AlertBook {
    active: DashMap<String, Alert>,
    resolved: Mutex<VecDeque<Alert>>,
}

impl AlertBook {
    /// Fold a new component status into the alert table.
    pub(crate) fn observe(
        &self,
        component: &str,
        status: HealthStatus,
        message: &str,
    ) -> Option<AlertEvent> {
        match AlertSeverity::for_status(status) {
            Some(severity) => match self.active.entry(component.to_string()) {
                Entry::Occupied(mut entry) => {
                    let alert = entry.get_mut();
                    if severity == alert.severity {
                        return None;
                    }
                    let escalated = severity > alert.severity;
                    alert.severity = severity;
                    alert.message = message.to_string();
                    escalated.then(|| AlertEvent {
                        kind: AlertEventKind::Escalated,
                        alert: alert.clone(),
                    })
                }
                Entry::Vacant(entry) => {
                    let alert = Alert {
                        id: Uuid::new_v4(),
                        component: component.to_string(),
                        severity,
                        message: message.to_string(),
                        created_at: Utc::now(),
                        resolved_at: None,
                    };
                    entry.insert(alert.clone());
                    Some(AlertEvent {
                        kind: AlertEventKind::Created,
                        alert,
                    })
                }
            },
            None if status == HealthStatus::Healthy => {
                let (_, alert) = self.active.remove(component)?;
                Some(AlertEvent {
                    kind: AlertEventKind::Resolved,
                    alert: self.archive(alert),
                })
            }
            None => None,
        }
    }

    /// Resolve an alert by id, regardless of the component's status.
    pub(crate) fn resolve(&self, id: Uuid) -> Option<Alert> {
        let component = self
            .active
            .iter()
            .find(|entry| entry.value().id == id)
            .map(|entry| entry.key().clone())?;
        let (_, alert) = self.active.remove_if(&component, |_, alert| alert.id == id)?;
        Some(self.archive(alert))
    }

    pub(crate) fn active(&self) -> Vec<Alert> {
        let mut alerts: Vec<Alert> = self.active.iter().map(|e| e.value().clone()).collect();
        alerts.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        alerts
    }

    pub(crate) fn resolved(&self) -> Vec<Alert> {
        self.lock_resolved().iter().cloned().collect()
    }

    fn archive(&self, mut alert: Alert) -> Alert {
        alert.resolved_at = Some(Utc::now());
        let mut history = self.lock_resolved();
        history.push_back(alert.clone());
        while history.len() > RESOLVED_HISTORY_LIMIT {
            history.pop_front();
        }
        alert
    }

    fn lock_resolved(&self) -> MutexGuard<'_, VecDeque<Alert>> {
        match self.resolved.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("Alert history lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}
