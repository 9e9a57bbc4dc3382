//! In-memory sinks, useful for tests and embedding.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Mutex, MutexGuard};

use super::{AlertSink, AuditSink, MetricsSink, SinkError};
use crate::health::AlertEvent;
use crate::metrics::MetricsSnapshot;

/// One recorded audit event
#[derive(Debug, Clone, PartialEq)]
pub struct AuditRecord {
    pub event_type: String,
    pub details: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

/// Keeps every audit event in memory.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        lock(&self.records).clone()
    }

    pub fn records_of(&self, event_type: &str) -> Vec<AuditRecord> {
        lock(&self.records)
            .iter()
            .filter(|r| r.event_type == event_type)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.records).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(
        &self,
        event_type: &str,
        details: serde_json::Value,
        timestamp: DateTime<Utc>,
    ) -> Result<(), SinkError> {
        lock(&self.records).push(AuditRecord {
            event_type: event_type.to_string(),
            details,
            timestamp,
        });
        Ok(())
    }
}

/// Keeps every alert event in memory.
#[derive(Debug, Default)]
pub struct MemoryAlertSink {
    events: Mutex<Vec<AlertEvent>>,
}

impl MemoryAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AlertEvent> {
        lock(&self.events).clone()
    }
}

#[async_trait]
impl AlertSink for MemoryAlertSink {
    async fn notify(&self, event: &AlertEvent) -> Result<(), SinkError> {
        lock(&self.events).push(event.clone());
        Ok(())
    }
}

/// Keeps every pushed metrics snapshot in memory.
#[derive(Debug, Default)]
pub struct MemoryMetricsSink {
    snapshots: Mutex<Vec<MetricsSnapshot>>,
}

impl MemoryMetricsSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshots(&self) -> Vec<MetricsSnapshot> {
        lock(&self.snapshots).clone()
    }

    pub fn latest(&self) -> Option<MetricsSnapshot> {
        lock(&self.snapshots).last().cloned()
    }
}

#[async_trait]
impl MetricsSink for MemoryMetricsSink {
    async fn push(&self, snapshot: &MetricsSnapshot) -> Result<(), SinkError> {
        lock(&self.snapshots).push(snapshot.clone());
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("Memory sink lock poisoned, recovering");
            poisoned.into_inner()
        }
    }
}
