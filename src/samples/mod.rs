//! Performance sample store.
//!
//! Keeps a rolling window of execution outcomes per path. Windows are
//! append-only; samples leave only by pruning (age or per-path cap).

mod stats;

pub use stats::{percentile, PathStats};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use crate::config::SampleConfig;

/// One execution attempt as seen by the analyzer and optimizer.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceSample {
    pub path_id: String,
    pub operation: String,
    pub latency_ms: u64,
    pub success: bool,
    pub cost: f64,
    pub timestamp: DateTime<Utc>,
    /// Monotonic record time, used for age-based pruning
    #[serde(skip)]
    pub recorded_at: Instant,
    /// Error message of a failed attempt
    pub error: Option<String>,
    /// Whether this attempt was made after an earlier candidate failed
    pub fallback: bool,
}

impl PerformanceSample {
    pub fn success(
        path_id: impl Into<String>,
        operation: impl Into<String>,
        latency_ms: u64,
        cost: f64,
    ) -> Self {
        Self {
            path_id: path_id.into(),
            operation: operation.into(),
            latency_ms,
            success: true,
            cost,
            timestamp: Utc::now(),
            recorded_at: Instant::now(),
            error: None,
            fallback: false,
        }
    }

    pub fn failure(
        path_id: impl Into<String>,
        operation: impl Into<String>,
        latency_ms: u64,
        error: impl Into<String>,
    ) -> Self {
        Self {
            path_id: path_id.into(),
            operation: operation.into(),
            latency_ms,
            success: false,
            cost: 0.0,
            timestamp: Utc::now(),
            recorded_at: Instant::now(),
            error: Some(error.into()),
            fallback: false,
        }
    }

    pub fn as_fallback(mut self, fallback: bool) -> Self {
        self.fallback = fallback;
        self
    }
}

/// Thread-safe per-path rolling windows, shared by the executor, the
/// analyzer and the optimizer.
#[derive(Debug)]
pub struct PerformanceStore {
    windows: DashMap<String, RwLock<VecDeque<PerformanceSample>>>,
    config: SampleConfig,
}

impl PerformanceStore {
    pub fn new(config: SampleConfig) -> Self {
        Self {
            windows: DashMap::new(),
            config,
        }
    }

    /// Append a sample to its path's window.
    pub fn record(&self, sample: PerformanceSample) {
        let max = self.config.max_samples_per_path.max(1);
        if !self.windows.contains_key(&sample.path_id) {
            self.windows
                .entry(sample.path_id.clone())
                .or_insert_with(|| RwLock::new(VecDeque::new()));
        }

        if let Some(entry) = self.windows.get(&sample.path_id) {
            let mut window = write_window(entry.value(), entry.key());
            window.push_back(sample);
            while window.len() > max {
                window.pop_front();
            }
        }
    }

    /// Drop samples older than the retention period. Returns how many were removed.
    pub fn prune(&self) -> usize {
        self.prune_older_than(self.config.retention())
    }

    pub fn prune_older_than(&self, retention: Duration) -> usize {
        let now = Instant::now();
        let mut removed = 0;
        for entry in self.windows.iter() {
            let mut window = write_window(entry.value(), entry.key());
            while let Some(front) = window.front() {
                if now.saturating_duration_since(front.recorded_at) > retention {
                    window.pop_front();
                    removed += 1;
                } else {
                    break;
                }
            }
        }
        removed
    }

    /// Copy of one path's window, oldest first.
    pub fn samples(&self, path_id: &str) -> Vec<PerformanceSample> {
        self.windows
            .get(path_id)
            .map(|entry| read_window(entry.value(), entry.key()).iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn sample_count(&self, path_id: &str) -> usize {
        self.windows
            .get(path_id)
            .map(|entry| read_window(entry.value(), entry.key()).len())
            .unwrap_or(0)
    }

    /// Failed samples across all paths recorded within `window`.
    pub fn failures_within(&self, window: Duration) -> Vec<PerformanceSample> {
        let now = Instant::now();
        let mut failures = Vec::new();
        for entry in self.windows.iter() {
            let samples = read_window(entry.value(), entry.key());
            failures.extend(
                samples
                    .iter()
                    .filter(|s| !s.success && now.saturating_duration_since(s.recorded_at) <= window)
                    .cloned(),
            );
        }
        failures.sort_by_key(|s| s.recorded_at);
        failures
    }

    pub fn stats(&self, path_id: &str) -> Option<PathStats> {
        PathStats::compute(path_id, &self.samples(path_id))
    }

    /// Stats for every path with at least `min_samples` samples, sorted by path id.
    pub fn all_stats(&self, min_samples: usize) -> Vec<PathStats> {
        let mut ids: Vec<String> = self.windows.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids.iter()
            .filter_map(|id| self.stats(id))
            .filter(|stats| stats.sample_count >= min_samples)
            .collect()
    }

    pub fn config(&self) -> &SampleConfig {
        &self.config
    }
}

fn read_window<'a>(
    lock: &'a RwLock<VecDeque<PerformanceSample>>,
    path_id: &str,
) -> RwLockReadGuard<'a, VecDeque<PerformanceSample>> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!(path_id, "Sample window lock poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

fn write_window<'a>(
    lock: &'a RwLock<VecDeque<PerformanceSample>>,
    path_id: &str,
) -> RwLockWriteGuard<'a, VecDeque<PerformanceSample>> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!(path_id, "Sample window lock poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> PerformanceStore {
        PerformanceStore::new(SampleConfig::default())
    }

    #[test]
    fn unknown_path_is_empty() {
        let store = store();
        assert!(store.samples("ghost").is_empty());
        assert!(store.stats("ghost").is_none());
    }

    #[test]
    fn record_and_compute_stats() {
        let store = store();
        store.record(PerformanceSample::success("direct", "chat", 100, 0.02));
        store.record(PerformanceSample::success("direct", "chat", 300, 0.04).as_fallback(true));
        store.record(PerformanceSample::failure("direct", "chat", 200, "timeout"));
        store.record(PerformanceSample::success("direct", "chat", 400, 0.0));

        let stats = store.stats("direct").unwrap();
        assert_eq!(stats.sample_count, 4);
        assert_eq!(stats.p50_ms, 200);
        assert_eq!(stats.p95_ms, 400);
        assert!((stats.success_rate - 0.75).abs() < 1e-9);
        assert!((stats.fallback_rate - 0.25).abs() < 1e-9);
        assert!((stats.avg_cost - 0.015).abs() < 1e-9);
    }

    #[test]
    fn window_is_capped_per_path() {
        let store = PerformanceStore::new(SampleConfig {
            max_samples_per_path: 3,
            ..Default::default()
        });
        for latency in 1..=5 {
            store.record(PerformanceSample::success("direct", "chat", latency, 0.0));
        }
        let latencies: Vec<u64> = store.samples("direct").iter().map(|s| s.latency_ms).collect();
        assert_eq!(latencies, vec![3, 4, 5]);
    }

    #[test]
    fn prune_removes_old_samples() {
        let store = store();
        store.record(PerformanceSample::success("direct", "chat", 100, 0.0));
        std::thread::sleep(Duration::from_millis(20));
        store.record(PerformanceSample::success("direct", "chat", 200, 0.0));

        let removed = store.prune_older_than(Duration::from_millis(10));
        assert_eq!(removed, 1);
        assert_eq!(store.sample_count("direct"), 1);
    }

    #[test]
    fn failures_within_spans_paths() {
        let store = store();
        store.record(PerformanceSample::failure("direct", "chat", 100, "timeout"));
        store.record(PerformanceSample::success("direct", "chat", 100, 0.0));
        store.record(PerformanceSample::failure("broker", "embed", 100, "HTTP 503"));

        let failures = store.failures_within(Duration::from_secs(60));
        assert_eq!(failures.len(), 2);
        assert!(failures.iter().all(|s| !s.success));
    }

    #[test]
    fn all_stats_respects_min_samples() {
        let store = store();
        for _ in 0..5 {
            store.record(PerformanceSample::success("direct", "chat", 100, 0.0));
        }
        store.record(PerformanceSample::success("broker", "chat", 100, 0.0));

        let stats = store.all_stats(3);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].path_id, "direct");
    }
}
