//! Aggregates computed over a path's sample window.

use serde::Serialize;

use super::PerformanceSample;

/// Per-path aggregates used by the optimizer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathStats {
    pub path_id: String,
    pub sample_count: usize,
    pub p50_ms: u64,
    pub p95_ms: u64,
    pub p99_ms: u64,
    /// Successful samples / all samples
    pub success_rate: f64,
    /// Samples served as a fallback / all samples
    pub fallback_rate: f64,
    pub avg_cost: f64,
}

impl PathStats {
    /// Returns None for an empty window.
    pub fn compute(path_id: &str, samples: &[PerformanceSample]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let mut latencies: Vec<u64> = samples.iter().map(|s| s.latency_ms).collect();
        latencies.sort_unstable();

        let n = samples.len() as f64;
        let successes = samples.iter().filter(|s| s.success).count() as f64;
        let fallbacks = samples.iter().filter(|s| s.fallback).count() as f64;
        let total_cost: f64 = samples.iter().map(|s| s.cost).sum();

        Some(Self {
            path_id: path_id.to_string(),
            sample_count: samples.len(),
            p50_ms: percentile(&latencies, 50.0),
            p95_ms: percentile(&latencies, 95.0),
            p99_ms: percentile(&latencies, 99.0),
            success_rate: successes / n,
            fallback_rate: fallbacks / n,
            avg_cost: total_cost / n,
        })
    }
}

/// Nearest-rank percentile over a sorted slice. Empty input yields 0.
pub fn percentile(sorted: &[u64], pct: f64) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    let rank = ((pct / 100.0) * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentile_nearest_rank() {
        let values: Vec<u64> = (1..=100).collect();
        assert_eq!(percentile(&values, 50.0), 50);
        assert_eq!(percentile(&values, 95.0), 95);
        assert_eq!(percentile(&values, 99.0), 99);
        assert_eq!(percentile(&values, 100.0), 100);
    }

    #[test]
    fn percentile_small_inputs() {
        assert_eq!(percentile(&[], 95.0), 0);
        assert_eq!(percentile(&[7], 50.0), 7);
        assert_eq!(percentile(&[1, 9], 95.0), 9);
        assert_eq!(percentile(&[1, 9], 0.0), 1);
    }

    #[test]
    fn empty_window_has_no_stats() {
        assert!(PathStats::compute("direct", &[]).is_none());
    }
}
