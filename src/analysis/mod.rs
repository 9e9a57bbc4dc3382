//! Failure pattern analysis.
//!
//! Mines the failed samples of the recent window for recurring
//! (operation, error category) signatures. Output is advisory only: the
//! optimizer may turn high-confidence patterns into recommendations, but
//! nothing here changes engine state.

mod category;

pub use category::{signature, ErrorCategory};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::time::Instant;

use crate::config::AnalyzerConfig;
use crate::samples::{PerformanceSample, PerformanceStore};

/// Share of confidence driven by occurrence count; the rest is recency.
const COUNT_WEIGHT: f64 = 0.6;
const RECENCY_WEIGHT: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl PatternSeverity {
    fn bump(self) -> Self {
        match self {
            PatternSeverity::Low => PatternSeverity::Medium,
            PatternSeverity::Medium => PatternSeverity::High,
            PatternSeverity::High | PatternSeverity::Critical => PatternSeverity::Critical,
        }
    }
}

impl fmt::Display for PatternSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternSeverity::Low => write!(f, "low"),
            PatternSeverity::Medium => write!(f, "medium"),
            PatternSeverity::High => write!(f, "high"),
            PatternSeverity::Critical => write!(f, "critical"),
        }
    }
}

/// A recurring failure signature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailurePattern {
    pub operation: String,
    pub category: ErrorCategory,
    /// Most frequent normalized message in the group
    pub signature: String,
    pub severity: PatternSeverity,
    pub occurrences: usize,
    pub affected_paths: Vec<String>,
    pub mean_latency_ms: u64,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    /// 0.0–1.0
    pub confidence: f64,
    pub suggested_action: String,
}

pub struct FailureAnalyzer {
    config: AnalyzerConfig,
}

impl FailureAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze the failures recorded in the store within the configured window.
    pub fn analyze_store(&self, store: &PerformanceStore) -> Vec<FailurePattern> {
        self.analyze(&store.failures_within(self.config.window()))
    }

    /// Group failures into patterns, best first.
    ///
    /// Returns nothing until at least `min_failures` failures are present.
    pub fn analyze(&self, samples: &[PerformanceSample]) -> Vec<FailurePattern> {
        let failures: Vec<&PerformanceSample> = samples.iter().filter(|s| !s.success).collect();
        if failures.len() < self.config.min_failures.max(1) {
            tracing::trace!(
                failures = failures.len(),
                min_failures = self.config.min_failures,
                "Not enough failures for pattern analysis"
            );
            return Vec::new();
        }

        let mut groups: BTreeMap<(String, ErrorCategory), Vec<&PerformanceSample>> = BTreeMap::new();
        for sample in failures {
            let message = sample.error.as_deref().unwrap_or("");
            groups
                .entry((sample.operation.clone(), ErrorCategory::classify(message)))
                .or_default()
                .push(sample);
        }

        let now = Instant::now();
        let mut patterns: Vec<FailurePattern> = groups
            .into_iter()
            .filter_map(|((operation, category), group)| {
                self.build_pattern(operation, category, &group, now)
            })
            .collect();

        patterns.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| b.occurrences.cmp(&a.occurrences))
                .then_with(|| a.operation.cmp(&b.operation))
                .then_with(|| a.category.cmp(&b.category))
        });

        if !patterns.is_empty() {
            tracing::debug!(patterns = patterns.len(), "Failure patterns detected");
        }
        patterns
    }

    fn build_pattern(
        &self,
        operation: String,
        category: ErrorCategory,
        group: &[&PerformanceSample],
        now: Instant,
    ) -> Option<FailurePattern> {
        let latest = group.iter().max_by_key(|s| s.recorded_at)?;
        let first_seen = group.iter().map(|s| s.timestamp).min()?;
        let last_seen = group.iter().map(|s| s.timestamp).max()?;

        let occurrences = group.len();
        let mean_latency_ms = group.iter().map(|s| s.latency_ms).sum::<u64>() / occurrences as u64;

        let affected_paths: Vec<String> = group
            .iter()
            .map(|s| s.path_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut signatures: HashMap<String, usize> = HashMap::new();
        for sample in group {
            *signatures
                .entry(signature(sample.error.as_deref().unwrap_or("")))
                .or_default() += 1;
        }
        let signature = signatures
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
            .map(|(sig, _)| sig)
            .unwrap_or_default();

        let age_secs = now.saturating_duration_since(latest.recorded_at).as_secs_f64();
        let confidence = self.confidence(occurrences, age_secs);

        let mut severity = base_severity(category);
        if occurrences >= self.config.saturation_count {
            severity = severity.bump();
        }
        if category != ErrorCategory::Timeout && mean_latency_ms >= self.config.slow_latency_ms {
            severity = severity.bump();
        }

        Some(FailurePattern {
            operation,
            category,
            signature,
            severity,
            occurrences,
            affected_paths,
            mean_latency_ms,
            first_seen,
            last_seen,
            confidence,
            suggested_action: category.suggested_action().to_string(),
        })
    }

    /// `0.6·min(1, count/saturation) + 0.4·0.5^(age/half_life)`
    pub fn confidence(&self, occurrences: usize, age_secs: f64) -> f64 {
        let saturation = self.config.saturation_count.max(1) as f64;
        let count_term = (occurrences as f64 / saturation).min(1.0);

        let half_life = self.config.recency_half_life_seconds.max(1) as f64;
        let recency = 0.5f64.powf(age_secs.max(0.0) / half_life);

        COUNT_WEIGHT * count_term + RECENCY_WEIGHT * recency
    }
}

fn base_severity(category: ErrorCategory) -> PatternSeverity {
    match category {
        ErrorCategory::Timeout | ErrorCategory::Network => PatternSeverity::High,
        ErrorCategory::Upstream | ErrorCategory::RateLimited | ErrorCategory::Unknown => {
            PatternSeverity::Medium
        }
        ErrorCategory::CircuitOpen | ErrorCategory::Budget => PatternSeverity::Low,
    }
}
