//! Scoring function for path ranking

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::CostTier;

/// Lower bound for any tunable weight
pub const WEIGHT_MIN: f64 = 0.1;
/// Upper bound for any tunable weight
pub const WEIGHT_MAX: f64 = 5.0;

/// Bonus per path feature (streaming, tools) in the premium tier
const PREMIUM_FEATURE_BONUS: f64 = 0.5;

/// Weights applied to each scoring term.
///
/// The optimizer retunes these at runtime; every write goes through
/// [`ScoringWeights::set`] which clamps into `[WEIGHT_MIN, WEIGHT_MAX]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub latency: f64,
    pub cost: f64,
    pub capability: f64,
    pub affinity: f64,
    pub priority_order: f64,
    pub reliability: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            latency: 1.0,
            cost: 1.0,
            capability: 0.5,
            affinity: 0.5,
            priority_order: 1.0,
            reliability: 1.0,
        }
    }
}

/// Names a single tunable weight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightKind {
    Latency,
    Cost,
    Capability,
    Affinity,
    PriorityOrder,
    Reliability,
}

impl WeightKind {
    pub const ALL: [WeightKind; 6] = [
        WeightKind::Latency,
        WeightKind::Cost,
        WeightKind::Capability,
        WeightKind::Affinity,
        WeightKind::PriorityOrder,
        WeightKind::Reliability,
    ];
}

impl FromStr for WeightKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "latency" => Ok(WeightKind::Latency),
            "cost" => Ok(WeightKind::Cost),
            "capability" => Ok(WeightKind::Capability),
            "affinity" => Ok(WeightKind::Affinity),
            "priority_order" => Ok(WeightKind::PriorityOrder),
            "reliability" => Ok(WeightKind::Reliability),
            _ => Err(format!("Unknown scoring weight: {}", s)),
        }
    }
}

impl fmt::Display for WeightKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeightKind::Latency => write!(f, "latency"),
            WeightKind::Cost => write!(f, "cost"),
            WeightKind::Capability => write!(f, "capability"),
            WeightKind::Affinity => write!(f, "affinity"),
            WeightKind::PriorityOrder => write!(f, "priority_order"),
            WeightKind::Reliability => write!(f, "reliability"),
        }
    }
}

impl ScoringWeights {
    /// Validate that every weight is finite and within bounds
    pub fn validate(&self) -> Result<(), String> {
        for kind in WeightKind::ALL {
            let value = self.get(kind);
            if !value.is_finite() || !(WEIGHT_MIN..=WEIGHT_MAX).contains(&value) {
                return Err(format!(
                    "Scoring weight '{}' must be within [{}, {}], got {}",
                    kind, WEIGHT_MIN, WEIGHT_MAX, value
                ));
            }
        }
        Ok(())
    }

    pub fn get(&self, kind: WeightKind) -> f64 {
        match kind {
            WeightKind::Latency => self.latency,
            WeightKind::Cost => self.cost,
            WeightKind::Capability => self.capability,
            WeightKind::Affinity => self.affinity,
            WeightKind::PriorityOrder => self.priority_order,
            WeightKind::Reliability => self.reliability,
        }
    }

    /// Set a weight, clamped into bounds. Returns the value actually stored.
    pub fn set(&mut self, kind: WeightKind, value: f64) -> f64 {
        let clamped = if value.is_finite() {
            value.clamp(WEIGHT_MIN, WEIGHT_MAX)
        } else {
            self.get(kind)
        };
        match kind {
            WeightKind::Latency => self.latency = clamped,
            WeightKind::Cost => self.cost = clamped,
            WeightKind::Capability => self.capability = clamped,
            WeightKind::Affinity => self.affinity = clamped,
            WeightKind::PriorityOrder => self.priority_order = clamped,
            WeightKind::Reliability => self.reliability = clamped,
        }
        clamped
    }
}

/// Everything the score of one candidate depends on
#[derive(Debug, Clone, Copy)]
pub struct ScoreInputs {
    /// Observed latency if known, declared otherwise
    pub latency_ms: u32,
    /// Latency budget of the request (or the configured default)
    pub sla_ms: u64,
    pub cost_per_unit: f64,
    pub cost_tier: CostTier,
    /// Number of required capabilities the path satisfies
    pub matched_capabilities: u32,
    /// Number of optional features (streaming, tools) the path offers
    pub path_features: u32,
    pub affinity_match: bool,
    /// `(index, len)` of the path's provider in the caller's priority order
    pub priority_position: Option<(usize, usize)>,
    /// Optimizer-published success rate, if any
    pub success_rate: Option<f64>,
}

/// Per-term contribution to a path's score (already weighted)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub latency: f64,
    pub cost: f64,
    pub capability: f64,
    pub affinity: f64,
    pub priority_order: f64,
    pub reliability: f64,
    pub total: f64,
}

/// Score a path. Higher is better; the result is never negative.
pub fn score_path(inputs: &ScoreInputs, weights: &ScoringWeights) -> ScoreBreakdown {
    let sla = inputs.sla_ms.max(1) as f64;
    let latency_fit = (2.0 - inputs.latency_ms as f64 / sla).max(0.0);

    let cost = inputs.cost_per_unit.max(0.0);
    let cost_term = match inputs.cost_tier {
        CostTier::CostSensitive => 2.0 / (1.0 + cost),
        CostTier::Balanced => 1.0 / (1.0 + cost),
        CostTier::Premium => 0.0,
    };

    let mut capability_term = inputs.matched_capabilities as f64;
    if inputs.cost_tier == CostTier::Premium {
        capability_term += PREMIUM_FEATURE_BONUS * inputs.path_features as f64;
    }

    let affinity_term = if inputs.affinity_match { 1.0 } else { 0.0 };

    let priority_term = match inputs.priority_position {
        Some((index, len)) if len > 0 && index < len => (len - index) as f64 / len as f64,
        _ => 0.0,
    };

    let reliability_term = inputs.success_rate.unwrap_or(1.0).clamp(0.0, 1.0);

    let mut breakdown = ScoreBreakdown {
        latency: weights.latency * latency_fit,
        cost: weights.cost * cost_term,
        capability: weights.capability * capability_term,
        affinity: weights.affinity * affinity_term,
        priority_order: weights.priority_order * priority_term,
        reliability: weights.reliability * reliability_term,
        total: 0.0,
    };
    breakdown.total = breakdown.latency
        + breakdown.cost
        + breakdown.capability
        + breakdown.affinity
        + breakdown.priority_order
        + breakdown.reliability;
    breakdown
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs() -> ScoreInputs {
        ScoreInputs {
            latency_ms: 500,
            sla_ms: 1000,
            cost_per_unit: 1.0,
            cost_tier: CostTier::Balanced,
            matched_capabilities: 0,
            path_features: 0,
            affinity_match: false,
            priority_position: None,
            success_rate: None,
        }
    }

    #[test]
    fn default_weights_are_valid() {
        assert!(ScoringWeights::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_out_of_bounds() {
        let weights = ScoringWeights {
            latency: 6.0,
            ..Default::default()
        };
        assert!(weights.validate().is_err());

        let weights = ScoringWeights {
            cost: 0.0,
            ..Default::default()
        };
        assert!(weights.validate().is_err());
    }

    #[test]
    fn set_clamps_into_bounds() {
        let mut weights = ScoringWeights::default();
        assert_eq!(weights.set(WeightKind::Latency, 9.0), WEIGHT_MAX);
        assert_eq!(weights.set(WeightKind::Cost, -1.0), WEIGHT_MIN);
        assert_eq!(weights.latency, WEIGHT_MAX);
        assert_eq!(weights.cost, WEIGHT_MIN);
    }

    #[test]
    fn set_ignores_nan() {
        let mut weights = ScoringWeights::default();
        assert_eq!(weights.set(WeightKind::Affinity, f64::NAN), 0.5);
    }

    #[test]
    fn weight_kind_parses_and_displays() {
        for kind in WeightKind::ALL {
            assert_eq!(kind.to_string().parse::<WeightKind>().unwrap(), kind);
        }
        assert!("speed".parse::<WeightKind>().is_err());
    }

    #[test]
    fn latency_fit_is_two_minus_ratio() {
        let breakdown = score_path(&inputs(), &ScoringWeights::default());
        assert!((breakdown.latency - 1.5).abs() < 1e-9);
    }

    #[test]
    fn latency_fit_floors_at_zero() {
        let slow = ScoreInputs {
            latency_ms: 5000,
            ..inputs()
        };
        let breakdown = score_path(&slow, &ScoringWeights::default());
        assert_eq!(breakdown.latency, 0.0);
    }

    #[test]
    fn cost_sensitive_doubles_cost_term() {
        let balanced = score_path(&inputs(), &ScoringWeights::default());
        let sensitive = score_path(
            &ScoreInputs {
                cost_tier: CostTier::CostSensitive,
                ..inputs()
            },
            &ScoringWeights::default(),
        );
        assert!((balanced.cost - 0.5).abs() < 1e-9);
        assert!((sensitive.cost - 1.0).abs() < 1e-9);
    }

    #[test]
    fn premium_ignores_cost_and_rewards_features() {
        let premium = score_path(
            &ScoreInputs {
                cost_tier: CostTier::Premium,
                path_features: 2,
                matched_capabilities: 1,
                ..inputs()
            },
            &ScoringWeights::default(),
        );
        assert_eq!(premium.cost, 0.0);
        // (1 + 0.5 * 2) * 0.5
        assert!((premium.capability - 1.0).abs() < 1e-9);
    }

    #[test]
    fn priority_order_bonus() {
        let first = score_path(
            &ScoreInputs {
                priority_position: Some((0, 2)),
                ..inputs()
            },
            &ScoringWeights::default(),
        );
        let second = score_path(
            &ScoreInputs {
                priority_position: Some((1, 2)),
                ..inputs()
            },
            &ScoringWeights::default(),
        );
        assert!((first.priority_order - 1.0).abs() < 1e-9);
        assert!((second.priority_order - 0.5).abs() < 1e-9);
    }

    #[test]
    fn unknown_reliability_counts_as_perfect() {
        let unknown = score_path(&inputs(), &ScoringWeights::default());
        let flaky = score_path(
            &ScoreInputs {
                success_rate: Some(0.4),
                ..inputs()
            },
            &ScoringWeights::default(),
        );
        assert!(unknown.reliability > flaky.reliability);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Faster paths never score lower on the latency term.
            #[test]
            fn prop_latency_term_is_monotone(a in 0u32..20_000, b in 0u32..20_000, sla in 1u64..10_000) {
                let (fast, slow) = if a <= b { (a, b) } else { (b, a) };
                let weights = ScoringWeights::default();
                let fast_score = score_path(&ScoreInputs { latency_ms: fast, sla_ms: sla, ..inputs() }, &weights);
                let slow_score = score_path(&ScoreInputs { latency_ms: slow, sla_ms: sla, ..inputs() }, &weights);
                prop_assert!(fast_score.latency >= slow_score.latency);
            }

            /// Scores stay finite and non-negative for any in-bounds weights.
            #[test]
            fn prop_total_is_finite_and_non_negative(
                latency in 0u32..100_000,
                cost in 0.0f64..1_000.0,
                w in WEIGHT_MIN..WEIGHT_MAX,
                rate in proptest::option::of(0.0f64..=1.0),
            ) {
                let weights = ScoringWeights { latency: w, cost: w, capability: w, affinity: w, priority_order: w, reliability: w };
                let breakdown = score_path(&ScoreInputs { latency_ms: latency, cost_per_unit: cost, success_rate: rate, ..inputs() }, &weights);
                prop_assert!(breakdown.total.is_finite());
                prop_assert!(breakdown.total >= 0.0);
            }

            /// Clamped writes always land inside the bounds.
            #[test]
            fn prop_set_stays_in_bounds(value in -100.0f64..100.0) {
                let mut weights = ScoringWeights::default();
                let stored = weights.set(WeightKind::Reliability, value);
                prop_assert!((WEIGHT_MIN..=WEIGHT_MAX).contains(&stored));
            }
        }
    }
}
