//! Routing configuration

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::error::ConfigError;
use crate::registry::ProviderKind;
use crate::routing::{CostTier, ScoringWeights};

/// Decision engine configuration.
///
/// # Example
///
/// ```toml
/// [routing]
/// cost_tier = "balanced"
/// default_sla_ms = 2000
///
/// [routing.domain_affinity]
/// legal = "broker"
///
/// [routing.domain_exclusions]
/// healthcare = ["broker"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Default cost tier used to shape the cost term
    pub cost_tier: CostTier,
    /// Latency budget assumed for requests that do not declare one
    pub default_sla_ms: u64,
    /// Initial scoring weights (the optimizer may retune them at runtime)
    pub weights: RoutingWeights,
    /// Domain tag → preferred provider kind
    pub domain_affinity: HashMap<String, ProviderKind>,
    /// Domain tag → provider kinds that must never serve it
    pub domain_exclusions: HashMap<String, Vec<ProviderKind>>,
}

/// Scoring weights as they appear in configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingWeights {
    pub latency: f64,
    pub cost: f64,
    pub capability: f64,
    pub affinity: f64,
    pub priority_order: f64,
    pub reliability: f64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            cost_tier: CostTier::Balanced,
            default_sla_ms: 2000,
            weights: RoutingWeights::default(),
            domain_affinity: default_domain_affinity(),
            domain_exclusions: default_domain_exclusions(),
        }
    }
}

impl Default for RoutingWeights {
    fn default() -> Self {
        let weights = ScoringWeights::default();
        Self {
            latency: weights.latency,
            cost: weights.cost,
            capability: weights.capability,
            affinity: weights.affinity,
            priority_order: weights.priority_order,
            reliability: weights.reliability,
        }
    }
}

impl From<RoutingWeights> for ScoringWeights {
    fn from(weights: RoutingWeights) -> Self {
        ScoringWeights {
            latency: weights.latency,
            cost: weights.cost,
            capability: weights.capability,
            affinity: weights.affinity,
            priority_order: weights.priority_order,
            reliability: weights.reliability,
        }
    }
}

fn default_domain_affinity() -> HashMap<String, ProviderKind> {
    HashMap::from([
        ("code".to_string(), ProviderKind::Direct),
        ("chat".to_string(), ProviderKind::Direct),
        ("research".to_string(), ProviderKind::Broker),
        ("legal".to_string(), ProviderKind::Broker),
    ])
}

fn default_domain_exclusions() -> HashMap<String, Vec<ProviderKind>> {
    HashMap::from([
        ("healthcare".to_string(), vec![ProviderKind::Broker]),
        ("finance".to_string(), vec![ProviderKind::Broker]),
    ])
}

/// Reject exclusion tables that rule out every provider kind for a domain.
pub fn validate_exclusions(
    exclusions: &HashMap<String, Vec<ProviderKind>>,
) -> Result<(), ConfigError> {
    for (domain, kinds) in exclusions {
        if ProviderKind::ALL.iter().all(|kind| kinds.contains(kind)) {
            return Err(ConfigError::Validation {
                field: format!("routing.domain_exclusions.{}", domain),
                message: "excludes every provider kind".to_string(),
            });
        }
    }
    Ok(())
}
