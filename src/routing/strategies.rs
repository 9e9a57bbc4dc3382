//! Cost tiers shaping the cost term of the score

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Cost tier determines how strongly cost influences path selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostTier {
    /// Cost term weighted double
    CostSensitive,

    /// Cost term counted once
    #[default]
    Balanced,

    /// Cost ignored; path capabilities rewarded instead
    Premium,
}

impl FromStr for CostTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cost_sensitive" | "cost-sensitive" => Ok(CostTier::CostSensitive),
            "balanced" => Ok(CostTier::Balanced),
            "premium" => Ok(CostTier::Premium),
            _ => Err(format!("Unknown cost tier: {}", s)),
        }
    }
}

impl std::fmt::Display for CostTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CostTier::CostSensitive => write!(f, "cost_sensitive"),
            CostTier::Balanced => write!(f, "balanced"),
            CostTier::Premium => write!(f, "premium"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_spellings() {
        assert_eq!(
            "cost-sensitive".parse::<CostTier>().unwrap(),
            CostTier::CostSensitive
        );
        assert_eq!(
            "COST_SENSITIVE".parse::<CostTier>().unwrap(),
            CostTier::CostSensitive
        );
        assert!("cheap".parse::<CostTier>().is_err());
    }

    #[test]
    fn display_round_trips() {
        for tier in [CostTier::CostSensitive, CostTier::Balanced, CostTier::Premium] {
            assert_eq!(tier.to_string().parse::<CostTier>().unwrap(), tier);
        }
    }
}
