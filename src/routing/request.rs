//! Operation requests as seen by the decision engine

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use super::CostTier;
use crate::registry::Capabilities;

/// Priority tier of an operation
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "critical" => Ok(Priority::Critical),
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            _ => Err(format!("Unknown priority: {}", s)),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Critical => write!(f, "critical"),
            Priority::High => write!(f, "high"),
            Priority::Medium => write!(f, "medium"),
            Priority::Low => write!(f, "low"),
        }
    }
}

/// What the executor does after the first candidate fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackStrategy {
    /// Try every ranked candidate in order
    #[default]
    Sequential,
    /// Attempt only the top-ranked candidate
    None,
}

impl FromStr for FallbackStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sequential" => Ok(FallbackStrategy::Sequential),
            "none" => Ok(FallbackStrategy::None),
            _ => Err(format!("Unknown fallback strategy: {}", s)),
        }
    }
}

impl fmt::Display for FallbackStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackStrategy::Sequential => write!(f, "sequential"),
            FallbackStrategy::None => write!(f, "none"),
        }
    }
}

/// Capabilities an operation needs from its path
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequiredCapabilities {
    pub tools: bool,
    pub streaming: bool,
    pub min_tokens: u32,
}

impl RequiredCapabilities {
    /// Names of the requirements a path cannot meet
    pub fn missing(&self, caps: &Capabilities) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.tools && !caps.supports_tools {
            missing.push("tools");
        }
        if self.streaming && !caps.supports_streaming {
            missing.push("streaming");
        }
        if caps.max_tokens < self.min_tokens {
            missing.push("max_tokens");
        }
        missing
    }

    /// Number of declared requirements a path satisfies
    pub fn matched(&self, caps: &Capabilities) -> u32 {
        let mut matched = 0;
        if self.tools && caps.supports_tools {
            matched += 1;
        }
        if self.streaming && caps.supports_streaming {
            matched += 1;
        }
        if self.min_tokens > 0 && caps.max_tokens >= self.min_tokens {
            matched += 1;
        }
        matched
    }
}

/// An inbound operation. Built once, never mutated by the engine.
///
/// # Examples
///
/// ```
/// use dualroute::routing::{OperationRequest, Priority};
///
/// let request = OperationRequest::new("chat")
///     .with_priority(Priority::High)
///     .with_domain("legal")
///     .with_latency_budget_ms(500);
///
/// assert_eq!(request.domain, "legal");
/// assert_eq!(request.correlation_id.len(), 36);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRequest {
    /// Operation type (e.g. "chat", "completion", "embedding")
    pub operation: String,
    pub priority: Priority,
    /// Domain tag used for affinity and exclusion rules
    pub domain: String,
    pub requirements: RequiredCapabilities,
    /// Latency budget for the whole operation, including fallbacks
    pub latency_budget_ms: Option<u64>,
    /// Maximum acceptable cost per unit
    pub cost_ceiling: Option<f64>,
    /// Overrides the configured default cost tier
    pub cost_tier: Option<CostTier>,
    pub fallback: FallbackStrategy,
    pub correlation_id: String,
    /// Opaque payload forwarded to the path client
    pub payload: serde_json::Value,
}

impl OperationRequest {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            priority: Priority::default(),
            domain: "general".to_string(),
            requirements: RequiredCapabilities::default(),
            latency_budget_ms: None,
            cost_ceiling: None,
            cost_tier: None,
            fallback: FallbackStrategy::default(),
            correlation_id: crate::logging::generate_correlation_id(),
            payload: serde_json::Value::Null,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn with_requirements(mut self, requirements: RequiredCapabilities) -> Self {
        self.requirements = requirements;
        self
    }

    pub fn with_latency_budget_ms(mut self, budget_ms: u64) -> Self {
        self.latency_budget_ms = Some(budget_ms);
        self
    }

    pub fn with_cost_ceiling(mut self, ceiling: f64) -> Self {
        self.cost_ceiling = Some(ceiling);
        self
    }

    pub fn with_cost_tier(mut self, tier: CostTier) -> Self {
        self.cost_tier = Some(tier);
        self
    }

    pub fn with_fallback(mut self, fallback: FallbackStrategy) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = id.into();
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn latency_budget(&self) -> Option<Duration> {
        self.latency_budget_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let request = OperationRequest::new("chat");
        assert_eq!(request.priority, Priority::Medium);
        assert_eq!(request.fallback, FallbackStrategy::Sequential);
        assert_eq!(request.domain, "general");
        assert!(request.latency_budget().is_none());
    }

    #[test]
    fn correlation_id_can_be_supplied() {
        let request = OperationRequest::new("chat").with_correlation_id("abc");
        assert_eq!(request.correlation_id, "abc");
    }

    #[test]
    fn priority_parse_and_order() {
        assert_eq!("CRITICAL".parse::<Priority>().unwrap(), Priority::Critical);
        assert!(Priority::Critical < Priority::Low);
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn fallback_strategy_parse() {
        assert_eq!(
            "none".parse::<FallbackStrategy>().unwrap(),
            FallbackStrategy::None
        );
        assert_eq!(FallbackStrategy::Sequential.to_string(), "sequential");
    }

    #[test]
    fn missing_capabilities() {
        let required = RequiredCapabilities {
            tools: true,
            streaming: false,
            min_tokens: 8000,
        };
        let caps = Capabilities::default();
        assert_eq!(required.missing(&caps), vec!["tools", "max_tokens"]);
    }

    #[test]
    fn matched_capabilities() {
        let required = RequiredCapabilities {
            tools: true,
            streaming: true,
            min_tokens: 1000,
        };
        let caps = Capabilities {
            supports_tools: true,
            supports_streaming: false,
            max_tokens: 4096,
        };
        assert_eq!(required.matched(&caps), 2);
    }

    #[test]
    fn request_serde_uses_lowercase_enums() {
        let request = OperationRequest::new("chat").with_priority(Priority::Critical);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["priority"], "critical");
        assert_eq!(json["fallback"], "sequential");
    }
}
