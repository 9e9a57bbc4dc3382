use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Provider kind behind an execution path.
///
/// The set is closed: the decision engine matches on it exhaustively when
/// applying domain affinity and exclusion rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Dedicated low-latency channel to the model provider
    Direct,
    /// General-purpose multiplexed channel with richer features
    Broker,
}

impl ProviderKind {
    /// All known provider kinds, in declaration order.
    pub const ALL: [ProviderKind; 2] = [ProviderKind::Direct, ProviderKind::Broker];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Direct => "direct",
            ProviderKind::Broker => "broker",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "direct" => Ok(ProviderKind::Direct),
            "broker" => Ok(ProviderKind::Broker),
            _ => Err(format!("Unknown provider kind: {}", s)),
        }
    }
}

/// Capabilities advertised by a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Whether the path supports function/tool calling
    pub supports_tools: bool,
    /// Whether the path can stream partial responses
    pub supports_streaming: bool,
    /// Maximum tokens a single operation may use
    pub max_tokens: u32,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            supports_tools: false,
            supports_streaming: false,
            max_tokens: 4096,
        }
    }
}

/// An execution path (route) to the upstream model provider.
///
/// Configuration fields are fixed once loaded. `observed_latency_ms` and
/// `observed_success_rate` are written back by the efficiency optimizer.
///
/// # Examples
///
/// ```
/// use dualroute::registry::{Capabilities, Path, ProviderKind};
///
/// let path = Path::new("direct", ProviderKind::Direct, "anthropic", Capabilities::default(), 0.8, 300);
/// assert_eq!(path.effective_latency_ms(), 300);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    /// Unique path identifier
    pub id: String,
    /// Provider kind
    pub provider: ProviderKind,
    /// Upstream provider name (informational)
    pub provider_name: String,
    /// Capability set
    pub capabilities: Capabilities,
    /// Cost per unit of work (USD per 1k tokens)
    pub cost_per_unit: f64,
    /// Declared default latency in milliseconds
    pub default_latency_ms: u32,
    /// p50 latency observed over the last optimizer window
    pub observed_latency_ms: Option<u32>,
    /// Success rate observed over the last optimizer window (0.0–1.0)
    pub observed_success_rate: Option<f64>,
    /// When the observed values were last refreshed
    pub observed_at: Option<DateTime<Utc>>,
}

impl Path {
    pub fn new(
        id: impl Into<String>,
        provider: ProviderKind,
        provider_name: impl Into<String>,
        capabilities: Capabilities,
        cost_per_unit: f64,
        default_latency_ms: u32,
    ) -> Self {
        Self {
            id: id.into(),
            provider,
            provider_name: provider_name.into(),
            capabilities,
            cost_per_unit,
            default_latency_ms,
            observed_latency_ms: None,
            observed_success_rate: None,
            observed_at: None,
        }
    }

    /// Latency used for routing: observed when known, declared otherwise.
    pub fn effective_latency_ms(&self) -> u32 {
        self.observed_latency_ms.unwrap_or(self.default_latency_ms)
    }
}

impl From<&crate::config::PathConfig> for Path {
    fn from(config: &crate::config::PathConfig) -> Self {
        Path::new(
            config.id.clone(),
            config.provider,
            config.provider_name.clone(),
            Capabilities {
                supports_tools: config.supports_tools,
                supports_streaming: config.supports_streaming,
                max_tokens: config.max_tokens,
            },
            config.cost_per_unit,
            config.default_latency_ms,
        )
    }
}
