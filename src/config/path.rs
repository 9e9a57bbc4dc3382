//! Path configuration

use crate::registry::ProviderKind;
use serde::{Deserialize, Serialize};

/// Static definition of one execution path.
///
/// # Example
///
/// ```toml
/// [[paths]]
/// id = "direct"
/// provider = "direct"
/// provider_name = "anthropic"
/// supports_tools = true
/// max_tokens = 200000
/// cost_per_unit = 3.0
/// default_latency_ms = 800
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathConfig {
    pub id: String,
    pub provider: ProviderKind,
    #[serde(default = "default_provider_name")]
    pub provider_name: String,
    #[serde(default)]
    pub supports_tools: bool,
    #[serde(default)]
    pub supports_streaming: bool,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub cost_per_unit: f64,
    #[serde(default = "default_latency_ms")]
    pub default_latency_ms: u32,
}

fn default_provider_name() -> String {
    "anthropic".to_string()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_latency_ms() -> u32 {
    1000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_config_minimal_toml() {
        let toml = r#"
        id = "broker"
        provider = "broker"
        "#;
        let config: PathConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.provider, ProviderKind::Broker);
        assert_eq!(config.provider_name, "anthropic");
        assert_eq!(config.max_tokens, 4096);
        assert_eq!(config.default_latency_ms, 1000);
        assert!(!config.supports_tools);
    }

    #[test]
    fn test_path_config_rejects_unknown_provider() {
        let toml = r#"
        id = "x"
        provider = "carrier-pigeon"
        "#;
        assert!(toml::from_str::<PathConfig>(toml).is_err());
    }
}
