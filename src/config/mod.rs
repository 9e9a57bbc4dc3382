//! Configuration module for dualroute
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`DUALROUTE_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use dualroute::config::DualrouteConfig;
//!
//! let config = DualrouteConfig::default();
//! assert_eq!(config.circuit_breaker.failure_threshold, 5);
//!
//! let toml = r#"
//! [circuit_breaker]
//! failure_threshold = 3
//! "#;
//! let config: DualrouteConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.circuit_breaker.failure_threshold, 3);
//! ```

pub mod analyzer;
pub mod circuit;
pub mod error;
pub mod executor;
pub mod logging;
pub mod optimizer;
pub mod path;
pub mod routing;
pub mod samples;

pub use analyzer::AnalyzerConfig;
pub use circuit::{CircuitBreakerConfig, CircuitOverride, CircuitSettings};
pub use error::ConfigError;
pub use executor::ExecutorConfig;
pub use logging::{LogFormat, LoggingConfig, LOG_COMPONENTS, LOG_LEVELS};
pub use optimizer::OptimizerConfig;
pub use path::PathConfig;
pub use routing::{RoutingConfig, RoutingWeights};
pub use samples::SampleConfig;

// Re-export HealthConfig from health module
pub use crate::health::{ComponentCheckConfig, ComponentOverride, HealthConfig};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Unified configuration for the routing engine.
///
/// # Example
///
/// ```rust
/// use dualroute::config::DualrouteConfig;
///
/// let config = DualrouteConfig::default();
/// assert!(config.paths.is_empty());
/// assert!(config.health.enabled);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DualrouteConfig {
    /// Execution path definitions
    pub paths: Vec<PathConfig>,
    /// Decision engine configuration
    pub routing: RoutingConfig,
    /// Circuit breaker thresholds and per-path overrides
    pub circuit_breaker: CircuitBreakerConfig,
    /// Health monitor defaults and per-component overrides
    pub health: HealthConfig,
    /// Failover executor limits
    pub executor: ExecutorConfig,
    /// Failure pattern analyzer settings
    pub analyzer: AnalyzerConfig,
    /// Efficiency optimizer settings
    pub optimizer: OptimizerConfig,
    /// Performance sample retention
    pub samples: SampleConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl DualrouteConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supports DUALROUTE_* environment variables for common settings.
    /// Invalid values are silently ignored (defaults are kept).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(level) = std::env::var("DUALROUTE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("DUALROUTE_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }
        if let Ok(tier) = std::env::var("DUALROUTE_COST_TIER") {
            if let Ok(t) = tier.parse() {
                self.routing.cost_tier = t;
            }
        }
        if let Ok(health) = std::env::var("DUALROUTE_HEALTH_CHECK") {
            self.health.enabled = health.to_lowercase() == "true";
        }
        if let Ok(optimizer) = std::env::var("DUALROUTE_OPTIMIZER") {
            self.optimizer.enabled = optimizer.to_lowercase() == "true";
        }

        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for (i, path) in self.paths.iter().enumerate() {
            if path.id.trim().is_empty() {
                return Err(ConfigError::Validation {
                    field: format!("paths[{}].id", i),
                    message: "id cannot be empty".to_string(),
                });
            }
            if !seen.insert(path.id.as_str()) {
                return Err(ConfigError::DuplicatePath(path.id.clone()));
            }
            if !path.cost_per_unit.is_finite() || path.cost_per_unit < 0.0 {
                return Err(ConfigError::Validation {
                    field: format!("paths[{}].cost_per_unit", i),
                    message: "cost must be a non-negative number".to_string(),
                });
            }
            if path.default_latency_ms == 0 {
                return Err(ConfigError::Validation {
                    field: format!("paths[{}].default_latency_ms", i),
                    message: "latency must be non-zero".to_string(),
                });
            }
        }

        for path_id in self.circuit_breaker.overrides.keys() {
            if !seen.contains(path_id.as_str()) {
                return Err(ConfigError::UnknownPath {
                    section: "circuit_breaker.overrides".to_string(),
                    path: path_id.clone(),
                });
            }
        }

        if self.circuit_breaker.failure_threshold == 0 {
            return Err(ConfigError::Validation {
                field: "circuit_breaker.failure_threshold".to_string(),
                message: "threshold must be at least 1".to_string(),
            });
        }
        if self.circuit_breaker.open_duration_ms == 0 {
            return Err(ConfigError::Validation {
                field: "circuit_breaker.open_duration_ms".to_string(),
                message: "open duration must be non-zero".to_string(),
            });
        }

        if self.routing.default_sla_ms == 0 {
            return Err(ConfigError::Validation {
                field: "routing.default_sla_ms".to_string(),
                message: "default SLA must be non-zero".to_string(),
            });
        }
        crate::routing::ScoringWeights::from(self.routing.weights.clone())
            .validate()
            .map_err(|message| ConfigError::Validation {
                field: "routing.weights".to_string(),
                message,
            })?;
        routing::validate_exclusions(&self.routing.domain_exclusions)?;

        if self.health.timeout_ms == 0 || self.health.interval_ms == 0 {
            return Err(ConfigError::Validation {
                field: "health".to_string(),
                message: "interval and timeout must be non-zero".to_string(),
            });
        }

        if self.optimizer.min_samples == 0 {
            return Err(ConfigError::Validation {
                field: "optimizer.min_samples".to_string(),
                message: "at least one sample is required".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.optimizer.success_rate_floor) {
            return Err(ConfigError::Validation {
                field: "optimizer.success_rate_floor".to_string(),
                message: "must be between 0.0 and 1.0".to_string(),
            });
        }
        if self.optimizer.latency_regression_ratio <= 1.0 {
            return Err(ConfigError::Validation {
                field: "optimizer.latency_regression_ratio".to_string(),
                message: "must be greater than 1.0".to_string(),
            });
        }

        if let Some((field, message)) = self.logging.invalid_entry() {
            return Err(ConfigError::Validation { field, message });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ProviderKind;
    use crate::routing::CostTier;
    use std::path::Path;

    fn path_config(id: &str) -> PathConfig {
        PathConfig {
            id: id.to_string(),
            provider: ProviderKind::Direct,
            provider_name: "anthropic".to_string(),
            supports_tools: false,
            supports_streaming: false,
            max_tokens: 4096,
            cost_per_unit: 1.0,
            default_latency_ms: 500,
        }
    }

    #[test]
    fn test_config_defaults() {
        let config = DualrouteConfig::default();
        assert!(config.paths.is_empty());
        assert!(config.health.enabled);
        assert!(config.optimizer.enabled);
        assert_eq!(config.optimizer.min_samples, 10);
        assert_eq!(config.executor.retries_per_path, 0);
    }

    #[test]
    fn test_config_parse_minimal_toml() {
        let toml = r#"
        [optimizer]
        interval_seconds = 5
        "#;

        let config: DualrouteConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.optimizer.interval_seconds, 5);
        assert_eq!(config.optimizer.max_changes_per_cycle, 2); // Default
    }

    #[test]
    fn test_config_parse_example_toml() {
        let toml = include_str!("../../dualroute.example.toml");
        let config: DualrouteConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.paths.len(), 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_parse_paths_array() {
        let toml = r#"
        [[paths]]
        id = "direct"
        provider = "direct"
        default_latency_ms = 400

        [[paths]]
        id = "broker"
        provider = "broker"
        supports_tools = true
        "#;

        let config: DualrouteConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.paths.len(), 2);
        assert!(config.paths[1].supports_tools);
    }

    #[test]
    fn test_config_load_from_file() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "[circuit_breaker]\nfailure_threshold = 7").unwrap();

        let config = DualrouteConfig::load(Some(temp.path())).unwrap();
        assert_eq!(config.circuit_breaker.failure_threshold, 7);
    }

    #[test]
    fn test_config_load_parse_error() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "[circuit_breaker\nbroken").unwrap();

        let result = DualrouteConfig::load(Some(temp.path()));
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_config_missing_file_error() {
        let result = DualrouteConfig::load(Some(Path::new("/nonexistent/dualroute.toml")));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_config_load_none_returns_defaults() {
        let config = DualrouteConfig::load(None).unwrap();
        assert_eq!(config.routing.default_sla_ms, 2000);
    }

    #[test]
    fn test_config_env_overrides() {
        std::env::set_var("DUALROUTE_LOG_LEVEL", "debug");
        std::env::set_var("DUALROUTE_COST_TIER", "premium");
        std::env::set_var("DUALROUTE_OPTIMIZER", "false");
        let config = DualrouteConfig::default().with_env_overrides();
        std::env::remove_var("DUALROUTE_LOG_LEVEL");
        std::env::remove_var("DUALROUTE_COST_TIER");
        std::env::remove_var("DUALROUTE_OPTIMIZER");

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.routing.cost_tier, CostTier::Premium);
        assert!(!config.optimizer.enabled);
    }

    #[test]
    fn test_config_env_invalid_value_ignored() {
        std::env::set_var("DUALROUTE_LOG_FORMAT", "xml");
        let config = DualrouteConfig::default().with_env_overrides();
        std::env::remove_var("DUALROUTE_LOG_FORMAT");

        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_config_validation_duplicate_path() {
        let mut config = DualrouteConfig::default();
        config.paths.push(path_config("direct"));
        config.paths.push(path_config("direct"));

        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::DuplicatePath(id)) if id == "direct"));
    }

    #[test]
    fn test_config_validation_empty_path_id() {
        let mut config = DualrouteConfig::default();
        config.paths.push(path_config(""));

        let result = config.validate();
        assert!(matches!(
            result,
            Err(ConfigError::Validation { ref field, .. }) if field.contains("id")
        ));
    }

    #[test]
    fn test_config_validation_negative_cost() {
        let mut config = DualrouteConfig::default();
        let mut path = path_config("direct");
        path.cost_per_unit = -1.0;
        config.paths.push(path);

        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation { ref field, .. }) if field.contains("cost")
        ));
    }

    #[test]
    fn test_config_validation_override_for_unknown_path() {
        let mut config = DualrouteConfig::default();
        config.paths.push(path_config("direct"));
        config
            .circuit_breaker
            .overrides
            .insert("ghost".to_string(), CircuitOverride::default());

        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnknownPath { ref path, .. }) if path == "ghost"
        ));
    }

    #[test]
    fn test_config_validation_zero_threshold() {
        let mut config = DualrouteConfig::default();
        config.circuit_breaker.failure_threshold = 0;

        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation { ref field, .. }) if field == "circuit_breaker.failure_threshold"
        ));
    }

    #[test]
    fn test_config_validation_regression_ratio() {
        let mut config = DualrouteConfig::default();
        config.optimizer.latency_regression_ratio = 0.8;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_log_level() {
        let mut config = DualrouteConfig::default();
        config.logging.level = "chatty".to_string();
        match config.validate() {
            Err(ConfigError::Validation { field, .. }) => assert_eq!(field, "logging.level"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
