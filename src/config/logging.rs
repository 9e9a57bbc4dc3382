//! Logging configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Levels accepted for `level` and per-component overrides
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Modules that accept a component level override
pub const LOG_COMPONENTS: [&str; 8] = [
    "analysis", "circuit", "engine", "executor", "health", "optimizer", "routing", "samples",
];

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: {}", s)),
        }
    }
}

/// Logging configuration
///
/// ```toml
/// [logging]
/// level = "info"
/// format = "json"
///
/// [logging.component_levels]
/// circuit = "debug"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    /// Per-module level overrides, keyed by module name
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub component_levels: BTreeMap<String, String>,
    /// Include a preview of the operation payload in attempt failure logs.
    /// Payloads may carry user data.
    pub enable_payload_logging: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            component_levels: BTreeMap::new(),
            enable_payload_logging: false,
        }
    }
}

impl LoggingConfig {
    /// First level or component name that is not recognised, as
    /// `(field, message)`.
    pub fn invalid_entry(&self) -> Option<(String, String)> {
        if !is_level(&self.level) {
            return Some((
                "logging.level".to_string(),
                format!("unknown level '{}'", self.level),
            ));
        }
        self.component_levels.iter().find_map(|(component, level)| {
            if !LOG_COMPONENTS.contains(&component.as_str()) {
                Some((
                    "logging.component_levels".to_string(),
                    format!("unknown component '{}'", component),
                ))
            } else if !is_level(level) {
                Some((
                    format!("logging.component_levels.{}", component),
                    format!("unknown level '{}'", level),
                ))
            } else {
                None
            }
        })
    }
}

fn is_level(level: &str) -> bool {
    LOG_LEVELS.contains(&level.to_lowercase().as_str())
}
