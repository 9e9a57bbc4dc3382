//! Structured logging setup and helpers
//!
//! This module builds the tracing subscriber from [`LoggingConfig`] and
//! provides small helpers for the structured fields the engine logs
//! (correlation ids, truncated error details, payload previews).
//!
//! [`LoggingConfig`]: crate::config::LoggingConfig

pub mod correlation;
pub mod fields;

pub use correlation::generate_correlation_id;
pub use fields::{payload_preview, truncate_detail};

use crate::config::{LogFormat, LoggingConfig};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Build the `EnvFilter` directive string for a [`LoggingConfig`].
///
/// The base level comes first, followed by one `dualroute::<component>`
/// directive per override, in component order.
///
/// ```
/// use dualroute::config::LoggingConfig;
/// use dualroute::logging::build_filter_directives;
///
/// let mut config = LoggingConfig::default();
/// config.component_levels.insert("circuit".to_string(), "debug".to_string());
///
/// assert_eq!(build_filter_directives(&config), "info,dualroute::circuit=debug");
/// ```
pub fn build_filter_directives(config: &LoggingConfig) -> String {
    let mut filter_str = config.level.to_lowercase();
    for (component, level) in &config.component_levels {
        filter_str.push_str(&format!(",dualroute::{}={}", component, level.to_lowercase()));
    }
    filter_str
}

/// Install the global tracing subscriber, writing to stderr.
///
/// `RUST_LOG` takes precedence over the configured directives when set.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let filter_str = build_filter_directives(config);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    match config.format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .try_init()?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .try_init()?;
        }
    }

    if config.enable_payload_logging {
        tracing::warn!("Payload logging is enabled; attempt failures will log operation payloads");
    }

    Ok(())
}
