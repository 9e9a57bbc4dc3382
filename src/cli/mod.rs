//! CLI module for dualroute
//!
//! Command-line interface definitions and handlers.
//!
//! # Commands
//!
//! - `route` - Rank the configured paths for a synthetic request
//! - `paths` - List configured execution paths
//! - `config` - Configuration utilities (init, validate)
//! - `completions` - Generate shell completions
//!
//! # Example
//!
//! ```bash
//! # Where would a tool-using critical request go?
//! dualroute route --operation chat --priority critical --tools
//!
//! # Generate shell completions
//! dualroute completions bash > ~/.bash_completion.d/dualroute
//! ```

pub mod completions;
pub mod config;
pub mod output;
pub mod paths;
pub mod route;

pub use completions::handle_completions;
pub use config::{handle_config_init, handle_config_validate};

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::DualrouteConfig;

/// dualroute - routing and resilience for dual-path model execution
#[derive(Parser, Debug)]
#[command(
    name = "dualroute",
    version,
    about = "Routing and resilience engine for direct and broker execution paths"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rank paths for a request without executing it
    Route(RouteArgs),
    /// List configured paths
    Paths(PathsArgs),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct RouteArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "dualroute.toml")]
    pub config: PathBuf,

    /// Operation type
    #[arg(short, long, default_value = "chat")]
    pub operation: String,

    /// Priority tier (critical, high, medium, low)
    #[arg(short, long, default_value = "medium")]
    pub priority: String,

    /// Domain tag
    #[arg(short, long, default_value = "general")]
    pub domain: String,

    /// Latency budget in milliseconds
    #[arg(short = 'b', long)]
    pub latency_budget_ms: Option<u64>,

    /// Maximum acceptable cost per unit
    #[arg(long)]
    pub cost_ceiling: Option<f64>,

    /// Cost tier override (cost_sensitive, balanced, premium)
    #[arg(long, env = "DUALROUTE_COST_TIER")]
    pub cost_tier: Option<String>,

    /// Require tool calling
    #[arg(long)]
    pub tools: bool,

    /// Require streaming
    #[arg(long)]
    pub streaming: bool,

    /// Minimum context size in tokens
    #[arg(long)]
    pub min_tokens: Option<u32>,

    /// Preferred provider order, e.g. `--prefer broker,direct`
    #[arg(long, value_delimiter = ',')]
    pub prefer: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct PathsArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Filter by provider kind (direct, broker)
    #[arg(short, long)]
    pub provider: Option<String>,

    /// Path to configuration file
    #[arg(short, long, default_value = "dualroute.toml")]
    pub config: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file
    Init(ConfigInitArgs),
    /// Check a configuration file for errors
    Validate(ConfigValidateArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = "dualroute.toml")]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct ConfigValidateArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "dualroute.toml")]
    pub config: PathBuf,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

/// Load, env-override and validate a configuration file.
pub fn load_config(path: &std::path::Path) -> Result<DualrouteConfig, Box<dyn std::error::Error>> {
    let config = DualrouteConfig::load(Some(path))?.with_env_overrides();
    config.validate()?;
    Ok(config)
}
