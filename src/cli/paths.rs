//! Paths command implementation

use crate::cli::output::{format_paths_json, format_paths_table, PathView};
use crate::cli::PathsArgs;
use crate::registry::{PathRegistry, ProviderKind};

/// Handle `dualroute paths` command
pub fn handle_paths(
    args: &PathsArgs,
    registry: &PathRegistry,
) -> Result<String, Box<dyn std::error::Error>> {
    let provider: Option<ProviderKind> = args.provider.as_deref().map(str::parse).transpose()?;

    let views: Vec<PathView> = registry
        .all_paths()
        .iter()
        .filter(|p| provider.map_or(true, |kind| p.provider == kind))
        .map(PathView::from)
        .collect();

    if args.json {
        Ok(format_paths_json(&views)?)
    } else {
        Ok(format_paths_table(&views))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Capabilities, Path};
    use std::path::PathBuf;

    fn registry() -> PathRegistry {
        let registry = PathRegistry::new();
        registry
            .add_path(Path::new("direct", ProviderKind::Direct, "anthropic", Capabilities::default(), 3.0, 800))
            .unwrap();
        registry
            .add_path(Path::new("broker", ProviderKind::Broker, "gateway", Capabilities::default(), 1.5, 1200))
            .unwrap();
        registry
    }

    fn args(json: bool, provider: Option<&str>) -> PathsArgs {
        PathsArgs {
            json,
            provider: provider.map(str::to_string),
            config: PathBuf::from("dualroute.toml"),
        }
    }

    #[test]
    fn test_paths_filter_by_provider() {
        let out = handle_paths(&args(true, Some("broker")), &registry()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        let paths = value["paths"].as_array().unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0]["id"], "broker");
    }

    #[test]
    fn test_paths_invalid_provider() {
        assert!(handle_paths(&args(false, Some("carrier")), &registry()).is_err());
    }
}
