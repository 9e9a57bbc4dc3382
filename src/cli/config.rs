//! Config command handlers

use crate::cli::{load_config, ConfigInitArgs, ConfigValidateArgs};
use std::fs;

const EXAMPLE_CONFIG: &str = include_str!("../../dualroute.example.toml");

/// Handle `dualroute config init` command
pub fn handle_config_init(args: &ConfigInitArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.output.exists() && !args.force {
        return Err(format!(
            "File already exists: {}. Use --force to overwrite.",
            args.output.display()
        )
        .into());
    }

    fs::write(&args.output, EXAMPLE_CONFIG)?;

    println!("✓ Configuration file created: {}", args.output.display());
    println!("  Edit the [[paths]] entries to match your deployment.");

    Ok(())
}

/// Handle `dualroute config validate` command
pub fn handle_config_validate(
    args: &ConfigValidateArgs,
) -> Result<String, Box<dyn std::error::Error>> {
    let config = load_config(&args.config)?;
    Ok(format!(
        "✓ {} is valid ({} paths, {} circuit overrides, {} health components)",
        args.config.display(),
        config.paths.len(),
        config.circuit_breaker.overrides.len(),
        config.health.components.len()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_init_creates_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let output_path = temp_dir.path().join("dualroute.toml");

        let args = ConfigInitArgs {
            output: output_path.clone(),
            force: false,
        };

        handle_config_init(&args).unwrap();

        let content = std::fs::read_to_string(&output_path).unwrap();
        assert!(content.contains("[[paths]]"));
    }

    #[test]
    fn test_config_init_no_overwrite() {
        let temp_dir = tempfile::tempdir().unwrap();
        let output_path = temp_dir.path().join("dualroute.toml");
        std::fs::write(&output_path, "existing").unwrap();

        let args = ConfigInitArgs {
            output: output_path.clone(),
            force: false,
        };

        assert!(handle_config_init(&args).is_err());
        let content = std::fs::read_to_string(&output_path).unwrap();
        assert_eq!(content, "existing");
    }

    #[test]
    fn test_config_init_force_overwrites() {
        let temp_dir = tempfile::tempdir().unwrap();
        let output_path = temp_dir.path().join("dualroute.toml");
        std::fs::write(&output_path, "old content").unwrap();

        let args = ConfigInitArgs {
            output: output_path.clone(),
            force: true,
        };

        handle_config_init(&args).unwrap();
        let content = std::fs::read_to_string(&output_path).unwrap();
        assert!(content.contains("[circuit_breaker]"));
    }

    #[test]
    fn test_config_validate_accepts_example() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("dualroute.toml");
        std::fs::write(&path, EXAMPLE_CONFIG).unwrap();

        let message = handle_config_validate(&ConfigValidateArgs { config: path }).unwrap();
        assert!(message.contains("2 paths"));
    }

    #[test]
    fn test_config_validate_rejects_duplicate_paths() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("dualroute.toml");
        std::fs::write(
            &path,
            r#"
[[paths]]
id = "direct"
provider = "direct"

[[paths]]
id = "direct"
provider = "broker"
"#,
        )
        .unwrap();

        let err = handle_config_validate(&ConfigValidateArgs { config: path }).unwrap_err();
        assert!(err.to_string().contains("direct"));
    }
}
