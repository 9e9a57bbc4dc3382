//! CLI integration tests.
//!
//! End-to-end tests for the dualroute binary using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

fn dualroute_cmd() -> Command {
    Command::cargo_bin("dualroute").unwrap()
}

/// Write the bundled example configuration into a temp dir.
fn init_config(temp_dir: &TempDir) -> PathBuf {
    let config_path = temp_dir.path().join("dualroute.toml");
    dualroute_cmd()
        .args(["config", "init", "-o", config_path.to_str().unwrap()])
        .assert()
        .success();
    config_path
}

#[test]
fn test_version_output() {
    dualroute_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("dualroute"));
}

#[test]
fn test_help_shows_all_commands() {
    dualroute_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("route"))
        .stdout(predicate::str::contains("paths"))
        .stdout(predicate::str::contains("config"))
        .stdout(predicate::str::contains("completions"));
}

#[test]
fn test_config_init_creates_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    let content = std::fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("[[paths]]"));
    assert!(content.contains("[circuit_breaker]"));
}

#[test]
fn test_config_init_no_overwrite() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("dualroute.toml");
    std::fs::write(&config_path, "existing content").unwrap();

    dualroute_cmd()
        .args(["config", "init", "-o", config_path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    let content = std::fs::read_to_string(&config_path).unwrap();
    assert_eq!(content, "existing content");
}

#[test]
fn test_config_validate_reports_paths() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    dualroute_cmd()
        .args(["config", "validate", "-c", config_path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid"))
        .stdout(predicate::str::contains("2 paths"));
}

#[test]
fn test_config_validate_rejects_duplicates() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("dup.toml");
    std::fs::write(
        &config_path,
        r#"
[[paths]]
id = "direct"
provider = "direct"
default_latency_ms = 100

[[paths]]
id = "direct"
provider = "broker"
default_latency_ms = 200
"#,
    )
    .unwrap();

    dualroute_cmd()
        .args(["config", "validate", "-c", config_path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("direct"));
}

#[test]
fn test_missing_config_fails() {
    dualroute_cmd()
        .args(["paths", "-c", "/nonexistent/dualroute.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_paths_json() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    let output = dualroute_cmd()
        .args(["paths", "--json", "-c", config_path.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let paths = parsed["paths"].as_array().unwrap();
    assert_eq!(paths.len(), 2);
}

#[test]
fn test_paths_provider_filter() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    dualroute_cmd()
        .args([
            "paths",
            "-p",
            "broker",
            "-c",
            config_path.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("broker"))
        .stdout(predicate::str::contains("anthropic").not());
}

#[test]
fn test_route_json_ranks_both_paths() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    let output = dualroute_cmd()
        .args(["route", "--json", "-c", config_path.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["decision"]["candidates"].as_array().unwrap().len(), 2);
}

#[test]
fn test_route_domain_exclusion() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    let output = dualroute_cmd()
        .args([
            "route",
            "--json",
            "-d",
            "healthcare",
            "-c",
            config_path.to_str().unwrap(),
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["decision"]["path_id"], "direct");
    assert_eq!(parsed["excluded"][0]["path_id"], "broker");
}

#[test]
fn test_route_without_candidate_fails() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    dualroute_cmd()
        .args([
            "route",
            "--cost-ceiling",
            "0.1",
            "-c",
            config_path.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No candidate path"));
}

#[test]
fn test_completions_bash() {
    dualroute_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dualroute"));
}
