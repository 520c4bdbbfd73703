/// End-to-end tests for config file discovery, validation and CLI overrides.
///
/// Each test runs `sweep --once` in an isolated directory. On an empty graph
/// the sweep finds nothing to retry, so the command never reaches the network.
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

// ============================================================================
// Helper Functions
// ============================================================================

fn write_config(path: &Path, content: &str) {
    fs::write(path, content).unwrap();
}

fn sweep_in(dir: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("artifact-graph");
    cmd.current_dir(dir).args(["sweep", "--once"]);
    cmd
}

// ============================================================================
// Discovery
// ============================================================================

#[test]
fn test_discovered_config_sets_store_path() {
    let dir = TempDir::new().unwrap();
    write_config(
        &dir.path().join("artifact-graph.config.yml"),
        "store_path: graph/custom.json\n",
    );
    fs::create_dir(dir.path().join("graph")).unwrap();

    sweep_in(dir.path()).assert().success();

    assert!(dir.path().join("graph/custom.json").exists());
    assert!(!dir.path().join("artifact-graph.store.json").exists());
}

#[test]
fn test_store_option_overrides_config() {
    let dir = TempDir::new().unwrap();
    write_config(
        &dir.path().join("artifact-graph.config.yml"),
        "store_path: from-config.json\n",
    );

    sweep_in(dir.path())
        .args(["--store", "from-cli.json"])
        .assert()
        .success();

    assert!(dir.path().join("from-cli.json").exists());
    assert!(!dir.path().join("from-config.json").exists());
}

#[test]
fn test_explicit_config_path() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("custom.yml");
    write_config(&config, "store_path: explicit.json\nmax_retries: 1\n");

    sweep_in(dir.path())
        .arg("--config")
        .arg(&config)
        .assert()
        .success();

    assert!(dir.path().join("explicit.json").exists());
}

#[test]
fn test_unknown_field_is_warned_not_rejected() {
    let dir = TempDir::new().unwrap();
    write_config(
        &dir.path().join("artifact-graph.config.yml"),
        "mystery_option: 42\n",
    );

    sweep_in(dir.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Unknown config field"))
        .stderr(predicate::str::contains("mystery_option"));
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_non_http_repository_is_rejected() {
    let dir = TempDir::new().unwrap();
    write_config(
        &dir.path().join("artifact-graph.config.yml"),
        "repository_url: ftp://mirror.example.org/maven2\n",
    );

    sweep_in(dir.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("repository_url"));
}

#[test]
fn test_zero_sweeper_concurrency_is_rejected() {
    let dir = TempDir::new().unwrap();
    write_config(
        &dir.path().join("artifact-graph.config.yml"),
        "sweeper:\n  concurrency: 0\n",
    );

    sweep_in(dir.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("sweeper.concurrency must be positive"));
}

#[test]
fn test_missing_explicit_config_fails() {
    let dir = TempDir::new().unwrap();

    sweep_in(dir.path())
        .args(["--config", "does-not-exist.yml"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Failed to read config file"));
}

#[test]
fn test_malformed_config_fails() {
    let dir = TempDir::new().unwrap();
    write_config(
        &dir.path().join("artifact-graph.config.yml"),
        "sweeper: [[[broken",
    );

    sweep_in(dir.path())
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Failed to parse config file"));
}
