/// End-to-end tests for config file discovery, validation and the settings
/// it feeds into an analysis.
///
/// These tests exercise the full flow from config file on disk through CLI
/// invocation, using `assert_cmd` and `tempfile` for isolated environments.
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

// ============================================================================
// Helper Functions
// ============================================================================

/// Settings that make an unreachable target fail fast.
const FAST_CONFIG: &str = r#"
services:
  http_scraper:
    max_attempts: 1
    base_delay_ms: 0
    max_delay_ms: 0
    jitter: false
deadlines:
  website_secs: 5
"#;

/// Write a config file at the specified path.
fn write_config(path: &Path, content: &str) {
    fs::write(path, content).unwrap();
}

// ============================================================================
// Discovery
// ============================================================================

#[test]
fn test_discovered_config_is_applied() {
    let dir = TempDir::new().unwrap();
    write_config(&dir.path().join("stackdebt.config.yml"), FAST_CONFIG);

    cargo_bin_cmd!("stackdebt")
        .current_dir(dir.path())
        .args(["analyze", "http://127.0.0.1:9"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("http_scraper unavailable"));
}

#[test]
fn test_explicit_config_path() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("custom.yml");
    write_config(&config_path, FAST_CONFIG);

    cargo_bin_cmd!("stackdebt")
        .current_dir(dir.path())
        .args(["analyze", "http://127.0.0.1:9", "--config"])
        .arg(&config_path)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("No software components"));
}

#[test]
fn test_unknown_fields_warn_but_do_not_fail() {
    let dir = TempDir::new().unwrap();
    write_config(
        &dir.path().join("stackdebt.config.yml"),
        "favourite_colour: teal\ncache:\n  max_entries: 10\n",
    );

    cargo_bin_cmd!("stackdebt")
        .current_dir(dir.path())
        .arg("status")
        .assert()
        .code(0)
        .stderr(predicate::str::contains("unknown config field"))
        .stderr(predicate::str::contains("favourite_colour"));
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_missing_explicit_config_fails() {
    let dir = TempDir::new().unwrap();

    cargo_bin_cmd!("stackdebt")
        .current_dir(dir.path())
        .args(["status", "--config", "does-not-exist.yml"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Failed to read config file"));
}

#[test]
fn test_malformed_config_fails() {
    let dir = TempDir::new().unwrap();
    write_config(
        &dir.path().join("stackdebt.config.yml"),
        "services: [[[broken",
    );

    cargo_bin_cmd!("stackdebt")
        .current_dir(dir.path())
        .arg("status")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Failed to parse config file"));
}

#[test]
fn test_zero_attempts_rejected_with_hint() {
    let dir = TempDir::new().unwrap();
    write_config(
        &dir.path().join("stackdebt.config.yml"),
        "services:\n  github_api:\n    max_attempts: 0\n",
    );

    cargo_bin_cmd!("stackdebt")
        .current_dir(dir.path())
        .arg("status")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("max_attempts must be at least 1"))
        .stderr(predicate::str::contains("Hint"));
}

#[test]
fn test_exponential_base_below_one_rejected() {
    let dir = TempDir::new().unwrap();
    write_config(
        &dir.path().join("stackdebt.config.yml"),
        "services:\n  http_scraper:\n    exponential_base: 0.9\n",
    );

    cargo_bin_cmd!("stackdebt")
        .current_dir(dir.path())
        .arg("status")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("exponential_base"));
}

// ============================================================================
// Reference table
// ============================================================================

#[test]
fn test_missing_reference_table_fails_before_analysis() {
    let dir = TempDir::new().unwrap();
    write_config(
        &dir.path().join("stackdebt.config.yml"),
        "reference_table: ./missing-table.yml\n",
    );

    cargo_bin_cmd!("stackdebt")
        .current_dir(dir.path())
        .args(["analyze", "https://example.com"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("reference table"));
}

#[test]
fn test_invalid_reference_table_fails() {
    let dir = TempDir::new().unwrap();
    write_config(
        &dir.path().join("table.yml"),
        "releases:\n  - { software: nginx, version: \"1.0\" }\n",
    );
    write_config(
        &dir.path().join("stackdebt.config.yml"),
        "reference_table: ./table.yml\n",
    );

    cargo_bin_cmd!("stackdebt")
        .current_dir(dir.path())
        .args(["analyze", "https://example.com"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Failed to load reference table"));
}

#[test]
fn test_custom_reference_table_with_unreachable_target() {
    let dir = TempDir::new().unwrap();
    write_config(
        &dir.path().join("table.yml"),
        "releases:\n  - { software: nginx, version: \"1.18.0\", release_date: 2020-04-21 }\n",
    );
    write_config(
        &dir.path().join("stackdebt.config.yml"),
        &format!("{}reference_table: ./table.yml\n", FAST_CONFIG),
    );

    cargo_bin_cmd!("stackdebt")
        .current_dir(dir.path())
        .args(["analyze", "http://127.0.0.1:9", "--format", "text"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Suggestions"));
}
