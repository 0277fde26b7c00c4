//! CLI integration tests.
//!
//! These verify command-line argument parsing, help output, the init
//! command and exit codes for configuration errors. Nothing here touches
//! the network.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a command for the shopify-wc-migrate binary.
fn cmd() -> Command {
    Command::cargo_bin("shopify-wc-migrate").unwrap()
}

// =============================================================================
// Help and Version
// =============================================================================

#[test]
fn test_help_shows_all_commands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("health-check"))
        .stdout(predicate::str::contains("init"));
}

#[test]
fn test_run_subcommand_help() {
    cmd()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--only"));
}

#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("shopify-wc-migrate"));
}

// =============================================================================
// Configuration errors
// =============================================================================

#[test]
fn test_missing_config_file_exits_nonzero() {
    cmd()
        .args(["--config", "/nonexistent/config.yaml", "run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_invalid_config_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "source: {store_url: '', access_token: ''}\n").unwrap();

    cmd()
        .args(["--config", path.to_str().unwrap(), "run", "--dry-run"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_unknown_only_kind_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(
        &path,
        "source:\n  store_url: https://demo.myshopify.com\n  access_token: shpat_x\n\
         target:\n  url: https://shop.example.com\n  consumer_key: ck_x\n  consumer_secret: cs_x\n",
    )
    .unwrap();

    cmd()
        .args([
            "--config",
            path.to_str().unwrap(),
            "run",
            "--dry-run",
            "--only",
            "warehouses",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown entity kind"));
}

// =============================================================================
// Init
// =============================================================================

#[test]
fn test_init_writes_starter_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");

    cmd()
        .args(["init", "--output", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote starter configuration"));

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("store_url"));
    assert!(content.contains("consumer_key"));
    assert!(content.contains("correlation_file"));
}

#[test]
fn test_init_refuses_overwrite_without_force() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "keep me").unwrap();

    cmd()
        .args(["init", "--output", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "keep me");

    cmd()
        .args(["init", "--force", "--output", path.to_str().unwrap()])
        .assert()
        .success();
    assert!(std::fs::read_to_string(&path).unwrap().contains("store_url"));
}
