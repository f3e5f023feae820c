//! Smoke tests for the stockcheck CLI
//!
//! Runs the real binary. Scenario runs use the simulated driver so no
//! browser or network is needed.

#![allow(deprecated)] // Command::cargo_bin
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get a command for the stockcheck binary with a clean environment
fn stockcheck(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("stockcheck").expect("stockcheck binary should exist");
    cmd.current_dir(dir.path())
        .env_remove("STOCKCHECK_CONFIG")
        .env_remove("URL")
        .env_remove("ADMIN_USERNAME")
        .env_remove("ADMIN_PASSWORD")
        .env_remove("VOLUNTEER_USERNAME")
        .env_remove("VOLUNTEER_PASSWORD")
        .env_remove("VOLUNTEER_PIN")
        .env_remove("RUST_LOG");
    cmd
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_version_flag() {
    let dir = TempDir::new().unwrap();
    stockcheck(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.4.0"));
}

#[test]
fn test_help_flag() {
    let dir = TempDir::new().unwrap();
    stockcheck(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_no_args_fails() {
    let dir = TempDir::new().unwrap();
    stockcheck(&dir).assert().failure();
}

// ============================================================================
// List
// ============================================================================

#[test]
fn test_list_all_scenarios() {
    let dir = TempDir::new().unwrap();
    stockcheck(&dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("login_volunteer"))
        .stdout(predicate::str::contains("checkout_adjusts_inventory"))
        .stdout(predicate::str::contains("logout"));
}

#[test]
fn test_list_by_tag() {
    let dir = TempDir::new().unwrap();
    stockcheck(&dir)
        .args(["list", "--tag", "smoke"])
        .assert()
        .success()
        .stdout(predicate::str::contains("checkout_general"))
        .stdout(predicate::str::contains("out_of_stock_filter").not());
}

#[test]
fn test_list_json() {
    let dir = TempDir::new().unwrap();
    let output = stockcheck(&dir)
        .args(["list", "--json", "--tag", "serial"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let listing: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<_> = listing
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap().to_string())
        .collect();
    assert!(names.contains(&"checkout_adjusts_inventory".to_string()));
    assert!(!names.contains(&"logout".to_string()));
}

// ============================================================================
// Run
// ============================================================================

#[test]
fn test_run_smoke_against_simulated_app() {
    let dir = TempDir::new().unwrap();
    stockcheck(&dir)
        .args(["run", "--driver", "simulated", "--tag", "smoke", "--color", "never"])
        .assert()
        .success()
        .stderr(predicate::str::contains("PASS login_volunteer"))
        .stderr(predicate::str::contains("3 passed, 0 failed"));
}

#[test]
fn test_run_json_report_on_stdout() {
    let dir = TempDir::new().unwrap();
    let output = stockcheck(&dir)
        .args(["run", "--driver", "simulated", "--tag", "smoke", "--json", "-q"])
        .arg("--artifacts")
        .arg(dir.path().join("shots"))
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["total"], 3);
    assert_eq!(report["passed"], 3);
    assert_eq!(report["failed"], 0);
    let results = report["results"].as_array().unwrap();
    assert_eq!(results[0]["name"], "login_volunteer");
    assert!(results.iter().all(|r| r["duration_ms"].is_u64()));
}

#[test]
fn test_run_with_unmatched_filter_fails() {
    let dir = TempDir::new().unwrap();
    stockcheck(&dir)
        .args(["run", "--driver", "simulated", "--filter", "no_such_scenario"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no scenarios match"));
}

#[test]
fn test_failing_scenario_exits_nonzero_with_screenshot() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("suite.yaml");
    fs::write(&config, "expected:\n  logout_message: Goodbye\n").unwrap();
    let artifacts = dir.path().join("shots");

    stockcheck(&dir)
        .args(["run", "--driver", "simulated", "--filter", "logout", "--color", "never"])
        .arg("--config")
        .arg(&config)
        .arg("--artifacts")
        .arg(&artifacts)
        .assert()
        .failure()
        .stderr(predicate::str::contains("FAIL logout"))
        .stderr(predicate::str::contains("1 of 1 scenarios failed"));

    assert!(artifacts.join("logout.png").exists());
}

// ============================================================================
// Config
// ============================================================================

#[test]
fn test_config_masks_passwords() {
    let dir = TempDir::new().unwrap();
    stockcheck(&dir)
        .arg("config")
        .env("ADMIN_USERNAME", "admin@example.org")
        .env("ADMIN_PASSWORD", "hunter2")
        .assert()
        .success()
        .stdout(predicate::str::contains("admin@example.org"))
        .stdout(predicate::str::contains("***"))
        .stdout(predicate::str::contains("hunter2").not());
}

#[test]
fn test_config_check_without_credentials_fails() {
    let dir = TempDir::new().unwrap();
    stockcheck(&dir)
        .args(["config", "--check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("base URL is not set"));
}

#[test]
fn test_invalid_config_file_fails() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("broken.yaml");
    fs::write(&config, "timeouts: [not, a, map]\n").unwrap();
    stockcheck(&dir)
        .arg("config")
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}
