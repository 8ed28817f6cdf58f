use std::fs;
use std::process::Command;

use assert_cmd::prelude::*;
use serde_json::Value;

const CONFIG: &str = r#"
providers:
  - name: github
    start_url: "https://app.test/signin"
    home_domain: "app.test"
    provider_domain: "github.com"
    phases:
      - name: landing
        settle_delay_ms: 1
      - name: provider_auth
        settle_delay_ms: 1
      - name: callback
        settle_delay_ms: 1
      - name: dashboard
        settle_delay_ms: 1
"#;

fn write_config(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let path = dir.path().join("authpilot.yaml");
    fs::write(&path, CONFIG).expect("write config");
    path
}

#[test]
fn check_config_accepts_valid_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir);

    let mut cmd = Command::cargo_bin("authpilot").unwrap();
    let assert = cmd
        .args(["--config", config.to_str().unwrap(), "check-config"])
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(stdout.contains("configuration OK"));
}

#[test]
fn check_config_rejects_repeated_phase() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("authpilot.yaml");
    fs::write(
        &path,
        r#"
providers:
  - name: github
    start_url: "https://app.test/signin"
    home_domain: "app.test"
    provider_domain: "github.com"
    phases:
      - name: landing
      - name: landing
"#,
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("authpilot").unwrap();
    cmd.args(["--config", path.to_str().unwrap(), "check-config"])
        .assert()
        .failure();
}

#[test]
fn providers_lists_configured_flows() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir);

    let mut cmd = Command::cargo_bin("authpilot").unwrap();
    let assert = cmd
        .args(["--config", config.to_str().unwrap(), "providers"])
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(stdout.contains("github"));
    assert!(stdout.contains("landing -> provider_auth -> callback -> dashboard"));
}

#[test]
fn dry_run_emits_passed_report() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir);
    let report_dir = dir.path().join("reports");

    let mut cmd = Command::cargo_bin("authpilot").unwrap();
    let assert = cmd
        .args([
            "--config",
            config.to_str().unwrap(),
            "--output",
            "json",
            "run",
            "--dry-run",
            "--report-dir",
            report_dir.to_str().unwrap(),
        ])
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&assert.get_output().stdout);
    let payload: Value = serde_json::from_str(stdout.trim()).expect("valid JSON payload");
    let reports = payload.as_array().expect("report array");
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0]["status"], "passed");
    assert_eq!(reports[0]["provider"], "github");
    assert_eq!(reports[0]["history"].as_array().unwrap().len(), 4);

    // One report file per attempt.
    let written: Vec<_> = fs::read_dir(&report_dir).unwrap().collect();
    assert_eq!(written.len(), 1);
}

#[test]
fn run_rejects_unknown_provider() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir);

    let mut cmd = Command::cargo_bin("authpilot").unwrap();
    cmd.args([
        "--config",
        config.to_str().unwrap(),
        "run",
        "--dry-run",
        "--provider",
        "gitlab",
    ])
    .assert()
    .failure();
}
