//! CLI smoke tests for the `tn` binary
//!
//! Every invocation gets its own HOME and XDG directories so logs, PID
//! files and the task database stay inside a temp dir.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn tn(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("tn").expect("tn binary should build");
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("XDG_DATA_HOME", home.path().join("data"))
        .env("XDG_RUNTIME_DIR", home.path().join("run"))
        .current_dir(home.path());
    cmd
}

fn write_config(home: &TempDir, extra: &str) -> std::path::PathBuf {
    let path = home.path().join("tasknotify.yml");
    let yaml = format!(
        "storage:\n  db-path: {}\n{}",
        home.path().join("tasks.db").display(),
        extra
    );
    std::fs::write(&path, yaml).expect("Failed to write config");
    path
}

#[test]
fn test_help_lists_commands() {
    let home = TempDir::new().unwrap();
    tn(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("tick"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("run-daemon").not());
}

#[test]
fn test_version() {
    let home = TempDir::new().unwrap();
    tn(&home).arg("--version").assert().success().stdout(predicate::str::starts_with("tn "));
}

#[test]
fn test_config_prints_effective_yaml() {
    let home = TempDir::new().unwrap();
    let config = write_config(&home, "scheduler:\n  tick-interval-secs: 60\n");

    tn(&home)
        .arg("--config")
        .arg(&config)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("tick-interval-secs: 60"))
        .stdout(predicate::str::contains("smtp-host: smtp.gmail.com"));
}

#[test]
fn test_tick_dry_run_on_empty_store() {
    let home = TempDir::new().unwrap();
    let config = write_config(&home, "");

    tn(&home)
        .arg("--config")
        .arg(&config)
        .args(["tick", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run"))
        .stdout(predicate::str::contains("Tick at"))
        .stdout(predicate::str::contains("overdue"));

    assert!(home.path().join("tasks.db").exists());
}

#[test]
fn test_tick_json_reports_three_kinds() {
    let home = TempDir::new().unwrap();
    let config = write_config(&home, "");

    let output = tn(&home)
        .arg("--config")
        .arg(&config)
        .args(["tick", "--dry-run", "--format", "json"])
        .output()
        .expect("Failed to run tn");
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("tick output should be JSON");
    let kinds = report["kinds"].as_array().expect("kinds array");
    assert_eq!(kinds.len(), 3);
    assert_eq!(kinds[0]["kind"], "reminder");
    assert_eq!(kinds[2]["kind"], "stalled_unfinished");
}

#[test]
fn test_tick_without_smtp_credentials_fails() {
    let home = TempDir::new().unwrap();
    let config = write_config(&home, "email:\n  username-env: TN_CLI_TEST_MISSING_USER\n");

    tn(&home)
        .arg("--config")
        .arg(&config)
        .env_remove("TN_CLI_TEST_MISSING_USER")
        .arg("tick")
        .assert()
        .failure()
        .stderr(predicate::str::contains("TN_CLI_TEST_MISSING_USER"));
}

#[test]
fn test_invalid_scheduler_config_fails() {
    let home = TempDir::new().unwrap();
    let config = write_config(&home, "scheduler:\n  tick-interval-secs: 0\n");

    tn(&home)
        .arg("--config")
        .arg(&config)
        .args(["tick", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("tick-interval-secs"));
}

#[test]
fn test_status_when_stopped() {
    let home = TempDir::new().unwrap();

    tn(&home)
        .args(["status", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"running\": false"));
}

#[test]
fn test_stop_when_not_running() {
    let home = TempDir::new().unwrap();

    tn(&home)
        .arg("stop")
        .assert()
        .success()
        .stdout(predicate::str::contains("not running"));
}
