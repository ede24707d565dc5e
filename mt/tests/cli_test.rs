//! End-to-end tests for the `mt` binary

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn mt(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("mt").expect("Failed to find mt binary");
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env("XDG_DATA_HOME", home.path().join("data"))
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("NO_COLOR", "1")
        .env_remove("ANTHROPIC_API_KEY")
        .arg("--store")
        .arg(home.path().join("store"));
    cmd
}

#[test]
fn test_help_mentions_log_path() {
    let home = TempDir::new().unwrap();
    mt(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Logs are written to:"))
        .stdout(predicate::str::contains("prioritize"));
}

#[test]
fn test_project_add_and_list() {
    let home = TempDir::new().unwrap();

    mt(&home)
        .args(["project", "add", "Launch", "-d", "Ship the public beta"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added project Launch"));

    mt(&home)
        .args(["project", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Uncategorized"))
        .stdout(predicate::str::contains("Launch"))
        .stdout(predicate::str::contains("Ship the public beta"));
}

#[test]
fn test_task_add_list_and_done() {
    let home = TempDir::new().unwrap();

    mt(&home).args(["project", "add", "Launch"]).assert().success();
    mt(&home)
        .args(["task", "add", "Write docs", "-p", "launch", "--deadline", "2026-11-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added task Write docs"));

    mt(&home)
        .args(["task", "list", "-p", "launch"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[ ]"))
        .stdout(predicate::str::contains("Write docs"))
        .stdout(predicate::str::contains("due 2026-11-01"));

    mt(&home)
        .args(["task", "done", "write-docs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Completed task Write docs"));

    mt(&home)
        .args(["task", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No tasks"));

    mt(&home)
        .args(["task", "list", "--done"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[x]"));
}

#[test]
fn test_task_add_rejects_bad_deadline() {
    let home = TempDir::new().unwrap();

    mt(&home)
        .args(["task", "add", "Write docs", "--deadline", "next week"])
        .assert()
        .failure();
}

#[test]
fn test_unknown_project_reference_fails() {
    let home = TempDir::new().unwrap();

    mt(&home)
        .args(["task", "add", "Write docs", "-p", "nowhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No project matches 'nowhere'"));
}

#[test]
fn test_uncategorized_cannot_be_deleted() {
    let home = TempDir::new().unwrap();

    mt(&home)
        .args(["project", "delete", "uncategorized"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be deleted"));
}

#[test]
fn test_prioritize_without_api_key_fails_before_calling_model() {
    let home = TempDir::new().unwrap();

    mt(&home).args(["project", "add", "Launch"]).assert().success();
    mt(&home).args(["task", "add", "Write docs", "-p", "launch"]).assert().success();

    mt(&home)
        .args(["prioritize", "launch"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ANTHROPIC_API_KEY"));
}
