use assert_cmd::{Command, cargo_bin_cmd};
use predicates::prelude::*;
use tempfile::TempDir;

fn sync_cmd(workspace: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("pomodoro-notion-sync");
    cmd.arg("--workspace").arg(workspace.path());
    cmd
}

#[test]
fn init_creates_workspace_layout() {
    let workspace = TempDir::new().expect("temp dir");

    sync_cmd(&workspace)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("pomodoro.sqlite"));

    assert!(workspace.path().join("config/notion_config.json").exists());
    assert!(workspace.path().join("state/pomodoro.sqlite").exists());
    assert!(workspace.path().join("logs").is_dir());
}

#[test]
fn tasks_added_offline_are_listed_and_counted() {
    let workspace = TempDir::new().expect("temp dir");

    sync_cmd(&workspace)
        .args(["add-task", "Work", "Email"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"task_key\": \"Work: Email\""))
        .stdout(predicate::str::contains("\"synced\": false"));
    sync_cmd(&workspace)
        .args(["add-task", "Home", "Laundry"])
        .assert()
        .success();

    sync_cmd(&workspace)
        .args(["tasks", "--project", "Work"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Work: Email"))
        .stdout(predicate::str::contains("Laundry").not());

    sync_cmd(&workspace)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"connection_state\": \"unconfigured\""))
        .stdout(predicate::str::contains("\"tasks\": 2"));
}

#[test]
fn token_is_stored_but_not_echoed() {
    let workspace = TempDir::new().expect("temp dir");

    sync_cmd(&workspace)
        .args(["set-token", "secret_abc"])
        .assert()
        .success()
        .stdout(predicate::str::contains("configured_untested"))
        .stdout(predicate::str::contains("secret_abc").not());

    sync_cmd(&workspace)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"token_configured\": true"))
        .stdout(predicate::str::contains("secret_abc").not());
}

#[test]
fn import_without_token_fails_with_prompt() {
    let workspace = TempDir::new().expect("temp dir");

    sync_cmd(&workspace)
        .arg("import")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("set-token"));
}

#[test]
fn recorded_session_is_pending_until_logged() {
    let workspace = TempDir::new().expect("temp dir");

    sync_cmd(&workspace)
        .args([
            "record-session",
            "Work",
            "Email",
            "--start",
            "2026-02-16T09:00:00",
            "--end",
            "2026-02-16T09:25:00",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"duration_seconds\": 1500.0"))
        .stdout(predicate::str::contains("\"logged\": false"));

    sync_cmd(&workspace)
        .args(["sessions", "--unlogged"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"notion_logged\": false"));

    sync_cmd(&workspace)
        .args(["log-sessions", "--window", "all"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("set-token"));
}
