//! E2E CLI tests for project setup, owner resolution, and output modes.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

fn kin_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("kin"));
    cmd.current_dir(dir);
    cmd.env("KIN_LOG", "error");
    cmd.env("XDG_CONFIG_HOME", dir.join("xdg"));
    cmd.env("HOME", dir);
    cmd.env_remove("KIN_OWNER");
    cmd.env_remove("FORMAT");
    cmd
}

fn stdout_json(cmd: &mut Command) -> Value {
    let output = cmd.output().expect("kin should not crash");
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout should be valid JSON")
}

#[test]
fn init_creates_config_and_database() {
    let dir = TempDir::new().expect("tempdir");

    let report = stdout_json(kin_cmd(dir.path()).args(["init", "--json"]));
    assert_eq!(report["config_written"], true);
    assert_eq!(report["schema_version"].as_u64(), Some(2));
    assert!(dir.path().join(".kin/config.toml").exists());
    assert!(dir.path().join(".kin/kin.sqlite3").exists());

    // Second run keeps the config.
    let report = stdout_json(kin_cmd(dir.path()).args(["init", "--json"]));
    assert_eq!(report["config_written"], false);

    let report = stdout_json(kin_cmd(dir.path()).args(["init", "--force", "--json"]));
    assert_eq!(report["config_written"], true);
}

#[test]
fn commands_outside_a_project_report_not_initialized() {
    let dir = TempDir::new().expect("tempdir");

    kin_cmd(dir.path())
        .args(["tree", "list", "--owner", "alice"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("E1001"))
        .stderr(predicate::str::contains("kin init"));
}

#[test]
fn subdirectories_find_the_project_root() {
    let dir = TempDir::new().expect("tempdir");
    kin_cmd(dir.path()).arg("init").assert().success();
    let nested = dir.path().join("a/b");
    std::fs::create_dir_all(&nested).expect("mkdir");

    let tree = stdout_json(kin_cmd(&nested).args(["--owner", "alice", "tree", "create", "Nested", "--json"]));
    assert_eq!(tree["name"], "Nested");
}

#[test]
fn creating_a_tree_requires_an_owner() {
    let dir = TempDir::new().expect("tempdir");
    kin_cmd(dir.path()).arg("init").assert().success();

    kin_cmd(dir.path())
        .args(["tree", "create", "Orphans"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2001"))
        .stderr(predicate::str::contains("owner"));
}

#[test]
fn owner_env_and_flag_scope_trees() {
    let dir = TempDir::new().expect("tempdir");
    kin_cmd(dir.path()).arg("init").assert().success();

    let tree = stdout_json(
        kin_cmd(dir.path())
            .env("KIN_OWNER", "alice")
            .args(["tree", "create", "  Lovelaces  ", "--json"]),
    );
    assert_eq!(tree["name"], "Lovelaces");
    assert_eq!(tree["owner"], "alice");
    let id = tree["id"].as_i64().expect("id").to_string();

    let trees = stdout_json(kin_cmd(dir.path()).args(["--owner", "bob", "tree", "list", "--json"]));
    assert_eq!(trees, serde_json::json!([]));

    kin_cmd(dir.path())
        .env("KIN_OWNER", "alice")
        .args(["--owner", "bob", "tree", "show", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E4001"));
}

#[test]
fn user_config_supplies_owner() {
    let dir = TempDir::new().expect("tempdir");
    let config_dir = dir.path().join("xdg/kin");
    std::fs::create_dir_all(&config_dir).expect("mkdir");
    std::fs::write(config_dir.join("config.toml"), "owner = \"carol\"\n").expect("write");
    kin_cmd(dir.path()).arg("init").assert().success();

    let tree = stdout_json(kin_cmd(dir.path()).args(["tree", "create", "Config", "--json"]));
    assert_eq!(tree["owner"], "carol");
}

#[test]
fn broken_project_config_is_reported() {
    let dir = TempDir::new().expect("tempdir");
    kin_cmd(dir.path()).arg("init").assert().success();
    std::fs::write(dir.path().join(".kin/config.toml"), "[database\npath = ").expect("write");

    kin_cmd(dir.path())
        .args(["--owner", "alice", "tree", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E1002"));
}

#[test]
fn text_output_is_the_default_when_piped() {
    let dir = TempDir::new().expect("tempdir");
    kin_cmd(dir.path()).arg("init").assert().success();
    kin_cmd(dir.path())
        .args(["--owner", "alice", "tree", "create", "Piped"])
        .assert()
        .success()
        .stdout(predicate::str::contains("alice  Piped"));

    kin_cmd(dir.path())
        .env("FORMAT", "json")
        .args(["--owner", "alice", "tree", "list"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("["));
}

#[test]
fn invalid_person_dates_are_rejected() {
    let dir = TempDir::new().expect("tempdir");
    kin_cmd(dir.path()).arg("init").assert().success();
    let tree = stdout_json(kin_cmd(dir.path()).args(["--owner", "alice", "tree", "create", "T", "--json"]));
    let id = tree["id"].as_i64().expect("id").to_string();

    kin_cmd(dir.path())
        .args([
            "--owner", "alice", "person", "add", "--tree", &id, "--first", "Ada", "--last",
            "Byron", "--born", "1900-01-01", "--died", "1899-01-01", "--sex", "female",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2002"));

    kin_cmd(dir.path())
        .args([
            "--owner", "alice", "person", "add", "--tree", &id, "--first", "   ", "--last",
            "Byron", "--sex", "female",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2001"));
}

#[test]
fn completions_are_generated() {
    let dir = TempDir::new().expect("tempdir");
    kin_cmd(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("kin"));
}
