// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI surface specs: validation failures exit 1, help exits 0.

use super::prelude::*;

fn stdout_of(assert: assert_cmd::assert::Assert) -> String {
    String::from_utf8_lossy(&assert.get_output().stdout).into_owned()
}

fn stderr_of(assert: assert_cmd::assert::Assert) -> String {
    String::from_utf8_lossy(&assert.get_output().stderr).into_owned()
}

#[test]
fn help_lists_subcommands() {
    let stdout = stdout_of(berth().arg("--help").assert().success());
    for subcommand in ["spawn", "register", "start", "status"] {
        assert!(stdout.contains(subcommand), "help missing '{}'", subcommand);
    }
}

#[test]
fn version_exits_zero() {
    berth().arg("--version").assert().success();
}

#[test]
fn unknown_subcommand_exits_one() {
    berth().arg("teleport").assert().code(1);
}

#[test]
fn spawn_rejects_missing_project_path() {
    let project = Project::new();
    let assert =
        project.berth().args(["spawn", "/nonexistent/berth-project"]).assert().code(1);
    assert!(stderr_of(assert).contains("does not exist"));
}

#[test]
fn spawn_rejects_missing_descriptor() {
    let project = Project::new();
    std::fs::create_dir_all(project.project_path()).unwrap();
    let assert =
        project.berth().arg("spawn").arg(project.project_path()).assert().code(1);
    assert!(stderr_of(assert).contains("devcontainer descriptor"));
}

#[test]
fn spawn_rejects_malformed_build_arg() {
    let project = Project::new().with_devcontainer();
    let assert = project
        .berth()
        .arg("spawn")
        .arg(project.project_path())
        .args(["--build-arg", "NOEQUALS"])
        .assert()
        .code(1);
    assert!(stderr_of(assert).contains("KEY=VALUE"));
}

#[test]
fn spawn_rejects_unknown_rebuild_policy() {
    let project = Project::new().with_devcontainer();
    project
        .berth()
        .arg("spawn")
        .arg(project.project_path())
        .args(["--rebuild", "sometimes"])
        .assert()
        .code(1);
}

#[test]
fn register_rejects_bad_slug() {
    let project = Project::new();
    let assert = project.berth().args(["register", "not-a-slug"]).assert().code(1);
    assert!(stderr_of(assert).contains("owner/project"));
}

#[test]
fn status_reports_empty_state() {
    let project = Project::new();
    let stdout = stdout_of(project.berth().arg("status").assert().success());
    assert!(stdout.contains("Daemon: not running"));
    assert!(stdout.contains("Registrations: none"));
    assert!(stdout.contains("Named containers: none"));
}

#[test]
fn status_lists_stored_registrations() {
    let project = Project::new();
    std::fs::create_dir_all(project.state_dir()).unwrap();
    std::fs::write(
        project.state_dir().join("registrations.toml"),
        r#"
[[registration]]
server = "https://queue.example.com"
owner = "acme"
project = "api"
id = "reg-1"
name = "runner-a"
token = "tok-secret"
"#,
    )
    .unwrap();

    let stdout = stdout_of(project.berth().arg("status").assert().success());
    assert!(stdout.contains("acme/api"));
    assert!(stdout.contains("runner-a"));
    // The bearer token is never echoed
    assert!(!stdout.contains("tok-secret"));
}
