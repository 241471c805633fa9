// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::runner::FakeRunner;

fn cli(fake: &FakeRunner) -> DockerCli {
    DockerCli::new(Arc::new(fake.clone()))
}

#[tokio::test]
async fn volume_create_requires_success() {
    let fake = FakeRunner::new();
    let docker = cli(&fake);
    docker.volume_create("berth-api-ws").await.unwrap();
    assert_eq!(fake.count_calls("volume create berth-api-ws"), 1);

    fake.fail("volume create", 1, "permission denied");
    let err = docker.volume_create("berth-api-ws").await.unwrap_err();
    assert!(matches!(err, EngineError::CommandFailed { .. }));
}

#[tokio::test]
async fn find_container_returns_first_id() {
    let fake = FakeRunner::new();
    fake.respond("ps -a --filter", "abc123\ndef456\n");
    let docker = cli(&fake);
    let found = docker.find_container_by_label("berth.project", "api").await.unwrap();
    assert_eq!(found.as_deref(), Some("abc123"));
    assert_eq!(fake.count_calls("label=berth.project=api"), 1);
}

#[tokio::test]
async fn find_container_empty_is_none() {
    let fake = FakeRunner::new();
    fake.respond("ps -a --filter", "\n");
    let docker = cli(&fake);
    assert!(docker.find_container_by_label("berth.project", "api").await.unwrap().is_none());
}

#[tokio::test]
async fn labels_parse_json() {
    let fake = FakeRunner::new();
    fake.respond(
        "inspect --format {{json .Config.Labels}}",
        r#"{"berth.project":"api","berth.config-hash":"aabb"}"#,
    );
    let docker = cli(&fake);
    let labels = docker.container_labels("abc123").await.unwrap();
    assert_eq!(labels.get("berth.project").map(String::as_str), Some("api"));
    assert_eq!(labels.get("berth.config-hash").map(String::as_str), Some("aabb"));
}

#[tokio::test]
async fn null_labels_are_empty() {
    let fake = FakeRunner::new();
    fake.respond("inspect --format {{json .Config.Labels}}", "null");
    let docker = cli(&fake);
    assert!(docker.container_labels("abc123").await.unwrap().is_empty());
}

#[tokio::test]
async fn container_running_parses_bool() {
    let fake = FakeRunner::new();
    fake.respond("{{.State.Running}}", "true\n");
    let docker = cli(&fake);
    assert!(docker.container_running("abc").await.unwrap());
}

#[tokio::test]
async fn run_detached_builds_full_command() {
    let fake = FakeRunner::new();
    fake.respond("docker run -d", "deadbeef\n");
    let docker = cli(&fake);
    let id = docker
        .run_detached(
            "berth-bootstrap-x1",
            "berth-bootstrap:latest",
            &["berth-api-ws:/workspace".to_string()],
            &[("berth.bootstrap".to_string(), "true".to_string())],
            &["tail", "-f", "/dev/null"],
        )
        .await
        .unwrap();
    assert_eq!(id, "deadbeef");
    let line = fake.calls().remove(0);
    assert!(line.contains("--name berth-bootstrap-x1"));
    assert!(line.contains("-v berth-api-ws:/workspace"));
    assert!(line.contains("--label berth.bootstrap=true"));
    assert!(line.ends_with("berth-bootstrap:latest tail -f /dev/null"));
}

#[tokio::test]
async fn cp_into_does_not_error_on_failure() {
    let fake = FakeRunner::new();
    fake.fail("docker cp", 1, "no space left on device");
    let docker = cli(&fake);
    let out = docker
        .cp_into("berth-bootstrap-x1", Path::new("/src/api"), "/workspace")
        .await
        .unwrap();
    assert!(!out.success());
    assert!(out.stderr.contains("no space left"));
}

#[tokio::test]
async fn image_exists_maps_status() {
    let fake = FakeRunner::new();
    let docker = cli(&fake);
    assert!(docker.image_exists("berth-bootstrap:latest").await.unwrap());

    fake.fail("image inspect", 1, "no such image");
    assert!(!docker.image_exists("berth-bootstrap:latest").await.unwrap());
}
