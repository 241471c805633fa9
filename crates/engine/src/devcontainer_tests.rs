// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::runner::FakeRunner;
use berth_core::RebuildBehavior;

const UP_SUCCESS: &str = concat!(
    "[1 ms] resolving configuration\n",
    "[2 ms] building image\n",
    r#"{"outcome":"success","containerId":"cafe01","remoteUser":"dev","remoteWorkspaceFolder":"/workspace"}"#,
    "\n",
);

fn options() -> berth_core::SpawnOptions {
    berth_core::SpawnOptions::builder("api", "/src/api")
        .rebuild_behavior(RebuildBehavior::Always)
        .build()
}

#[tokio::test]
async fn up_parses_result_document() {
    let fake = FakeRunner::new();
    fake.respond("devcontainer up", UP_SUCCESS);
    let cli = DevcontainerCli::new(Arc::new(fake.clone()));

    let (result, output) = cli.up(&options(), Some("berth-api-ws"), &[]).await.unwrap();
    let result = result.unwrap();
    assert!(result.succeeded());
    assert_eq!(result.container_id.as_deref(), Some("cafe01"));
    assert_eq!(result.remote_user.as_deref(), Some("dev"));
    assert!(output.success());

    let line = fake.calls().remove(0);
    assert!(line.contains("--workspace-folder /src/api"));
    assert!(line.contains("--config /src/api/.devcontainer/devcontainer.json"));
    assert!(line.contains("--workspace-mount type=volume,source=berth-api-ws,target=/workspace"));
}

#[tokio::test]
async fn up_passes_build_args_and_labels() {
    let fake = FakeRunner::new();
    fake.respond("devcontainer up", UP_SUCCESS);
    let cli = DevcontainerCli::new(Arc::new(fake.clone()));

    let opts = berth_core::SpawnOptions::builder("api", "/src/api")
        .build_arg("RUST_VERSION", "1.80")
        .build();
    let labels = vec![("berth.project".to_string(), "api".to_string())];
    cli.up(&opts, None, &labels).await.unwrap();

    let line = fake.calls().remove(0);
    assert!(line.contains("--id-label berth.project=api"));
    assert!(line.contains("--build-arg RUST_VERSION=1.80"));
    assert!(!line.contains("--workspace-mount"));
}

#[tokio::test]
async fn up_mounts_credential_socket() {
    let fake = FakeRunner::new();
    fake.respond("devcontainer up", UP_SUCCESS);
    let cli = DevcontainerCli::new(Arc::new(fake.clone()));

    let opts = berth_core::SpawnOptions::builder("api", "/src/api")
        .credential_socket("/run/berth/cred-reg1.sock")
        .build();
    cli.up(&opts, None, &[]).await.unwrap();

    let line = fake.calls().remove(0);
    assert!(line.contains("type=bind,source=/run/berth/cred-reg1.sock"));
    assert!(line.contains("--remote-env BERTH_CREDENTIAL_SOCKET=/var/run/berth/credentials.sock"));
}

#[tokio::test]
async fn up_forwards_docker_config_env() {
    let fake = FakeRunner::new();
    fake.respond("devcontainer up", UP_SUCCESS);
    let cli = DevcontainerCli::new(Arc::new(fake.clone()));

    let opts = berth_core::SpawnOptions::builder("api", "/src/api")
        .forward_docker_config(true)
        .docker_config_path("/home/dev/.docker")
        .build();
    cli.up(&opts, None, &[]).await.unwrap();

    let inv = fake.invocations().remove(0);
    assert!(inv
        .envs
        .contains(&("DOCKER_CONFIG".to_string(), "/home/dev/.docker".to_string())));
}

#[tokio::test]
async fn up_streams_to_log_file_and_parses_tail() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("build.log");
    // Simulate the manager having streamed its output to the log file
    std::fs::write(&log, UP_SUCCESS).unwrap();

    let fake = FakeRunner::new();
    let cli = DevcontainerCli::new(Arc::new(fake.clone()));
    let opts = berth_core::SpawnOptions::builder("api", "/src/api")
        .build_log_path(&log)
        .build();

    let (result, _) = cli.up(&opts, None, &[]).await.unwrap();
    assert_eq!(result.unwrap().container_id.as_deref(), Some("cafe01"));
    let inv = fake.invocations().remove(0);
    assert_eq!(inv.log_path.as_deref(), Some(log.as_path()));
}

#[tokio::test]
async fn missing_result_document_is_none() {
    let fake = FakeRunner::new();
    fake.respond("devcontainer up", "no json here\n");
    let cli = DevcontainerCli::new(Arc::new(fake.clone()));
    let (result, _) = cli.up(&options(), None, &[]).await.unwrap();
    assert!(result.is_none());
}

#[test]
fn parse_skips_non_result_json() {
    let output = "{\"progress\": 50}\n{\"outcome\":\"error\",\"message\":\"build failed\"}\n";
    let result = parse_up_result(output).unwrap();
    assert_eq!(result.outcome, "error");
    assert!(!result.succeeded());
}
