// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Container-manager CLI driver.
//!
//! Invokes the `devcontainer` CLI's `up` subcommand against a
//! devcontainer descriptor and parses the JSON result document from the
//! output (outcome, container id, remote user, remote workspace folder).

use crate::error::EngineError;
use crate::runner::{CommandOutput, CommandRunner, Invocation};
use berth_core::SpawnOptions;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

/// Path at which a forwarded credential socket appears inside the
/// container.
pub const CREDENTIAL_SOCKET_TARGET: &str = "/var/run/berth/credentials.sock";

/// Parsed result document from a container-manager `up` invocation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpResult {
    pub outcome: String,
    #[serde(default)]
    pub container_id: Option<String>,
    #[serde(default)]
    pub remote_user: Option<String>,
    #[serde(default)]
    pub remote_workspace_folder: Option<String>,
}

impl UpResult {
    pub fn succeeded(&self) -> bool {
        self.outcome == "success"
    }
}

#[derive(Clone)]
pub struct DevcontainerCli {
    runner: Arc<dyn CommandRunner>,
}

impl DevcontainerCli {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Invoke `devcontainer up` for the given options.
    ///
    /// `workspace_volume` mounts the staged volume as the workspace when
    /// the bootstrap pattern was used. Labels are attached with
    /// `--id-label` so later spawns can discover and diff the container.
    ///
    /// Output goes to `options.build_log_path` when set (the result
    /// document is then parsed from the file's tail), otherwise it is
    /// captured into the returned [`CommandOutput`].
    pub async fn up(
        &self,
        options: &SpawnOptions,
        workspace_volume: Option<&str>,
        labels: &[(String, String)],
    ) -> Result<(Option<UpResult>, CommandOutput), EngineError> {
        let mut args: Vec<String> = vec![
            "up".into(),
            "--workspace-folder".into(),
            options.project_path.display().to_string(),
            "--config".into(),
            options.config_path.display().to_string(),
        ];

        if let Some(volume) = workspace_volume {
            args.push("--workspace-mount".into());
            args.push(format!(
                "type=volume,source={},target=/workspace",
                volume
            ));
        }

        for (key, value) in labels {
            args.push("--id-label".into());
            args.push(format!("{}={}", key, value));
        }

        for (key, value) in &options.build_args {
            args.push("--build-arg".into());
            args.push(format!("{}={}", key, value));
        }

        if let Some(ref socket) = options.credential_socket {
            args.push("--mount".into());
            args.push(format!(
                "type=bind,source={},target={}",
                socket.display(),
                CREDENTIAL_SOCKET_TARGET
            ));
            args.push("--remote-env".into());
            args.push(format!("BERTH_CREDENTIAL_SOCKET={}", CREDENTIAL_SOCKET_TARGET));
        }

        let mut invocation = Invocation::new("devcontainer", args);

        if options.forward_docker_config {
            let config_dir = options
                .docker_config_path
                .clone()
                .or_else(|| dirs::home_dir().map(|h| h.join(".docker")));
            if let Some(dir) = config_dir {
                invocation = invocation.env("DOCKER_CONFIG", dir.display().to_string());
            }
        }

        if let Some(ref log_path) = options.build_log_path {
            invocation = invocation.log_path(log_path.clone());
            let output = self.runner.run(invocation).await?;
            let result = parse_up_result_from_file(log_path);
            return Ok((result, output));
        }

        let output = self.runner.run(invocation).await?;
        let result = parse_up_result(&output.stdout);
        Ok((result, output))
    }
}

/// Scan output lines from the end for the JSON result document.
fn parse_up_result(output: &str) -> Option<UpResult> {
    for line in output.lines().rev() {
        let line = line.trim();
        if !line.starts_with('{') {
            continue;
        }
        if let Ok(result) = serde_json::from_str::<UpResult>(line) {
            return Some(result);
        }
    }
    None
}

fn parse_up_result_from_file(path: &Path) -> Option<UpResult> {
    let content = std::fs::read_to_string(path).ok()?;
    parse_up_result(&content)
}

#[cfg(test)]
#[path = "devcontainer_tests.rs"]
mod tests;
