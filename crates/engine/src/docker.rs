// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime engine CLI driver.
//!
//! Thin async wrapper over the `docker` CLI for volume lifecycle,
//! container run/stop/rm/inspect, and label-based discovery. "Not found"
//! answers are `Ok(None)`/`Ok(false)`, never errors.

use crate::error::EngineError;
use crate::runner::{CommandOutput, CommandRunner, Invocation};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

#[derive(Clone)]
pub struct DockerCli {
    runner: Arc<dyn CommandRunner>,
}

impl DockerCli {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    async fn docker(
        &self,
        args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<CommandOutput, EngineError> {
        self.runner.run(Invocation::new("docker", args)).await
    }

    /// Run a docker command that must succeed; returns trimmed stdout.
    async fn docker_ok(
        &self,
        args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<String, EngineError> {
        let invocation = Invocation::new("docker", args);
        let command = invocation.command_line();
        let output = self.runner.run(invocation).await?;
        if output.success() {
            Ok(output.stdout.trim().to_string())
        } else {
            Err(EngineError::CommandFailed {
                command,
                stderr: output.stderr.trim().to_string(),
            })
        }
    }

    /// Create a volume. Creating a volume that already exists with the
    /// same name is not an error (the engine treats it as a no-op).
    pub async fn volume_create(&self, name: &str) -> Result<(), EngineError> {
        self.docker_ok(["volume", "create", name]).await.map(|_| ())
    }

    pub async fn volume_exists(&self, name: &str) -> Result<bool, EngineError> {
        Ok(self.docker(["volume", "inspect", name]).await?.success())
    }

    /// Find a container (running or stopped) carrying `label=value`.
    /// Returns the newest match's id, if any.
    pub async fn find_container_by_label(
        &self,
        label: &str,
        value: &str,
    ) -> Result<Option<String>, EngineError> {
        let filter = format!("label={}={}", label, value);
        let stdout = self
            .docker_ok(["ps", "-a", "--filter", &filter, "--format", "{{.ID}}"])
            .await?;
        Ok(stdout.lines().next().map(|line| line.trim().to_string()).filter(|s| !s.is_empty()))
    }

    /// Read a container's labels. A container without labels yields an
    /// empty map.
    pub async fn container_labels(
        &self,
        container: &str,
    ) -> Result<HashMap<String, String>, EngineError> {
        let stdout = self
            .docker_ok(["inspect", "--format", "{{json .Config.Labels}}", container])
            .await?;
        if stdout.is_empty() || stdout == "null" {
            return Ok(HashMap::new());
        }
        serde_json::from_str(&stdout)
            .map_err(|e| EngineError::InvalidManagerOutput(format!("container labels: {}", e)))
    }

    pub async fn container_running(&self, container: &str) -> Result<bool, EngineError> {
        let stdout =
            self.docker_ok(["inspect", "--format", "{{.State.Running}}", container]).await?;
        Ok(stdout == "true")
    }

    pub async fn start(&self, container: &str) -> Result<(), EngineError> {
        self.docker_ok(["start", container]).await.map(|_| ())
    }

    /// Start a detached container and return its id.
    pub async fn run_detached(
        &self,
        name: &str,
        image: &str,
        mounts: &[String],
        labels: &[(String, String)],
        command: &[&str],
    ) -> Result<String, EngineError> {
        let mut args: Vec<String> =
            vec!["run".into(), "-d".into(), "--name".into(), name.into()];
        for mount in mounts {
            args.push("-v".into());
            args.push(mount.clone());
        }
        for (key, value) in labels {
            args.push("--label".into());
            args.push(format!("{}={}", key, value));
        }
        args.push(image.into());
        args.extend(command.iter().map(|s| s.to_string()));
        self.docker_ok(args).await
    }

    /// Copy a directory's contents into a container path. The caller
    /// inspects the output: a failed copy is a spawn-step failure, not
    /// an engine fault.
    pub async fn cp_into(
        &self,
        container: &str,
        source: &Path,
        dest: &str,
    ) -> Result<CommandOutput, EngineError> {
        let src = format!("{}/.", source.display());
        let target = format!("{}:{}", container, dest);
        self.docker(["cp", src.as_str(), target.as_str()]).await
    }

    /// Run a shell command inside a container, stdout/stderr captured
    /// separately.
    pub async fn exec(
        &self,
        container: &str,
        shell_command: &str,
    ) -> Result<CommandOutput, EngineError> {
        self.docker(["exec", container, "sh", "-c", shell_command]).await
    }

    /// Stop a container. Tolerant: already-stopped or missing is fine.
    pub async fn stop(&self, container: &str) -> Result<CommandOutput, EngineError> {
        self.docker(["stop", container]).await
    }

    /// Force-remove a container. Tolerant: missing is fine.
    pub async fn rm_force(&self, container: &str) -> Result<CommandOutput, EngineError> {
        self.docker(["rm", "-f", container]).await
    }

    pub async fn image_exists(&self, tag: &str) -> Result<bool, EngineError> {
        Ok(self.docker(["image", "inspect", tag]).await?.success())
    }

    pub async fn build_image(
        &self,
        tag: &str,
        context: &Path,
    ) -> Result<CommandOutput, EngineError> {
        let ctx = context.display().to_string();
        self.docker(["build", "-t", tag, ctx.as_str()]).await
    }
}

#[cfg(test)]
#[path = "docker_tests.rs"]
mod tests;
