// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bootstrap container manager.
//!
//! Stages project files into a target volume without requiring the final
//! development image to exist yet: a short-lived helper container mounts
//! the volume, receives the source tree, runs any staging commands, and
//! is torn down before the spawn returns. The helper's lifetime is
//! strictly nested inside one spawn attempt.

use crate::docker::DockerCli;
use crate::error::EngineError;
use crate::naming::LABEL_BOOTSTRAP;
use berth_core::{CompletedStep, SpawnId, SpawnOptions};
use std::time::{Duration, Instant};

/// Default bootstrap image tag, built once from the embedded Dockerfile.
pub const BOOTSTRAP_IMAGE: &str = "berth-bootstrap:latest";

/// Dockerfile for the helper image: a small base with the tools staging
/// commands need.
const BOOTSTRAP_DOCKERFILE: &str = "FROM alpine:3.20\n\
RUN apk add --no-cache git rsync tar\n\
CMD [\"tail\", \"-f\", \"/dev/null\"]\n";

/// Engine socket mount for nested container operations.
const ENGINE_SOCKET_MOUNT: &str = "/var/run/docker.sock:/var/run/docker.sock";

/// Configuration for one bootstrap helper.
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    pub image: String,
    pub container_name: String,
    pub volume: String,
    /// Mount point of the volume inside the helper.
    pub workspace_path: String,
    /// Mount the host engine socket for nested operations.
    pub mount_engine_socket: bool,
    /// Per-command timeout for staging commands.
    pub timeout: Duration,
    pub labels: Vec<(String, String)>,
    /// Commands run inside the helper after the copy, via `sh -c`.
    pub staging_commands: Vec<String>,
}

impl BootstrapConfig {
    pub fn new(spawn_id: &SpawnId, volume: impl Into<String>) -> Self {
        Self {
            image: BOOTSTRAP_IMAGE.to_string(),
            container_name: crate::naming::bootstrap_container_name(spawn_id),
            volume: volume.into(),
            workspace_path: "/workspace".to_string(),
            mount_engine_socket: false,
            timeout: Duration::from_secs(300),
            labels: vec![(LABEL_BOOTSTRAP.to_string(), "true".to_string())],
            staging_commands: Vec::new(),
        }
    }

    berth_core::setters! {
        into {
            image: String,
        }
        set {
            mount_engine_socket: bool,
            timeout: Duration,
            staging_commands: Vec<String>,
        }
    }
}

/// Runtime handle for a started helper.
#[derive(Debug, Clone)]
pub struct BootstrapInfo {
    pub container_id: String,
    pub container_name: String,
    pub image_was_built: bool,
    pub image_build_ms: u64,
}

/// Result of a staging run. Failures carry the step reached, the
/// captured output, and the exit code; they never raise for the caller
/// to additionally catch.
#[derive(Debug)]
pub struct BootstrapOutcome {
    pub ok: bool,
    /// Orchestrator-ladder step execution had reached when it stopped.
    pub step: CompletedStep,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub info: Option<BootstrapInfo>,
}

impl BootstrapOutcome {
    fn failed(step: CompletedStep, stdout: String, stderr: String, exit_code: Option<i32>) -> Self {
        Self { ok: false, step, stdout, stderr, exit_code, info: None }
    }
}

pub struct BootstrapManager {
    docker: DockerCli,
}

impl BootstrapManager {
    pub fn new(docker: DockerCli) -> Self {
        Self { docker }
    }

    /// Make sure the bootstrap image exists locally, building it from the
    /// embedded Dockerfile when missing. Returns whether a build ran and
    /// how long it took.
    pub async fn ensure_image(&self, image: &str) -> Result<(bool, u64), EngineError> {
        if self.docker.image_exists(image).await? {
            return Ok((false, 0));
        }

        tracing::info!(%image, "bootstrap image missing, building");
        let context = std::env::temp_dir().join(format!("berth-bootstrap-ctx-{}", nano_suffix()));
        tokio::fs::create_dir_all(&context)
            .await
            .map_err(|e| EngineError::io(context.clone(), e))?;
        let dockerfile = context.join("Dockerfile");
        tokio::fs::write(&dockerfile, BOOTSTRAP_DOCKERFILE)
            .await
            .map_err(|e| EngineError::io(dockerfile.clone(), e))?;

        let started = Instant::now();
        let output = self.docker.build_image(image, &context).await;
        let _ = tokio::fs::remove_dir_all(&context).await;

        let output = output?;
        if !output.success() {
            return Err(EngineError::CommandFailed {
                command: format!("docker build -t {}", image),
                stderr: output.stderr.trim().to_string(),
            });
        }
        Ok((true, started.elapsed().as_millis() as u64))
    }

    /// Run the staging protocol: ensure image → start helper → copy the
    /// source tree → run staging commands.
    ///
    /// On success the helper is left running (the development build reads
    /// from the shared volume) and must be released with [`cleanup`].
    /// On failure the helper is torn down here, on every path.
    ///
    /// [`cleanup`]: BootstrapManager::cleanup
    pub async fn stage(
        &self,
        config: &BootstrapConfig,
        options: &SpawnOptions,
    ) -> BootstrapOutcome {
        // Image check
        let (image_was_built, image_build_ms) = match self.ensure_image(&config.image).await {
            Ok(result) => result,
            Err(e) => {
                return BootstrapOutcome::failed(
                    CompletedStep::BootstrapImageCheck,
                    String::new(),
                    e.to_string(),
                    None,
                );
            }
        };

        // Helper start
        let mut mounts = vec![format!("{}:{}", config.volume, config.workspace_path)];
        if config.mount_engine_socket {
            mounts.push(ENGINE_SOCKET_MOUNT.to_string());
        }
        let container_id = match self
            .docker
            .run_detached(
                &config.container_name,
                &config.image,
                &mounts,
                &config.labels,
                &["tail", "-f", "/dev/null"],
            )
            .await
        {
            Ok(id) => id,
            Err(e) => {
                // A partially created container must not outlive the attempt
                self.teardown(&config.container_name).await;
                return BootstrapOutcome::failed(
                    CompletedStep::BootstrapContainerStart,
                    String::new(),
                    e.to_string(),
                    None,
                );
            }
        };

        let info = BootstrapInfo {
            container_id,
            container_name: config.container_name.clone(),
            image_was_built,
            image_build_ms,
        };

        // File copy
        if options.copy_source_files {
            let copy = self
                .docker
                .cp_into(&config.container_name, &options.project_path, &config.workspace_path)
                .await;
            match copy {
                Ok(output) if output.success() => {}
                Ok(output) => {
                    self.teardown(&config.container_name).await;
                    return BootstrapOutcome::failed(
                        CompletedStep::FileCopyToBootstrap,
                        output.stdout,
                        output.stderr,
                        Some(output.status),
                    );
                }
                Err(e) => {
                    self.teardown(&config.container_name).await;
                    return BootstrapOutcome::failed(
                        CompletedStep::FileCopyToBootstrap,
                        String::new(),
                        e.to_string(),
                        None,
                    );
                }
            }
        }

        // Staging commands, stdout/stderr captured separately
        let mut stdout = String::new();
        let mut stderr = String::new();
        for command in &config.staging_commands {
            let exec = tokio::time::timeout(
                config.timeout,
                self.docker.exec(&config.container_name, command),
            )
            .await;
            let output = match exec {
                Ok(Ok(output)) => output,
                Ok(Err(e)) => {
                    self.teardown(&config.container_name).await;
                    stderr.push_str(&e.to_string());
                    return BootstrapOutcome::failed(
                        CompletedStep::FileCopyToBootstrap,
                        stdout,
                        stderr,
                        None,
                    );
                }
                Err(_) => {
                    self.teardown(&config.container_name).await;
                    stderr.push_str(&format!(
                        "staging command timed out after {:?}: {}",
                        config.timeout, command
                    ));
                    return BootstrapOutcome::failed(
                        CompletedStep::FileCopyToBootstrap,
                        stdout,
                        stderr,
                        None,
                    );
                }
            };
            stdout.push_str(&output.stdout);
            stderr.push_str(&output.stderr);
            if !output.success() {
                self.teardown(&config.container_name).await;
                return BootstrapOutcome::failed(
                    CompletedStep::FileCopyToBootstrap,
                    stdout,
                    stderr,
                    Some(output.status),
                );
            }
        }

        BootstrapOutcome {
            ok: true,
            step: CompletedStep::FileCopyToBootstrap,
            stdout,
            stderr,
            exit_code: Some(0),
            info: Some(info),
        }
    }

    /// Stop and remove the helper container. Tolerant of an
    /// already-stopped or already-removed helper; errors only when the
    /// engine CLI itself cannot run.
    pub async fn cleanup(&self, container_name: &str) -> Result<(), EngineError> {
        let _ = self.docker.stop(container_name).await?;
        let _ = self.docker.rm_force(container_name).await?;
        Ok(())
    }

    /// Best-effort teardown on failure paths; outcome already carries
    /// the real error.
    async fn teardown(&self, container_name: &str) {
        if let Err(e) = self.cleanup(container_name).await {
            tracing::warn!(container = container_name, error = %e, "bootstrap teardown failed");
        }
    }
}

fn nano_suffix() -> String {
    SpawnId::new().suffix().to_string()
}

#[cfg(test)]
#[path = "bootstrap_tests.rs"]
mod tests;
