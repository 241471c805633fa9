// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spawn orchestrator.
//!
//! Sequences the full spawn ladder and converts every fault at this
//! boundary into a failed [`SpawnResult`] carrying the step execution
//! had reached; callers never receive an unconverted error.

use crate::bootstrap::{BootstrapConfig, BootstrapManager};
use crate::devcontainer::DevcontainerCli;
use crate::docker::DockerCli;
use crate::error::EngineError;
use crate::hash::{compute_hash, config_file_set, has_changed, ChangeResult};
use crate::naming::{
    volume_name, LABEL_BUILT_AT, LABEL_CONFIG_FILES, LABEL_CONFIG_HASH, LABEL_PROJECT,
};
use crate::probe::{check_runtime, container_cli_installed};
use crate::runner::{CommandRunner, Invocation};
use berth_core::{
    Clock, CompletedStep, RebuildBehavior, SpawnId, SpawnOptions, SpawnResult, SystemClock,
};
use std::sync::Arc;

/// Decision surface for the `auto`/`prompt` rebuild policies.
///
/// The CLI attaches an interactive implementation; the runner daemon
/// attaches none and `auto` degrades to reuse.
pub trait RebuildPrompt: Send + Sync {
    /// Whether to rebuild given a detected configuration change.
    fn confirm_rebuild(&self, change: &ChangeResult) -> bool;
}

enum RebuildDecision {
    Reuse,
    Rebuild,
}

pub struct Orchestrator<C: Clock = SystemClock> {
    runner: Arc<dyn CommandRunner>,
    docker: DockerCli,
    manager: DevcontainerCli,
    bootstrap: BootstrapManager,
    clock: C,
    prompt: Option<Arc<dyn RebuildPrompt>>,
}

impl Orchestrator<SystemClock> {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self::with_clock(runner, SystemClock)
    }
}

impl<C: Clock> Orchestrator<C> {
    pub fn with_clock(runner: Arc<dyn CommandRunner>, clock: C) -> Self {
        let docker = DockerCli::new(Arc::clone(&runner));
        Self {
            manager: DevcontainerCli::new(Arc::clone(&runner)),
            bootstrap: BootstrapManager::new(docker.clone()),
            docker,
            runner,
            clock,
            prompt: None,
        }
    }

    pub fn with_prompt(mut self, prompt: Arc<dyn RebuildPrompt>) -> Self {
        self.prompt = Some(prompt);
        self
    }

    /// Run one spawn attempt. Never returns an error; every failure is a
    /// structured result attributing the step reached.
    pub async fn spawn(&self, options: &SpawnOptions) -> SpawnResult {
        let spawn_id = SpawnId::new();
        let started = self.clock.now();
        tracing::info!(
            spawn_id = %spawn_id,
            project = %options.project_name,
            path = %options.project_path.display(),
            "spawn requested"
        );

        let mut result = self.run(options, &spawn_id).await;
        result.duration_ms = self.clock.now().duration_since(started).as_millis() as u64;

        if result.success {
            tracing::info!(
                spawn_id = %spawn_id,
                container_id = result.container_id.as_deref().unwrap_or(""),
                duration_ms = result.duration_ms,
                "spawn completed"
            );
        } else {
            tracing::error!(
                spawn_id = %spawn_id,
                step = %result.completed_step,
                duration_ms = result.duration_ms,
                error = %result.message,
                "spawn failed"
            );
        }
        result
    }

    async fn run(&self, options: &SpawnOptions, spawn_id: &SpawnId) -> SpawnResult {
        // Runtime check: nothing is created before both probes pass
        let status = check_runtime(&*self.runner).await;
        if !status.available || !status.running {
            return SpawnResult::failed(CompletedStep::RuntimeCheck, status.message);
        }

        // Container-manager CLI check
        if !container_cli_installed(&*self.runner).await {
            return SpawnResult::failed(
                CompletedStep::CliCheck,
                "devcontainer CLI not installed; install @devcontainers/cli and ensure it is on PATH",
            );
        }

        // Existing-container discovery and short-circuit
        if options.reuse_existing {
            let existing = match self
                .docker
                .find_container_by_label(LABEL_PROJECT, &options.project_name)
                .await
            {
                Ok(found) => found,
                Err(e) => return SpawnResult::failed(CompletedStep::CliCheck, e.to_string()),
            };
            if let Some(existing) = existing {
                match self.try_reuse(options, &existing).await {
                    Ok(Some(result)) => return result,
                    Ok(None) => {} // rebuild required, fall through
                    Err(e) => {
                        return SpawnResult::failed(CompletedStep::CliCheck, e.to_string())
                    }
                }
            }
        }

        self.build(options, spawn_id).await
    }

    /// Decide whether an existing container can be reused. `Ok(None)`
    /// means a rebuild is required and the ladder continues.
    async fn try_reuse(
        &self,
        options: &SpawnOptions,
        existing: &str,
    ) -> Result<Option<SpawnResult>, EngineError> {
        if options.skip_rebuild {
            return Ok(Some(self.reuse(options, existing, "rebuild skipped").await));
        }

        if options.rebuild_behavior == RebuildBehavior::Always {
            tracing::info!(container = existing, "rebuild policy is 'always', rebuilding");
            return Ok(None);
        }

        let labels = self.docker.container_labels(existing).await?;
        let files = config_file_set(options);
        let current = compute_hash(&files, self.clock.epoch_ms())?;
        let change = has_changed(&current, &labels);
        tracing::debug!(
            container = existing,
            changed = change.changed,
            reason = %change.reason,
            "configuration change detection"
        );

        match self.decide(options.rebuild_behavior, &change)? {
            RebuildDecision::Reuse => {
                Ok(Some(self.reuse(options, existing, &change.reason).await))
            }
            RebuildDecision::Rebuild => Ok(None),
        }
    }

    fn decide(
        &self,
        behavior: RebuildBehavior,
        change: &ChangeResult,
    ) -> Result<RebuildDecision, EngineError> {
        match behavior {
            RebuildBehavior::Never => Ok(RebuildDecision::Reuse),
            RebuildBehavior::Always => Ok(RebuildDecision::Rebuild),
            RebuildBehavior::Prompt => match self.prompt {
                Some(ref prompt) => Ok(if prompt.confirm_rebuild(change) {
                    RebuildDecision::Rebuild
                } else {
                    RebuildDecision::Reuse
                }),
                None => Err(EngineError::Precondition(
                    "rebuild behavior 'prompt' requires an interactive prompt".to_string(),
                )),
            },
            RebuildBehavior::Auto => {
                if !change.changed {
                    return Ok(RebuildDecision::Reuse);
                }
                // Changed: ask when a surface is attached, reuse otherwise
                match self.prompt {
                    Some(ref prompt) => Ok(if prompt.confirm_rebuild(change) {
                        RebuildDecision::Rebuild
                    } else {
                        RebuildDecision::Reuse
                    }),
                    None => Ok(RebuildDecision::Reuse),
                }
            }
        }
    }

    /// Reference the existing container without advancing through the
    /// bootstrap/build steps.
    async fn reuse(&self, options: &SpawnOptions, existing: &str, reason: &str) -> SpawnResult {
        let mut result = SpawnResult::succeeded(
            CompletedStep::Completed,
            format!("reusing existing container {} ({})", berth_core::short(existing, 12), reason),
        );
        result.container_id = Some(existing.to_string());
        result.volume_name = Some(volume_name(options));

        // A stopped container is started in place of a rebuild
        match self.docker.container_running(existing).await {
            Ok(true) => {}
            Ok(false) => {
                if let Err(e) = self.docker.start(existing).await {
                    result.push_warning(format!("could not start existing container: {}", e));
                }
            }
            Err(e) => result.push_warning(format!("could not inspect existing container: {}", e)),
        }

        if options.launch_editor {
            self.launch_editor(existing, &mut result).await;
        }
        result
    }

    async fn build(&self, options: &SpawnOptions, spawn_id: &SpawnId) -> SpawnResult {
        // Volume creation (idempotent: an existing volume is not an error)
        let volume = volume_name(options);
        if let Err(e) = self.docker.volume_create(&volume).await {
            return SpawnResult::failed(CompletedStep::VolumeCreation, e.to_string());
        }

        // Bootstrap staging. On failure the volume is deliberately left
        // intact so a retry can skip re-staging.
        let mut bootstrap_name = None;
        let mut bootstrap_id = None;
        if options.use_bootstrap_container {
            let config = BootstrapConfig::new(spawn_id, &volume);
            let outcome = self.bootstrap.stage(&config, options).await;
            if !outcome.ok {
                let message = if outcome.stderr.trim().is_empty() {
                    "bootstrap staging failed".to_string()
                } else {
                    outcome.stderr.trim().to_string()
                };
                let mut result = SpawnResult::failed(outcome.step, message);
                result.volume_name = Some(volume);
                return result;
            }
            if let Some(info) = outcome.info {
                bootstrap_name = Some(info.container_name);
                bootstrap_id = Some(info.container_id);
            }
        }

        // Container up
        let result = self.container_up(options, spawn_id, &volume, bootstrap_id.clone()).await;

        // The helper never outlives the attempt, success or failure
        if let Some(ref name) = bootstrap_name {
            match self.bootstrap.cleanup(name).await {
                Ok(()) => {}
                Err(e) => {
                    tracing::warn!(container = %name, error = %e, "bootstrap cleanup failed");
                }
            }
        }

        match result {
            Ok(mut result) => {
                // Bootstrap cleanup completed; only the editor remains
                if options.launch_editor {
                    if let Some(container) = result.container_id.clone() {
                        self.launch_editor(&container, &mut result).await;
                    }
                }
                result.completed_step = CompletedStep::Completed;
                result.success = true;
                result
            }
            Err(mut result) => {
                result.volume_name = Some(volume);
                result.bootstrap_container_id = bootstrap_id;
                result
            }
        }
    }

    /// Invoke the container-manager `up` step. Returns the in-progress
    /// result on success; a finished failure result otherwise.
    async fn container_up(
        &self,
        options: &SpawnOptions,
        spawn_id: &SpawnId,
        volume: &str,
        bootstrap_id: Option<String>,
    ) -> Result<SpawnResult, SpawnResult> {
        let files = config_file_set(options);
        let current = match compute_hash(&files, self.clock.epoch_ms()) {
            Ok(hash) => hash,
            Err(e) => {
                return Err(SpawnResult::failed(CompletedStep::ContainerUp, e.to_string()))
            }
        };

        let labels = vec![
            (LABEL_PROJECT.to_string(), options.project_name.clone()),
            (LABEL_CONFIG_HASH.to_string(), current.digest.clone()),
            (LABEL_CONFIG_FILES.to_string(), current.files_json()),
            (LABEL_BUILT_AT.to_string(), self.clock.epoch_ms().to_string()),
        ];

        let workspace_volume = options.use_bootstrap_container.then_some(volume);
        tracing::info!(
            spawn_id = %spawn_id,
            volume,
            config = %options.config_path.display(),
            "invoking container manager up"
        );

        let (up_result, output) =
            match self.manager.up(options, workspace_volume, &labels).await {
                Ok(pair) => pair,
                Err(e) => {
                    return Err(SpawnResult::failed(CompletedStep::ContainerUp, e.to_string()))
                }
            };

        let outcome_ok =
            output.success() && up_result.as_ref().map(|r| r.succeeded()).unwrap_or(false);
        if !outcome_ok {
            let message = up_result
                .as_ref()
                .filter(|r| !r.succeeded())
                .map(|r| format!("container manager reported outcome '{}'", r.outcome))
                .unwrap_or_else(|| {
                    format!("container manager up exited with status {}", output.status)
                });
            let mut result = SpawnResult::failed(CompletedStep::ContainerUp, message);
            result.manager_stdout = output.stdout;
            result.manager_stderr = output.stderr;
            return Err(result);
        }

        let container_id = match up_result.as_ref().and_then(|r| r.container_id.clone()) {
            Some(id) => id,
            None => {
                let mut result = SpawnResult::failed(
                    CompletedStep::ContainerUp,
                    "container manager result carried no container id",
                );
                result.manager_stdout = output.stdout;
                result.manager_stderr = output.stderr;
                return Err(result);
            }
        };

        let mut result =
            SpawnResult::succeeded(CompletedStep::ContainerUp, "container ready".to_string());
        result.container_id = Some(container_id);
        result.volume_name = Some(volume.to_string());
        result.bootstrap_container_id = bootstrap_id;
        result.manager_stdout = output.stdout;
        result.manager_stderr = output.stderr;
        Ok(result)
    }

    /// Best-effort editor launch: failure downgrades to a warning
    /// because the container is usable without the editor.
    async fn launch_editor(&self, container: &str, result: &mut SpawnResult) {
        let uri = format!("vscode-remote://attached-container+{}/workspace", hex(container));
        result.editor_uri = Some(uri.clone());

        let invocation = Invocation::new("code", ["--folder-uri", uri.as_str()]);
        match self.runner.run(invocation).await {
            Ok(output) if output.success() => {}
            Ok(output) => {
                result.push_warning(format!(
                    "editor launch exited with status {}: {}",
                    output.status,
                    output.stderr.trim()
                ));
            }
            Err(e) => result.push_warning(format!("editor launch failed: {}", e)),
        }
    }
}

fn hex(s: &str) -> String {
    let mut out = String::with_capacity(s.len() * 2);
    for b in s.as_bytes() {
        out.push_str(&format!("{:02x}", b));
    }
    out
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
