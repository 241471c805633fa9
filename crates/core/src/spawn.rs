// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spawn options, results, and the orchestrator step ladder.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// What to do when the configuration hash differs from the last build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RebuildBehavior {
    /// Ask when an interactive surface is attached, otherwise reuse.
    #[default]
    Auto,
    /// Rebuild regardless of the change result.
    Always,
    /// Reuse regardless of the change result.
    Never,
    /// Always ask the attached prompt; fail if none is attached.
    Prompt,
}

crate::simple_display! {
    RebuildBehavior {
        Auto => "auto",
        Always => "always",
        Never => "never",
        Prompt => "prompt",
    }
}

impl FromStr for RebuildBehavior {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(RebuildBehavior::Auto),
            "always" => Ok(RebuildBehavior::Always),
            "never" => Ok(RebuildBehavior::Never),
            "prompt" => Ok(RebuildBehavior::Prompt),
            other => Err(format!(
                "unknown rebuild behavior '{}' (expected auto|always|never|prompt)",
                other
            )),
        }
    }
}

/// Last step the orchestrator completed, in execution order.
///
/// Strictly increasing on success. A failed spawn reports the last step
/// that finished, which is how the CLI produces "resume from here"
/// guidance and how tests attribute failures precisely.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum CompletedStep {
    #[default]
    None,
    RuntimeCheck,
    CliCheck,
    BootstrapImageCheck,
    VolumeCreation,
    BootstrapContainerStart,
    FileCopyToBootstrap,
    ContainerUp,
    BootstrapCleanup,
    EditorLaunch,
    Completed,
}

crate::simple_display! {
    CompletedStep {
        None => "none",
        RuntimeCheck => "runtime-check",
        CliCheck => "cli-check",
        BootstrapImageCheck => "bootstrap-image-check",
        VolumeCreation => "volume-creation",
        BootstrapContainerStart => "bootstrap-container-start",
        FileCopyToBootstrap => "file-copy-to-bootstrap",
        ContainerUp => "container-up",
        BootstrapCleanup => "bootstrap-cleanup",
        EditorLaunch => "editor-launch",
        Completed => "completed",
    }
}

/// Input to one spawn attempt. Immutable once handed to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnOptions {
    /// Project name (names the volume and container labels).
    pub project_name: String,
    /// Project source tree on the host.
    pub project_path: PathBuf,
    /// Devcontainer descriptor path.
    pub config_path: PathBuf,
    /// Explicit volume name override.
    pub volume_name: Option<String>,
    /// Copy the source tree into the volume during bootstrap.
    pub copy_source_files: bool,
    /// Launch the editor after the container is up (best-effort).
    pub launch_editor: bool,
    /// Reuse a matching existing container instead of building.
    pub reuse_existing: bool,
    /// Stage files through a bootstrap helper container.
    pub use_bootstrap_container: bool,
    /// Build arguments passed to the container manager as KEY=VALUE.
    /// Ordered so generated command lines are deterministic.
    pub build_args: Vec<(String, String)>,
    /// Redirect container-manager output to this file instead of capturing.
    pub build_log_path: Option<PathBuf>,
    /// Make the host's registry credentials available to the build.
    pub forward_docker_config: bool,
    /// Explicit docker config dir (defaults to `~/.docker` when forwarding).
    pub docker_config_path: Option<PathBuf>,
    /// Credential socket to expose inside the container (runner dispatch).
    pub credential_socket: Option<PathBuf>,
    /// Policy applied when the configuration hash differs.
    pub rebuild_behavior: RebuildBehavior,
    /// Skip change detection entirely and reuse if possible.
    pub skip_rebuild: bool,
}

impl SpawnOptions {
    pub fn builder(
        project_name: impl Into<String>,
        project_path: impl Into<PathBuf>,
    ) -> SpawnOptionsBuilder {
        let project_path = project_path.into();
        SpawnOptionsBuilder {
            project_name: project_name.into(),
            config_path: project_path.join(".devcontainer/devcontainer.json"),
            project_path,
            volume_name: None,
            copy_source_files: true,
            launch_editor: true,
            reuse_existing: true,
            use_bootstrap_container: true,
            build_args: Vec::new(),
            build_log_path: None,
            forward_docker_config: false,
            docker_config_path: None,
            credential_socket: None,
            rebuild_behavior: RebuildBehavior::Auto,
            skip_rebuild: false,
        }
    }
}

pub struct SpawnOptionsBuilder {
    project_name: String,
    project_path: PathBuf,
    config_path: PathBuf,
    volume_name: Option<String>,
    copy_source_files: bool,
    launch_editor: bool,
    reuse_existing: bool,
    use_bootstrap_container: bool,
    build_args: Vec<(String, String)>,
    build_log_path: Option<PathBuf>,
    forward_docker_config: bool,
    docker_config_path: Option<PathBuf>,
    credential_socket: Option<PathBuf>,
    rebuild_behavior: RebuildBehavior,
    skip_rebuild: bool,
}

impl SpawnOptionsBuilder {
    crate::setters! {
        into {
            config_path: PathBuf,
        }
        set {
            copy_source_files: bool,
            launch_editor: bool,
            reuse_existing: bool,
            use_bootstrap_container: bool,
            build_args: Vec<(String, String)>,
            forward_docker_config: bool,
            rebuild_behavior: RebuildBehavior,
            skip_rebuild: bool,
        }
        option {
            volume_name: String,
            build_log_path: PathBuf,
            docker_config_path: PathBuf,
            credential_socket: PathBuf,
        }
    }

    pub fn build_arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.build_args.push((key.into(), value.into()));
        self
    }

    pub fn build(self) -> SpawnOptions {
        SpawnOptions {
            project_name: self.project_name,
            project_path: self.project_path,
            config_path: self.config_path,
            volume_name: self.volume_name,
            copy_source_files: self.copy_source_files,
            launch_editor: self.launch_editor,
            reuse_existing: self.reuse_existing,
            use_bootstrap_container: self.use_bootstrap_container,
            build_args: self.build_args,
            build_log_path: self.build_log_path,
            forward_docker_config: self.forward_docker_config,
            docker_config_path: self.docker_config_path,
            credential_socket: self.credential_socket,
            rebuild_behavior: self.rebuild_behavior,
            skip_rebuild: self.skip_rebuild,
        }
    }
}

/// Output of one spawn attempt. Never mutated after return.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpawnResult {
    pub success: bool,
    pub message: String,
    pub container_id: Option<String>,
    pub volume_name: Option<String>,
    pub editor_uri: Option<String>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub duration_ms: u64,
    pub completed_step: CompletedStep,
    pub bootstrap_container_id: Option<String>,
    /// Container-manager stdout, kept distinct from stderr so diagnostics
    /// never interleave the two streams.
    pub manager_stdout: String,
    pub manager_stderr: String,
}

impl SpawnResult {
    /// A failed result attributing the failure to the last completed step.
    pub fn failed(step: CompletedStep, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            success: false,
            errors: vec![message.clone()],
            message,
            completed_step: step,
            ..Self::default()
        }
    }

    /// A successful result with the given final step.
    pub fn succeeded(step: CompletedStep, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            completed_step: step,
            ..Self::default()
        }
    }

    /// Record a non-fatal problem without flipping overall success.
    pub fn push_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}

#[cfg(test)]
#[path = "spawn_tests.rs"]
mod tests;
