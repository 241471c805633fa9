// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `berth spawn` - spawn or reuse a development container.

use anyhow::{anyhow, bail, Context, Result};
use berth_core::{RebuildBehavior, SpawnOptions, SpawnResult};
use berth_engine::{ChangeResult, Orchestrator, RebuildPrompt, SystemRunner};
use clap::Args;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args)]
pub struct SpawnArgs {
    /// Project path (defaults to the current directory)
    pub path: Option<PathBuf>,

    /// Project name (defaults to the directory name)
    #[arg(long)]
    pub name: Option<String>,

    /// Explicit volume name
    #[arg(long)]
    pub volume: Option<String>,

    /// Force a rebuild regardless of configuration changes
    #[arg(long)]
    pub force: bool,

    /// Do not launch the editor after the container is up
    #[arg(long = "no-launch")]
    pub no_launch: bool,

    /// Do not copy source files into the workspace volume
    #[arg(long = "no-copy-source")]
    pub no_copy_source: bool,

    /// Skip the bootstrap staging container
    #[arg(long = "no-bootstrap")]
    pub no_bootstrap: bool,

    /// Build argument passed to the container manager (repeatable)
    #[arg(long = "build-arg", value_name = "KEY=VALUE")]
    pub build_args: Vec<String>,

    /// Stream container-manager output to this file
    #[arg(long = "build-log", value_name = "PATH")]
    pub build_log: Option<PathBuf>,

    /// Make the host's registry credentials available to the build
    #[arg(long = "forward-docker-config")]
    pub forward_docker_config: bool,

    /// Rebuild policy when the configuration changed
    #[arg(long, value_name = "auto|always|never|prompt", default_value = "auto")]
    pub rebuild: RebuildBehavior,
}

pub async fn spawn(args: SpawnArgs) -> Result<()> {
    let cwd = std::env::current_dir().context("could not resolve working directory")?;
    let options = build_options(args, &cwd)?;

    let orchestrator =
        Orchestrator::new(Arc::new(SystemRunner)).with_prompt(Arc::new(StdinPrompt));
    let result = orchestrator.spawn(&options).await;
    print_result(&result);

    if result.success {
        Ok(())
    } else {
        Err(anyhow!("spawn failed at step '{}'", result.completed_step))
    }
}

/// Validate arguments into immutable spawn options. All precondition
/// failures happen here, before anything is touched.
fn build_options(args: SpawnArgs, cwd: &std::path::Path) -> Result<SpawnOptions> {
    let project_path = match args.path {
        Some(ref path) if path.is_absolute() => path.clone(),
        Some(ref path) => cwd.join(path),
        None => cwd.to_path_buf(),
    };
    if !project_path.is_dir() {
        bail!("project path {} does not exist", project_path.display());
    }

    let config_path = project_path.join(".devcontainer/devcontainer.json");
    if !config_path.is_file() {
        bail!(
            "no devcontainer descriptor at {}; create one first",
            config_path.display()
        );
    }

    let project_name = match args.name {
        Some(name) => name,
        None => project_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| anyhow!("could not derive a project name from the path"))?,
    };

    let mut build_args = Vec::with_capacity(args.build_args.len());
    for pair in &args.build_args {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("invalid build arg '{}' (expected KEY=VALUE)", pair))?;
        if key.is_empty() {
            bail!("invalid build arg '{}' (empty key)", pair);
        }
        build_args.push((key.to_string(), value.to_string()));
    }

    let rebuild = if args.force { RebuildBehavior::Always } else { args.rebuild };

    let mut builder = SpawnOptions::builder(project_name, project_path)
        .copy_source_files(!args.no_copy_source)
        .launch_editor(!args.no_launch)
        .use_bootstrap_container(!args.no_bootstrap)
        .forward_docker_config(args.forward_docker_config)
        .rebuild_behavior(rebuild)
        .build_args(build_args);
    if let Some(volume) = args.volume {
        builder = builder.volume_name(volume);
    }
    if let Some(log) = args.build_log {
        builder = builder.build_log_path(log);
    }
    Ok(builder.build())
}

fn print_result(result: &SpawnResult) {
    if result.success {
        println!("{}", result.message);
        if let Some(ref id) = result.container_id {
            println!("Container: {}", berth_core::short(id, 12));
        }
        if let Some(ref volume) = result.volume_name {
            println!("Volume: {}", volume);
        }
        if let Some(ref uri) = result.editor_uri {
            println!("Editor: {}", uri);
        }
    } else {
        println!("Spawn failed: {}", result.message);
        println!("Last step: {}", result.completed_step);
        for error in &result.errors {
            println!("  error: {}", error);
        }
        if !result.manager_stderr.trim().is_empty() {
            println!("--- container manager stderr ---");
            println!("{}", result.manager_stderr.trim());
        }
    }
    for warning in &result.warnings {
        println!("  warning: {}", warning);
    }
    println!("Done in {}ms", result.duration_ms);
}

/// Interactive rebuild confirmation on stdin.
struct StdinPrompt;

impl RebuildPrompt for StdinPrompt {
    fn confirm_rebuild(&self, change: &ChangeResult) -> bool {
        println!("Configuration changed since the last build ({}):", change.reason);
        for file in &change.changed_files {
            println!("  {}", file);
        }
        print!("Rebuild the container? [y/N] ");
        let _ = std::io::stdout().flush();

        let mut answer = String::new();
        if std::io::stdin().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

#[cfg(test)]
#[path = "spawn_tests.rs"]
mod tests;
