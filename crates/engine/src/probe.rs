// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime engine and container-manager CLI availability checks.
//!
//! Both probes complete without erroring even when the engine is
//! entirely absent; absence is data, not a fault.

use crate::runner::{CommandRunner, Invocation};

/// Result of probing the container runtime engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeStatus {
    /// The engine CLI is installed.
    pub available: bool,
    /// The engine daemon answered.
    pub running: bool,
    pub version: Option<String>,
    /// Human-readable summary, actionable when something is missing.
    pub message: String,
}

/// Probe the runtime engine. Never returns an error: a missing CLI or
/// unreachable daemon is reported through the status fields.
pub async fn check_runtime(runner: &dyn CommandRunner) -> RuntimeStatus {
    let invocation =
        Invocation::new("docker", ["version", "--format", "{{.Server.Version}}"]);
    match runner.run(invocation).await {
        Err(_) => RuntimeStatus {
            available: false,
            running: false,
            version: None,
            message: "docker CLI not found; install Docker and ensure it is on PATH".to_string(),
        },
        Ok(output) if output.success() => {
            let version = output.stdout.trim().to_string();
            RuntimeStatus {
                available: true,
                running: true,
                message: format!("docker engine {} running", version),
                version: Some(version),
            }
        }
        Ok(output) => RuntimeStatus {
            available: true,
            running: false,
            version: None,
            message: format!(
                "docker CLI present but the engine is not reachable: {}",
                output.stderr.trim()
            ),
        },
    }
}

/// Check whether the container-manager CLI is installed.
pub async fn container_cli_installed(runner: &dyn CommandRunner) -> bool {
    let invocation = Invocation::new("devcontainer", ["--version"]);
    matches!(runner.run(invocation).await, Ok(output) if output.success())
}

#[cfg(test)]
#[path = "probe_tests.rs"]
mod tests;
