// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spawn orchestration engine.
//!
//! Sequences runtime probe → naming → existing-container discovery →
//! change detection → bootstrap staging → container-manager "up" →
//! editor launch, and converts every fault at the boundary into a
//! structured [`berth_core::SpawnResult`].
//!
//! All subprocess I/O funnels through the [`CommandRunner`] trait so the
//! whole ladder is testable without a container engine on the machine.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod bootstrap;
mod devcontainer;
mod docker;
mod error;
mod hash;
mod naming;
mod orchestrator;
mod probe;
mod runner;

pub use bootstrap::{BootstrapConfig, BootstrapInfo, BootstrapManager, BootstrapOutcome};
pub use devcontainer::{DevcontainerCli, UpResult};
pub use docker::DockerCli;
pub use error::EngineError;
pub use hash::{
    compute_hash, config_file_set, has_changed, ChangeResult, HashResult, HASH_ALGORITHM,
};
pub use naming::{
    bootstrap_container_name, sanitize_name, volume_name, LABEL_BOOTSTRAP, LABEL_BUILT_AT,
    LABEL_CONFIG_FILES, LABEL_CONFIG_HASH, LABEL_PROJECT,
};
pub use orchestrator::{Orchestrator, RebuildPrompt};
pub use probe::{check_runtime, container_cli_installed, RuntimeStatus};
pub use runner::{CommandOutput, CommandRunner, Invocation, SystemRunner};

#[cfg(any(test, feature = "test-support"))]
pub use runner::FakeRunner;
