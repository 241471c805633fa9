// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Core types for the berth container provisioner.
//!
//! Shared models used by the spawn engine, the runner daemon, and the CLI:
//! spawn options and results, runner job state, named container records,
//! and runner registrations.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod clock;
mod container;
mod id;
mod job;
mod macros;
mod registration;
mod spawn;

pub use clock::{Clock, FakeClock, SystemClock};
pub use container::NamedContainerEntry;
pub use id::short;
pub use job::{JobDispatchInfo, JobStatus, RunnerJob, RunnerJobState};
pub use registration::RunnerRegistration;
pub use spawn::{
    CompletedStep, RebuildBehavior, SpawnOptions, SpawnOptionsBuilder, SpawnResult,
};

crate::define_id! {
    /// Unique identifier for one spawn attempt.
    ///
    /// Names the bootstrap helper container and correlates log lines
    /// belonging to a single orchestrator run.
    pub struct SpawnId("spn-");
}
