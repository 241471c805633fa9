// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runner job payloads and the per-job state machine.

use crate::registration::RunnerRegistration;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A job claimed from the queue server.
///
/// Field names mirror the server's JSON; unknown fields are ignored so
/// server-side additions don't break older runners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerJob {
    pub id: String,
    pub run_id: String,
    pub workflow: String,
    pub branch: String,
    pub repository: String,
    /// Non-null means "reuse or create this named container";
    /// absent means ephemeral dispatch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_name: Option<String>,
}

/// Status of one in-flight job.
///
/// Transitions are strictly forward: `cloning → building → running →
/// completed|failed → cleaning`. Terminal states are followed only by
/// `cleaning`, after which the state is deleted from the active set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Cloning,
    Building,
    Running,
    Completed,
    Failed,
    Cleaning,
}

crate::simple_display! {
    JobStatus {
        Cloning => "cloning",
        Building => "building",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Cleaning => "cleaning",
    }
}

impl JobStatus {
    /// Check whether a transition to `next` moves strictly forward.
    pub fn may_advance_to(self, next: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self, next),
            (Cloning, Building)
                | (Building, Running)
                | (Running, Completed)
                | (Running, Failed)
                // A job can fail before its container is up
                | (Cloning, Failed)
                | (Building, Failed)
                | (Completed, Cleaning)
                | (Failed, Cleaning)
        )
    }

    /// Terminal states (followed only by `cleaning`).
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// One in-flight job tracked by the runner daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerJobState {
    pub job_id: String,
    pub registration_id: String,
    pub run_id: String,
    pub workflow: String,
    pub branch: String,
    /// Named container held by this job, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clone_path: Option<PathBuf>,
    pub started_at_ms: u64,
    pub status: JobStatus,
}

impl RunnerJobState {
    pub fn new(job: &RunnerJob, registration_id: impl Into<String>, started_at_ms: u64) -> Self {
        Self {
            job_id: job.id.clone(),
            registration_id: registration_id.into(),
            run_id: job.run_id.clone(),
            workflow: job.workflow.clone(),
            branch: job.branch.clone(),
            container_name: job.container_name.clone(),
            container_id: None,
            clone_path: None,
            started_at_ms,
            status: JobStatus::Cloning,
        }
    }

    /// Advance to `next` if the transition is legal. Returns false (and
    /// leaves the status untouched) on an illegal transition.
    pub fn advance(&mut self, next: JobStatus) -> bool {
        if self.status.may_advance_to(next) {
            self.status = next;
            true
        } else {
            false
        }
    }
}

/// Decision record produced when a claimed job is matched to a registration.
#[derive(Debug, Clone)]
pub struct JobDispatchInfo {
    pub job: RunnerJob,
    pub registration: RunnerRegistration,
    /// `None` means ephemeral dispatch (default).
    pub container_name: Option<String>,
}

impl JobDispatchInfo {
    /// Match a claimed job to its registration. The job's own
    /// `container_name` decides named vs ephemeral dispatch.
    pub fn for_job(job: RunnerJob, registration: RunnerRegistration) -> Self {
        let container_name = job.container_name.clone();
        Self { job, registration, container_name }
    }

    pub fn is_ephemeral(&self) -> bool {
        self.container_name.is_none()
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
