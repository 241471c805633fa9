// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

fn job(container_name: Option<&str>) -> RunnerJob {
    RunnerJob {
        id: "job-1".to_string(),
        run_id: "run-9".to_string(),
        workflow: "ci".to_string(),
        branch: "main".to_string(),
        repository: "acme/api".to_string(),
        container_name: container_name.map(String::from),
    }
}

fn registration() -> RunnerRegistration {
    RunnerRegistration {
        server: "https://queue.example.com".to_string(),
        owner: "acme".to_string(),
        project: "api".to_string(),
        id: "reg-1".to_string(),
        name: "runner-a".to_string(),
        token: "tok-secret".to_string(),
    }
}

#[parameterized(
    cloning_to_building = { JobStatus::Cloning, JobStatus::Building, true },
    building_to_running = { JobStatus::Building, JobStatus::Running, true },
    running_to_completed = { JobStatus::Running, JobStatus::Completed, true },
    running_to_failed = { JobStatus::Running, JobStatus::Failed, true },
    cloning_to_failed = { JobStatus::Cloning, JobStatus::Failed, true },
    completed_to_cleaning = { JobStatus::Completed, JobStatus::Cleaning, true },
    failed_to_cleaning = { JobStatus::Failed, JobStatus::Cleaning, true },
    no_backwards = { JobStatus::Running, JobStatus::Cloning, false },
    no_skip_to_cleaning = { JobStatus::Running, JobStatus::Cleaning, false },
    completed_is_terminal = { JobStatus::Completed, JobStatus::Running, false },
)]
fn status_transitions(from: JobStatus, to: JobStatus, allowed: bool) {
    assert_eq!(from.may_advance_to(to), allowed);
}

#[test]
fn illegal_advance_leaves_status_untouched() {
    let mut state = RunnerJobState::new(&job(None), "reg-1", 1_000);
    assert_eq!(state.status, JobStatus::Cloning);
    assert!(!state.advance(JobStatus::Cleaning));
    assert_eq!(state.status, JobStatus::Cloning);
    assert!(state.advance(JobStatus::Building));
    assert_eq!(state.status, JobStatus::Building);
}

#[test]
fn terminal_states() {
    assert!(JobStatus::Completed.is_terminal());
    assert!(JobStatus::Failed.is_terminal());
    assert!(!JobStatus::Running.is_terminal());
    assert!(!JobStatus::Cleaning.is_terminal());
}

#[test]
fn dispatch_defaults_to_ephemeral() {
    let info = JobDispatchInfo::for_job(job(None), registration());
    assert!(info.is_ephemeral());
    assert!(info.container_name.is_none());
}

#[test]
fn dispatch_honors_named_container() {
    let info = JobDispatchInfo::for_job(job(Some("build-box")), registration());
    assert!(!info.is_ephemeral());
    assert_eq!(info.container_name.as_deref(), Some("build-box"));
}

#[test]
fn job_state_carries_job_fields() {
    let state = RunnerJobState::new(&job(Some("build-box")), "reg-1", 42);
    assert_eq!(state.job_id, "job-1");
    assert_eq!(state.run_id, "run-9");
    assert_eq!(state.workflow, "ci");
    assert_eq!(state.branch, "main");
    assert_eq!(state.container_name.as_deref(), Some("build-box"));
    assert_eq!(state.started_at_ms, 42);
    assert_eq!(state.status, JobStatus::Cloning);
}

#[test]
fn runner_job_tolerates_unknown_fields() {
    let parsed: RunnerJob = serde_json::from_str(
        r#"{
            "id": "job-7",
            "run_id": "run-2",
            "workflow": "tests",
            "branch": "dev",
            "repository": "acme/api",
            "priority": 3
        }"#,
    )
    .unwrap();
    assert_eq!(parsed.id, "job-7");
    assert!(parsed.container_name.is_none());
}
