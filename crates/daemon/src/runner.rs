// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runner daemon loop.
//!
//! Polls the queue server for jobs and dispatches each into a
//! development container: clone → spawn → report → clean. Execution is
//! strictly sequential relative to the loop; one job finishes (success
//! or failure) before the next poll. Named containers are taken from and
//! released back to the shared table on every exit path.

use crate::client::JobClient;
use crate::containers::{AcquireOutcome, NamedContainerTable};
use crate::error::DaemonError;
use berth_core::{
    Clock, JobDispatchInfo, JobStatus, NamedContainerEntry, RunnerJob, RunnerJobState,
    RunnerRegistration, SpawnOptions, SystemClock,
};
use berth_engine::{CommandOutput, CommandRunner, DockerCli, Invocation, Orchestrator};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Runner daemon configuration.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub poll_interval: Duration,
    /// Present in configuration but clamped to 1: overlapping spawns
    /// would need per-job volume/container isolation and concurrent
    /// credential-server access the engine does not provide yet.
    pub max_concurrent_jobs: u32,
    /// Root directory for per-job and per-named-container clones.
    pub clone_root: PathBuf,
    /// Credential socket exposed to spawned containers.
    pub credential_socket: PathBuf,
}

impl RunnerConfig {
    pub fn new(state_dir: &Path, registration_id: &str) -> Self {
        Self {
            poll_interval: crate::env::poll_interval(),
            max_concurrent_jobs: 1,
            clone_root: crate::env::clones_dir(state_dir),
            credential_socket: crate::env::credential_socket_path(state_dir, registration_id),
        }
    }
}

pub struct RunnerDaemon<C: Clock = SystemClock> {
    registration: RunnerRegistration,
    client: JobClient,
    runner: Arc<dyn CommandRunner>,
    docker: DockerCli,
    orchestrator: Orchestrator<C>,
    containers: Arc<NamedContainerTable>,
    active: Mutex<HashMap<String, RunnerJobState>>,
    processed: AtomicU64,
    config: RunnerConfig,
    clock: C,
}

impl RunnerDaemon<SystemClock> {
    pub fn new(
        registration: RunnerRegistration,
        config: RunnerConfig,
        containers: Arc<NamedContainerTable>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self::with_clock(registration, config, containers, runner, SystemClock)
    }
}

impl<C: Clock> RunnerDaemon<C> {
    pub fn with_clock(
        registration: RunnerRegistration,
        config: RunnerConfig,
        containers: Arc<NamedContainerTable>,
        runner: Arc<dyn CommandRunner>,
        clock: C,
    ) -> Self {
        Self {
            orchestrator: Orchestrator::with_clock(Arc::clone(&runner), clock.clone()),
            docker: DockerCli::new(Arc::clone(&runner)),
            client: JobClient::new(),
            registration,
            runner,
            containers,
            active: Mutex::new(HashMap::new()),
            processed: AtomicU64::new(0),
            config,
            clock,
        }
    }

    /// Jobs successfully processed since startup.
    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    /// Snapshot of the in-flight job states.
    pub fn active_jobs(&self) -> Vec<RunnerJobState> {
        self.active.lock().values().cloned().collect()
    }

    /// Poll until cancelled. A cancellation request stops new polls; an
    /// in-flight job runs to its next safe boundary rather than being
    /// hard-killed mid-step.
    pub async fn run(&self, cancel: CancellationToken) {
        if self.config.max_concurrent_jobs > 1 {
            tracing::warn!(
                configured = self.config.max_concurrent_jobs,
                "max_concurrent_jobs above 1 is not supported; running sequentially"
            );
        }
        tracing::info!(
            registration = %self.registration.slug(),
            interval_ms = self.config.poll_interval.as_millis() as u64,
            "runner polling started"
        );

        loop {
            if cancel.is_cancelled() {
                break;
            }
            if let Err(e) = self.poll_once().await {
                tracing::warn!(error = %e, "poll failed; retrying next interval");
            }
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }
        tracing::info!(processed = self.processed(), "runner polling stopped");
    }

    /// One poll cycle. `Ok(true)` when a job was claimed this cycle.
    /// Job-level failures are reported and do not bubble out of the loop.
    pub async fn poll_once(&self) -> Result<bool, DaemonError> {
        match self.client.claim_job(&self.registration).await? {
            None => {
                tracing::debug!(registration = %self.registration.slug(), "no job available");
                Ok(false)
            }
            Some(job) => {
                let _ = self.dispatch_job(job).await;
                Ok(true)
            }
        }
    }

    /// Dispatch one claimed job. At-most-once: a job id already in the
    /// active set is not dispatched again. Returns the container id on
    /// success, `Ok(None)` for a skipped duplicate.
    pub async fn dispatch_job(&self, job: RunnerJob) -> Result<Option<String>, DaemonError> {
        tracing::info!(
            job_id = %job.id,
            run_id = %job.run_id,
            workflow = %job.workflow,
            branch = %job.branch,
            container = job.container_name.as_deref().unwrap_or("<ephemeral>"),
            "job received"
        );

        {
            let mut active = self.active.lock();
            if active.contains_key(&job.id) {
                tracing::warn!(job_id = %job.id, "job already active, skipping duplicate claim");
                return Ok(None);
            }
            active.insert(
                job.id.clone(),
                RunnerJobState::new(&job, &self.registration.id, self.clock.epoch_ms()),
            );
        }

        let dispatch = JobDispatchInfo::for_job(job, self.registration.clone());
        let outcome = self.execute(&dispatch).await;
        self.finish(&dispatch, &outcome).await;

        match outcome {
            Ok(container_id) => {
                self.processed.fetch_add(1, Ordering::Relaxed);
                tracing::info!(
                    job_id = %dispatch.job.id,
                    container_id = %container_id,
                    processed = self.processed(),
                    "job completed"
                );
                Ok(Some(container_id))
            }
            Err(e) => {
                tracing::error!(job_id = %dispatch.job.id, error = %e, "job failed");
                Err(e)
            }
        }
    }

    async fn execute(&self, dispatch: &JobDispatchInfo) -> Result<String, DaemonError> {
        let job = &dispatch.job;
        let now = self.clock.epoch_ms();

        // Named dispatch takes the container from the table; only one
        // job may hold a given name at a time.
        let (clone_path, known_entry) = match dispatch.container_name {
            Some(ref name) => match self.containers.acquire(name, now)? {
                AcquireOutcome::Busy => {
                    return Err(DaemonError::NamedContainerBusy(name.clone()))
                }
                AcquireOutcome::Acquired(entry) => (entry.clone_path, true),
                AcquireOutcome::Unknown => (self.config.clone_root.join(name), false),
            },
            None => (self.config.clone_root.join(&job.id), false),
        };
        self.with_state(&job.id, |state| state.clone_path = Some(clone_path.clone()));

        // Cloning
        self.prepare_clone(job, &clone_path).await?;

        // Building
        self.advance(&job.id, JobStatus::Building);
        let options = self.spawn_options(dispatch, &clone_path);
        let result = self.orchestrator.spawn(&options).await;
        if !result.success {
            let message = if result.errors.is_empty() {
                result.message
            } else {
                result.errors.join("; ")
            };
            return Err(DaemonError::SpawnFailed { step: result.completed_step, message });
        }
        let container_id = result.container_id.ok_or_else(|| DaemonError::SpawnFailed {
            step: result.completed_step,
            message: "spawn succeeded without a container id".to_string(),
        })?;
        self.with_state(&job.id, |state| state.container_id = Some(container_id.clone()));

        // First job for a named container creates its table entry
        if let Some(ref name) = dispatch.container_name {
            if !known_entry {
                self.containers.insert_held(NamedContainerEntry::new(
                    name,
                    &container_id,
                    &clone_path,
                    &job.repository,
                    now,
                ))?;
            }
        }

        self.advance(&job.id, JobStatus::Running);
        Ok(container_id)
    }

    /// Terminal bookkeeping for every dispatch: advance to the terminal
    /// status, clean, release the named container (on success and
    /// failure alike), and drop the job from the active set.
    async fn finish(&self, dispatch: &JobDispatchInfo, outcome: &Result<String, DaemonError>) {
        let job_id = &dispatch.job.id;
        let terminal =
            if outcome.is_ok() { JobStatus::Completed } else { JobStatus::Failed };
        self.advance(job_id, terminal);
        self.advance(job_id, JobStatus::Cleaning);

        // A Busy outcome means another job holds the name; releasing
        // here would steal its hold.
        let held_elsewhere = matches!(outcome, Err(DaemonError::NamedContainerBusy(_)));
        match dispatch.container_name {
            Some(ref name) if !held_elsewhere => {
                if let Err(e) = self.containers.release(name, self.clock.epoch_ms()) {
                    tracing::warn!(container = %name, error = %e, "named container release failed");
                }
            }
            Some(_) => {}
            None => {
                // Ephemeral containers do not outlive their job
                if let Ok(ref container_id) = outcome {
                    if let Err(e) = self.docker.rm_force(container_id).await {
                        tracing::warn!(
                            container = %container_id,
                            error = %e,
                            "ephemeral container cleanup failed"
                        );
                    }
                }
            }
        }

        self.active.lock().remove(job_id);
    }

    /// Clone the job's repository, or refresh an existing clone when a
    /// named container is being reused.
    async fn prepare_clone(&self, job: &RunnerJob, clone_path: &Path) -> Result<(), DaemonError> {
        let url = clone_url(&job.repository);
        let path = clone_path.display().to_string();

        if clone_path.join(".git").exists() {
            tracing::debug!(job_id = %job.id, %path, "refreshing existing clone");
            self.git_ok(["-C", &path, "fetch", "origin", &job.branch]).await?;
            self.git_ok(["-C", &path, "checkout", &job.branch]).await?;
            return Ok(());
        }

        if let Some(parent) = clone_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| DaemonError::io(parent.to_path_buf(), e))?;
        }
        tracing::info!(job_id = %job.id, branch = %job.branch, %path, "cloning repository");
        self.git_ok([
            "clone",
            "--branch",
            &job.branch,
            "--single-branch",
            "--depth",
            "1",
            &url,
            &path,
        ])
        .await?;
        Ok(())
    }

    async fn git_ok(
        &self,
        args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<CommandOutput, DaemonError> {
        let output = self.runner.run(Invocation::new("git", args)).await?;
        if output.success() {
            Ok(output)
        } else {
            Err(DaemonError::CloneFailed(output.stderr.trim().to_string()))
        }
    }

    fn spawn_options(&self, dispatch: &JobDispatchInfo, clone_path: &Path) -> SpawnOptions {
        let project_name = match dispatch.container_name {
            Some(ref name) => name.clone(),
            None => format!("{}-{}", self.registration.project, dispatch.job.id),
        };
        SpawnOptions::builder(project_name, clone_path)
            .launch_editor(false)
            .reuse_existing(dispatch.container_name.is_some())
            .credential_socket(self.config.credential_socket.clone())
            .build()
    }

    fn advance(&self, job_id: &str, status: JobStatus) {
        let mut active = self.active.lock();
        match active.get_mut(job_id) {
            Some(state) => {
                if !state.advance(status) {
                    tracing::warn!(
                        %job_id,
                        from = %state.status,
                        to = %status,
                        "illegal job status transition ignored"
                    );
                }
            }
            None => tracing::warn!(%job_id, "status update for unknown job"),
        }
    }

    fn with_state(&self, job_id: &str, update: impl FnOnce(&mut RunnerJobState)) {
        if let Some(state) = self.active.lock().get_mut(job_id) {
            update(state);
        }
    }

    /// Test hook: pretend a job is already in flight.
    #[cfg(test)]
    fn mark_active(&self, job: &RunnerJob) {
        self.active.lock().insert(
            job.id.clone(),
            RunnerJobState::new(job, &self.registration.id, self.clock.epoch_ms()),
        );
    }
}

/// Expand a repository slug to a clone URL; full URLs pass through.
fn clone_url(repository: &str) -> String {
    if repository.contains("://") || repository.starts_with("git@") {
        repository.to_string()
    } else {
        format!("https://github.com/{}.git", repository)
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
