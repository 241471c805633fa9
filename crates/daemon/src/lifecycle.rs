// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup and shutdown.
//!
//! Startup order matters: logging, single-instance lock, registration,
//! credential resolution, credential server, then the polling loop. The
//! credential server must be serving before any job dispatch and is
//! stopped deterministically when the loop exits.

use crate::config;
use crate::containers::NamedContainerTable;
use crate::credentials::{self, CredentialServer};
use crate::env;
use crate::error::DaemonError;
use crate::runner::{RunnerConfig, RunnerDaemon};
use berth_engine::SystemRunner;
use fs2::FileExt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Options carried in from the CLI surface.
#[derive(Debug, Clone, Default)]
pub struct StartOptions {
    /// Override the polling interval (CLI `--polling-interval`).
    pub poll_interval: Option<Duration>,
}

/// Run the daemon until interrupted. Blocks the calling task.
pub async fn run(options: StartOptions) -> Result<(), DaemonError> {
    let state_dir = env::state_dir()?;
    std::fs::create_dir_all(&state_dir).map_err(|e| DaemonError::io(state_dir.clone(), e))?;

    let _log_guard = init_logging(&state_dir);
    let _lock = acquire_lock(&state_dir)?;

    let registration = config::first_registration(&env::registrations_path(&state_dir))?;
    tracing::info!(
        registration = %registration.slug(),
        runner = %registration.name,
        server = %registration.server,
        "daemon starting"
    );

    // Jobs cannot safely proceed without credential forwarding, so a
    // missing credential fails startup rather than failing every job.
    let credential = credentials::resolve(&state_dir).ok_or_else(|| {
        DaemonError::Credential(
            "no stored git token; set BERTH_GIT_TOKEN or write credentials.json".to_string(),
        )
    })?;

    let cancel = CancellationToken::new();
    let socket_path = env::credential_socket_path(&state_dir, &registration.id);
    let server_handle =
        CredentialServer::new(&socket_path, credential).start(cancel.clone())?;

    let containers = Arc::new(NamedContainerTable::load(env::containers_path(&state_dir))?);
    let mut runner_config = RunnerConfig::new(&state_dir, &registration.id);
    if let Some(interval) = options.poll_interval {
        runner_config.poll_interval = interval;
    }

    let daemon =
        RunnerDaemon::new(registration, runner_config, containers, Arc::new(SystemRunner));

    spawn_signal_listener(cancel.clone());
    daemon.run(cancel.clone()).await;

    // The polling loop exited; stop the credential server with it
    cancel.cancel();
    if let Err(e) = server_handle.await {
        tracing::warn!(error = %e, "credential server task join failed");
    }
    tracing::info!("daemon stopped");
    Ok(())
}

/// Guard against a second daemon instance via an exclusive lock file.
/// The lock is held for the process lifetime.
pub fn acquire_lock(state_dir: &Path) -> Result<std::fs::File, DaemonError> {
    let path = env::lock_path(state_dir);
    let file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(&path)
        .map_err(|e| DaemonError::io(path.clone(), e))?;
    file.try_lock_exclusive().map_err(|_| DaemonError::AlreadyRunning(path))?;
    Ok(file)
}

/// File logging with env-filter; defaults to `info`.
fn init_logging(state_dir: &Path) -> tracing_appender::non_blocking::WorkerGuard {
    let appender = tracing_appender::rolling::never(state_dir, "berthd.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .finish();
    // A second init (e.g., embedded in tests) keeps the existing subscriber
    let _ = tracing::subscriber::set_global_default(subscriber);
    guard
}

/// Interrupt and terminate signals request a graceful stop: no new
/// polls, in-flight work runs to its next safe boundary.
fn spawn_signal_listener(cancel: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();
        #[cfg(unix)]
        {
            let mut sigterm = match tokio::signal::unix::signal(
                tokio::signal::unix::SignalKind::terminate(),
            ) {
                Ok(signal) => signal,
                Err(e) => {
                    tracing::error!(error = %e, "failed to install SIGTERM handler");
                    let _ = ctrl_c.await;
                    cancel.cancel();
                    return;
                }
            };
            tokio::select! {
                _ = ctrl_c => tracing::info!("interrupt received, stopping"),
                _ = sigterm.recv() => tracing::info!("terminate received, stopping"),
            }
        }
        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            tracing::info!("interrupt received, stopping");
        }
        cancel.cancel();
    });
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
