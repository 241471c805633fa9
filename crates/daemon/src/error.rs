// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon error types.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("could not determine state directory (HOME unset)")]
    NoStateDir,

    #[error("another daemon instance holds the lock at {}", .0.display())]
    AlreadyRunning(PathBuf),

    #[error("no runner registration found; run `berth register <owner/project>` first")]
    NoRegistration,

    #[error("registrations file at {} is invalid: {reason}", .path.display())]
    InvalidRegistrations { path: PathBuf, reason: String },

    #[error("state file at {} is corrupt: {reason}", .path.display())]
    CorruptState { path: PathBuf, reason: String },

    #[error("io error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("queue server request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("queue server answered {status}: {body}")]
    ServerError { status: u16, body: String },

    /// Credential-server problems are fatal to daemon startup; jobs
    /// cannot safely proceed without credential forwarding.
    #[error("credential forwarding unavailable: {0}")]
    Credential(String),

    #[error("named container '{0}' is held by another job")]
    NamedContainerBusy(String),

    #[error("git clone failed: {0}")]
    CloneFailed(String),

    #[error("spawn failed at step {step}: {message}")]
    SpawnFailed {
        step: berth_core::CompletedStep,
        message: String,
    },

    #[error(transparent)]
    Engine(#[from] berth_engine::EngineError),
}

impl DaemonError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DaemonError::Io { path: path.into(), source }
    }
}
