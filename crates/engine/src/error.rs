// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine error types.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The program could not be executed at all (missing binary, perms).
    #[error("failed to execute {program}: {source}")]
    Exec {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A subprocess ran but exited nonzero where success was required.
    #[error("{command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("io error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Container-manager output could not be parsed as a result document.
    #[error("invalid container manager output: {0}")]
    InvalidManagerOutput(String),

    /// A precondition failed before any resource was touched.
    #[error("{0}")]
    Precondition(String),
}

impl EngineError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EngineError::Io { path: path.into(), source }
    }
}
