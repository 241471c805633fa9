// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Named container records.
//!
//! A named container is intentionally kept alive across jobs, as opposed
//! to an ephemeral one destroyed after a single dispatch. The runner
//! daemon tracks these in a persisted table; only one job may hold a
//! given name at a time.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Persisted record of a long-lived, reusable container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedContainerEntry {
    pub name: String,
    pub container_id: String,
    pub clone_path: PathBuf,
    pub repository: String,
    pub created_at_ms: u64,
    pub last_used_at_ms: u64,
    /// True exactly while a job holds this container.
    #[serde(default)]
    pub in_use: bool,
}

impl NamedContainerEntry {
    pub fn new(
        name: impl Into<String>,
        container_id: impl Into<String>,
        clone_path: impl Into<PathBuf>,
        repository: impl Into<String>,
        now_ms: u64,
    ) -> Self {
        Self {
            name: name.into(),
            container_id: container_id.into(),
            clone_path: clone_path.into(),
            repository: repository.into(),
            created_at_ms: now_ms,
            last_used_at_ms: now_ms,
            in_use: false,
        }
    }

    /// Mark the entry as held by a job.
    pub fn acquire(&mut self, now_ms: u64) {
        self.in_use = true;
        self.last_used_at_ms = now_ms;
    }

    /// Release the entry on job completion (success or failure).
    pub fn release(&mut self, now_ms: u64) {
        self.in_use = false;
        self.last_used_at_ms = now_ms;
    }
}

#[cfg(test)]
#[path = "container_tests.rs"]
mod tests;
