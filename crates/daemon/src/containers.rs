// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Named container table.
//!
//! The single piece of mutable shared state the daemon protects: a
//! mutex-guarded map of named containers, persisted to disk after every
//! mutation so the in-use ledger survives a daemon restart. Only one job
//! may hold a given name at a time.

use crate::error::DaemonError;
use berth_core::NamedContainerEntry;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;

/// Result of trying to take a named container for a job.
#[derive(Debug, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// The entry existed and is now held by the caller.
    Acquired(NamedContainerEntry),
    /// Another job holds it.
    Busy,
    /// No entry with this name exists yet.
    Unknown,
}

pub struct NamedContainerTable {
    path: PathBuf,
    entries: Mutex<HashMap<String, NamedContainerEntry>>,
}

impl NamedContainerTable {
    /// Load the table from disk. A missing file is an empty table.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, DaemonError> {
        let path = path.into();
        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .map_err(|e| DaemonError::io(path.clone(), e))?;
            let list: Vec<NamedContainerEntry> =
                serde_json::from_str(&content).map_err(|e| DaemonError::CorruptState {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
            list.into_iter().map(|e| (e.name.clone(), e)).collect()
        } else {
            HashMap::new()
        };
        Ok(Self { path, entries: Mutex::new(entries) })
    }

    pub fn get(&self, name: &str) -> Option<NamedContainerEntry> {
        self.entries.lock().get(name).cloned()
    }

    /// Try to take a named container for a job.
    pub fn acquire(&self, name: &str, now_ms: u64) -> Result<AcquireOutcome, DaemonError> {
        let mut entries = self.entries.lock();
        let outcome = match entries.get_mut(name) {
            None => return Ok(AcquireOutcome::Unknown),
            Some(entry) if entry.in_use => return Ok(AcquireOutcome::Busy),
            Some(entry) => {
                entry.acquire(now_ms);
                AcquireOutcome::Acquired(entry.clone())
            }
        };
        self.persist(&entries)?;
        Ok(outcome)
    }

    /// Record a newly created named container, already held by the
    /// creating job.
    pub fn insert_held(&self, mut entry: NamedContainerEntry) -> Result<(), DaemonError> {
        entry.in_use = true;
        let mut entries = self.entries.lock();
        entries.insert(entry.name.clone(), entry);
        self.persist(&entries)
    }

    /// Release a held container. Runs on every job exit path, success
    /// and failure alike. Returns false when the name is unknown.
    pub fn release(&self, name: &str, now_ms: u64) -> Result<bool, DaemonError> {
        let mut entries = self.entries.lock();
        match entries.get_mut(name) {
            None => Ok(false),
            Some(entry) => {
                entry.release(now_ms);
                self.persist(&entries)?;
                Ok(true)
            }
        }
    }

    /// Drop an entry when its container is deleted.
    pub fn remove(&self, name: &str) -> Result<Option<NamedContainerEntry>, DaemonError> {
        let mut entries = self.entries.lock();
        let removed = entries.remove(name);
        if removed.is_some() {
            self.persist(&entries)?;
        }
        Ok(removed)
    }

    /// All entries, sorted by name.
    pub fn entries(&self) -> Vec<NamedContainerEntry> {
        let mut list: Vec<_> = self.entries.lock().values().cloned().collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        list
    }

    fn persist(&self, entries: &HashMap<String, NamedContainerEntry>) -> Result<(), DaemonError> {
        let mut list: Vec<_> = entries.values().cloned().collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        let content = serde_json::to_string_pretty(&list).map_err(|e| {
            DaemonError::CorruptState { path: self.path.clone(), reason: e.to_string() }
        })?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| DaemonError::io(parent.to_path_buf(), e))?;
        }
        std::fs::write(&self.path, content).map_err(|e| DaemonError::io(self.path.clone(), e))
    }
}

impl std::fmt::Debug for NamedContainerTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamedContainerTable")
            .field("path", &self.path)
            .field("entries", &self.entries.lock().len())
            .finish()
    }
}

#[cfg(test)]
#[path = "containers_tests.rs"]
mod tests;
