// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use crate::error::DaemonError;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Resolve state directory: BERTH_STATE_DIR > XDG_STATE_HOME/berth > ~/.local/state/berth
pub fn state_dir() -> Result<PathBuf, DaemonError> {
    if let Ok(dir) = std::env::var("BERTH_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("berth"));
    }
    let home = std::env::var("HOME").map_err(|_| DaemonError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/berth"))
}

/// Registrations file within a state directory.
pub fn registrations_path(state_dir: &Path) -> PathBuf {
    state_dir.join("registrations.toml")
}

/// Named-container table within a state directory.
pub fn containers_path(state_dir: &Path) -> PathBuf {
    state_dir.join("containers.json")
}

/// Stored git credential within a state directory.
pub fn credentials_path(state_dir: &Path) -> PathBuf {
    state_dir.join("credentials.json")
}

/// Credential socket for one registration.
pub fn credential_socket_path(state_dir: &Path, registration_id: &str) -> PathBuf {
    state_dir.join(format!("cred-{}.sock", registration_id))
}

/// Root directory for job clones.
pub fn clones_dir(state_dir: &Path) -> PathBuf {
    state_dir.join("clones")
}

/// Daemon lock file guarding against a second instance.
pub fn lock_path(state_dir: &Path) -> PathBuf {
    state_dir.join("berthd.lock")
}

/// Daemon log file.
pub fn log_path(state_dir: &Path) -> PathBuf {
    state_dir.join("berthd.log")
}

/// Default polling interval (override via `BERTH_POLL_INTERVAL_MS`).
pub fn poll_interval() -> Duration {
    std::env::var("BERTH_POLL_INTERVAL_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(10))
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
