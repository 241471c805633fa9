// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registrations file.
//!
//! A TOML file under the state dir holding one or more runner
//! registrations. The daemon reads it at startup and uses the first
//! entry when multiple exist.

use crate::error::DaemonError;
use berth_core::RunnerRegistration;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Default, Serialize, Deserialize)]
struct RegistrationsFile {
    #[serde(default, rename = "registration")]
    registrations: Vec<RunnerRegistration>,
}

/// Load all registrations. A missing file is an empty list, not an error.
pub fn load_registrations(path: &Path) -> Result<Vec<RunnerRegistration>, DaemonError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content =
        std::fs::read_to_string(path).map_err(|e| DaemonError::io(path.to_path_buf(), e))?;
    let file: RegistrationsFile =
        toml::from_str(&content).map_err(|e| DaemonError::InvalidRegistrations {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    Ok(file.registrations)
}

/// The registration the daemon polls: the first stored one.
pub fn first_registration(path: &Path) -> Result<RunnerRegistration, DaemonError> {
    load_registrations(path)?.into_iter().next().ok_or(DaemonError::NoRegistration)
}

/// Append a registration, creating the file (and parent dir) if needed.
pub fn append_registration(
    path: &Path,
    registration: &RunnerRegistration,
) -> Result<(), DaemonError> {
    let mut registrations = load_registrations(path)?;
    registrations.push(registration.clone());
    let file = RegistrationsFile { registrations };
    let content = toml::to_string_pretty(&file).map_err(|e| DaemonError::InvalidRegistrations {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| DaemonError::io(parent.to_path_buf(), e))?;
    }
    std::fs::write(path, content).map_err(|e| DaemonError::io(path.to_path_buf(), e))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
