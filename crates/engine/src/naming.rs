// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Volume and container naming, and the label vocabulary used for
//! existing-resource discovery.

use berth_core::{SpawnId, SpawnOptions};

/// Label identifying which project a container belongs to.
pub const LABEL_PROJECT: &str = "berth.project";
/// Label carrying the configuration hash of the last build.
pub const LABEL_CONFIG_HASH: &str = "berth.config-hash";
/// Label carrying per-file digests as compact JSON (path → digest).
pub const LABEL_CONFIG_FILES: &str = "berth.config-files";
/// Label carrying the epoch-ms build timestamp.
pub const LABEL_BUILT_AT: &str = "berth.built-at";
/// Label marking bootstrap helper containers.
pub const LABEL_BOOTSTRAP: &str = "berth.bootstrap";

/// Sanitize a project name into the character set Docker accepts for
/// volume and container names. Lowercases and collapses anything outside
/// `[a-z0-9_.-]` to a single dash.
pub fn sanitize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_dash = false;
    for c in name.chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-' {
            out.push(c);
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    let trimmed = out.trim_matches('-').to_string();
    if trimmed.is_empty() {
        "project".to_string()
    } else {
        trimmed
    }
}

/// Workspace volume name for a spawn: the explicit override when given,
/// otherwise `berth-<project>-ws`.
pub fn volume_name(options: &SpawnOptions) -> String {
    match options.volume_name {
        Some(ref name) => name.clone(),
        None => format!("berth-{}-ws", sanitize_name(&options.project_name)),
    }
}

/// Bootstrap helper container name, unique per spawn attempt.
pub fn bootstrap_container_name(spawn_id: &SpawnId) -> String {
    format!("berth-bootstrap-{}", spawn_id.suffix())
}

#[cfg(test)]
#[path = "naming_tests.rs"]
mod tests;
