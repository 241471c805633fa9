// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration hashing and change detection.
//!
//! The digest covers the files that determine a container's build
//! output. Files are processed in sorted path order so the result is
//! independent of filesystem enumeration order: same file set and
//! content always produce the same digest, across calls and restarts.

use crate::error::EngineError;
use crate::naming::{LABEL_BUILT_AT, LABEL_CONFIG_FILES, LABEL_CONFIG_HASH};
use berth_core::SpawnOptions;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::PathBuf;

/// Hash algorithm version, recorded with every result so a future
/// algorithm change invalidates stored hashes instead of mismatching.
pub const HASH_ALGORITHM: &str = "v1";

/// Digest over a set of configuration files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashResult {
    pub algorithm: String,
    pub computed_at_ms: u64,
    /// Top-level digest: SHA-256 over the concatenated per-file digests.
    pub digest: String,
    /// Per-file digests, sorted by path.
    pub file_digests: Vec<(String, String)>,
}

impl HashResult {
    /// Per-file digests as compact JSON for storage in a container label.
    pub fn files_json(&self) -> String {
        let map: serde_json::Map<String, serde_json::Value> = self
            .file_digests
            .iter()
            .map(|(path, digest)| (path.clone(), serde_json::Value::String(digest.clone())))
            .collect();
        serde_json::Value::Object(map).to_string()
    }
}

/// Comparison between a fresh hash and the one recorded on an existing
/// container's labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeResult {
    pub changed: bool,
    pub reason: String,
    /// Files whose digest differs from the prior build.
    pub changed_files: Vec<String>,
    /// When the existing container was built, if its label records it.
    pub previous_built_at_ms: Option<u64>,
}

impl ChangeResult {
    fn unchanged(previous_built_at_ms: Option<u64>) -> Self {
        Self {
            changed: false,
            reason: "configuration unchanged".to_string(),
            changed_files: Vec::new(),
            previous_built_at_ms,
        }
    }
}

/// Collect the files that affect the built container: the devcontainer
/// descriptor, Dockerfiles, compose files, and dependency lockfiles.
/// Only files that exist make the set; the result is sorted and deduped.
pub fn config_file_set(options: &SpawnOptions) -> Vec<PathBuf> {
    const BUILD_FILES: &[&str] =
        &["Dockerfile", "docker-compose.yml", "docker-compose.yaml", "compose.yaml"];
    const LOCKFILES: &[&str] = &[
        "Cargo.lock",
        "package-lock.json",
        "yarn.lock",
        "pnpm-lock.yaml",
        "poetry.lock",
        "Gemfile.lock",
        "go.sum",
    ];

    let mut candidates = vec![options.config_path.clone()];
    if let Some(config_dir) = options.config_path.parent() {
        for name in BUILD_FILES {
            candidates.push(config_dir.join(name));
        }
    }
    for name in BUILD_FILES.iter().chain(LOCKFILES) {
        candidates.push(options.project_path.join(name));
    }

    let mut files: Vec<PathBuf> = candidates.into_iter().filter(|p| p.is_file()).collect();
    files.sort();
    files.dedup();
    files
}

/// Compute the configuration hash over the given files.
///
/// Reads each file in sorted order, digests it individually, then
/// digests the concatenation of the per-file digests.
pub fn compute_hash(files: &[PathBuf], now_ms: u64) -> Result<HashResult, EngineError> {
    let mut sorted: Vec<&PathBuf> = files.iter().collect();
    sorted.sort();

    let mut file_digests = Vec::with_capacity(sorted.len());
    for path in sorted {
        let content = std::fs::read(path).map_err(|e| EngineError::io(path.clone(), e))?;
        let digest = hex_digest(&content);
        file_digests.push((path.to_string_lossy().into_owned(), digest));
    }

    let mut top = Sha256::new();
    for (_, digest) in &file_digests {
        top.update(digest.as_bytes());
    }

    Ok(HashResult {
        algorithm: HASH_ALGORITHM.to_string(),
        computed_at_ms: now_ms,
        digest: to_hex(&top.finalize()),
        file_digests,
    })
}

/// Compare a fresh hash against the labels of an existing container.
///
/// An absent hash label means "no prior build recorded" and forces the
/// rebuild path. A present, equal label means unchanged. A differing
/// label lists the files whose per-file digests moved.
pub fn has_changed(current: &HashResult, labels: &HashMap<String, String>) -> ChangeResult {
    let previous_built_at_ms =
        labels.get(LABEL_BUILT_AT).and_then(|v| v.parse::<u64>().ok());

    let Some(previous_hash) = labels.get(LABEL_CONFIG_HASH) else {
        return ChangeResult {
            changed: true,
            reason: "no prior build recorded".to_string(),
            changed_files: Vec::new(),
            previous_built_at_ms,
        };
    };

    if previous_hash == &current.digest {
        return ChangeResult::unchanged(previous_built_at_ms);
    }

    let previous_files = parse_files_label(labels.get(LABEL_CONFIG_FILES));
    let mut changed_files = Vec::new();
    for (path, digest) in &current.file_digests {
        if previous_files.get(path) != Some(digest) {
            changed_files.push(path.clone());
        }
    }
    for path in previous_files.keys() {
        if !current.file_digests.iter().any(|(p, _)| p == path) {
            changed_files.push(path.clone());
        }
    }
    changed_files.sort();

    ChangeResult {
        changed: true,
        reason: "configuration hash differs from last build".to_string(),
        changed_files,
        previous_built_at_ms,
    }
}

fn parse_files_label(label: Option<&String>) -> HashMap<String, String> {
    label
        .and_then(|raw| serde_json::from_str::<HashMap<String, String>>(raw).ok())
        .unwrap_or_default()
}

fn hex_digest(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    to_hex(&hasher.finalize())
}

fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{:02x}", b));
    }
    out
}

#[cfg(test)]
#[path = "hash_tests.rs"]
mod tests;
