// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for CLI specs.

use assert_cmd::Command;
use std::path::{Path, PathBuf};

pub fn berth() -> Command {
    Command::cargo_bin("berth").unwrap()
}

/// Temp project scaffold with an isolated state dir.
pub struct Project {
    dir: tempfile::TempDir,
}

impl Project {
    pub fn new() -> Self {
        Self { dir: tempfile::tempdir().unwrap() }
    }

    /// A project directory carrying a devcontainer descriptor.
    pub fn with_devcontainer(self) -> Self {
        let devcontainer = self.root().join("api/.devcontainer");
        std::fs::create_dir_all(&devcontainer).unwrap();
        std::fs::write(devcontainer.join("devcontainer.json"), r#"{"image": "rust:1"}"#)
            .unwrap();
        self
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn project_path(&self) -> PathBuf {
        self.root().join("api")
    }

    pub fn state_dir(&self) -> PathBuf {
        self.root().join("state")
    }

    /// `berth` with the state dir pinned inside the scaffold.
    pub fn berth(&self) -> Command {
        let mut cmd = berth();
        cmd.env("BERTH_STATE_DIR", self.state_dir());
        cmd
    }
}
