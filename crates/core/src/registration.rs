// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runner registrations.

use serde::{Deserialize, Serialize};

/// One polling target: a server/owner/project tuple plus the bearer
/// token the registration call returned.
///
/// `Debug` redacts the token; the raw secret must never reach a log line.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerRegistration {
    pub server: String,
    pub owner: String,
    pub project: String,
    pub id: String,
    pub name: String,
    pub token: String,
}

impl RunnerRegistration {
    /// `owner/project` slug used in queue server URLs and log lines.
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.project)
    }
}

impl std::fmt::Debug for RunnerRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunnerRegistration")
            .field("server", &self.server)
            .field("owner", &self.owner)
            .field("project", &self.project)
            .field("id", &self.id)
            .field("name", &self.name)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
#[path = "registration_tests.rs"]
mod tests;
