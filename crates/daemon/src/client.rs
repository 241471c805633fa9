// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job queue server client.
//!
//! Two calls: runner registration and job claiming. Requests carry the
//! registration's bearer token; "no job available" (204/404/empty body)
//! is an expected answer, not an error.

use crate::error::DaemonError;
use berth_core::{RunnerJob, RunnerRegistration};
use serde::Deserialize;
use std::time::Duration;

/// Server response to a registration call.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterResponse {
    pub id: String,
    pub name: String,
    pub token: String,
}

#[derive(Clone)]
pub struct JobClient {
    http: reqwest::Client,
}

impl Default for JobClient {
    fn default() -> Self {
        Self::new()
    }
}

impl JobClient {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            // Builder only fails on TLS backend misconfiguration; fall
            // back to the default client rather than failing startup.
            .unwrap_or_default();
        Self { http }
    }

    /// Register a runner for `owner/project`, returning the identity and
    /// bearer token to persist.
    pub async fn register(
        &self,
        server: &str,
        owner: &str,
        project: &str,
        name: Option<&str>,
    ) -> Result<RegisterResponse, DaemonError> {
        let url = runners_url(server, owner, project);
        let mut body = serde_json::Map::new();
        if let Some(name) = name {
            body.insert("name".to_string(), serde_json::Value::String(name.to_string()));
        }

        let response = self.http.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DaemonError::ServerError {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(response.json().await?)
    }

    /// Claim the next queued job for a registration. `Ok(None)` means no
    /// job is available.
    pub async fn claim_job(
        &self,
        registration: &RunnerRegistration,
    ) -> Result<Option<RunnerJob>, DaemonError> {
        let url = format!(
            "{}/jobs",
            runners_url(&registration.server, &registration.owner, &registration.project)
        );
        let response =
            self.http.post(&url).bearer_auth(&registration.token).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::NO_CONTENT || status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(DaemonError::ServerError {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let body = response.text().await?;
        if body.trim().is_empty() || body.trim() == "null" {
            return Ok(None);
        }
        let job: RunnerJob = serde_json::from_str(&body).map_err(|e| {
            DaemonError::ServerError {
                status: status.as_u16(),
                body: format!("unparseable job payload: {}", e),
            }
        })?;
        Ok(Some(job))
    }
}

fn runners_url(server: &str, owner: &str, project: &str) -> String {
    format!(
        "{}/owners/{}/projects/{}/runners",
        server.trim_end_matches('/'),
        owner,
        project
    )
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
