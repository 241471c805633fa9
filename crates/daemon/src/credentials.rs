// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential forwarding.
//!
//! Containers run isolated from the host's keychain and config files.
//! The daemon resolves a git token from the host once at startup and
//! answers requests for it over a Unix socket exposed only to the
//! locally spawned container. The trust boundary is the socket path;
//! nothing is network-exposed, and the raw token never reaches a log
//! line.
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload.

use crate::error::DaemonError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio_util::sync::CancellationToken;

/// Upper bound on a single frame; credential traffic is tiny.
const MAX_FRAME_LEN: u32 = 64 * 1024;

/// A git credential resolved from the host.
#[derive(Clone)]
pub enum GitCredential {
    /// OAuth access token.
    OAuth(String),
    /// Personal access token.
    Pat(String),
}

impl GitCredential {
    pub fn token(&self) -> &str {
        match self {
            GitCredential::OAuth(token) | GitCredential::Pat(token) => token,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            GitCredential::OAuth(_) => "oauth",
            GitCredential::Pat(_) => "pat",
        }
    }
}

impl std::fmt::Debug for GitCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GitCredential::{}(<redacted>)", self.kind())
    }
}

/// Resolve a git credential from the host environment.
///
/// Fallback chain: `BERTH_GIT_TOKEN` env → `GITHUB_TOKEN` env → the
/// stored credentials file under the state dir.
pub fn resolve(state_dir: &Path) -> Option<GitCredential> {
    if let Ok(token) = std::env::var("BERTH_GIT_TOKEN") {
        if !token.is_empty() {
            return Some(GitCredential::Pat(token));
        }
    }
    if let Ok(token) = std::env::var("GITHUB_TOKEN") {
        if !token.is_empty() {
            return Some(GitCredential::Pat(token));
        }
    }
    read_credentials_file(&crate::env::credentials_path(state_dir))
}

/// Read a stored credential: `{"oauth": {"accessToken": ...}}` or
/// `{"pat": ...}`.
fn read_credentials_file(path: &Path) -> Option<GitCredential> {
    let content = std::fs::read_to_string(path).ok()?;
    let value: serde_json::Value = serde_json::from_str(&content).ok()?;

    if let Some(token) = value
        .get("oauth")
        .and_then(|v| v.get("accessToken"))
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
    {
        return Some(GitCredential::OAuth(token.to_string()));
    }
    value
        .get("pat")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| GitCredential::Pat(s.to_string()))
}

/// Request sent by a container over the credential socket.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CredentialRequest {
    Get,
}

/// Answer to a credential request.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CredentialResponse {
    Token { kind: String, token: String },
    Denied { reason: String },
}

/// Socket service answering credential requests for one registration.
///
/// Scoped to the daemon run: started before any job dispatch, stopped
/// deterministically on shutdown via the cancellation token.
pub struct CredentialServer {
    socket_path: PathBuf,
    credential: GitCredential,
}

impl CredentialServer {
    pub fn new(socket_path: impl Into<PathBuf>, credential: GitCredential) -> Self {
        Self { socket_path: socket_path.into(), credential }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Bind the socket and serve until cancelled. The socket file is
    /// removed on shutdown.
    pub fn start(
        self,
        cancel: CancellationToken,
    ) -> Result<tokio::task::JoinHandle<()>, DaemonError> {
        // A stale socket from a crashed run would make bind fail
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path)
                .map_err(|e| DaemonError::Credential(format!("stale socket: {}", e)))?;
        }
        let listener = UnixListener::bind(&self.socket_path)
            .map_err(|e| DaemonError::Credential(format!("bind failed: {}", e)))?;
        tracing::info!(socket = %self.socket_path.display(), "credential server listening");

        Ok(tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    accepted = listener.accept() => {
                        match accepted {
                            Ok((stream, _)) => {
                                let credential = self.credential.clone();
                                tokio::spawn(async move {
                                    if let Err(e) = handle_connection(stream, &credential).await {
                                        tracing::warn!(error = %e, "credential request failed");
                                    }
                                });
                            }
                            Err(e) => tracing::error!(error = %e, "credential accept error"),
                        }
                    }
                }
            }
            drop(listener);
            if let Err(e) = std::fs::remove_file(&self.socket_path) {
                tracing::debug!(error = %e, "credential socket already removed");
            }
            tracing::info!("credential server stopped");
        }))
    }
}

async fn handle_connection(
    mut stream: UnixStream,
    credential: &GitCredential,
) -> Result<(), DaemonError> {
    let request: CredentialRequest = read_frame(&mut stream).await?;
    let response = match request {
        CredentialRequest::Get => CredentialResponse::Token {
            kind: credential.kind().to_string(),
            token: credential.token().to_string(),
        },
    };
    write_frame(&mut stream, &response).await
}

/// Request the stored token over a credential socket (container side).
pub async fn request_token(socket_path: &Path) -> Result<CredentialResponse, DaemonError> {
    let mut stream = UnixStream::connect(socket_path)
        .await
        .map_err(|e| DaemonError::Credential(format!("connect failed: {}", e)))?;
    write_frame(&mut stream, &CredentialRequest::Get).await?;
    read_frame(&mut stream).await
}

async fn read_frame<T: serde::de::DeserializeOwned, S: AsyncRead + Unpin>(
    stream: &mut S,
) -> Result<T, DaemonError> {
    let mut len_buf = [0u8; 4];
    stream
        .read_exact(&mut len_buf)
        .await
        .map_err(|e| DaemonError::Credential(format!("read length: {}", e)))?;
    let len = u32::from_be_bytes(len_buf);
    if len > MAX_FRAME_LEN {
        return Err(DaemonError::Credential(format!("frame too large: {} bytes", len)));
    }
    let mut payload = vec![0u8; len as usize];
    stream
        .read_exact(&mut payload)
        .await
        .map_err(|e| DaemonError::Credential(format!("read payload: {}", e)))?;
    serde_json::from_slice(&payload)
        .map_err(|e| DaemonError::Credential(format!("decode payload: {}", e)))
}

async fn write_frame<T: Serialize, S: AsyncWrite + Unpin>(
    stream: &mut S,
    message: &T,
) -> Result<(), DaemonError> {
    let payload = serde_json::to_vec(message)
        .map_err(|e| DaemonError::Credential(format!("encode payload: {}", e)))?;
    let len = payload.len() as u32;
    stream
        .write_all(&len.to_be_bytes())
        .await
        .map_err(|e| DaemonError::Credential(format!("write length: {}", e)))?;
    stream
        .write_all(&payload)
        .await
        .map_err(|e| DaemonError::Credential(format!("write payload: {}", e)))?;
    stream.flush().await.map_err(|e| DaemonError::Credential(format!("flush: {}", e)))
}

#[cfg(test)]
#[path = "credentials_tests.rs"]
mod tests;
