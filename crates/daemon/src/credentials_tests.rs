// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

#[test]
fn debug_never_prints_token() {
    let cred = GitCredential::OAuth("tok-very-secret".to_string());
    let rendered = format!("{:?}", cred);
    assert!(!rendered.contains("tok-very-secret"));
    assert!(rendered.contains("<redacted>"));
}

#[test]
#[serial]
fn resolve_prefers_berth_env() {
    std::env::set_var("BERTH_GIT_TOKEN", "tok-env");
    std::env::set_var("GITHUB_TOKEN", "tok-gh");
    let dir = tempfile::tempdir().unwrap();
    let cred = resolve(dir.path()).unwrap();
    std::env::remove_var("BERTH_GIT_TOKEN");
    std::env::remove_var("GITHUB_TOKEN");
    assert_eq!(cred.token(), "tok-env");
    assert_eq!(cred.kind(), "pat");
}

#[test]
#[serial]
fn resolve_reads_credentials_file() {
    std::env::remove_var("BERTH_GIT_TOKEN");
    std::env::remove_var("GITHUB_TOKEN");
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        crate::env::credentials_path(dir.path()),
        r#"{"oauth": {"accessToken": "tok-oauth"}}"#,
    )
    .unwrap();
    let cred = resolve(dir.path()).unwrap();
    assert_eq!(cred.token(), "tok-oauth");
    assert_eq!(cred.kind(), "oauth");
}

#[test]
#[serial]
fn resolve_empty_values_are_skipped() {
    std::env::set_var("BERTH_GIT_TOKEN", "");
    std::env::remove_var("GITHUB_TOKEN");
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(crate::env::credentials_path(dir.path()), r#"{"pat": ""}"#).unwrap();
    assert!(resolve(dir.path()).is_none());
    std::env::remove_var("BERTH_GIT_TOKEN");
}

#[tokio::test]
async fn server_answers_get_with_token() {
    let dir = tempfile::tempdir().unwrap();
    let socket = dir.path().join("cred.sock");
    let cancel = CancellationToken::new();
    let server =
        CredentialServer::new(&socket, GitCredential::Pat("tok-forwarded".to_string()));
    let handle = server.start(cancel.clone()).unwrap();

    let response = request_token(&socket).await.unwrap();
    match response {
        CredentialResponse::Token { kind, token } => {
            assert_eq!(kind, "pat");
            assert_eq!(token, "tok-forwarded");
        }
        CredentialResponse::Denied { reason } => panic!("denied: {}", reason),
    }

    cancel.cancel();
    handle.await.unwrap();
    // Socket removed on deterministic shutdown
    assert!(!socket.exists());
}

#[tokio::test]
async fn server_replaces_stale_socket() {
    let dir = tempfile::tempdir().unwrap();
    let socket = dir.path().join("cred.sock");
    std::fs::write(&socket, "stale").unwrap();

    let cancel = CancellationToken::new();
    let server = CredentialServer::new(&socket, GitCredential::Pat("tok".to_string()));
    let handle = server.start(cancel.clone()).unwrap();

    let response = request_token(&socket).await.unwrap();
    assert!(matches!(response, CredentialResponse::Token { .. }));
    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn server_handles_sequential_requests() {
    let dir = tempfile::tempdir().unwrap();
    let socket = dir.path().join("cred.sock");
    let cancel = CancellationToken::new();
    let server = CredentialServer::new(&socket, GitCredential::OAuth("tok".to_string()));
    let handle = server.start(cancel.clone()).unwrap();

    for _ in 0..3 {
        let response = request_token(&socket).await.unwrap();
        assert!(matches!(response, CredentialResponse::Token { .. }));
    }

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn oversized_frame_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let socket = dir.path().join("cred.sock");
    let cancel = CancellationToken::new();
    let server = CredentialServer::new(&socket, GitCredential::Pat("tok".to_string()));
    let _handle = server.start(cancel.clone()).unwrap();

    use tokio::io::AsyncWriteExt;
    let mut stream = UnixStream::connect(&socket).await.unwrap();
    // Length prefix far above the cap; server must drop the connection
    stream.write_all(&u32::MAX.to_be_bytes()).await.unwrap();
    stream.flush().await.unwrap();

    let mut buf = [0u8; 4];
    use tokio::io::AsyncReadExt;
    let read = stream.read(&mut buf).await.unwrap_or(0);
    assert_eq!(read, 0, "connection should be closed without a response");
    cancel.cancel();
}
