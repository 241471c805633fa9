// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

#[test]
#[serial]
fn state_dir_prefers_explicit_override() {
    std::env::set_var("BERTH_STATE_DIR", "/tmp/berth-test-state");
    let dir = state_dir().unwrap();
    std::env::remove_var("BERTH_STATE_DIR");
    assert_eq!(dir, PathBuf::from("/tmp/berth-test-state"));
}

#[test]
#[serial]
fn state_dir_falls_back_to_xdg() {
    std::env::remove_var("BERTH_STATE_DIR");
    std::env::set_var("XDG_STATE_HOME", "/tmp/xdg-state");
    let dir = state_dir().unwrap();
    std::env::remove_var("XDG_STATE_HOME");
    assert_eq!(dir, PathBuf::from("/tmp/xdg-state/berth"));
}

#[test]
#[serial]
fn poll_interval_default_and_override() {
    std::env::remove_var("BERTH_POLL_INTERVAL_MS");
    assert_eq!(poll_interval(), Duration::from_secs(10));
    std::env::set_var("BERTH_POLL_INTERVAL_MS", "250");
    assert_eq!(poll_interval(), Duration::from_millis(250));
    std::env::remove_var("BERTH_POLL_INTERVAL_MS");
}

#[test]
fn derived_paths() {
    let state = Path::new("/state");
    assert_eq!(registrations_path(state), PathBuf::from("/state/registrations.toml"));
    assert_eq!(containers_path(state), PathBuf::from("/state/containers.json"));
    assert_eq!(
        credential_socket_path(state, "reg-1"),
        PathBuf::from("/state/cred-reg-1.sock")
    );
    assert_eq!(clones_dir(state), PathBuf::from("/state/clones"));
}
