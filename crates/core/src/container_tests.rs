// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn new_entry_is_not_in_use() {
    let entry = NamedContainerEntry::new("build-box", "abc123", "/work/clone", "acme/api", 100);
    assert!(!entry.in_use);
    assert_eq!(entry.created_at_ms, 100);
    assert_eq!(entry.last_used_at_ms, 100);
}

#[test]
fn acquire_release_toggles_in_use() {
    let mut entry = NamedContainerEntry::new("build-box", "abc123", "/work/clone", "acme/api", 100);
    entry.acquire(200);
    assert!(entry.in_use);
    assert_eq!(entry.last_used_at_ms, 200);
    entry.release(300);
    assert!(!entry.in_use);
    assert_eq!(entry.last_used_at_ms, 300);
}

#[test]
fn in_use_defaults_false_on_deserialize() {
    let entry: NamedContainerEntry = serde_json::from_str(
        r#"{
            "name": "build-box",
            "container_id": "abc",
            "clone_path": "/work",
            "repository": "acme/api",
            "created_at_ms": 1,
            "last_used_at_ms": 1
        }"#,
    )
    .unwrap();
    assert!(!entry.in_use);
}
