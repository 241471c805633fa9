// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::SpawnId;

#[test]
fn new_ids_carry_prefix() {
    let id = SpawnId::new();
    assert!(id.as_str().starts_with("spn-"));
    assert_eq!(id.as_str().len(), 23);
}

#[test]
fn new_ids_are_unique() {
    let a = SpawnId::new();
    let b = SpawnId::new();
    assert_ne!(a, b);
}

#[test]
fn suffix_strips_prefix() {
    let id = SpawnId::from_string("spn-abc123");
    assert_eq!(id.suffix(), "abc123");
}

#[test]
fn suffix_tolerates_missing_prefix() {
    let id = SpawnId::from_string("raw-id");
    assert_eq!(id.suffix(), "raw-id");
}

#[test]
fn short_truncates() {
    assert_eq!(crate::short("abcdefgh", 4), "abcd");
    assert_eq!(crate::short("ab", 4), "ab");
}

#[test]
fn serde_round_trip_is_transparent() {
    let id = SpawnId::from_string("spn-xyz");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, r#""spn-xyz""#);
    let back: SpawnId = serde_json::from_str(&json).unwrap();
    assert_eq!(back, id);
}
