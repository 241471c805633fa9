// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::path::Path;

fn entry(name: &str) -> NamedContainerEntry {
    NamedContainerEntry::new(name, format!("{}-cid", name), "/work/clone", "acme/api", 100)
}

fn table(dir: &Path) -> NamedContainerTable {
    NamedContainerTable::load(dir.join("containers.json")).unwrap()
}

#[test]
fn missing_file_is_empty_table() {
    let dir = tempfile::tempdir().unwrap();
    let table = table(dir.path());
    assert!(table.entries().is_empty());
    assert_eq!(table.acquire("build-box", 0).unwrap(), AcquireOutcome::Unknown);
}

#[test]
fn insert_held_then_release_then_acquire() {
    let dir = tempfile::tempdir().unwrap();
    let table = table(dir.path());

    table.insert_held(entry("build-box")).unwrap();
    assert!(table.get("build-box").unwrap().in_use);

    // Held: a second job may not take it
    assert_eq!(table.acquire("build-box", 200).unwrap(), AcquireOutcome::Busy);

    assert!(table.release("build-box", 300).unwrap());
    let released = table.get("build-box").unwrap();
    assert!(!released.in_use);
    assert_eq!(released.last_used_at_ms, 300);

    match table.acquire("build-box", 400).unwrap() {
        AcquireOutcome::Acquired(e) => assert!(e.in_use),
        other => panic!("expected acquire, got {:?}", other),
    }
}

#[test]
fn release_unknown_is_false() {
    let dir = tempfile::tempdir().unwrap();
    let table = table(dir.path());
    assert!(!table.release("ghost", 0).unwrap());
}

#[test]
fn mutations_persist_across_reload() {
    let dir = tempfile::tempdir().unwrap();
    {
        let table = table(dir.path());
        table.insert_held(entry("build-box")).unwrap();
        table.insert_held(entry("test-box")).unwrap();
        table.release("test-box", 500).unwrap();
    }

    let reloaded = table(dir.path());
    let entries = reloaded.entries();
    assert_eq!(entries.len(), 2);
    // The in-use ledger survived the restart
    assert!(reloaded.get("build-box").unwrap().in_use);
    assert!(!reloaded.get("test-box").unwrap().in_use);
}

#[test]
fn remove_deletes_entry_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    let table = table(dir.path());
    table.insert_held(entry("build-box")).unwrap();
    let removed = table.remove("build-box").unwrap();
    assert_eq!(removed.unwrap().name, "build-box");
    assert!(table.get("build-box").is_none());

    let reloaded = NamedContainerTable::load(dir.path().join("containers.json")).unwrap();
    assert!(reloaded.get("build-box").is_none());
}

#[test]
fn corrupt_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("containers.json");
    std::fs::write(&path, "{not json").unwrap();
    let err = NamedContainerTable::load(&path).unwrap_err();
    assert!(matches!(err, DaemonError::CorruptState { .. }));
}

#[test]
fn entries_are_sorted_by_name() {
    let dir = tempfile::tempdir().unwrap();
    let table = table(dir.path());
    table.insert_held(entry("zeta")).unwrap();
    table.insert_held(entry("alpha")).unwrap();
    let names: Vec<_> = table.entries().into_iter().map(|e| e.name).collect();
    assert_eq!(names, vec!["alpha".to_string(), "zeta".to_string()]);
}
