// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::migration::MigrationRegistry;
use pal_core::test_support::root_session;
use tempfile::tempdir;

fn write_snapshot(path: &Path, state: MaterializedState) {
    Snapshot::new(1, state, Utc::now()).write(path).unwrap();
}

#[test]
fn create_then_info_round_trips_manifest() {
    let dir = tempdir().unwrap();
    let snapshot_path = dir.path().join("snapshot.zst");
    let mut state = MaterializedState::default();
    state.sessions.insert("s1".to_string(), root_session("s1"));
    write_snapshot(&snapshot_path, state);

    let backups_dir = dir.path().join("backups");
    let archive = create(&snapshot_path, &backups_dir, "demo-project").unwrap();
    assert!(archive.exists());

    let manifest = info(&archive).unwrap();
    assert_eq!(manifest.project, "demo-project");
    assert_eq!(manifest.stats.sessions, 1);
}

#[test]
fn list_returns_archives_newest_first() {
    let dir = tempdir().unwrap();
    let snapshot_path = dir.path().join("snapshot.zst");
    write_snapshot(&snapshot_path, MaterializedState::default());
    let backups_dir = dir.path().join("backups");

    let first = create(&snapshot_path, &backups_dir, "p").unwrap();
    let found = list(&backups_dir).unwrap();
    assert_eq!(found, vec![first]);
}

#[test]
fn restore_replace_overwrites_destination() {
    let dir = tempdir().unwrap();
    let src_snapshot = dir.path().join("src.zst");
    let mut state = MaterializedState::default();
    state.sessions.insert("s1".to_string(), root_session("s1"));
    write_snapshot(&src_snapshot, state);

    let backups_dir = dir.path().join("backups");
    let archive = create(&src_snapshot, &backups_dir, "p").unwrap();

    let dest_snapshot = dir.path().join("dest.zst");
    write_snapshot(&dest_snapshot, MaterializedState::default());

    let report = restore(&archive, &dest_snapshot, RestoreMode::Replace, false).unwrap();
    assert!(!report.dry_run);

    let registry = MigrationRegistry::new();
    let restored = Snapshot::read(&dest_snapshot, &registry).unwrap().unwrap();
    assert!(restored.state.sessions.contains_key("s1"));
}

#[test]
fn restore_merge_keeps_existing_rows() {
    let dir = tempdir().unwrap();
    let src_snapshot = dir.path().join("src.zst");
    let mut incoming_state = MaterializedState::default();
    incoming_state.sessions.insert("s1".to_string(), root_session("s1"));
    incoming_state.sessions.insert("s2".to_string(), root_session("s2"));
    write_snapshot(&src_snapshot, incoming_state);

    let backups_dir = dir.path().join("backups");
    let archive = create(&src_snapshot, &backups_dir, "p").unwrap();

    let dest_snapshot = dir.path().join("dest.zst");
    let mut existing_state = MaterializedState::default();
    existing_state.sessions.insert("s1".to_string(), root_session("s1"));
    write_snapshot(&dest_snapshot, existing_state);

    let report = restore(&archive, &dest_snapshot, RestoreMode::Merge, false).unwrap();
    assert_eq!(report.merged.unwrap().sessions, 1);

    let registry = MigrationRegistry::new();
    let merged = Snapshot::read(&dest_snapshot, &registry).unwrap().unwrap();
    assert_eq!(merged.state.sessions.len(), 2);
}

#[test]
fn restore_dry_run_does_not_write() {
    let dir = tempdir().unwrap();
    let src_snapshot = dir.path().join("src.zst");
    let mut state = MaterializedState::default();
    state.sessions.insert("s1".to_string(), root_session("s1"));
    write_snapshot(&src_snapshot, state);

    let backups_dir = dir.path().join("backups");
    let archive = create(&src_snapshot, &backups_dir, "p").unwrap();

    let dest_snapshot = dir.path().join("dest.zst");
    let report = restore(&archive, &dest_snapshot, RestoreMode::Replace, true).unwrap();
    assert!(report.dry_run);
    assert!(!dest_snapshot.exists());
}
