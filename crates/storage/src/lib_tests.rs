// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use pal_core::test_support::root_session;
use tempfile::tempdir;

#[test]
fn open_on_fresh_directory_starts_empty() {
    let dir = tempdir().unwrap();
    let store = Store::open(dir.path()).unwrap();
    assert_eq!(store.version(), 0);
    store.query(|state| assert!(state.sessions.is_empty()));
}

#[test]
fn commit_then_query_sees_the_mutation() {
    let dir = tempdir().unwrap();
    let mut store = Store::open(dir.path()).unwrap();
    let seq = store
        .commit(StoreEvent::SessionCreated {
            session: Box::new(root_session("s1")),
        })
        .unwrap();
    assert_eq!(seq, 1);
    store.query(|state| assert!(state.sessions.contains_key("s1")));
}

#[test]
fn reopen_without_checkpoint_replays_wal() {
    let dir = tempdir().unwrap();
    {
        let mut store = Store::open(dir.path()).unwrap();
        store
            .commit(StoreEvent::SessionCreated {
                session: Box::new(root_session("s1")),
            })
            .unwrap();
        store.close().unwrap();
    }

    let reopened = Store::open(dir.path()).unwrap();
    assert_eq!(reopened.version(), 1);
    reopened.query(|state| assert!(state.sessions.contains_key("s1")));
}

#[test]
fn checkpoint_then_reopen_reads_from_snapshot() {
    let dir = tempdir().unwrap();
    {
        let mut store = Store::open(dir.path()).unwrap();
        store
            .commit(StoreEvent::SessionCreated {
                session: Box::new(root_session("s1")),
            })
            .unwrap();
        store.checkpoint().unwrap();
    }

    assert!(dir.path().join("snapshot.zst").exists());
    let reopened = Store::open(dir.path()).unwrap();
    assert_eq!(reopened.version(), 1);
    reopened.query(|state| assert!(state.sessions.contains_key("s1")));
}
