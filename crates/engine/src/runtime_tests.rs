// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use pal_core::FakeClock;

fn new_runtime() -> (tempfile::TempDir, Runtime<FakeClock>) {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(dir.path()).unwrap();
    (dir, Runtime::new(Arc::new(Mutex::new(store)), FakeClock::new()))
}

#[tokio::test]
async fn emit_publishes_to_subscribers_without_touching_the_store() {
    let (_dir, runtime) = new_runtime();
    let mut rx = runtime.subscribe();

    let event = Event::new(EventKind::SessionStart, 0, serde_json::json!({}));
    runtime.execute(Effect::Emit { event: event.clone() }).await.unwrap();

    let received = rx.try_recv().unwrap();
    assert_eq!(received.kind, EventKind::SessionStart);
}

#[tokio::test]
async fn acquire_lock_then_release_round_trips() {
    let (_dir, runtime) = new_runtime();

    runtime
        .execute(Effect::AcquireLock { resource: "res-1".to_string(), session_id: "ses-1".to_string() })
        .await
        .unwrap();

    let held = runtime.store().lock().query(|s| s.locks.contains_key("res-1"));
    assert!(held);

    runtime.execute(Effect::ReleaseLock { resource: "res-1".to_string() }).await.unwrap();
    let held = runtime.store().lock().query(|s| s.locks.contains_key("res-1"));
    assert!(!held);
}

#[tokio::test]
async fn acquire_lock_is_idempotent_for_the_same_owner() {
    let (_dir, runtime) = new_runtime();
    for _ in 0..2 {
        runtime
            .execute(Effect::AcquireLock { resource: "res-1".to_string(), session_id: "ses-1".to_string() })
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn acquire_lock_rejects_a_conflicting_owner() {
    let (_dir, runtime) = new_runtime();
    runtime
        .execute(Effect::AcquireLock { resource: "res-1".to_string(), session_id: "ses-1".to_string() })
        .await
        .unwrap();

    let err = runtime
        .execute(Effect::AcquireLock { resource: "res-1".to_string(), session_id: "ses-2".to_string() })
        .await
        .unwrap_err();
    assert!(matches!(err, RuntimeError::Store(CoreError::AlreadyLocked { .. })));
}

#[tokio::test]
async fn deliver_direct_message_and_report_escalation_publish_events() {
    let (_dir, runtime) = new_runtime();
    let mut rx = runtime.subscribe();

    runtime
        .execute(Effect::DeliverDirectMessage {
            channel_id: "chan-1".to_string(),
            message_id: "msg-1".to_string(),
            to_session: "ses-2".to_string(),
        })
        .await
        .unwrap();
    let event = rx.try_recv().unwrap();
    assert_eq!(event.kind, EventKind::DirectMessage);

    runtime
        .execute(Effect::ReportEscalation { escalation_id: "esc-1".to_string(), ancestor_session: "ses-1".to_string() })
        .await
        .unwrap();
    let event = rx.try_recv().unwrap();
    assert_eq!(event.kind, EventKind::EscalationCreated);
}

#[tokio::test]
async fn persist_summary_writes_the_file() {
    let (dir, runtime) = new_runtime();
    let path = dir.path().join("summary.md").to_str().unwrap().to_string();

    runtime
        .execute(Effect::PersistSummary { session_id: "ses-1".to_string(), path: path.clone(), contents: "done".to_string() })
        .await
        .unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "done");
}

#[tokio::test]
async fn execute_all_stops_at_the_first_error() {
    let (_dir, runtime) = new_runtime();
    let effects = vec![
        Effect::AcquireLock { resource: "res-1".to_string(), session_id: "ses-1".to_string() },
        Effect::AcquireLock { resource: "res-1".to_string(), session_id: "ses-2".to_string() },
        Effect::ReleaseLock { resource: "res-1".to_string() },
    ];

    let err = runtime.execute_all(effects).await.unwrap_err();
    assert!(matches!(err, RuntimeError::Store(CoreError::AlreadyLocked { .. })));

    // The third effect never ran: the lock acquired by the first is still held.
    let held = runtime.store().lock().query(|s| s.locks.contains_key("res-1"));
    assert!(held);
}
