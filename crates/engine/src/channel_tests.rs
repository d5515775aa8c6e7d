use super::*;
use pal_core::FakeClock;
use pal_storage::Store;

fn open_store() -> (tempfile::TempDir, Store) {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(dir.path()).unwrap();
    (dir, store)
}

#[test]
fn open_then_send_and_receive_roundtrip() {
    let (_dir, mut store) = open_store();
    let clock = FakeClock::new();
    let channel = DirectChannelManager::open(&mut store, &clock, "s1", "s2", None, None).unwrap();

    DirectChannelManager::send(&mut store, &clock, channel.id, "s1", MessageType::Query, serde_json::json!({"q": 1}))
        .unwrap();

    let received = DirectChannelManager::receive_all_pending(&mut store, &clock, "s2").unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].from_session, "s1");
    assert!(received[0].delivered_at_ms.is_some());

    // A second drain finds nothing left pending.
    let again = DirectChannelManager::receive_all_pending(&mut store, &clock, "s2").unwrap();
    assert!(again.is_empty());
}

#[test]
fn opening_a_second_channel_for_the_same_port_is_a_conflict() {
    let (_dir, mut store) = open_store();
    let clock = FakeClock::new();
    DirectChannelManager::open(&mut store, &clock, "s1", "s2", Some("p1".to_string()), None).unwrap();
    let err = DirectChannelManager::open(&mut store, &clock, "s3", "s4", Some("p1".to_string()), None).unwrap_err();
    assert!(matches!(err, CoreError::Conflict { .. }));
}

#[test]
fn opening_a_second_channel_for_the_same_pair_in_an_orchestration_is_a_conflict() {
    let (_dir, mut store) = open_store();
    let clock = FakeClock::new();
    DirectChannelManager::open(&mut store, &clock, "s1", "s2", None, Some("orch1".to_string())).unwrap();
    let err = DirectChannelManager::open(&mut store, &clock, "s2", "s1", None, Some("orch1".to_string())).unwrap_err();
    assert!(matches!(err, CoreError::Conflict { .. }));
}

#[test]
fn closing_a_channel_allows_reopening_the_same_port_slot() {
    let (_dir, mut store) = open_store();
    let clock = FakeClock::new();
    let channel = DirectChannelManager::open(&mut store, &clock, "s1", "s2", Some("p1".to_string()), None).unwrap();
    DirectChannelManager::close(&mut store, &clock, channel.id).unwrap();
    let reopened = DirectChannelManager::open(&mut store, &clock, "s1", "s2", Some("p1".to_string()), None);
    assert!(reopened.is_ok());
}

#[test]
fn sending_from_a_non_participant_is_rejected() {
    let (_dir, mut store) = open_store();
    let clock = FakeClock::new();
    let channel = DirectChannelManager::open(&mut store, &clock, "s1", "s2", None, None).unwrap();
    let err =
        DirectChannelManager::send(&mut store, &clock, channel.id, "s3", MessageType::Query, serde_json::Value::Null)
            .unwrap_err();
    assert!(matches!(err, CoreError::Conflict { .. }));
}

#[test]
fn mark_processed_requires_prior_delivery() {
    let (_dir, mut store) = open_store();
    let clock = FakeClock::new();
    let channel = DirectChannelManager::open(&mut store, &clock, "s1", "s2", None, None).unwrap();
    let message =
        DirectChannelManager::send(&mut store, &clock, channel.id, "s1", MessageType::Result, serde_json::Value::Null)
            .unwrap();
    DirectChannelManager::mark_processed(&mut store, &clock, message.id).unwrap();
    let row = store.query(|s| s.direct_messages.get(&message.id).cloned()).unwrap();
    // Never delivered, so the processed mark must not have taken effect.
    assert!(row.processed_at_ms.is_none());

    DirectChannelManager::receive_all_pending(&mut store, &clock, "s2").unwrap();
    DirectChannelManager::mark_processed(&mut store, &clock, message.id).unwrap();
    let row = store.query(|s| s.direct_messages.get(&message.id).cloned()).unwrap();
    assert!(row.processed_at_ms.is_some());
}
