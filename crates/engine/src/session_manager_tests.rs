use super::*;
use pal_core::{FakeClock, SessionConfig, SessionType};
use pal_storage::Store;

fn open_store() -> (tempfile::TempDir, Store) {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(dir.path()).unwrap();
    (dir, store)
}

#[test]
fn start_hierarchical_root_has_self_path() {
    let (_dir, mut store) = open_store();
    let clock = FakeClock::new();
    let opts = SessionConfig::builder("b1").session_type(SessionType::Build).build();
    let session = SessionManager::start_hierarchical(&mut store, &clock, opts).unwrap();
    assert_eq!(session.depth, 0);
    assert_eq!(session.root_id, "b1");
    assert_eq!(session.path, "b1");
}

#[test]
fn start_hierarchical_inherits_from_parent() {
    let (_dir, mut store) = open_store();
    let clock = FakeClock::new();
    let root_opts = SessionConfig::builder("b1").session_type(SessionType::Build).build();
    SessionManager::start_hierarchical(&mut store, &clock, root_opts).unwrap();

    let child_opts = SessionConfig::builder("op1")
        .session_type(SessionType::Operator)
        .parent_id("b1")
        .build();
    let child = SessionManager::start_hierarchical(&mut store, &clock, child_opts).unwrap();
    assert_eq!(child.depth, 1);
    assert_eq!(child.root_id, "b1");
    assert_eq!(child.path, "b1/op1");

    let grandchild_opts = SessionConfig::builder("w1")
        .session_type(SessionType::Worker)
        .parent_id("op1")
        .build();
    let grandchild = SessionManager::start_hierarchical(&mut store, &clock, grandchild_opts).unwrap();
    assert_eq!(grandchild.depth, 2);
    assert_eq!(grandchild.path, "b1/op1/w1");
}

#[test]
fn start_hierarchical_rejects_missing_parent() {
    let (_dir, mut store) = open_store();
    let clock = FakeClock::new();
    let opts = SessionConfig::builder("w1").parent_id("missing").build();
    let err = SessionManager::start_hierarchical(&mut store, &clock, opts).unwrap_err();
    assert!(matches!(err, pal_core::CoreError::NotFound { .. }));
}

#[test]
fn start_hierarchical_rejects_terminated_parent() {
    let (_dir, mut store) = open_store();
    let clock = FakeClock::new();
    let root_opts = SessionConfig::builder("b1").build();
    SessionManager::start_hierarchical(&mut store, &clock, root_opts).unwrap();
    SessionManager::end_with_summary(&mut store, &clock, "b1", pal_core::SessionStatus::Complete, None).unwrap();

    let child_opts = SessionConfig::builder("w1").parent_id("b1").build();
    let err = SessionManager::start_hierarchical(&mut store, &clock, child_opts).unwrap_err();
    assert!(matches!(err, pal_core::CoreError::ParentTerminated { .. }));
}

#[test]
fn end_with_summary_scenario_5_blocks_child_after_parent_ends() {
    let (_dir, mut store) = open_store();
    let clock = FakeClock::new();
    SessionManager::start_hierarchical(&mut store, &clock, SessionConfig::builder("b1").build()).unwrap();
    SessionManager::start_hierarchical(&mut store, &clock, SessionConfig::builder("op1").parent_id("b1").build())
        .unwrap();
    SessionManager::start_hierarchical(&mut store, &clock, SessionConfig::builder("w1").parent_id("op1").build())
        .unwrap();

    let tree = SessionManager::get_hierarchy(&store, "b1", false).unwrap();
    assert_eq!(tree.session.path, "b1");
    assert_eq!(tree.children[0].session.path, "b1/op1");
    assert_eq!(tree.children[0].children[0].session.path, "b1/op1/w1");

    SessionManager::end_with_summary(&mut store, &clock, "op1", pal_core::SessionStatus::Failed, None).unwrap();

    // w1 still exists (not cascaded)
    let w1 = store.query(|s| s.get_session("w1").cloned()).unwrap();
    assert_eq!(w1.status, pal_core::SessionStatus::Pending);
}

#[test]
fn ending_abnormally_blocks_owned_running_ports() {
    let (_dir, mut store) = open_store();
    let clock = FakeClock::new();
    SessionManager::start_hierarchical(&mut store, &clock, SessionConfig::builder("s1").build()).unwrap();
    let port = pal_core::Port::new("p1", "port one", pal_core::PortType::Atomic, 0);
    store.commit(pal_storage::StoreEvent::PortCreated { port: Box::new(port) }).unwrap();
    store
        .commit(pal_storage::StoreEvent::PortStarted { port_id: "p1".into(), session_id: "s1".into(), at_ms: 0 })
        .unwrap();

    SessionManager::end_with_summary(&mut store, &clock, "s1", pal_core::SessionStatus::Failed, None).unwrap();

    let port = store.query(|s| s.get_port("p1").cloned()).unwrap();
    assert_eq!(port.status, pal_core::PortStatus::Blocked);
}

#[test]
fn find_by_claude_session_id_returns_most_recent() {
    let (_dir, mut store) = open_store();
    let clock = FakeClock::new();
    let opts = SessionConfig::builder("s1").claude_session_id("host-abc").build();
    SessionManager::start_hierarchical(&mut store, &clock, opts).unwrap();

    let found = SessionManager::find_by_claude_session_id(&store, "host-abc").unwrap();
    assert_eq!(found.id, "s1");
    assert!(SessionManager::find_by_claude_session_id(&store, "host-xyz").is_none());
}

#[test]
fn update_usage_is_monotone() {
    let (_dir, mut store) = open_store();
    let clock = FakeClock::new();
    SessionManager::start_hierarchical(&mut store, &clock, SessionConfig::builder("s1").build()).unwrap();
    SessionManager::update_usage(&mut store, "s1", 100, 50, 0, 0, 0.1).unwrap();
    SessionManager::update_usage(&mut store, "s1", 60, 200, 0, 0, 0.05).unwrap();
    let session = store.query(|s| s.get_session("s1").cloned()).unwrap();
    assert_eq!(session.usage.input_tokens, 100);
    assert_eq!(session.usage.output_tokens, 200);
    assert_eq!(session.usage.cost_usd, 0.1);
}
