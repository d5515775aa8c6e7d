// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::hooks::HookDispatcher;
use pal_core::{Config, FakeClock, Port, PortType, SessionConfig};
use pal_storage::{Store, StoreEvent};

fn new_state() -> (tempfile::TempDir, AppState<FakeClock>) {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(dir.path()).unwrap();
    let clock = FakeClock::new();
    let runtime = Arc::new(Runtime::new(Arc::new(parking_lot::Mutex::new(store)), clock.clone()));
    let dispatcher = Arc::new(HookDispatcher::new(Arc::clone(&runtime), Config::default(), clock.clone()));
    (dir, AppState { runtime, dispatcher, clock })
}

#[tokio::test]
async fn list_sessions_returns_every_session() {
    let (_dir, state) = new_state();
    {
        let store = state.runtime.store();
        let mut store = store.lock();
        let config = SessionConfig::builder("ses-a").title("a").build();
        let session = pal_core::Session::new_root(config, 0);
        store.commit(StoreEvent::SessionCreated { session: Box::new(session) }).unwrap();
    }

    let Json(sessions) = list_sessions(State(state)).await;
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].id, "ses-a");
}

#[tokio::test]
async fn get_session_404s_on_unknown_id() {
    let (_dir, state) = new_state();
    let err = get_session(State(state), Path("missing".to_string())).await.unwrap_err();
    assert_eq!(Problem::from(&err.0).status, 404);
}

#[tokio::test]
async fn retry_port_transitions_a_blocked_port_back_to_pending() {
    let (_dir, state) = new_state();
    {
        let store = state.runtime.store();
        let mut store = store.lock();
        let port = Port::new("port-1", "demo", PortType::Atomic, 0);
        store.commit(StoreEvent::PortCreated { port: Box::new(port) }).unwrap();
        store.commit(StoreEvent::PortBlocked { port_id: "port-1".to_string() }).unwrap();
    }

    let status = retry_port(State(state.clone()), Path("port-1".to_string()), Json(PortRetryRequest::default()))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::NO_CONTENT);

    let port = state.runtime.store().lock().query(|s| s.get_port("port-1").cloned()).unwrap();
    assert_eq!(port.status, pal_core::PortStatus::Pending);
}

#[tokio::test]
async fn list_escalations_filters_by_status() {
    let (_dir, state) = new_state();
    {
        let store = state.runtime.store();
        let mut store = store.lock();
        let escalation = pal_core::Escalation::new("ses-a", pal_core::EscalationType::General, pal_core::Severity::Low, "needs a decision", 0);
        store.commit(StoreEvent::EscalationCreated { escalation: Box::new(escalation) }).unwrap();
    }

    let mut params = HashMap::new();
    params.insert("status".to_string(), "open".to_string());
    let Json(open) = list_escalations(State(state.clone()), Query(params)).await;
    assert_eq!(open.len(), 1);

    let mut params = HashMap::new();
    params.insert("status".to_string(), "resolved".to_string());
    let Json(resolved) = list_escalations(State(state), Query(params)).await;
    assert!(resolved.is_empty());
}
