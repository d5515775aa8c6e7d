// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use pal_core::test_support::{atomic_port, child_session, root_session};
use pal_core::Lock;

#[test]
fn empty_state_reports_ok() {
    let state = MaterializedState::default();
    let report = check(&state);
    assert!(!report.has_errors());
    assert_eq!(report.findings.len(), 1);
    assert_eq!(report.findings[0].level, FindingLevel::Ok);
}

#[test]
fn dangling_parent_id_is_an_error() {
    let mut state = MaterializedState::default();
    let root = root_session("root");
    let mut child = child_session("child", &root);
    child.parent_id = Some("missing-parent".to_string());
    state.sessions.insert(child.id.clone(), child);

    let report = check(&state);
    assert!(report.has_errors());
    assert!(report.findings.iter().any(|f| f.message.contains("missing parent")));
}

#[test]
fn dangling_active_port_is_an_error() {
    let mut state = MaterializedState::default();
    let mut session = root_session("s1");
    session.active_port = Some("no-such-port".to_string());
    state.sessions.insert(session.id.clone(), session);

    let report = check(&state);
    assert!(report.has_errors());
    assert!(report.findings.iter().any(|f| f.message.contains("missing active_port")));
}

#[test]
fn hierarchy_invariant_violation_is_an_error() {
    let mut state = MaterializedState::default();
    let mut root = root_session("root");
    root.depth = 5;
    state.sessions.insert(root.id.clone(), root);

    let report = check(&state);
    assert!(report.has_errors());
    assert!(report.findings.iter().any(|f| f.message.contains("implies")));
}

#[test]
fn terminal_port_holding_lock_is_an_error() {
    let mut state = MaterializedState::default();
    let mut port = atomic_port("p1");
    port.status = pal_core::PortStatus::Complete;
    state.ports.insert(port.id.clone(), port);
    state.locks.insert(Lock::port_resource("p1"), Lock::new(Lock::port_resource("p1"), "s1", 0));

    let report = check(&state);
    assert!(report.has_errors());
    assert!(report.findings.iter().any(|f| f.message.contains("still holds lock")));
}

#[test]
fn dangling_dependency_edge_is_a_warning_not_an_error() {
    let mut state = MaterializedState::default();
    let port = atomic_port("p1");
    state.ports.insert(port.id.clone(), port);
    state.dependencies.insert(
        "p1".to_string(),
        vec![pal_core::PortDependency::new("p1", "missing-dep", pal_core::DependencyType::FinishToStart)],
    );

    let report = check(&state);
    assert!(!report.has_errors());
    assert!(report.findings.iter().any(|f| f.level == FindingLevel::Warning));
}
