// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn pending_to_running_is_allowed() {
    assert!(PortStatus::Pending.can_transition_to(PortStatus::Running));
}

#[test]
fn complete_to_running_is_rejected() {
    assert!(!PortStatus::Complete.can_transition_to(PortStatus::Running));
}

#[test]
fn blocked_can_retry_to_running() {
    assert!(PortStatus::Blocked.can_transition_to(PortStatus::Running));
}

#[test]
fn terminal_states_are_complete_and_failed() {
    assert!(PortStatus::Complete.is_terminal());
    assert!(PortStatus::Failed.is_terminal());
    assert!(!PortStatus::Blocked.is_terminal());
}

#[test]
fn lock_resource_is_prefixed() {
    let p = Port::new("user-entity", "User entity", PortType::Atomic, 0);
    assert_eq!(p.lock_resource(), "port:user-entity");
}

#[test]
fn complete_records_duration() {
    let mut p = Port::new("user-entity", "User entity", PortType::Atomic, 0);
    p.start("s1", 1_000);
    p.complete(5_000);
    assert_eq!(p.duration_s, Some(4));
    assert!(p.status.is_terminal());
}
