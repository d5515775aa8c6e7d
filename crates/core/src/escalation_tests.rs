// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn default_severity_matches_trigger_table() {
    assert_eq!(EscalationType::TestFailure.default_severity(), Some(Severity::High));
    assert_eq!(EscalationType::TokenExhausted.default_severity(), Some(Severity::Medium));
    assert_eq!(EscalationType::Timeout.default_severity(), Some(Severity::High));
    assert_eq!(EscalationType::Dependency.default_severity(), Some(Severity::Critical));
    assert_eq!(EscalationType::Quality.default_severity(), None);
}

#[test]
fn new_escalation_is_open() {
    let esc = Escalation::new("s1", EscalationType::Dependency, Severity::Critical, "cycle detected", 10);
    assert_eq!(esc.status, EscalationStatus::Open);
    assert!(esc.resolved_at_ms.is_none());
}

#[test]
fn resolve_sets_fields() {
    let mut esc = Escalation::new("s1", EscalationType::General, Severity::Low, "issue", 10);
    esc.resolve("fixed", "resolver-1", 20);
    assert_eq!(esc.status, EscalationStatus::Resolved);
    assert_eq!(esc.resolution.as_deref(), Some("fixed"));
    assert_eq!(esc.resolved_at_ms, Some(20));
}

#[test]
fn severity_ordering_is_ascending() {
    assert!(Severity::Low < Severity::Medium);
    assert!(Severity::Medium < Severity::High);
    assert!(Severity::High < Severity::Critical);
}
