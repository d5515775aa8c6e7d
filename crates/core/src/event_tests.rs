// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn wire_str_round_trips() {
    for kind in [
        EventKind::SessionStart,
        EventKind::PortEnd,
        EventKind::AttentionCritical,
        EventKind::ChecklistFailed,
        EventKind::DirectMessage,
    ] {
        let s = kind.as_wire_str();
        assert_eq!(EventKind::from_wire_str(s), Some(kind));
    }
}

#[test]
fn parse_filter_list_ignores_unknown_tokens() {
    let filter = EventKind::parse_filter_list("session:start, bogus:event ,port:end");
    assert_eq!(filter, vec![EventKind::SessionStart, EventKind::PortEnd]);
}

#[test]
fn empty_filter_matches_everything() {
    let event = Event::new(EventKind::PortStart, 0, serde_json::Value::Null).with_session("s1");
    assert!(event.matches(&[], None));
    assert!(event.matches(&[], Some("s1")));
    assert!(!event.matches(&[], Some("other")));
}

#[test]
fn nonempty_filter_requires_membership() {
    let event = Event::new(EventKind::BuildFailed, 0, serde_json::Value::Null);
    assert!(event.matches(&[EventKind::BuildFailed, EventKind::TestFailed], None));
    assert!(!event.matches(&[EventKind::TestFailed], None));
}

#[test]
fn sse_frame_is_data_prefixed_and_double_newline_terminated() {
    let event = Event::new(EventKind::SessionStart, 1000, serde_json::json!({"ok": true}));
    let frame = event.to_sse_frame();
    assert!(frame.starts_with("data: "));
    assert!(frame.ends_with("\n\n"));
}
