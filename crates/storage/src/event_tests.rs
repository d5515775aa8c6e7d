// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use pal_core::test_support::{atomic_port, root_session};

#[test]
fn session_created_round_trips_through_json() {
    let session = root_session("s1");
    let event = StoreEvent::SessionCreated {
        session: Box::new(session),
    };
    let json = serde_json::to_string(&event).unwrap();
    let back: StoreEvent = serde_json::from_str(&json).unwrap();
    match back {
        StoreEvent::SessionCreated { session } => assert_eq!(session.id, "s1"),
        other => panic!("expected SessionCreated, got {other:?}"),
    }
}

#[test]
fn port_created_tag_is_type_field() {
    let event = StoreEvent::PortCreated {
        port: Box::new(atomic_port("p1")),
    };
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["type"], "PortCreated");
}

#[test]
fn shutdown_has_no_fields() {
    let json = serde_json::to_value(StoreEvent::Shutdown).unwrap();
    assert_eq!(json, serde_json::json!({"type": "Shutdown"}));
}
