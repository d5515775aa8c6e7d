// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::event::{Event, EventKind};
use crate::port::{Port, PortType};
use crate::session::{Session, SessionConfig, SessionType};

// ── Proptest strategies ─────────────────────────────────────────────────

/// Proptest strategies for core state machine types, used by `pal-engine`'s
/// DAG-acyclicity and hierarchy-invariant property tests.
pub mod strategies {
    use crate::port::PortStatus;
    use crate::session::SessionStatus;
    use proptest::prelude::*;

    pub fn arb_session_status() -> impl Strategy<Value = SessionStatus> {
        prop_oneof![
            Just(SessionStatus::Pending),
            Just(SessionStatus::Running),
            Just(SessionStatus::Complete),
            Just(SessionStatus::Failed),
            Just(SessionStatus::Blocked),
        ]
    }

    pub fn arb_port_status() -> impl Strategy<Value = PortStatus> {
        prop_oneof![
            Just(PortStatus::Pending),
            Just(PortStatus::Running),
            Just(PortStatus::Complete),
            Just(PortStatus::Blocked),
            Just(PortStatus::Failed),
        ]
    }

    /// A pipeline shape as a count of ports and an edge list by index,
    /// suitable for building acyclic-DAG property tests (edges always
    /// point from a higher index to a lower one, guaranteeing acyclicity
    /// unless a test wants to construct the cyclic negative case by hand).
    pub fn arb_acyclic_edges(port_count: usize) -> impl Strategy<Value = Vec<(usize, usize)>> {
        if port_count < 2 {
            return Just(Vec::new()).boxed();
        }
        prop::collection::vec((1..port_count, 0..port_count - 1), 0..port_count * 2)
            .prop_map(|pairs| pairs.into_iter().filter(|(from, to)| from > to).collect())
            .boxed()
    }
}

// ── Entity factory functions ────────────────────────────────────────────

pub fn root_session(id: &str) -> Session {
    let config = SessionConfig::builder(id)
        .title(format!("session {id}"))
        .session_type(SessionType::Build)
        .project_root("/tmp/project")
        .project_name("project")
        .cwd("/tmp/project")
        .build();
    Session::new_root(config, 1_000_000)
}

pub fn child_session(id: &str, parent: &Session) -> Session {
    let config = SessionConfig::builder(id)
        .title(format!("session {id}"))
        .session_type(SessionType::Worker)
        .parent_id(parent.id.clone())
        .project_root(parent.project_root.clone())
        .project_name(parent.project_name.clone())
        .cwd(parent.cwd.clone())
        .build();
    Session::child_of(config, parent, 1_000_000)
}

pub fn atomic_port(id: &str) -> Port {
    Port::new(id, format!("port {id}"), PortType::Atomic, 1_000_000)
}

pub fn orchestration_port(id: &str) -> Port {
    Port::new(id, format!("port {id}"), PortType::Orchestration, 1_000_000)
}

pub fn session_start_event(session_id: &str) -> Event {
    Event::new(EventKind::SessionStart, 1_000_000, serde_json::json!({ "session_id": session_id }))
        .with_session(session_id)
}

pub fn port_start_event(port_id: &str, session_id: &str) -> Event {
    Event::new(EventKind::PortStart, 1_000_000, serde_json::json!({ "port_id": port_id }))
        .with_session(session_id)
        .with_port(port_id)
}

pub fn attention_warning_event(session_id: &str, usage_percent: f64) -> Event {
    Event::new(
        EventKind::AttentionWarning,
        1_000_000,
        serde_json::json!({ "usage_percent": usage_percent }),
    )
    .with_session(session_id)
}
