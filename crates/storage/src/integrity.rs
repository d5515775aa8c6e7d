// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Integrity checking (spec.md §4.10): the store's native pass (can the
//! WAL/snapshot be read and replayed at all) plus a foreign-key-style
//! reference scan and the per-table invariants from spec.md §3. New to this
//! crate — the teacher never separates "read the store" from "validate the
//! store", since its own `MaterializedState` has no cross-referencing
//! entities with nullable foreign keys the way sessions/ports/channels do
//! here.

use crate::state::MaterializedState;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingLevel {
    Ok,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub level: FindingLevel,
    pub message: String,
    pub remediation: Option<String>,
}

impl Finding {
    fn ok(message: impl Into<String>) -> Self {
        Self { level: FindingLevel::Ok, message: message.into(), remediation: None }
    }
    fn warning(message: impl Into<String>, remediation: impl Into<String>) -> Self {
        Self { level: FindingLevel::Warning, message: message.into(), remediation: Some(remediation.into()) }
    }
    fn error(message: impl Into<String>, remediation: impl Into<String>) -> Self {
        Self { level: FindingLevel::Error, message: message.into(), remediation: Some(remediation.into()) }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrityReport {
    pub findings: Vec<Finding>,
}

impl IntegrityReport {
    pub fn has_errors(&self) -> bool {
        self.findings.iter().any(|f| f.level == FindingLevel::Error)
    }
}

/// Runs every check against `state`: reference scan, then per-table
/// invariants from spec.md §3. The "store's native integrity pass" (can
/// the snapshot/WAL be read) already happened by the time a caller holds a
/// `MaterializedState` at all — `Store::open` would have failed otherwise.
pub fn check(state: &MaterializedState) -> IntegrityReport {
    let mut findings = Vec::new();
    check_session_references(state, &mut findings);
    check_port_references(state, &mut findings);
    check_channel_references(state, &mut findings);
    check_escalation_references(state, &mut findings);
    check_session_hierarchy_invariants(state, &mut findings);
    check_port_terminal_invariants(state, &mut findings);

    if findings.is_empty() {
        findings.push(Finding::ok("no issues found"));
    }
    IntegrityReport { findings }
}

fn check_session_references(state: &MaterializedState, findings: &mut Vec<Finding>) {
    for session in state.sessions.values() {
        if let Some(parent_id) = &session.parent_id {
            if !state.sessions.contains_key(parent_id) {
                findings.push(Finding::error(
                    format!("session {} references missing parent {}", session.id, parent_id),
                    "restore the parent session from backup or clear parent_id",
                ));
            }
        }
        if let Some(port_id) = &session.active_port {
            if !state.ports.contains_key(port_id) {
                findings.push(Finding::error(
                    format!("session {} references missing active_port {}", session.id, port_id),
                    "clear active_port or restore the referenced port",
                ));
            }
        }
    }
}

fn check_port_references(state: &MaterializedState, findings: &mut Vec<Finding>) {
    for port in state.ports.values() {
        if let Some(owner) = &port.owner_session {
            if !state.sessions.contains_key(owner) {
                findings.push(Finding::error(
                    format!("port {} references missing owner_session {}", port.id, owner),
                    "restore the owning session or clear owner_session",
                ));
            }
        }
    }
    for (port_id, edges) in &state.dependencies {
        if !state.ports.contains_key(port_id) {
            findings.push(Finding::warning(
                format!("dependency edges reference missing port {port_id}"),
                "prune orphaned dependency edges",
            ));
        }
        for edge in edges {
            if !state.ports.contains_key(&edge.depends_on) {
                findings.push(Finding::warning(
                    format!("port {} depends on missing port {}", port_id, edge.depends_on),
                    "prune the dangling dependency edge",
                ));
            }
        }
    }
}

fn check_channel_references(state: &MaterializedState, findings: &mut Vec<Finding>) {
    for channel in state.direct_channels.values() {
        for session_id in [&channel.session_a, &channel.session_b] {
            if !state.sessions.contains_key(session_id) {
                findings.push(Finding::error(
                    format!("channel {} references missing session {}", channel.id, session_id),
                    "restore the referenced session or close the channel",
                ));
            }
        }
    }
    for message in state.direct_messages.values() {
        if !state.direct_channels.contains_key(&message.channel_id) {
            findings.push(Finding::error(
                format!("message {} references missing channel {}", message.id, message.channel_id),
                "restore the referenced channel",
            ));
        }
    }
}

fn check_escalation_references(state: &MaterializedState, findings: &mut Vec<Finding>) {
    for escalation in state.escalations.values() {
        if !state.sessions.contains_key(&escalation.session_id) {
            findings.push(Finding::error(
                format!("escalation {} references missing session {}", escalation.id, escalation.session_id),
                "restore the referenced session",
            ));
        }
        if let Some(port_id) = &escalation.port_id {
            if !state.ports.contains_key(port_id) {
                findings.push(Finding::warning(
                    format!("escalation {} references missing port {}", escalation.id, port_id),
                    "clear the dangling port_id",
                ));
            }
        }
    }
}

/// spec.md §8 invariant (1): `depth = len(split(path, '/')) - 1` and
/// `root_id = first(split(path, '/'))`.
fn check_session_hierarchy_invariants(state: &MaterializedState, findings: &mut Vec<Finding>) {
    for session in state.sessions.values() {
        if session.depth != session.expected_depth() {
            findings.push(Finding::error(
                format!("session {} has depth {} but path {} implies {}", session.id, session.depth, session.path, session.expected_depth()),
                "recompute depth from path",
            ));
        }
        if session.root_id != session.expected_root_id() {
            findings.push(Finding::error(
                format!("session {} has root_id {} but path {} implies {}", session.id, session.root_id, session.path, session.expected_root_id()),
                "recompute root_id from path",
            ));
        }
    }
}

/// spec.md §8 invariant: a `complete`/`failed` port holds no active locks.
fn check_port_terminal_invariants(state: &MaterializedState, findings: &mut Vec<Finding>) {
    for port in state.ports.values() {
        if !port.status.is_terminal() {
            continue;
        }
        let port_lock = pal_core::Lock::port_resource(&port.id);
        if state.locks.contains_key(&port_lock) {
            findings.push(Finding::error(
                format!("terminal port {} still holds lock {}", port.id, port_lock),
                "release the stale lock",
            ));
        }
    }
}

#[cfg(test)]
#[path = "integrity_tests.rs"]
mod tests;
