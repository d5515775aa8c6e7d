// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event: the vocabulary published by the SSE hub and appended to the
//! store's WAL (spec.md §4.8). Generalizes the teacher's `event/mod.rs`
//! `#[serde(tag = "type")]` enum convention with PAL Kit's own variant set.

use serde::{Deserialize, Serialize};

/// The minimum published event type list from spec.md §4.8, used for SSE
/// client filter matching (`?filter=session:start,port:end`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    SessionStart,
    SessionEnd,
    SessionUpdate,
    PortStart,
    PortEnd,
    PortBlocked,
    AttentionWarning,
    AttentionCritical,
    CompactTriggered,
    CheckpointCreated,
    ChecklistPassed,
    ChecklistFailed,
    EscalationCreated,
    EscalationResolved,
    DirectMessage,
    WorkerProgress,
    WorkerFeedback,
    BuildFailed,
    TestFailed,
}

crate::simple_display! {
    EventKind {
        SessionStart => "session:start",
        SessionEnd => "session:end",
        SessionUpdate => "session:update",
        PortStart => "port:start",
        PortEnd => "port:end",
        PortBlocked => "port:blocked",
        AttentionWarning => "attention:warning",
        AttentionCritical => "attention:critical",
        CompactTriggered => "compact:triggered",
        CheckpointCreated => "checkpoint:created",
        ChecklistPassed => "checklist:passed",
        ChecklistFailed => "checklist:failed",
        EscalationCreated => "escalation:created",
        EscalationResolved => "escalation:resolved",
        DirectMessage => "direct:message",
        WorkerProgress => "worker:progress",
        WorkerFeedback => "worker:feedback",
        BuildFailed => "build:failed",
        TestFailed => "test:failed",
    }
}

impl EventKind {
    pub fn as_wire_str(self) -> &'static str {
        match self {
            EventKind::SessionStart => "session:start",
            EventKind::SessionEnd => "session:end",
            EventKind::SessionUpdate => "session:update",
            EventKind::PortStart => "port:start",
            EventKind::PortEnd => "port:end",
            EventKind::PortBlocked => "port:blocked",
            EventKind::AttentionWarning => "attention:warning",
            EventKind::AttentionCritical => "attention:critical",
            EventKind::CompactTriggered => "compact:triggered",
            EventKind::CheckpointCreated => "checkpoint:created",
            EventKind::ChecklistPassed => "checklist:passed",
            EventKind::ChecklistFailed => "checklist:failed",
            EventKind::EscalationCreated => "escalation:created",
            EventKind::EscalationResolved => "escalation:resolved",
            EventKind::DirectMessage => "direct:message",
            EventKind::WorkerProgress => "worker:progress",
            EventKind::WorkerFeedback => "worker:feedback",
            EventKind::BuildFailed => "build:failed",
            EventKind::TestFailed => "test:failed",
        }
    }

    /// Parses the comma-separated `?filter=` query parameter from spec.md
    /// §4.8. Unknown tokens are ignored (forward-compatible filtering).
    pub fn parse_filter_list(raw: &str) -> Vec<EventKind> {
        raw.split(',')
            .filter_map(|tok| Self::from_wire_str(tok.trim()))
            .collect()
    }

    pub fn from_wire_str(s: &str) -> Option<Self> {
        use EventKind::*;
        Some(match s {
            "session:start" => SessionStart,
            "session:end" => SessionEnd,
            "session:update" => SessionUpdate,
            "port:start" => PortStart,
            "port:end" => PortEnd,
            "port:blocked" => PortBlocked,
            "attention:warning" => AttentionWarning,
            "attention:critical" => AttentionCritical,
            "compact:triggered" => CompactTriggered,
            "checkpoint:created" => CheckpointCreated,
            "checklist:passed" => ChecklistPassed,
            "checklist:failed" => ChecklistFailed,
            "escalation:created" => EscalationCreated,
            "escalation:resolved" => EscalationResolved,
            "direct:message" => DirectMessage,
            "worker:progress" => WorkerProgress,
            "worker:feedback" => WorkerFeedback,
            "build:failed" => BuildFailed,
            "test:failed" => TestFailed,
            _ => return None,
        })
    }
}

/// A published event. `data` is opaque JSON per SPEC_FULL.md §9 ("dynamic
/// typing in JSON payloads") — readers that need structure know the `kind`
/// and define a per-event struct at the boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    pub timestamp_ms: u64,
    pub session_id: Option<String>,
    pub port_id: Option<String>,
    pub data: serde_json::Value,
}

impl Event {
    pub fn new(kind: EventKind, timestamp_ms: u64, data: serde_json::Value) -> Self {
        Self {
            kind,
            timestamp_ms,
            session_id: None,
            port_id: None,
            data,
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_port(mut self, port_id: impl Into<String>) -> Self {
        self.port_id = Some(port_id.into());
        self
    }

    /// True if this event passes an SSE client's filter list (empty filter
    /// matches all, per spec.md §4.8) and its optional session scope.
    pub fn matches(&self, filter: &[EventKind], session_scope: Option<&str>) -> bool {
        if !filter.is_empty() && !filter.contains(&self.kind) {
            return false;
        }
        if let Some(scope) = session_scope {
            return self.session_id.as_deref() == Some(scope);
        }
        true
    }

    /// Renders the SSE wire frame: `data: <json>\n\n`.
    pub fn to_sse_frame(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string());
        format!("data: {json}\n\n")
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
