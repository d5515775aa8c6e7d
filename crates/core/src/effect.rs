// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Effects the runtime executes after a hook or command mutates the store.
//!
//! Generalizes the teacher's `Effect` enum (`.name()`/`.fields()`/
//! `.verbose()` for structured `tracing` logging around each effect's
//! execution in `pal-engine::runtime`) to PAL Kit's own side-effect set:
//! event emission, lock acquisition/release, the checklist gate subprocess,
//! and direct-message delivery notifications.

use crate::event::Event;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    /// Publish an event to the SSE hub (spec.md §4.8).
    Emit { event: Event },

    /// Acquire a named-resource lock for a session (spec.md §4.2).
    AcquireLock { resource: String, session_id: String },

    /// Release a named-resource lock (spec.md §4.2).
    ReleaseLock { resource: String },

    /// Run the language-agnostic build/test/lint checklist gate against a
    /// project root for a port's `port-end` transition (spec.md §4.5.2).
    RunChecklistGate { port_id: String, project_root: String },

    /// Deliver a pending direct message to its recipient's next hook poll
    /// (spec.md §4.6) — logged so delivery latency is observable.
    DeliverDirectMessage {
        channel_id: String,
        message_id: String,
        to_session: String,
    },

    /// Report an escalation to the nearest running ancestor session
    /// (spec.md §4.6).
    ReportEscalation { escalation_id: String, ancestor_session: String },

    /// Write a rendered checkpoint or compact-event summary file into
    /// `<project>/.pal/sessions/` (spec.md §6 persisted state layout).
    PersistSummary { session_id: String, path: String, contents: String },
}

impl Effect {
    /// Effect name for log spans (e.g., "emit", "acquire_lock").
    pub fn name(&self) -> &'static str {
        match self {
            Effect::Emit { .. } => "emit",
            Effect::AcquireLock { .. } => "acquire_lock",
            Effect::ReleaseLock { .. } => "release_lock",
            Effect::RunChecklistGate { .. } => "run_checklist_gate",
            Effect::DeliverDirectMessage { .. } => "deliver_direct_message",
            Effect::ReportEscalation { .. } => "report_escalation",
            Effect::PersistSummary { .. } => "persist_summary",
        }
    }

    /// Key-value pairs for structured logging.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        match self {
            Effect::Emit { event } => vec![("kind", event.kind.to_string())],
            Effect::AcquireLock { resource, session_id } => {
                vec![("resource", resource.clone()), ("session_id", session_id.clone())]
            }
            Effect::ReleaseLock { resource } => vec![("resource", resource.clone())],
            Effect::RunChecklistGate { port_id, project_root } => {
                vec![("port_id", port_id.clone()), ("project_root", project_root.clone())]
            }
            Effect::DeliverDirectMessage { channel_id, message_id, to_session } => vec![
                ("channel_id", channel_id.clone()),
                ("message_id", message_id.clone()),
                ("to_session", to_session.clone()),
            ],
            Effect::ReportEscalation { escalation_id, ancestor_session } => vec![
                ("escalation_id", escalation_id.clone()),
                ("ancestor_session", ancestor_session.clone()),
            ],
            Effect::PersistSummary { session_id, path, .. } => {
                vec![("session_id", session_id.clone()), ("path", path.clone())]
            }
        }
    }

    /// Whether to log both 'started' and 'completed' or just 'executed',
    /// controlling verbosity for frequent effects.
    pub fn verbose(&self) -> bool {
        match self {
            Effect::Emit { .. } => false,
            _ => true,
        }
    }
}

#[cfg(test)]
#[path = "effect_tests.rs"]
mod tests;
