// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Escalation manager (spec.md §4.6): creates labeled, severity-bearing
//! conditions routed to the nearest running ancestor session, resolves or
//! dismisses them, and detects the automatic triggers table (test_failure,
//! token_exhausted, timeout, dependency). Grounded on `oj-engine`'s
//! `runtime::handlers` dispatch-by-condition style; no direct teacher
//! analog exists for escalation routing, so the ancestor walk is built
//! directly from `pal_core::Session::path`.

use pal_core::{Clock, CoreError, Escalation, EscalationId, EscalationType, Port, Session, Severity};
use pal_storage::{MaterializedState, Store, StoreEvent};

/// Default retries allowed in the test-impl feedback loop before a
/// `test_failure` escalation fires (spec.md §4.6).
pub const DEFAULT_FEEDBACK_RETRY_BUDGET: u32 = 3;

pub struct EscalationManager;

impl EscalationManager {
    /// Creates an escalation against `session_id` and commits it. Severity
    /// defaults to `EscalationType::default_severity()` when `severity` is
    /// `None` (required for `quality`, which has no fixed mapping).
    #[allow(clippy::too_many_arguments)]
    pub fn create<C: Clock>(
        store: &mut Store,
        clock: &C,
        session_id: &str,
        port_id: Option<String>,
        escalation_type: EscalationType,
        severity: Option<Severity>,
        issue: impl Into<String>,
        suggestion: Option<String>,
        context: serde_json::Value,
    ) -> Result<Escalation, CoreError> {
        let severity = severity
            .or_else(|| escalation_type.default_severity())
            .ok_or_else(|| CoreError::ConfigInvalid { message: format!("{escalation_type} has no default severity") })?;

        let mut escalation = Escalation::new(session_id, escalation_type, severity, issue, clock.epoch_ms());
        escalation.port_id = port_id;
        escalation.suggestion = suggestion;
        escalation.context = context;

        store.commit(StoreEvent::EscalationCreated { escalation: Box::new(escalation.clone()) })?;
        Ok(escalation)
    }

    pub fn resolve<C: Clock>(
        store: &mut Store,
        clock: &C,
        escalation_id: EscalationId,
        resolution: impl Into<String>,
        resolved_by: impl Into<String>,
    ) -> Result<Escalation, CoreError> {
        let exists = store.query(|s| s.escalations.contains_key(&escalation_id));
        if !exists {
            return Err(CoreError::NotFound { resource: "escalation", id: escalation_id.to_string() });
        }
        store.commit(StoreEvent::EscalationResolved {
            escalation_id,
            resolution: resolution.into(),
            resolved_by: resolved_by.into(),
            at_ms: clock.epoch_ms(),
        })?;
        store
            .query(|s| s.escalations.get(&escalation_id).cloned())
            .ok_or_else(|| CoreError::NotFound { resource: "escalation", id: escalation_id.to_string() })
    }

    pub fn dismiss<C: Clock>(
        store: &mut Store,
        clock: &C,
        escalation_id: EscalationId,
        resolved_by: impl Into<String>,
    ) -> Result<Escalation, CoreError> {
        let exists = store.query(|s| s.escalations.contains_key(&escalation_id));
        if !exists {
            return Err(CoreError::NotFound { resource: "escalation", id: escalation_id.to_string() });
        }
        store.commit(StoreEvent::EscalationDismissed {
            escalation_id,
            resolved_by: resolved_by.into(),
            at_ms: clock.epoch_ms(),
        })?;
        store
            .query(|s| s.escalations.get(&escalation_id).cloned())
            .ok_or_else(|| CoreError::NotFound { resource: "escalation", id: escalation_id.to_string() })
    }

    /// Walks `session.path` upward from its parent and returns the nearest
    /// session still `running` (spec.md §4.6: "reported to the nearest
    /// running ancestor session"). `None` if no ancestor is running (the
    /// escalation is then surfaced at the root).
    pub fn nearest_running_ancestor(state: &MaterializedState, session_id: &str) -> Option<String> {
        let session = state.get_session(session_id)?;
        let mut ancestor_ids: Vec<&str> = session.path.split('/').collect();
        ancestor_ids.pop(); // drop the session itself
        for ancestor_id in ancestor_ids.into_iter().rev() {
            if let Some(ancestor) = state.get_session(ancestor_id) {
                if ancestor.status == pal_core::SessionStatus::Running {
                    return Some(ancestor.id.clone());
                }
            }
        }
        None
    }

    /// `token_exhausted` trigger: `tokens_used >= escalate_ratio * budget`
    /// (spec.md §4.6 table; `escalate_ratio` default 0.95, distinct from
    /// the attention warn/critical thresholds).
    pub fn check_token_exhausted(session: &Session, escalate_ratio: f64) -> bool {
        session.attention_enabled() && session.usage_ratio() >= escalate_ratio
    }

    /// `timeout` trigger: the port has been running longer than its
    /// declared `timeout_s`.
    pub fn check_timeout(port: &Port, now_ms: u64) -> bool {
        match (port.started_at_ms, port.timeout_s) {
            (Some(started), Some(timeout_s)) => now_ms.saturating_sub(started) > timeout_s * 1000,
            _ => false,
        }
    }
}

#[cfg(test)]
#[path = "escalation_tests.rs"]
mod tests;
