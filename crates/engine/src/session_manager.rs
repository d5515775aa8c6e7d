// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session hierarchy and lifecycle manager (spec.md §4.3).
//!
//! A thin, stateless layer over [`pal_storage::Store`]: every method here
//! commits one or more `StoreEvent`s and returns the resulting row(s). The
//! hierarchy algorithm itself (depth/root_id/path inheritance) lives on
//! `pal_core::Session::child_of`/`new_root` — this module only resolves the
//! parent lookup and the `parent-not-found`/`parent-terminated` failure
//! modes around it, mirroring `oj-core::Job`'s helper-method style.

use pal_core::{Clock, CoreError, Session, SessionConfig, SessionStatus, SessionTree};
use pal_storage::{Store, StoreEvent};

pub struct SessionManager;

impl SessionManager {
    /// `StartHierarchical`: creates a session, computing `depth`/`root_id`/
    /// `path` from `parent_id` if present. Fails with `NotFound` or
    /// `ParentTerminated` if the parent is missing or already finished.
    pub fn start_hierarchical<C: Clock>(store: &mut Store, clock: &C, opts: SessionConfig) -> Result<Session, CoreError> {
        let now = clock.epoch_ms();
        let session = match &opts.parent_id {
            Some(parent_id) => {
                let parent = store
                    .query(|s| s.get_session(parent_id).cloned())
                    .ok_or_else(|| CoreError::NotFound { resource: "session", id: parent_id.clone() })?;
                if parent.status.is_terminal() || parent.status == SessionStatus::Blocked {
                    return Err(CoreError::ParentTerminated { parent_id: parent.id.clone() });
                }
                Session::child_of(opts, &parent, now)
            }
            None => Session::new_root(opts, now),
        };
        store.commit(StoreEvent::SessionCreated { session: Box::new(session.clone()) })?;
        Ok(session)
    }

    /// `EndWithSummary`: terminates a session. `SessionEnded`'s apply
    /// handler already closes this session's active direct channels and
    /// releases its locks (spec.md §4.3 termination steps 1-2) as part of
    /// the same committed event. This method additionally blocks any port
    /// the session still owned if it did not end `complete` (step 3) and
    /// appends the `session_end` log event (step 4).
    pub fn end_with_summary<C: Clock>(
        store: &mut Store,
        clock: &C,
        session_id: &str,
        status: SessionStatus,
        summary: Option<serde_json::Value>,
    ) -> Result<Session, CoreError> {
        let session = store
            .query(|s| s.get_session(session_id).cloned())
            .ok_or_else(|| CoreError::NotFound { resource: "session", id: session_id.to_string() })?;
        let now = clock.epoch_ms();

        store.commit(StoreEvent::SessionEnded {
            session_id: session.id.clone(),
            status,
            summary,
            at_ms: now,
        })?;

        if status != SessionStatus::Complete {
            let owned_running: Vec<String> = store.query(|s| {
                s.ports
                    .values()
                    .filter(|p| p.owner_session.as_deref() == Some(session.id.as_str()) && p.status == pal_core::PortStatus::Running)
                    .map(|p| p.id.clone())
                    .collect()
            });
            for port_id in owned_running {
                store.commit(StoreEvent::PortBlocked { port_id })?;
            }
        }

        store.commit(StoreEvent::SessionEventLogged {
            session_id: session.id.clone(),
            event_type: "session_end".to_string(),
            event_data: serde_json::json!({ "status": status.to_string() }),
            at_ms: now,
        })?;

        store
            .query(|s| s.get_session(&session.id).cloned())
            .ok_or_else(|| CoreError::NotFound { resource: "session", id: session.id.clone() })
    }

    /// `FindByClaudeSessionID`: the most recent session for a host-assistant
    /// correlation ID. Required because hook invocations carry the host's
    /// session ID, not PAL Kit's own.
    pub fn find_by_claude_session_id(store: &Store, correlation_id: &str) -> Option<Session> {
        store.query(|s| s.find_by_claude_session_id(correlation_id).cloned())
    }

    /// `UpdateUsage`: idempotent cumulative update; never decreases values.
    pub fn update_usage(
        store: &mut Store,
        session_id: &str,
        input: u64,
        output: u64,
        cache_read: u64,
        cache_create: u64,
        cost_usd: f64,
    ) -> Result<(), CoreError> {
        store.commit(StoreEvent::SessionUsageUpdated {
            session_id: session_id.to_string(),
            input,
            output,
            cache_read,
            cache_create,
            cost_usd,
        })?;
        Ok(())
    }

    /// `IncrementCompact`: atomic +1 on the compact counter.
    pub fn increment_compact<C: Clock>(store: &mut Store, clock: &C, session_id: &str) -> Result<(), CoreError> {
        store.commit(StoreEvent::SessionCompacted { session_id: session_id.to_string(), at_ms: clock.epoch_ms() })?;
        Ok(())
    }

    /// `LogEvent`: append-only session event log.
    pub fn log_event<C: Clock>(
        store: &mut Store,
        clock: &C,
        session_id: &str,
        event_type: impl Into<String>,
        event_data: serde_json::Value,
    ) -> Result<(), CoreError> {
        store.commit(StoreEvent::SessionEventLogged {
            session_id: session_id.to_string(),
            event_type: event_type.into(),
            event_data,
            at_ms: clock.epoch_ms(),
        })?;
        Ok(())
    }

    /// `GetHierarchy`: the recursive tree rooted at `root_id`, built in
    /// depth order via the materialized path prefix query. `include_archived`
    /// is accepted for API symmetry with spec.md §4.3 but has no effect yet
    /// — rows are never deleted, so "archived" is presently a query-time
    /// distinction this store does not separately track.
    pub fn get_hierarchy(store: &Store, root_id: &str, _include_archived: bool) -> Result<SessionTree, CoreError> {
        let sessions: Vec<Session> = store.query(|s| s.descendants_of(root_id).into_iter().cloned().collect());
        let root = sessions
            .iter()
            .find(|s| s.id == root_id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound { resource: "session", id: root_id.to_string() })?;
        Ok(build_tree(&root, &sessions))
    }
}

fn build_tree(node: &Session, all: &[Session]) -> SessionTree {
    let children: Vec<SessionTree> = all
        .iter()
        .filter(|s| s.parent_id.as_deref() == Some(node.id.as_str()))
        .map(|s| build_tree(s, all))
        .collect();
    SessionTree { session: node.clone(), children }
}

#[cfg(test)]
#[path = "session_manager_tests.rs"]
mod tests;
