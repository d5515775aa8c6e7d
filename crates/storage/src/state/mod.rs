// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state built from WAL replay (spec.md §3/§4.1).

mod attention;
mod channels;
mod escalations;
mod locks;
mod pipelines;
mod ports;
mod sessions;

use crate::event::StoreEvent;
use pal_core::{
    AttentionState, Checkpoint, CheckpointId, CompactEvent, CompactEventId, DirectChannel,
    DirectChannelId, DirectMessage, DirectMessageId, Escalation, EscalationId, Lock, Pipeline,
    Port, PortDependency, Session,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An append-only entry in a session's event log (spec.md §3 `SessionEvent`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEvent {
    pub event_type: String,
    pub event_data: serde_json::Value,
    pub created_at_ms: u64,
}

/// The complete, in-memory derived state of a store, rebuilt by replaying
/// `StoreEvent`s in order. Every field here must be reachable from some
/// combination of events — there is no state that only direct mutation
/// produces.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MaterializedState {
    pub sessions: HashMap<String, Session>,
    #[serde(default)]
    pub session_events: HashMap<String, Vec<SessionEvent>>,

    pub ports: HashMap<String, Port>,

    #[serde(default)]
    pub pipelines: HashMap<String, Pipeline>,
    /// port_id -> dependency edges where `port_id` is the dependent side.
    #[serde(default)]
    pub dependencies: HashMap<String, Vec<PortDependency>>,

    #[serde(default)]
    pub attention: HashMap<String, AttentionState>,
    #[serde(default)]
    pub checkpoints: HashMap<CheckpointId, Checkpoint>,
    #[serde(default)]
    pub compact_events: HashMap<CompactEventId, CompactEvent>,

    #[serde(default)]
    pub direct_channels: HashMap<DirectChannelId, DirectChannel>,
    #[serde(default)]
    pub direct_messages: HashMap<DirectMessageId, DirectMessage>,

    #[serde(default)]
    pub escalations: HashMap<EscalationId, Escalation>,

    #[serde(default)]
    pub locks: HashMap<String, Lock>,
}

impl MaterializedState {
    /// Applies a committed event to derive the next state.
    ///
    /// # Idempotency requirement
    ///
    /// All handlers MUST be idempotent: applying the same event twice must
    /// produce the same state as applying it once (the store's `commit`
    /// applies an event exactly once, but WAL replay during recovery may
    /// re-run the tail of the log against a slightly stale snapshot).
    /// Guidelines: use assignment instead of mutation, guard inserts with
    /// existence checks, guard monotone counters with the value they'd
    /// already reach.
    pub fn apply_event(&mut self, event: &StoreEvent) {
        match event {
            StoreEvent::SessionCreated { .. }
            | StoreEvent::SessionUsageUpdated { .. }
            | StoreEvent::SessionCompacted { .. }
            | StoreEvent::SessionEnded { .. }
            | StoreEvent::SessionAttentionRatioObserved { .. }
            | StoreEvent::SessionActivePortSet { .. }
            | StoreEvent::SessionEventLogged { .. } => sessions::apply(self, event),

            StoreEvent::PortCreated { .. }
            | StoreEvent::PortStarted { .. }
            | StoreEvent::PortCompleted { .. }
            | StoreEvent::PortBlocked { .. }
            | StoreEvent::PortRetried { .. }
            | StoreEvent::PortFailed { .. } => ports::apply(self, event),

            StoreEvent::PipelineCreated { .. }
            | StoreEvent::DependencyAdded { .. }
            | StoreEvent::DependencySatisfied { .. } => pipelines::apply(self, event),

            StoreEvent::LockAcquired { .. } | StoreEvent::LockReleased { .. } => locks::apply(self, event),

            StoreEvent::AttentionUpdated { .. }
            | StoreEvent::CheckpointCreated { .. }
            | StoreEvent::CompactEventCreated { .. } => attention::apply(self, event),

            StoreEvent::DirectChannelOpened { .. }
            | StoreEvent::DirectChannelClosed { .. }
            | StoreEvent::DirectMessageSent { .. }
            | StoreEvent::DirectMessageDelivered { .. }
            | StoreEvent::DirectMessageProcessed { .. } => channels::apply(self, event),

            StoreEvent::EscalationCreated { .. }
            | StoreEvent::EscalationResolved { .. }
            | StoreEvent::EscalationDismissed { .. } => escalations::apply(self, event),

            // Control event, carries no state.
            StoreEvent::Shutdown => {}
        }
    }

    /// Looks up a session by ID or unique prefix (teacher's
    /// `find_by_prefix` convention, spec.md §4.3).
    pub fn get_session(&self, id: &str) -> Option<&Session> {
        find_by_prefix(&self.sessions, id)
    }

    pub fn get_port(&self, id: &str) -> Option<&Port> {
        find_by_prefix(&self.ports, id)
    }

    /// Most recent session with a matching `claude_session_id` (spec.md
    /// §4.3 `find_by_claude_session_id`).
    pub fn find_by_claude_session_id(&self, correlation_id: &str) -> Option<&Session> {
        self.sessions
            .values()
            .filter(|s| s.claude_session_id.as_deref() == Some(correlation_id))
            .max_by_key(|s| s.created_at_ms)
    }

    /// Sessions whose `path` descends from (or equals) `root_id`, depth
    /// ordered (spec.md §4.3 `get_hierarchy`).
    pub fn descendants_of(&self, root_id: &str) -> Vec<&Session> {
        let mut out: Vec<&Session> = self.sessions.values().filter(|s| s.is_descendant_path(root_id)).collect();
        out.sort_by_key(|s| s.depth);
        out
    }

    /// Dependency edges whose `depends_on` is `port_id` (outgoing edges to
    /// satisfy when `port_id` completes).
    pub fn outgoing_dependencies_mut(&mut self, port_id: &str) -> impl Iterator<Item = &mut PortDependency> {
        self.dependencies.values_mut().flatten().filter(move |d| d.depends_on == port_id)
    }

    /// Merges `other` into `self` keyed on primary ID, `INSERT OR IGNORE`
    /// style: rows already present in `self` are left untouched (restore
    /// `--merge`, spec.md §4.10).
    pub fn merge_from(&mut self, other: &MaterializedState) -> MergeStats {
        let mut stats = MergeStats::default();

        for (id, session) in &other.sessions {
            if self.sessions.insert(id.clone(), session.clone()).is_none() {
                stats.sessions += 1;
            }
        }
        for (id, port) in &other.ports {
            if self.ports.insert(id.clone(), port.clone()).is_none() {
                stats.ports += 1;
            }
        }
        for (id, pipeline) in &other.pipelines {
            if self.pipelines.insert(id.clone(), pipeline.clone()).is_none() {
                stats.pipelines += 1;
            }
        }
        for id in other.dependencies.keys() {
            self.dependencies.entry(id.clone()).or_insert_with(Vec::new);
        }
        for (id, escalation) in &other.escalations {
            if self.escalations.insert(*id, escalation.clone()).is_none() {
                stats.escalations += 1;
            }
        }
        for (id, message) in &other.direct_messages {
            if self.direct_messages.insert(*id, message.clone()).is_none() {
                stats.direct_messages += 1;
            }
        }
        for (id, channel) in &other.direct_channels {
            self.direct_channels.entry(*id).or_insert_with(|| channel.clone());
        }
        for (id, entry) in &other.checkpoints {
            self.checkpoints.entry(*id).or_insert_with(|| entry.clone());
        }
        for (id, entry) in &other.compact_events {
            self.compact_events.entry(*id).or_insert_with(|| entry.clone());
        }
        for (resource, lock) in &other.locks {
            self.locks.entry(resource.clone()).or_insert_with(|| lock.clone());
        }
        for (id, log) in &other.session_events {
            self.session_events.entry(id.clone()).or_insert_with(|| log.clone());
        }

        stats
    }
}

/// Row counts actually inserted by [`MaterializedState::merge_from`].
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MergeStats {
    pub sessions: usize,
    pub ports: usize,
    pub pipelines: usize,
    pub escalations: usize,
    pub direct_messages: usize,
}

/// Finds an entry by exact key or by unique key prefix (git-commit-hash
/// style lookup), matching the teacher's `state::helpers::find_by_prefix`.
fn find_by_prefix<'a, V>(map: &'a HashMap<String, V>, id: &str) -> Option<&'a V> {
    if let Some(v) = map.get(id) {
        return Some(v);
    }
    let mut matches = map.iter().filter(|(k, _)| k.starts_with(id));
    let first = matches.next()?;
    if matches.next().is_some() {
        return None;
    }
    Some(first.1)
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
