// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Attention + checkpoint subsystem (spec.md §4.4): token-budget tracking,
//! one-shot auto-checkpoint threshold detection, and compact recovery.

use pal_core::{
    AttentionState, Checkpoint, CheckpointTrigger, Clock, CompactEvent, CoreError, EventKind, Port, Session,
};
use pal_storage::{MaterializedState, Store, StoreEvent};

/// Outcome of [`Attention::observe_usage`]: whether a threshold was crossed
/// on this observation and, if so, the checkpoint + event to publish.
pub struct ThresholdCrossing {
    pub checkpoint: Checkpoint,
    pub event_kind: EventKind,
}

pub struct Attention;

impl Attention {
    /// Ensures an `AttentionState` row exists for `session`, budget-derived
    /// from its current `token_budget`.
    pub fn ensure_state(store: &mut Store, session: &Session) -> Result<(), CoreError> {
        let exists = store.query(|s| s.attention.contains_key(&session.id));
        if !exists {
            store.commit(StoreEvent::AttentionUpdated {
                state: Box::new(AttentionState::new(session.id.clone(), session.token_budget)),
            })?;
        }
        Ok(())
    }

    /// The auto-checkpoint rule (spec.md §4.4): recomputes `usage_ratio`
    /// from `session`'s current cumulative usage and compares it against
    /// the *previously observed* ratio stored on the session row
    /// (`last_attention_ratio`), so the 0.80/0.90 thresholds fire exactly
    /// once each per session. `token_budget = 0` disables attention
    /// entirely (spec.md §8 boundary case).
    ///
    /// Call this from within the same commit sequence that updates usage,
    /// after `SessionUsageUpdated` has already landed, so `session` reflects
    /// the post-update totals.
    pub fn observe_usage<C: Clock>(
        store: &mut Store,
        clock: &C,
        session: &Session,
        warn_ratio: f64,
        critical_ratio: f64,
        recent_port_title: Option<&str>,
        edited_files: Vec<String>,
    ) -> Result<(Vec<ThresholdCrossing>, f64), CoreError> {
        if !session.attention_enabled() {
            return Ok((Vec::new(), 0.0));
        }

        let r0 = session.last_attention_ratio;
        let r = session.usage_ratio();
        let mut crossings = Vec::new();
        let now = clock.epoch_ms();

        let summary = recent_port_title.unwrap_or("session in progress").to_string();

        if r0 < warn_ratio && r >= warn_ratio {
            let checkpoint = Checkpoint::new(
                session.id.clone(),
                CheckpointTrigger::Auto80,
                session.usage.tokens_used(),
                summary.clone(),
                edited_files.clone(),
                session.active_port.clone(),
                context_hash(session),
                now,
            );
            store.commit(StoreEvent::CheckpointCreated { checkpoint: Box::new(checkpoint.clone()) })?;
            crossings.push(ThresholdCrossing { checkpoint, event_kind: EventKind::AttentionWarning });
        }
        if r0 < critical_ratio && r >= critical_ratio {
            let checkpoint = Checkpoint::new(
                session.id.clone(),
                CheckpointTrigger::Auto90,
                session.usage.tokens_used(),
                summary,
                edited_files,
                session.active_port.clone(),
                context_hash(session),
                now,
            );
            store.commit(StoreEvent::CheckpointCreated { checkpoint: Box::new(checkpoint.clone()) })?;
            crossings.push(ThresholdCrossing { checkpoint, event_kind: EventKind::AttentionCritical });
        }

        // Persist the new ratio on the session row so the next hook
        // invocation (a fresh process) treats this observation as `r0`.
        store.commit(StoreEvent::SessionAttentionRatioObserved { session_id: session.id.clone(), ratio: r })?;
        let mut row = attention_row_after(store, session, r);
        if !crossings.is_empty() {
            // A checkpoint just captured the files touched since the last
            // one; start the next window empty.
            row.loaded_files.clear();
        }
        store.commit(StoreEvent::AttentionUpdated { state: Box::new(row) })?;

        Ok((crossings, r))
    }

    /// Builds the recovery context returned to the host assistant on the
    /// `session-start` hook that follows a `pre-compact` (spec.md §4.4
    /// "Compact recovery"): the pre-compact summary, the active port and
    /// its remaining checklist (checklist text is a pass-through concern of
    /// the spec file component, not modeled here), the recent-files list,
    /// and the latest 3 `decision`-typed events.
    pub fn recovery_context(state: &MaterializedState, session_id: &str) -> Option<serde_json::Value> {
        let compact = state
            .compact_events
            .values()
            .filter(|c| c.session_id == session_id)
            .max_by_key(|c| c.created_at_ms)?;
        let checkpoint = compact.pre_compact_checkpoint_id.and_then(|id| state.checkpoints.get(&id));
        let session = state.get_session(session_id);
        let decisions: Vec<&serde_json::Value> = state
            .session_events
            .get(session_id)
            .map(|events| {
                events
                    .iter()
                    .filter(|e| e.event_type == "decision")
                    .rev()
                    .take(3)
                    .map(|e| &e.event_data)
                    .collect()
            })
            .unwrap_or_default();

        Some(serde_json::json!({
            "pre_compact_summary": compact.preserved_summary,
            "recovery_hint": compact.recovery_hint,
            "active_port": session.and_then(|s| s.active_port.clone()),
            "recent_files": checkpoint.map(|c| c.edited_files.clone()).unwrap_or_default(),
            "recent_decisions": decisions,
        }))
    }

    /// `pre-compact` hook effect: persists a `CompactEvent` anchored to the
    /// most recent checkpoint for this session.
    pub fn record_compact<C: Clock>(
        store: &mut Store,
        clock: &C,
        session: &Session,
        trigger_reason: &str,
    ) -> Result<CompactEvent, CoreError> {
        let latest_checkpoint = store.query(|s| {
            s.checkpoints
                .values()
                .filter(|c| c.session_id == session.id)
                .max_by_key(|c| c.created_at_ms)
                .map(|c| c.id)
        });
        let tokens_before = session.usage.tokens_used();
        let compact_event = CompactEvent::new(
            session.id.clone(),
            trigger_reason,
            tokens_before,
            0,
            "context preserved across compact",
            "discarded verbose tool output",
            "resume from the last checkpoint's active port and edited files",
            latest_checkpoint,
            clock.epoch_ms(),
        );
        store.commit(StoreEvent::CompactEventCreated { compact_event: Box::new(compact_event.clone()) })?;
        Ok(compact_event)
    }

    /// Records a file as loaded/edited into the session's attention row
    /// (spec.md §4.4 "files edited since the last checkpoint", accumulated
    /// from `post-tool-use`).
    pub fn record_file_touched(store: &mut Store, session_id: &str, path: &str) -> Result<(), CoreError> {
        let mut row = store
            .query(|s| s.attention.get(session_id).cloned())
            .unwrap_or_else(|| AttentionState::new(session_id, 0));
        row.record_file_loaded(path);
        store.commit(StoreEvent::AttentionUpdated { state: Box::new(row) })?;
        Ok(())
    }
}

fn attention_row_after(store: &Store, session: &Session, ratio: f64) -> AttentionState {
    let mut row = store
        .query(|s| s.attention.get(&session.id).cloned())
        .unwrap_or_else(|| AttentionState::new(session.id.clone(), session.token_budget));
    row.token_budget = session.token_budget;
    row.set_loaded_tokens((ratio * session.token_budget as f64) as u64);
    row.focus_score = (1.0 - ratio).max(0.0);
    row
}

fn context_hash(session: &Session) -> String {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    let mut hasher = DefaultHasher::new();
    session.id.hash(&mut hasher);
    session.usage.tokens_used().hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

/// A checklist-gate-free `Port` title lookup helper used by hook dispatch
/// to derive the checkpoint's one-line summary from the active port.
pub fn active_port_title(state: &MaterializedState, session: &Session) -> Option<String> {
    let port_id = session.active_port.as_ref()?;
    state.get_port(port_id).map(|p: &Port| p.title.clone())
}

#[cfg(test)]
#[path = "attention_tests.rs"]
mod tests;
