// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Checkpoint + CompactEvent: immutable attention-subsystem snapshots
//! (spec.md §3/§4.4).

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Random ID for a checkpoint row.
    pub struct CheckpointId("ckp-");
}

crate::define_id! {
    /// Random ID for a compact-event row.
    pub struct CompactEventId("cpe-");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointTrigger {
    Auto80,
    Auto90,
    PreHeavy,
    Manual,
}

crate::simple_display! {
    CheckpointTrigger {
        Auto80 => "auto_80",
        Auto90 => "auto_90",
        PreHeavy => "pre_heavy",
        Manual => "manual",
    }
}

/// Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: CheckpointId,
    pub session_id: String,
    pub trigger: CheckpointTrigger,
    pub tokens_at_snapshot: u64,
    pub summary: String,
    pub edited_files: Vec<String>,
    pub active_port: Option<String>,
    pub context_hash: String,
    pub created_at_ms: u64,
}

impl Checkpoint {
    pub fn new(
        session_id: impl Into<String>,
        trigger: CheckpointTrigger,
        tokens_at_snapshot: u64,
        summary: impl Into<String>,
        edited_files: Vec<String>,
        active_port: Option<String>,
        context_hash: impl Into<String>,
        created_at_ms: u64,
    ) -> Self {
        Self {
            id: CheckpointId::new(),
            session_id: session_id.into(),
            trigger,
            tokens_at_snapshot,
            summary: summary.into(),
            edited_files,
            active_port,
            context_hash: context_hash.into(),
            created_at_ms,
        }
    }
}

crate::builder! {
    pub struct CheckpointBuilder => Checkpoint {
        into {
            session_id: String = "s1",
            summary: String = "checkpoint summary",
            context_hash: String = "deadbeef",
        }
        set {
            trigger: CheckpointTrigger = CheckpointTrigger::Manual,
            tokens_at_snapshot: u64 = 0,
            edited_files: Vec<String> = Vec::new(),
            created_at_ms: u64 = 0,
        }
        option {
            active_port: String = None,
        }
        computed {
            id: CheckpointId = CheckpointId::new(),
        }
    }
}

/// Immutable once written. Anchors a `pre-compact` hook to the most recent
/// checkpoint so the following `session-start` can build a recovery context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompactEvent {
    pub id: CompactEventId,
    pub session_id: String,
    pub trigger_reason: String,
    pub tokens_before: u64,
    pub tokens_after: u64,
    pub preserved_summary: String,
    pub discarded_summary: String,
    pub recovery_hint: String,
    pub pre_compact_checkpoint_id: Option<CheckpointId>,
    pub created_at_ms: u64,
}

impl CompactEvent {
    pub fn new(
        session_id: impl Into<String>,
        trigger_reason: impl Into<String>,
        tokens_before: u64,
        tokens_after: u64,
        preserved_summary: impl Into<String>,
        discarded_summary: impl Into<String>,
        recovery_hint: impl Into<String>,
        pre_compact_checkpoint_id: Option<CheckpointId>,
        created_at_ms: u64,
    ) -> Self {
        Self {
            id: CompactEventId::new(),
            session_id: session_id.into(),
            trigger_reason: trigger_reason.into(),
            tokens_before,
            tokens_after,
            preserved_summary: preserved_summary.into(),
            discarded_summary: discarded_summary.into(),
            recovery_hint: recovery_hint.into(),
            pre_compact_checkpoint_id,
            created_at_ms,
        }
    }
}

crate::builder! {
    pub struct CompactEventBuilder => CompactEvent {
        into {
            session_id: String = "s1",
            trigger_reason: String = "manual",
            preserved_summary: String = "kept",
            discarded_summary: String = "dropped",
            recovery_hint: String = "resume from checkpoint",
        }
        set {
            tokens_before: u64 = 0,
            tokens_after: u64 = 0,
            created_at_ms: u64 = 0,
        }
        option {
            pre_compact_checkpoint_id: CheckpointId = None,
        }
        computed {
            id: CompactEventId = CompactEventId::new(),
        }
    }
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;
