// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! StoreEvent: the WAL's internal mutation vocabulary.
//!
//! Distinct from `pal_core::Event` (the SSE-published notification, spec.md
//! §4.8): a `StoreEvent` is a command-sourced fact about a committed
//! mutation, generalizing the teacher's own large `Event` enum
//! (`crates/core/src/event/mod.rs`, one variant per mutation, `#[serde(tag =
//! "type")]`) to PAL Kit's entities. `pal-engine` derives zero or more
//! `pal_core::Event`s to publish whenever it commits one of these.

use pal_core::{
    AttentionState, Checkpoint, CheckpointId, CompactEvent, DirectChannel, DirectChannelId,
    DirectMessage, DirectMessageId, Escalation, EscalationId, Lock, Pipeline, Port, PortDependency,
    Session, SessionStatus,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StoreEvent {
    SessionCreated {
        session: Box<Session>,
    },
    /// Operator rename (`pal session rename`, spec.md §6 CLI surface): no
    /// hook or manager raises this today, only the CLI's direct commit.
    SessionRenamed {
        session_id: String,
        title: String,
    },
    SessionUsageUpdated {
        session_id: String,
        input: u64,
        output: u64,
        cache_read: u64,
        cache_create: u64,
        cost_usd: f64,
    },
    SessionCompacted {
        session_id: String,
        at_ms: u64,
    },
    SessionEnded {
        session_id: String,
        status: SessionStatus,
        summary: Option<serde_json::Value>,
        at_ms: u64,
    },
    SessionEventLogged {
        session_id: String,
        event_type: String,
        event_data: serde_json::Value,
        at_ms: u64,
    },
    /// Sets or clears the session's `active_port` (spec.md §3): committed
    /// alongside `PortStarted` for the owning session, and cleared
    /// alongside `PortCompleted`/`PortBlocked`/`PortFailed` when the
    /// session's active port was the one transitioning.
    SessionActivePortSet {
        session_id: String,
        port_id: Option<String>,
    },
    /// Records the usage ratio observed at the most recent `pre-tool-use`
    /// hook, so the one-shot 0.80/0.90 threshold crossing (spec.md §4.4)
    /// survives process restarts instead of resetting to 0 on every hook
    /// subprocess.
    SessionAttentionRatioObserved {
        session_id: String,
        ratio: f64,
    },

    PortCreated {
        port: Box<Port>,
    },
    PortStarted {
        port_id: String,
        session_id: String,
        at_ms: u64,
    },
    PortCompleted {
        port_id: String,
        at_ms: u64,
    },
    PortBlocked {
        port_id: String,
    },
    /// `blocked -> pending` (spec.md §4.5: "blocked -> running on retry"):
    /// resets the port so the next `port-start` can re-claim it. Does not
    /// touch dependency-satisfaction flags.
    PortRetried {
        port_id: String,
    },
    PortFailed {
        port_id: String,
        at_ms: u64,
    },

    PipelineCreated {
        pipeline: Box<Pipeline>,
    },
    DependencyAdded {
        dependency: Box<PortDependency>,
    },
    DependencySatisfied {
        port_id: String,
        depends_on: String,
    },

    LockAcquired {
        lock: Lock,
    },
    LockReleased {
        resource: String,
    },

    AttentionUpdated {
        state: Box<AttentionState>,
    },
    CheckpointCreated {
        checkpoint: Box<Checkpoint>,
    },
    CompactEventCreated {
        compact_event: Box<CompactEvent>,
    },

    DirectChannelOpened {
        channel: Box<DirectChannel>,
    },
    DirectChannelClosed {
        channel_id: DirectChannelId,
        at_ms: u64,
    },
    DirectMessageSent {
        message: Box<DirectMessage>,
    },
    DirectMessageDelivered {
        message_id: DirectMessageId,
        at_ms: u64,
    },
    DirectMessageProcessed {
        message_id: DirectMessageId,
        at_ms: u64,
    },

    EscalationCreated {
        escalation: Box<Escalation>,
    },
    EscalationResolved {
        escalation_id: EscalationId,
        resolution: String,
        resolved_by: String,
        at_ms: u64,
    },
    EscalationDismissed {
        escalation_id: EscalationId,
        resolved_by: String,
        at_ms: u64,
    },

    /// Control event: daemon shutdown request. Recorded so a restart can
    /// tell the engine loop replayed it and should not re-dispatch work
    /// (mirrors the teacher's `Event::Shutdown` WAL-survival guarantee).
    Shutdown,
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
