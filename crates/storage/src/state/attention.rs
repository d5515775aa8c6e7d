// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Attention state, checkpoint, and compact-event handlers (spec.md
//! §3/§4.4). Checkpoints and compact events are immutable once written, so
//! their handlers are plain inserts keyed by ID — replaying the same insert
//! twice is already idempotent.

use super::MaterializedState;
use crate::event::StoreEvent;

pub(crate) fn apply(state: &mut MaterializedState, event: &StoreEvent) {
    match event {
        StoreEvent::AttentionUpdated { state: attention } => {
            // Full-row replace keeps this idempotent regardless of replay
            // count, per the `loaded_tokens + available_tokens =
            // token_budget` invariant holding at every committed mutation.
            state.attention.insert(attention.session_id.clone(), (**attention).clone());
        }

        StoreEvent::CheckpointCreated { checkpoint } => {
            state.checkpoints.entry(checkpoint.id).or_insert_with(|| (**checkpoint).clone());
        }

        StoreEvent::CompactEventCreated { compact_event } => {
            state.compact_events.entry(compact_event.id).or_insert_with(|| (**compact_event).clone());
        }

        _ => {}
    }
}
