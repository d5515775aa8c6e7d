// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock table event handlers (spec.md §4.2). One row per resource, keyed by
//! the resource string itself.

use super::MaterializedState;
use crate::event::StoreEvent;

pub(crate) fn apply(state: &mut MaterializedState, event: &StoreEvent) {
    match event {
        StoreEvent::LockAcquired { lock } => {
            state.locks.entry(lock.resource.clone()).or_insert_with(|| lock.clone());
        }

        StoreEvent::LockReleased { resource } => {
            state.locks.remove(resource.as_str());
        }

        _ => {}
    }
}
