// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Escalation handlers (spec.md §3/§4.6).

use super::MaterializedState;
use crate::event::StoreEvent;
use pal_core::EscalationStatus;

pub(crate) fn apply(state: &mut MaterializedState, event: &StoreEvent) {
    match event {
        StoreEvent::EscalationCreated { escalation } => {
            state.escalations.entry(escalation.id).or_insert_with(|| (**escalation).clone());
        }

        StoreEvent::EscalationResolved {
            escalation_id,
            resolution,
            resolved_by,
            at_ms,
        } => {
            if let Some(escalation) = state.escalations.get_mut(escalation_id) {
                if escalation.status == EscalationStatus::Open {
                    escalation.resolve(resolution.clone(), resolved_by.clone(), *at_ms);
                }
            }
        }

        StoreEvent::EscalationDismissed {
            escalation_id,
            resolved_by,
            at_ms,
        } => {
            if let Some(escalation) = state.escalations.get_mut(escalation_id) {
                if escalation.status == EscalationStatus::Open {
                    escalation.dismiss(resolved_by.clone(), *at_ms);
                }
            }
        }

        _ => {}
    }
}
