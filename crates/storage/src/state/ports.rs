// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Port event handlers (spec.md §4.5 state machine).

use super::MaterializedState;
use crate::event::StoreEvent;
use pal_core::PortStatus;

pub(crate) fn apply(state: &mut MaterializedState, event: &StoreEvent) {
    match event {
        StoreEvent::PortCreated { port } => {
            state.ports.entry(port.id.clone()).or_insert_with(|| (**port).clone());
        }

        StoreEvent::PortStarted { port_id, session_id, at_ms } => {
            if let Some(port) = state.ports.get_mut(port_id.as_str()) {
                if port.status != PortStatus::Running {
                    port.start(session_id.clone(), *at_ms);
                }
            }
        }

        StoreEvent::PortCompleted { port_id, at_ms } => {
            let mut completed = false;
            if let Some(port) = state.ports.get_mut(port_id.as_str()) {
                if port.status != PortStatus::Complete {
                    port.complete(*at_ms);
                    completed = true;
                }
            }
            if completed {
                for dep in state.outgoing_dependencies_mut(port_id) {
                    dep.satisfy();
                }
            }
        }

        StoreEvent::PortBlocked { port_id } => {
            if let Some(port) = state.ports.get_mut(port_id.as_str()) {
                if port.status != PortStatus::Blocked {
                    port.block();
                }
            }
        }

        StoreEvent::PortRetried { port_id } => {
            if let Some(port) = state.ports.get_mut(port_id.as_str()) {
                if port.status == PortStatus::Blocked {
                    port.retry();
                }
            }
        }

        StoreEvent::PortFailed { port_id, at_ms } => {
            if let Some(port) = state.ports.get_mut(port_id.as_str()) {
                if port.status != PortStatus::Failed {
                    port.fail(*at_ms);
                }
            }
        }

        _ => {}
    }
}
