// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline + dependency edge event handlers (spec.md §3/§4.5).

use super::MaterializedState;
use crate::event::StoreEvent;

pub(crate) fn apply(state: &mut MaterializedState, event: &StoreEvent) {
    match event {
        StoreEvent::PipelineCreated { pipeline } => {
            state.pipelines.entry(pipeline.id.clone()).or_insert_with(|| (**pipeline).clone());
        }

        StoreEvent::DependencyAdded { dependency } => {
            let edges = state.dependencies.entry(dependency.port_id.clone()).or_default();
            let exists = edges.iter().any(|d| d.depends_on == dependency.depends_on);
            if !exists {
                edges.push((**dependency).clone());
            }
        }

        StoreEvent::DependencySatisfied { port_id, depends_on } => {
            if let Some(edges) = state.dependencies.get_mut(port_id.as_str()) {
                if let Some(edge) = edges.iter_mut().find(|d| &d.depends_on == depends_on) {
                    edge.satisfy();
                }
            }
        }

        _ => {}
    }
}
