// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Port + dependency scheduler (spec.md §4.5): the port state machine,
//! Kahn's-algorithm topological leveling, and bounded-concurrency parallel
//! dispatch. Grounded on `oj-engine`'s `Scheduler`/`Executor` ownership
//! shape (`crates/engine/src/executor.rs`) and `steps.rs`'s transition
//! helpers, generalized from job steps to dependency-ordered ports.

use pal_core::{Clock, CoreError, Lock, Pipeline, PipelineStatus, Port, PortStatus};
use pal_storage::{MaterializedState, Store, StoreEvent};
use std::collections::{HashSet, VecDeque};

pub struct Scheduler;

impl Scheduler {
    /// `pending -> running` via `port-start`: requires all dependencies
    /// satisfied and no other session owning the port. Optionally acquires
    /// resource locks for the port's declared file regions.
    pub fn start_port<C: Clock>(
        store: &mut Store,
        clock: &C,
        port_id: &str,
        session_id: &str,
    ) -> Result<Port, CoreError> {
        let port = store
            .query(|s| s.get_port(port_id).cloned())
            .ok_or_else(|| CoreError::NotFound { resource: "port", id: port_id.to_string() })?;

        if !port.status.can_transition_to(PortStatus::Running) {
            return Err(CoreError::InvalidTransition { from: port.status.to_string(), to: PortStatus::Running.to_string() });
        }

        let unsatisfied = store.query(|s| {
            s.dependencies
                .get(port_id)
                .map(|edges| edges.iter().any(|e| !e.satisfied))
                .unwrap_or(false)
        });
        if unsatisfied {
            return Err(CoreError::Conflict { reason: format!("port {port_id} has unsatisfied dependencies") });
        }

        let port_lock = Lock::port_resource(port_id);
        let already_locked = store.query(|s| s.locks.get(&port_lock).map(|l| l.session_id.clone()));
        if let Some(owner) = already_locked {
            if owner != session_id {
                return Err(CoreError::AlreadyLocked { owner_session: owner });
            }
        }

        let now = clock.epoch_ms();
        store.commit(StoreEvent::LockAcquired { lock: Lock::new(port_lock, session_id, now) })?;
        for file in &port.declared_file_locks {
            let resource = Lock::file_resource(file);
            if store.query(|s| s.locks.contains_key(&resource)) {
                continue;
            }
            store.commit(StoreEvent::LockAcquired { lock: Lock::new(resource, session_id, now) })?;
        }
        store.commit(StoreEvent::PortStarted { port_id: port_id.to_string(), session_id: session_id.to_string(), at_ms: now })?;
        store.commit(StoreEvent::SessionActivePortSet { session_id: session_id.to_string(), port_id: Some(port_id.to_string()) })?;

        store
            .query(|s| s.get_port(port_id).cloned())
            .ok_or_else(|| CoreError::NotFound { resource: "port", id: port_id.to_string() })
    }

    /// `running -> complete`: writes `completed_at`, satisfies all
    /// outgoing dependency edges in the same transaction (spec.md §4.5
    /// terminal-state invariant), releases the port lock.
    pub fn complete_port<C: Clock>(store: &mut Store, clock: &C, port_id: &str) -> Result<Port, CoreError> {
        let port = store
            .query(|s| s.get_port(port_id).cloned())
            .ok_or_else(|| CoreError::NotFound { resource: "port", id: port_id.to_string() })?;
        if port.status == PortStatus::Complete {
            // `port-end` on an already-complete port is a no-op (spec.md §8).
            return Ok(port);
        }
        if !port.status.can_transition_to(PortStatus::Complete) {
            return Err(CoreError::InvalidTransition { from: port.status.to_string(), to: PortStatus::Complete.to_string() });
        }
        let now = clock.epoch_ms();
        store.commit(StoreEvent::PortCompleted { port_id: port_id.to_string(), at_ms: now })?;
        release_port_locks(store, &port)?;

        store
            .query(|s| s.get_port(port_id).cloned())
            .ok_or_else(|| CoreError::NotFound { resource: "port", id: port_id.to_string() })
    }

    /// `running -> blocked`: checklist gate failure, or owning session
    /// ending abnormally. Per spec.md §9 Open Question, blocking a port
    /// does NOT unsatisfy its upstream dependency edges — a retry does not
    /// re-trigger upstream execution.
    pub fn block_port(store: &mut Store, port_id: &str) -> Result<Port, CoreError> {
        let port = store
            .query(|s| s.get_port(port_id).cloned())
            .ok_or_else(|| CoreError::NotFound { resource: "port", id: port_id.to_string() })?;
        store.commit(StoreEvent::PortBlocked { port_id: port_id.to_string() })?;
        release_port_locks(store, &port)?;
        store
            .query(|s| s.get_port(port_id).cloned())
            .ok_or_else(|| CoreError::NotFound { resource: "port", id: port_id.to_string() })
    }

    /// `running -> failed` (admin mutation, or `timeout` escalation past
    /// retry budget) / `blocked -> failed`.
    pub fn fail_port<C: Clock>(store: &mut Store, clock: &C, port_id: &str) -> Result<Port, CoreError> {
        let port = store
            .query(|s| s.get_port(port_id).cloned())
            .ok_or_else(|| CoreError::NotFound { resource: "port", id: port_id.to_string() })?;
        if !port.status.can_transition_to(PortStatus::Failed) {
            return Err(CoreError::InvalidTransition { from: port.status.to_string(), to: PortStatus::Failed.to_string() });
        }
        store.commit(StoreEvent::PortFailed { port_id: port_id.to_string(), at_ms: clock.epoch_ms() })?;
        release_port_locks(store, &port)?;
        store
            .query(|s| s.get_port(port_id).cloned())
            .ok_or_else(|| CoreError::NotFound { resource: "port", id: port_id.to_string() })
    }

    /// `blocked -> running` on retry: the port becomes claimable again. Does
    /// not touch dependency-satisfaction flags.
    pub fn retry_port(store: &mut Store, port_id: &str) -> Result<(), CoreError> {
        let port = store
            .query(|s| s.get_port(port_id).cloned())
            .ok_or_else(|| CoreError::NotFound { resource: "port", id: port_id.to_string() })?;
        if port.status != PortStatus::Blocked {
            return Err(CoreError::InvalidTransition { from: port.status.to_string(), to: "pending (retry)".to_string() });
        }
        // A retry resets the port to pending so the next `port-start` can
        // re-claim it; this does not touch dependency-satisfaction flags.
        store.commit(StoreEvent::PortRetried { port_id: port_id.to_string() })?;
        Ok(())
    }

    /// Computes topological levels for `pipeline` (Kahn's algorithm): level
    /// 0 is every port with zero unsatisfied in-edges; removing them may
    /// free up the next level, and so on. A cycle in the remaining graph is
    /// a fatal configuration error.
    pub fn topological_levels(state: &MaterializedState, pipeline: &Pipeline) -> Result<Vec<Vec<String>>, CoreError> {
        let port_ids: HashSet<String> = pipeline.port_ids().map(|s| s.to_string()).collect();
        let mut remaining_in_degree: std::collections::HashMap<String, usize> = port_ids
            .iter()
            .map(|id| {
                let missing_or_unsatisfied = state
                    .dependencies
                    .get(id)
                    .map(|edges| edges.iter().filter(|e| port_ids.contains(&e.depends_on) && !e.satisfied).count())
                    .unwrap_or(0);
                (id.clone(), missing_or_unsatisfied)
            })
            .collect();

        // A dependency on a port outside the pipeline that is not already
        // satisfied is a missing-reference configuration error (spec.md §8
        // boundary case), reported as a dependency cycle/critical
        // escalation rather than a silent stall.
        for id in &port_ids {
            if let Some(edges) = state.dependencies.get(id) {
                for edge in edges {
                    if !edge.satisfied && !port_ids.contains(&edge.depends_on) && !state.ports.contains_key(&edge.depends_on) {
                        return Err(CoreError::DependencyCycle { pipeline_id: pipeline.id.clone() });
                    }
                }
            }
        }

        let mut levels = Vec::new();
        let mut processed: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<String> =
            remaining_in_degree.iter().filter(|(_, deg)| **deg == 0).map(|(id, _)| id.clone()).collect();

        while !queue.is_empty() {
            let mut level: Vec<String> = queue.drain(..).collect();
            level.sort_by_key(|id| (pipeline.group_order_of(id).unwrap_or(0), id.clone()));
            for id in &level {
                processed.insert(id.clone());
            }
            for id in &port_ids {
                if processed.contains(id) {
                    continue;
                }
                if let Some(edges) = state.dependencies.get(id) {
                    let still_unsatisfied =
                        edges.iter().filter(|e| port_ids.contains(&e.depends_on) && !processed.contains(&e.depends_on) && !e.satisfied).count();
                    remaining_in_degree.insert(id.clone(), still_unsatisfied);
                    if still_unsatisfied == 0 && !queue.contains(id) {
                        queue.push_back(id.clone());
                    }
                }
            }
            levels.push(level);
        }

        if processed.len() != port_ids.len() {
            return Err(CoreError::DependencyCycle { pipeline_id: pipeline.id.clone() });
        }
        Ok(levels)
    }

    /// Ports eligible to start right now: members of the first
    /// not-yet-complete level whose dependencies are all satisfied and
    /// which are still `pending`, bounded by `max_concurrency` minus the
    /// count already `running`, tie-broken by `group_order` then creation
    /// timestamp (spec.md §4.5 step 2).
    pub fn eligible_to_start(state: &MaterializedState, pipeline: &Pipeline, max_concurrency: u32) -> Vec<String> {
        let running_count = pipeline
            .port_ids()
            .filter(|id| state.get_port(id).map(|p| p.status == PortStatus::Running).unwrap_or(false))
            .count();
        let slots = (max_concurrency as usize).saturating_sub(running_count);
        if slots == 0 {
            return Vec::new();
        }

        let mut candidates: Vec<&Port> = pipeline
            .port_ids()
            .filter_map(|id| state.get_port(id))
            .filter(|p| p.status == PortStatus::Pending)
            .filter(|p| {
                state
                    .dependencies
                    .get(&p.id)
                    .map(|edges| edges.iter().all(|e| e.satisfied))
                    .unwrap_or(true)
            })
            .collect();
        candidates.sort_by_key(|p| (pipeline.group_order_of(&p.id).unwrap_or(0), p.created_at_ms));
        candidates.into_iter().take(slots).map(|p| p.id.clone()).collect()
    }

    /// Pipeline status derives from its ports (spec.md §4.5): `running` if
    /// any port running; `failed` if any port failed; `complete` if all
    /// ports complete; otherwise `pending`.
    pub fn pipeline_status(state: &MaterializedState, pipeline: &Pipeline) -> PipelineStatus {
        let ports: Vec<&Port> = pipeline.port_ids().filter_map(|id| state.get_port(id)).collect();
        if ports.iter().any(|p| p.status == PortStatus::Running) {
            PipelineStatus::Running
        } else if ports.iter().any(|p| p.status == PortStatus::Failed) {
            PipelineStatus::Failed
        } else if !ports.is_empty() && ports.iter().all(|p| p.status == PortStatus::Complete) {
            PipelineStatus::Complete
        } else {
            PipelineStatus::Pending
        }
    }
}

fn release_port_locks(store: &mut Store, port: &Port) -> Result<(), CoreError> {
    let port_lock = Lock::port_resource(&port.id);
    if store.query(|s| s.locks.contains_key(&port_lock)) {
        store.commit(StoreEvent::LockReleased { resource: port_lock })?;
    }
    for file in &port.declared_file_locks {
        let resource = Lock::file_resource(file);
        if store.query(|s| s.locks.contains_key(&resource)) {
            store.commit(StoreEvent::LockReleased { resource })?;
        }
    }
    if let Some(owner) = &port.owner_session {
        let still_active = store.query(|s| s.get_session(owner).and_then(|sess| sess.active_port.clone())) == Some(port.id.clone());
        if still_active {
            store.commit(StoreEvent::SessionActivePortSet { session_id: owner.clone(), port_id: None })?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
