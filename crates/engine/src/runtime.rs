// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Effect runtime: the single place every `pal_core::Effect` a hook or
//! command produces gets executed, with structured `tracing` spans timing
//! each one. Grounded on `oj-engine`'s `Executor::execute` (the
//! start/elapsed_ms/verbose-branch logging shape in
//! `crates/engine/src/executor.rs`), generalized from the teacher's
//! agent/workspace/shell effect set to PAL Kit's own: SSE publication, lock
//! acquisition, the checklist gate, direct-message and escalation
//! notification, and summary persistence.

use crate::checklist::Checklist;
use pal_core::{Clock, CoreError, Effect, Event, EventKind, Lock};
use pal_storage::{Store, StoreEvent};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;

/// Errors raised while executing an effect. Distinct from `CoreError`
/// (domain-rule violations) because effects can also fail on I/O that has
/// no domain meaning (a summary file write, a checklist subprocess).
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("store error: {0}")]
    Store(#[from] CoreError),
    #[error("failed to persist summary at {path}: {source}")]
    Persist { path: String, source: std::io::Error },
}

/// Executes effects against a shared store and fans published events out
/// over a broadcast channel (one SSE connection subscribes per client,
/// spec.md §4.8).
pub struct Runtime<C: Clock> {
    store: Arc<Mutex<Store>>,
    clock: C,
    events: broadcast::Sender<Event>,
}

impl<C: Clock> Runtime<C> {
    pub fn new(store: Arc<Mutex<Store>>, clock: C) -> Self {
        let (events, _) = broadcast::channel(1024);
        Self { store, clock, events }
    }

    /// Subscribe to the published-event stream (one receiver per SSE
    /// client connection).
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    pub fn store(&self) -> Arc<Mutex<Store>> {
        Arc::clone(&self.store)
    }

    /// Execute a single effect with tracing, mirroring the start/elapsed_ms
    /// logging shape the teacher applies to every effect kind uniformly.
    pub async fn execute(&self, effect: Effect) -> Result<(), RuntimeError> {
        let info = {
            let fields = effect.fields();
            let cap = fields.iter().map(|(a, b)| a.len() + b.len() + 2).sum();
            let mut fmt = String::with_capacity(cap);
            for (key, val) in fields {
                fmt.push_str(key);
                fmt.push('=');
                fmt.push_str(&val);
                fmt.push(' ');
            }
            fmt.pop();
            fmt
        };

        let op = effect.name();
        let verbose = effect.verbose();
        if verbose {
            tracing::info!("executing effect={} {}", op, info);
        }

        let start = std::time::Instant::now();
        let result = self.execute_inner(effect).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;
        if verbose {
            match &result {
                Ok(()) => tracing::info!(elapsed_ms, "completed"),
                Err(e) => tracing::error!(error = %e, elapsed_ms, "failed"),
            }
        } else {
            match &result {
                Ok(()) => tracing::debug!(elapsed_ms, "executed effect={} {}", op, info),
                Err(e) => tracing::error!(error = %e, elapsed_ms, "error effect={} {}", op, info),
            }
        }
        result
    }

    /// Execute every effect in order, stopping at the first error.
    pub async fn execute_all(&self, effects: Vec<Effect>) -> Result<(), RuntimeError> {
        for effect in effects {
            self.execute(effect).await?;
        }
        Ok(())
    }

    async fn execute_inner(&self, effect: Effect) -> Result<(), RuntimeError> {
        match effect {
            Effect::Emit { event } => {
                // Published after the mutation that produced it has already
                // been committed to the WAL by the manager that raised this
                // effect; broadcasting has no failure mode worth surfacing
                // (no subscribers is the common case, not an error).
                let _ = self.events.send(event);
                Ok(())
            }

            Effect::AcquireLock { resource, session_id } => {
                let mut store = self.store.lock();
                let owner = store.query(|s| s.locks.get(&resource).map(|l| l.session_id.clone()));
                if let Some(owner) = owner {
                    if owner != session_id {
                        return Err(RuntimeError::Store(CoreError::AlreadyLocked { owner_session: owner }));
                    }
                    return Ok(());
                }
                let now = self.clock.epoch_ms();
                store.commit(StoreEvent::LockAcquired { lock: Lock::new(resource, session_id, now) })?;
                Ok(())
            }

            Effect::ReleaseLock { resource } => {
                let mut store = self.store.lock();
                if store.query(|s| s.locks.contains_key(&resource)) {
                    store.commit(StoreEvent::LockReleased { resource })?;
                }
                Ok(())
            }

            Effect::RunChecklistGate { port_id, project_root } => {
                let report = Checklist::run(&port_id, Path::new(&project_root)).await;
                let now = self.clock.epoch_ms();
                let kind = if report.passed { EventKind::ChecklistPassed } else { EventKind::ChecklistFailed };
                let data = serde_json::json!({
                    "port_id": port_id.clone(),
                    "passed": report.passed,
                    "duration_ms": report.duration_ms,
                    "steps": report.steps.iter().map(|s| serde_json::json!({
                        "step": s.step,
                        "command": s.command,
                        "passed": s.passed,
                        "exit_code": s.exit_code,
                    })).collect::<Vec<_>>(),
                });

                {
                    let mut store = self.store.lock();
                    if report.passed {
                        crate::scheduler::Scheduler::complete_port(&mut store, &self.clock, &port_id)?;
                    } else {
                        crate::scheduler::Scheduler::block_port(&mut store, &port_id)?;
                    }
                }

                let failures = if report.passed { Vec::new() } else { report.into_failures() };
                let _ = self.events.send(Event::new(kind, now, data).with_port(port_id.clone()));
                if !failures.is_empty() {
                    return Err(RuntimeError::Store(CoreError::ChecklistFailed { port_id, failures }));
                }
                Ok(())
            }

            Effect::DeliverDirectMessage { channel_id, message_id, to_session } => {
                tracing::info!(%channel_id, %message_id, %to_session, "direct message pending delivery");
                let now = self.clock.epoch_ms();
                let data = serde_json::json!({ "channel_id": channel_id, "message_id": message_id });
                let _ = self.events.send(Event::new(EventKind::DirectMessage, now, data).with_session(to_session));
                Ok(())
            }

            Effect::ReportEscalation { escalation_id, ancestor_session } => {
                tracing::warn!(%escalation_id, %ancestor_session, "escalation reported");
                let now = self.clock.epoch_ms();
                let data = serde_json::json!({ "escalation_id": escalation_id, "ancestor_session": ancestor_session });
                let _ = self
                    .events
                    .send(Event::new(EventKind::EscalationCreated, now, data).with_session(ancestor_session));
                Ok(())
            }

            Effect::PersistSummary { session_id: _, path, contents } => {
                tokio::fs::write(&path, contents)
                    .await
                    .map_err(|source| RuntimeError::Persist { path, source })
            }
        }
    }
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
