// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hook dispatcher (SPEC_FULL.md §4.7): the handler behind every `pal hook
//! <event>` invocation, whether run embedded by `pal-cli` or forwarded to
//! this daemon over HTTP.
//!
//! Each hook locates or creates the session, applies its effect in one or
//! two store commits, and returns the wire-level `HookOutput` alongside the
//! events it published. Per-session serialization follows the teacher's
//! `Arc<Mutex<..>>`-per-key registry convention from `executor.rs`: a
//! `tokio::sync::Mutex` keyed by session ID, guarded by a `parking_lot::
//! Mutex` so acquiring the per-session lock itself never blocks on async
//! I/O.

use pal_core::{Clock, Config, CoreError, Effect, Escalation, EscalationType, Event, EventKind, MessageType, Severity, TrackingMode};
use pal_engine::{attention, Attention, DirectChannelManager, EscalationManager, Runtime, Scheduler, SessionManager, DEFAULT_FEEDBACK_RETRY_BUDGET};
use pal_wire::hook::HookEvent;
use pal_wire::{HookInput, HookOutput, HookSpecificOutput};
use parking_lot::Mutex as SyncMutex;
use std::collections::HashMap;
use std::io::BufRead;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;

/// Tools treated as file-editing for the "edit without active port"
/// warning (spec.md §4.7).
const WRITE_TOOLS: &[&str] = &["Edit", "Write", "MultiEdit", "NotebookEdit"];
/// Tools treated as subagent spawns, producing a child session
/// (spec.md §4.7 `post-tool-use`).
const SUBAGENT_TOOLS: &[&str] = &["Task"];
const BUILD_TOOLS: &[&str] = &["Bash"];

/// A dispatched hook invocation. `port_id` comes from the CLI's own
/// `pal hook port-start <port-id>` / `port-end <port-id>` argument, not the
/// Claude Code hook JSON schema, which has no port concept.
pub struct HookRequest {
    pub input: HookInput,
    pub port_id: Option<String>,
}

pub struct HookDispatcher<C: Clock> {
    runtime: Arc<Runtime<C>>,
    config: Config,
    clock: C,
    session_locks: SyncMutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl<C: Clock + Clone> HookDispatcher<C> {
    pub fn new(runtime: Arc<Runtime<C>>, config: Config, clock: C) -> Self {
        Self { runtime, config, clock, session_locks: SyncMutex::new(HashMap::new()) }
    }

    fn lock_for(&self, session_id: &str) -> Arc<AsyncMutex<()>> {
        self.session_locks.lock().entry(session_id.to_string()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
    }

    pub async fn dispatch(&self, request: HookRequest) -> Result<HookOutput, CoreError> {
        let event = request.input.event().ok_or_else(|| CoreError::ConfigInvalid {
            message: format!("unrecognized hook_event_name: {}", request.input.hook_event_name),
        })?;

        // Serialize every commit against this correlation ID's session so
        // concurrent hook invocations never race attention thresholds or
        // usage updates against each other.
        let guard_key = request.input.session_id.clone();
        let lock = self.lock_for(&guard_key);
        let _permit = lock.lock().await;

        // `notification_type`/`message` ride on the generic hook input
        // regardless of `hook_event_name` (spec.md §6), so the `quality`
        // trigger (spec.md §4.6: "explicit, from hook `quality_warning`")
        // is checked once up front rather than duplicated per handler.
        if request.input.notification_type.as_deref() == Some("quality_warning") {
            self.escalate_quality(&request.input).await?;
        }

        match event {
            HookEvent::SessionStart => self.session_start(request.input).await,
            HookEvent::SessionEnd => self.session_end(request.input).await,
            HookEvent::PreToolUse => self.pre_tool_use(request.input).await,
            HookEvent::PostToolUse => self.post_tool_use(request.input).await,
            HookEvent::PreCompact => self.pre_compact(request.input).await,
            HookEvent::Stop => self.stop(request.input).await,
            HookEvent::PortStart => self.port_start(request.input, request.port_id).await,
            HookEvent::PortEnd => self.port_end(request.input, request.port_id).await,
        }
    }

    fn find_session(&self, correlation_id: &str) -> Option<pal_core::Session> {
        self.runtime.store().lock().query(|s| s.find_by_claude_session_id(correlation_id).cloned())
    }

    async fn session_start(&self, input: HookInput) -> Result<HookOutput, CoreError> {
        let session = match self.find_session(&input.session_id) {
            Some(session) => session,
            None => {
                let config = pal_core::SessionConfig::builder(format!("ses-{}", nanoid::nanoid!(16)))
                    .title(input.cwd.clone())
                    .cwd(input.cwd.clone())
                    .project_root(input.cwd.clone())
                    .project_name(project_name_of(&input.cwd))
                    .token_budget(self.config.attention.token_budget_default)
                    .claude_session_id(input.session_id.clone())
                    .build();
                let mut store = self.runtime.store().lock();
                SessionManager::start_hierarchical(&mut store, &self.clock, config)?
            }
        };

        self.publish(Event::new(EventKind::SessionStart, self.clock.epoch_ms(), serde_json::json!({ "session_id": session.id })).with_session(session.id.clone()))
            .await;

        Ok(HookOutput::approve())
    }

    /// `session-end` (spec.md §4.3 termination semantics): terminates the
    /// session carrying this correlation ID. `input.reason` names the
    /// terminal status (`complete`/`failed`/`blocked`), defaulting to
    /// `complete` for a plain `pal hook session-end` with no reason given;
    /// `input.message`, if present, becomes the output summary.
    async fn session_end(&self, input: HookInput) -> Result<HookOutput, CoreError> {
        let Some(session) = self.find_session(&input.session_id) else {
            // Nothing to terminate -- idempotent no-op rather than a
            // NotFound, mirroring `port-end` on an already-complete port.
            return Ok(HookOutput::approve());
        };

        let status = match input.reason.as_deref() {
            Some("failed") => pal_core::SessionStatus::Failed,
            Some("blocked") => pal_core::SessionStatus::Blocked,
            _ => pal_core::SessionStatus::Complete,
        };
        let summary = input.message.clone().map(serde_json::Value::String);

        {
            let mut store = self.runtime.store().lock();
            SessionManager::end_with_summary(&mut store, &self.clock, &session.id, status, summary)?;
        }

        self.publish(Event::new(EventKind::SessionEnd, self.clock.epoch_ms(), serde_json::json!({ "status": status.to_string() }))
            .with_session(session.id.clone()))
            .await;

        Ok(HookOutput::approve())
    }

    async fn pre_tool_use(&self, input: HookInput) -> Result<HookOutput, CoreError> {
        let Some(mut session) = self.find_session(&input.session_id) else {
            return Ok(HookOutput::approve());
        };

        // `tool_response` is empty on `pre-tool-use` (the tool has not run
        // yet); usage comes from what the model itself reported on its last
        // turn, read back out of the transcript.
        let usage = usage_from_transcript(&input.transcript_path);
        if let Some(usage) = usage {
            let mut store = self.runtime.store().lock();
            SessionManager::update_usage(
                &mut store,
                &session.id,
                usage.input_tokens,
                usage.output_tokens,
                usage.cache_read_tokens,
                usage.cache_create_tokens,
                usage.cost_usd,
            )?;
            session = store.query(|s| s.get_session(&session.id).cloned()).unwrap_or(session);
        }

        let (recent_port_title, edited_files) = {
            let store = self.runtime.store().lock();
            store.query(|s| {
                (
                    attention::active_port_title(s, &session),
                    s.attention.get(&session.id).map(|row| row.loaded_files.clone()).unwrap_or_default(),
                )
            })
        };

        let (crossings, ratio) = {
            let mut store = self.runtime.store().lock();
            Attention::observe_usage(
                &mut store,
                &self.clock,
                &session,
                self.config.attention.warn_ratio,
                self.config.attention.critical_ratio,
                recent_port_title.as_deref(),
                edited_files,
            )?
        };

        let mut notifications = Vec::new();
        for crossing in crossings {
            notifications.push(serde_json::Value::String(format!("attention threshold crossed: {:?}", crossing.event_kind)));
            self.publish(Event::new(
                crossing.event_kind,
                self.clock.epoch_ms(),
                serde_json::json!({ "checkpoint_id": crossing.checkpoint.id, "ratio": ratio }),
            ).with_session(session.id.clone()))
            .await;
        }

        if EscalationManager::check_token_exhausted(&session, self.config.attention.escalate_ratio)
            && !self.has_open_escalation(&session.id, EscalationType::TokenExhausted)
        {
            self.create_escalation(
                &session.id,
                session.active_port.clone(),
                EscalationType::TokenExhausted,
                None,
                format!("token usage at {:.0}% of budget", ratio * 100.0),
            )
            .await?;
        }

        if let Some(port_id) = session.active_port.clone() {
            let port = self.runtime.store().lock().query(|s| s.get_port(&port_id).cloned());
            if let Some(port) = port {
                if EscalationManager::check_timeout(&port, self.clock.epoch_ms())
                    && !self.has_open_escalation(&session.id, EscalationType::Timeout)
                {
                    self.create_escalation(
                        &session.id,
                        Some(port_id),
                        EscalationType::Timeout,
                        None,
                        format!("port {} exceeded its timeout", port.title),
                    )
                    .await?;
                }
            }
        }

        let editing_without_port = input
            .tool_name
            .as_deref()
            .is_some_and(|name| WRITE_TOOLS.contains(&name))
            && session.active_port.is_none();

        if editing_without_port && self.config.tracking.mode != TrackingMode::Off {
            let reason = "editing without an active port — start one with `pal port start` first".to_string();
            return Ok(match self.config.tracking.mode {
                TrackingMode::Strict => HookOutput::block(reason),
                TrackingMode::Warn => HookOutput::approve().with_specific(HookSpecificOutput {
                    notifications: vec![serde_json::Value::String(reason)],
                    ..Default::default()
                }),
                TrackingMode::Off => unreachable!(),
            });
        }

        Ok(HookOutput::approve().with_specific(HookSpecificOutput { notifications, ..Default::default() }))
    }

    async fn post_tool_use(&self, input: HookInput) -> Result<HookOutput, CoreError> {
        let Some(session) = self.find_session(&input.session_id) else {
            return Ok(HookOutput::approve());
        };

        {
            let mut store = self.runtime.store().lock();
            SessionManager::log_event(
                &mut store,
                &self.clock,
                &session.id,
                "tool_use",
                serde_json::json!({ "tool_name": input.tool_name, "tool_input": input.tool_input }),
            )?;
        }

        if let Some(tool_name) = input.tool_name.as_deref() {
            if WRITE_TOOLS.contains(&tool_name) {
                if let Some(path) = input.tool_input.as_ref().and_then(|v| v.get("file_path")).and_then(|v| v.as_str()) {
                    let mut store = self.runtime.store().lock();
                    Attention::record_file_touched(&mut store, &session.id, path)?;
                }
            }

            if BUILD_TOOLS.contains(&tool_name) {
                if let Some(failed) = tool_response_failed(input.tool_response.as_ref()) {
                    let kind = if failed.is_test { EventKind::TestFailed } else { EventKind::BuildFailed };
                    self.publish(Event::new(kind, self.clock.epoch_ms(), serde_json::json!({ "detail": failed.detail.clone() }))
                        .with_session(session.id.clone()))
                        .await;

                    if failed.is_test {
                        self.handle_test_failure(&session, &failed.detail).await?;
                    } else {
                        self.create_escalation(
                            &session.id,
                            session.active_port.clone(),
                            EscalationType::TestFailure,
                            None,
                            failed.detail,
                        )
                        .await?;
                    }
                }
            }

            if SUBAGENT_TOOLS.contains(&tool_name) {
                let child_config = pal_core::SessionConfig::builder(format!("ses-{}", nanoid::nanoid!(16)))
                    .title(format!("{} subagent", session.title))
                    .cwd(session.cwd.clone())
                    .project_root(session.project_root.clone())
                    .project_name(session.project_name.clone())
                    .token_budget(self.config.attention.token_budget_default)
                    .parent_id(session.id.clone())
                    .build();
                let child = {
                    let mut store = self.runtime.store().lock();
                    SessionManager::start_hierarchical(&mut store, &self.clock, child_config)?
                };
                self.publish(Event::new(EventKind::SessionStart, self.clock.epoch_ms(), serde_json::json!({ "session_id": child.id, "parent_id": session.id }))
                    .with_session(child.id))
                    .await;
            }
        }

        Ok(HookOutput::approve())
    }

    async fn pre_compact(&self, input: HookInput) -> Result<HookOutput, CoreError> {
        let Some(session) = self.find_session(&input.session_id) else {
            return Ok(HookOutput::approve());
        };

        let reason = input.reason.clone().unwrap_or_else(|| "manual".to_string());
        {
            let mut store = self.runtime.store().lock();
            Attention::record_compact(&mut store, &self.clock, &session, &reason)?;
            SessionManager::increment_compact(&mut store, &self.clock, &session.id)?;
        }

        self.publish(Event::new(EventKind::CompactTriggered, self.clock.epoch_ms(), serde_json::json!({ "reason": reason }))
            .with_session(session.id.clone()))
            .await;

        let context = self.runtime.store().lock().query(|s| Attention::recovery_context(s, &session.id));
        Ok(HookOutput::approve().with_specific(HookSpecificOutput { context, ..Default::default() }))
    }

    async fn stop(&self, input: HookInput) -> Result<HookOutput, CoreError> {
        let Some(session) = self.find_session(&input.session_id) else {
            return Ok(HookOutput::approve());
        };

        {
            let mut store = self.runtime.store().lock();
            SessionManager::log_event(&mut store, &self.clock, &session.id, "stop", serde_json::Value::Null)?;
        }

        self.publish(Event::new(EventKind::SessionUpdate, self.clock.epoch_ms(), serde_json::json!({ "stopped": true }))
            .with_session(session.id.clone()))
            .await;

        Ok(HookOutput::approve())
    }

    async fn port_start(&self, input: HookInput, port_id: Option<String>) -> Result<HookOutput, CoreError> {
        let port_id = port_id.ok_or_else(|| CoreError::NotFound { resource: "port", id: String::new() })?;
        let session = self.find_session(&input.session_id).ok_or_else(|| CoreError::NotFound {
            resource: "session",
            id: input.session_id.clone(),
        })?;

        let port = {
            let mut store = self.runtime.store().lock();
            Scheduler::start_port(&mut store, &self.clock, &port_id, &session.id)?
        };

        self.publish(Event::new(EventKind::PortStart, self.clock.epoch_ms(), serde_json::json!({ "port_id": port.id }))
            .with_session(session.id.clone())
            .with_port(port.id.clone()))
            .await;

        let context = serde_json::to_value(&port).unwrap_or(serde_json::Value::Null);
        Ok(HookOutput::approve().with_specific(HookSpecificOutput { context: Some(context), ..Default::default() }))
    }

    async fn port_end(&self, input: HookInput, port_id: Option<String>) -> Result<HookOutput, CoreError> {
        let port_id = port_id.ok_or_else(|| CoreError::NotFound { resource: "port", id: String::new() })?;
        let session = self.find_session(&input.session_id).ok_or_else(|| CoreError::NotFound {
            resource: "session",
            id: input.session_id.clone(),
        })?;

        match self
            .runtime
            .execute(Effect::RunChecklistGate { port_id: port_id.clone(), project_root: session.project_root.clone() })
            .await
        {
            Ok(()) => Ok(HookOutput::approve()),
            Err(pal_engine::RuntimeError::Store(CoreError::ChecklistFailed { port_id, failures })) => {
                let reason = format!("checklist gate failed for port {port_id}: {} failing step(s)", failures.len());
                Ok(HookOutput::block(reason))
            }
            Err(pal_engine::RuntimeError::Store(err)) => Err(err),
            Err(pal_engine::RuntimeError::Persist { path, source }) => {
                Err(CoreError::Storage { message: format!("failed to persist summary at {path}: {source}") })
            }
        }
    }

    /// The `test_failure` retry loop (spec.md §4.6): on the active port's
    /// direct channel to a paired worker, the first `DEFAULT_FEEDBACK_RETRY_BUDGET`
    /// failures go back to that worker as `feedback` messages rather than
    /// escalating. Only once the budget is exhausted — or there's no paired
    /// channel to feed back on — does this become a `test_failure`
    /// escalation to the nearest running ancestor.
    async fn handle_test_failure(&self, session: &pal_core::Session, detail: &str) -> Result<(), CoreError> {
        let channel = session.active_port.as_ref().and_then(|port_id| {
            self.runtime.store().lock().query(|s| {
                s.direct_channels
                    .values()
                    .find(|c| {
                        c.status == pal_core::ChannelStatus::Active
                            && c.port_id.as_deref() == Some(port_id.as_str())
                            && c.has_participant(&session.id)
                    })
                    .cloned()
            })
        });

        let Some(channel) = channel else {
            self.create_escalation(&session.id, session.active_port.clone(), EscalationType::TestFailure, None, detail.to_string()).await?;
            return Ok(());
        };

        let retries_sent = self.runtime.store().lock().query(|s| {
            s.direct_messages
                .values()
                .filter(|m| m.channel_id == channel.id && m.from_session == session.id && m.message_type == MessageType::Feedback)
                .count() as u32
        });

        if retries_sent >= DEFAULT_FEEDBACK_RETRY_BUDGET {
            self.create_escalation(&session.id, session.active_port.clone(), EscalationType::TestFailure, None, detail.to_string()).await?;
            return Ok(());
        }

        let message = {
            let mut store = self.runtime.store().lock();
            DirectChannelManager::send(
                &mut store,
                &self.clock,
                channel.id,
                &session.id,
                MessageType::Feedback,
                serde_json::json!({ "retry": retries_sent + 1, "failing_tests": detail }),
            )?
        };

        self.publish(
            Event::new(
                EventKind::WorkerFeedback,
                self.clock.epoch_ms(),
                serde_json::json!({ "message_id": message.id, "retry": retries_sent + 1 }),
            )
            .with_session(session.id.clone()),
        )
        .await;
        Ok(())
    }

    /// `quality` trigger (spec.md §4.6): explicit, carried on the hook's
    /// own `message`/`notification_type` rather than derived from a
    /// predicate like the other automatic triggers.
    async fn escalate_quality(&self, input: &HookInput) -> Result<(), CoreError> {
        let Some(session) = self.find_session(&input.session_id) else {
            return Ok(());
        };
        let issue = input.message.clone().unwrap_or_else(|| "quality warning".to_string());
        self.create_escalation(&session.id, session.active_port.clone(), EscalationType::Quality, Some(Severity::Medium), issue).await?;
        Ok(())
    }

    /// True if `session_id` already carries an unresolved escalation of
    /// `escalation_type` — guards the `token_exhausted`/`timeout` triggers,
    /// which are re-evaluated on every hook call, against re-escalating the
    /// same condition each time.
    fn has_open_escalation(&self, session_id: &str, escalation_type: EscalationType) -> bool {
        self.runtime.store().lock().query(|s| {
            s.escalations
                .values()
                .any(|e| e.session_id == session_id && e.escalation_type == escalation_type && e.status == pal_core::EscalationStatus::Open)
        })
    }

    /// Creates an escalation and, if a running ancestor exists, publishes
    /// `EscalationCreated` scoped to it (spec.md §4.6).
    async fn create_escalation(
        &self,
        session_id: &str,
        port_id: Option<String>,
        escalation_type: EscalationType,
        severity: Option<Severity>,
        issue: impl Into<String>,
    ) -> Result<Escalation, CoreError> {
        let (escalation, ancestor) = {
            let mut store = self.runtime.store().lock();
            let escalation =
                EscalationManager::create(&mut store, &self.clock, session_id, port_id, escalation_type, severity, issue, None, serde_json::Value::Null)?;
            let ancestor = EscalationManager::nearest_running_ancestor(&store.query(|s| s.clone()), session_id);
            (escalation, ancestor)
        };
        if let Some(ancestor) = ancestor {
            self.publish(
                Event::new(EventKind::EscalationCreated, self.clock.epoch_ms(), serde_json::json!({ "escalation_id": escalation.id }))
                    .with_session(ancestor),
            )
            .await;
        }
        Ok(escalation)
    }

    /// Publishes an event via the runtime's `Effect::Emit` (spec.md §4.8).
    /// Has no failure mode worth surfacing to the hook response.
    async fn publish(&self, event: Event) {
        let _ = self.runtime.execute(Effect::Emit { event }).await;
    }
}

struct UsageDelta {
    input_tokens: u64,
    output_tokens: u64,
    cache_read_tokens: u64,
    cache_create_tokens: u64,
    cost_usd: f64,
}

/// Reads the most recent assistant turn's `usage` object back out of the
/// session's transcript JSONL (spec.md §4.4/§4.7). `tool_response` carries
/// no usage on `pre-tool-use` — the tool hasn't run yet — so this is the
/// only source of the model's own token accounting at that point. Grounded
/// on the teacher's `extract_last_assistant_text` (`cli/src/commands/
/// agent/hooks.rs`): scan the last 50 lines in reverse, skip anything that
/// doesn't parse or isn't an assistant-type record, and stop at the first
/// one with a `usage` field.
fn usage_from_transcript(transcript_path: &str) -> Option<UsageDelta> {
    if transcript_path.is_empty() {
        return None;
    }
    let file = std::fs::File::open(transcript_path).ok()?;
    let reader = std::io::BufReader::new(file);
    let lines: Vec<String> = reader.lines().map_while(Result::ok).collect();

    lines.iter().rev().take(50).find_map(|line| {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }
        let record: serde_json::Value = serde_json::from_str(trimmed).ok()?;
        if record.get("type").and_then(|v| v.as_str()) != Some("assistant") {
            return None;
        }
        let usage = record.get("message")?.get("usage")?;
        Some(UsageDelta {
            input_tokens: usage.get("input_tokens").and_then(|v| v.as_u64()).unwrap_or(0),
            output_tokens: usage.get("output_tokens").and_then(|v| v.as_u64()).unwrap_or(0),
            cache_read_tokens: usage.get("cache_read_input_tokens").and_then(|v| v.as_u64()).unwrap_or(0),
            cache_create_tokens: usage.get("cache_creation_input_tokens").and_then(|v| v.as_u64()).unwrap_or(0),
            cost_usd: usage.get("cost_usd").and_then(|v| v.as_f64()).unwrap_or(0.0),
        })
    })
}

struct ToolFailure {
    detail: String,
    is_test: bool,
}

fn tool_response_failed(tool_response: Option<&serde_json::Value>) -> Option<ToolFailure> {
    let response = tool_response?;
    let exit_code = response.get("exit_code")?.as_i64()?;
    if exit_code == 0 {
        return None;
    }
    let command = response.get("command").and_then(|v| v.as_str()).unwrap_or("");
    let is_test = command.contains("test");
    let stderr = response.get("stderr").and_then(|v| v.as_str()).unwrap_or("");
    Some(ToolFailure { detail: stderr.to_string(), is_test })
}

fn project_name_of(cwd: &str) -> String {
    std::path::Path::new(cwd)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(cwd)
        .to_string()
}

#[cfg(test)]
#[path = "hooks_tests.rs"]
mod tests;
