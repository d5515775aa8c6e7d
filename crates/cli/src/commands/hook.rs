// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pal hook {session-start|session-end|pre-tool-use|post-tool-use|stop|
//! pre-compact|port-start|port-end|sync}` (SPEC_FULL.md §4.7, §6).
//!
//! Reads the hook JSON record from stdin, dispatches it (forwarding to a
//! running `pald` over `POST /api/v2/hooks/:event` when reachable, else
//! embedded against a one-shot `Runtime`), writes the hook response JSON
//! to stdout, and advisory human-readable lines to stderr -- one per
//! notification, each prefixed with an emoji and `[PAL Kit]` per the wire
//! contract in spec.md §6. The process exit code is the hook's own
//! (0 approve, 1 block) rather than a generic command exit code, since the
//! host assistant branches on it directly.
//!
//! `sync` is not one of the seven events `pal-wire::HookEvent` recognizes
//! -- spec.md §6 lists it in the CLI surface without describing an effect
//! elsewhere in the spec, so it is treated here as a pure readiness probe:
//! it opens and closes the store (proving `.pal/` is initialized and
//! readable) and always approves. A host assistant can run it once at
//! startup to fail fast on a broken project directory before any real hook
//! fires.

use crate::color;
use crate::context::Context;
use crate::exit_error::ExitError;
use clap::{Args, Subcommand};
use pal_core::SystemClock;
use pal_daemon::hooks::{HookDispatcher, HookRequest};
use pal_wire::hook::HookEvent;
use pal_wire::{Decision, HookInput, HookOutput};
use std::io::Read;
use std::sync::Arc;

#[derive(Args)]
pub struct HookArgs {
    #[command(subcommand)]
    pub action: HookAction,
}

#[derive(Subcommand)]
pub enum HookAction {
    SessionStart,
    SessionEnd,
    PreToolUse,
    PostToolUse,
    PreCompact,
    Stop,
    /// Requires `--port`.
    PortStart {
        #[arg(long)]
        port: String,
    },
    /// Requires `--port`.
    PortEnd {
        #[arg(long)]
        port: String,
    },
    /// Readiness probe: opens and closes the store, always approves.
    Sync,
}

pub async fn run(ctx: &Context, action: HookAction) -> Result<(), ExitError> {
    if let HookAction::Sync = action {
        return sync(ctx);
    }

    let (event, port_id) = match action {
        HookAction::SessionStart => (HookEvent::SessionStart, None),
        HookAction::SessionEnd => (HookEvent::SessionEnd, None),
        HookAction::PreToolUse => (HookEvent::PreToolUse, None),
        HookAction::PostToolUse => (HookEvent::PostToolUse, None),
        HookAction::PreCompact => (HookEvent::PreCompact, None),
        HookAction::Stop => (HookEvent::Stop, None),
        HookAction::PortStart { port } => (HookEvent::PortStart, Some(port)),
        HookAction::PortEnd { port } => (HookEvent::PortEnd, Some(port)),
        HookAction::Sync => unreachable!("handled above"),
    };

    let mut input = read_input()?;
    input.hook_event_name = event.as_str().to_string();

    let output = if let Some(discovery) = ctx.daemon() {
        forward(ctx, discovery, event, input, port_id.clone()).await?
    } else {
        dispatch_embedded(ctx, input, port_id.clone()).await?
    };

    emit_advisories(&output);
    println!("{}", serde_json::to_string(&output).unwrap_or_else(|_| "{}".to_string()));

    let exit_code = output.exit_code();
    if exit_code != 0 {
        return Err(ExitError::new(exit_code, output.reason.clone().unwrap_or_else(|| "hook blocked".to_string())));
    }
    Ok(())
}

fn read_input() -> Result<HookInput, ExitError> {
    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf).map_err(|e| ExitError::new(2, format!("failed to read hook input: {e}")))?;
    serde_json::from_str(&buf).map_err(|e| ExitError::new(2, format!("invalid hook input JSON: {e}")))
}

async fn forward(
    ctx: &Context,
    discovery: pal_daemon::Discovery,
    event: HookEvent,
    input: HookInput,
    port_id: Option<String>,
) -> Result<HookOutput, ExitError> {
    #[derive(serde::Serialize)]
    struct Body {
        input: HookInput,
        port_id: Option<String>,
    }
    let url = format!("{}/api/v2/hooks/{}", discovery.base_url(), event.as_str());
    let response = ctx
        .client()
        .post(&url)
        .json(&Body { input, port_id })
        .send()
        .await
        .map_err(|e| ExitError::new(3, format!("failed to reach daemon: {e}")))?;
    if !response.status().is_success() {
        return Err(crate::problem::response_to_exit_error(response).await);
    }
    response.json().await.map_err(|e| ExitError::new(3, format!("failed to parse daemon response: {e}")))
}

async fn dispatch_embedded(ctx: &Context, input: HookInput, port_id: Option<String>) -> Result<HookOutput, ExitError> {
    let runtime = Arc::new(ctx.open_runtime()?);
    let dispatcher = HookDispatcher::new(runtime.clone(), ctx.config.clone(), SystemClock);
    let result = dispatcher.dispatch(HookRequest { input, port_id }).await;
    runtime.store().lock().close().map_err(|e| ExitError::new(3, format!("failed to flush store: {e}")))?;
    result.map_err(|e| ExitError::new(e.exit_code(), e.to_string()))
}

fn sync(ctx: &Context) -> Result<(), ExitError> {
    let store = ctx.open_store()?;
    ctx.close_store(store)?;
    let output = HookOutput::approve();
    println!("{}", serde_json::to_string(&output).unwrap_or_else(|_| "{}".to_string()));
    Ok(())
}

/// Writes one advisory line per notification, emoji-prefixed per spec.md
/// §6's `[PAL Kit]` wire convention. A blocking decision's `reason` is
/// always surfaced even with no `notifications` entries.
fn emit_advisories(output: &HookOutput) {
    if let Some(reason) = &output.reason {
        if output.decision == Some(Decision::Block) || output.decision == Some(Decision::Deny) {
            eprintln!("{} [PAL Kit] {}", color::muted("\u{1f6d1}"), reason);
        }
    }
    if let Some(specific) = &output.hook_specific_output {
        for notification in &specific.notifications {
            let text = notification.as_str().map(str::to_string).unwrap_or_else(|| notification.to_string());
            eprintln!("{} [PAL Kit] {}", color::context("\u{2139}\u{fe0f}"), text);
        }
    }
}

#[cfg(test)]
#[path = "hook_tests.rs"]
mod tests;
