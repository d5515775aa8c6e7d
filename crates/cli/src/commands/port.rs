// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pal port {create|list|start|end|show|status|retry}` (SPEC_FULL.md §6).
//!
//! `create`/`start`/`end` have no daemon HTTP endpoint (the daemon's own
//! `/api/v2/hooks/port-start`/`port-end` speak the Claude Code hook
//! contract, keyed by the host's correlation ID, not the PAL Kit session ID
//! an operator names on this command line) so they always run embedded,
//! directly against `pal-engine::Scheduler`. `list`/`show`/`status` forward
//! to a running daemon when present since those are plain reads; `retry`
//! forwards to `POST /api/v2/ports/:id/retry` since the daemon already
//! exposes it.

use crate::color;
use crate::context::Context;
use crate::exit_error::ExitError;
use crate::output::{format_ago, format_or_json, handle_list, OutputFormat};
use crate::problem;
use clap::{Args, Subcommand, ValueEnum};
use pal_core::{Clock, Port, PortType, SystemClock};
use pal_engine::Scheduler;
use pal_wire::PortRetryRequest;

#[derive(Args)]
pub struct PortArgs {
    #[command(subcommand)]
    pub action: PortAction,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PortTypeArg {
    Atomic,
    Orchestration,
}

impl From<PortTypeArg> for PortType {
    fn from(value: PortTypeArg) -> Self {
        match value {
            PortTypeArg::Atomic => PortType::Atomic,
            PortTypeArg::Orchestration => PortType::Orchestration,
        }
    }
}

#[derive(Subcommand)]
pub enum PortAction {
    /// Register a new port in `pending` status.
    Create {
        id: String,
        title: String,
        #[arg(long, value_enum, default_value_t = PortTypeArg::Atomic)]
        port_type: PortTypeArg,
        #[arg(long)]
        spec_path: Option<String>,
        #[arg(long)]
        timeout_s: Option<u64>,
    },
    /// List every port.
    List {
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// `pending -> running`, owned by `--session`.
    Start {
        id: String,
        #[arg(long)]
        session: String,
    },
    /// Runs the checklist gate; `complete` on pass, `blocked` on failure.
    End { id: String },
    /// Show a single port's full row.
    Show {
        id: String,
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Print just the port's status word (for scripting).
    Status { id: String },
    /// `blocked -> pending`, so the next `port start` can reclaim it.
    Retry {
        id: String,
        #[arg(long)]
        reason: Option<String>,
    },
}

pub async fn run(ctx: &Context, action: PortAction) -> Result<(), ExitError> {
    match action {
        PortAction::Create { id, title, port_type, spec_path, timeout_s } => create(ctx, id, title, port_type, spec_path, timeout_s),
        PortAction::List { format } => list(ctx, format).await,
        PortAction::Start { id, session } => start(ctx, &id, &session),
        PortAction::End { id } => end(ctx, &id).await,
        PortAction::Show { id, format } => show(ctx, &id, format).await,
        PortAction::Status { id } => status(ctx, &id).await,
        PortAction::Retry { id, reason } => retry(ctx, &id, reason).await,
    }
}

fn create(
    ctx: &Context,
    id: String,
    title: String,
    port_type: PortTypeArg,
    spec_path: Option<String>,
    timeout_s: Option<u64>,
) -> Result<(), ExitError> {
    let mut store = ctx.open_store()?;
    let now = SystemClock.epoch_ms();
    let mut port = Port::new(id, title, port_type.into(), now);
    port.spec_path = spec_path;
    port.timeout_s = timeout_s;
    store
        .commit(pal_storage::StoreEvent::PortCreated { port: Box::new(port.clone()) })
        .map_err(|e| ExitError::new(3, format!("failed to create port: {e}")))?;
    ctx.close_store(store)?;
    println!("{} port {}", color::header("created"), color::literal(&port.id));
    Ok(())
}

async fn list(ctx: &Context, format: OutputFormat) -> Result<(), ExitError> {
    let ports: Vec<Port> = if let Some(discovery) = ctx.daemon() {
        let url = format!("{}/api/v2/ports", discovery.base_url());
        let response = ctx.client().get(&url).send().await.map_err(|e| ExitError::new(3, format!("failed to reach daemon: {e}")))?;
        if !response.status().is_success() {
            return Err(problem::response_to_exit_error(response).await);
        }
        response.json().await.map_err(|e| ExitError::new(3, format!("failed to parse daemon response: {e}")))?
    } else {
        let store = ctx.open_store()?;
        let ports = store.query(|s| s.ports.values().cloned().collect());
        ctx.close_store(store)?;
        ports
    };

    let now = SystemClock.epoch_ms();
    handle_list(format, &ports, "no ports", &["ID", "STATUS", "TYPE", "OWNER", "UPDATED"], |p| {
        vec![
            p.id.clone(),
            p.status.to_string(),
            p.port_type.to_string(),
            p.owner_session.clone().unwrap_or_else(|| "-".to_string()),
            format_ago(now, p.started_at_ms.or(p.completed_at_ms).unwrap_or(p.created_at_ms)),
        ]
    })
}

fn start(ctx: &Context, id: &str, session_id: &str) -> Result<(), ExitError> {
    let mut store = ctx.open_store()?;
    let port = Scheduler::start_port(&mut store, &SystemClock, id, session_id).map_err(to_exit_error)?;
    ctx.close_store(store)?;
    println!("{} port {} (owner {})", color::header("started"), color::literal(&port.id), session_id);
    Ok(())
}

async fn end(ctx: &Context, id: &str) -> Result<(), ExitError> {
    let project_root = store_project_root(ctx, id)?;
    let runtime = ctx.open_runtime()?;
    let result = runtime
        .execute(pal_core::Effect::RunChecklistGate { port_id: id.to_string(), project_root })
        .await;
    let outcome = match result {
        Ok(()) => Ok(()),
        Err(pal_engine::RuntimeError::Store(pal_core::CoreError::ChecklistFailed { port_id, failures })) => {
            println!("{} checklist gate failed for port {port_id} ({} failing step(s))", color::muted("blocked"), failures.len());
            for failure in &failures {
                println!("  - {}: {}", failure.step, failure.command);
            }
            Ok(())
        }
        Err(pal_engine::RuntimeError::Store(err)) => Err(ExitError::new(err.exit_code(), err.to_string())),
        Err(pal_engine::RuntimeError::Persist { path, source }) => {
            Err(ExitError::new(3, format!("failed to persist summary at {path}: {source}")))
        }
    };
    ctx.close_runtime(runtime)?;
    outcome.map(|()| println!("{} port {}", color::header("ended"), color::literal(id)))
}

async fn show(ctx: &Context, id: &str, format: OutputFormat) -> Result<(), ExitError> {
    let port = fetch_port(ctx, id).await?;
    format_or_json(format, &port, |p| {
        format!(
            "{}\n  status:  {}\n  type:    {}\n  owner:   {}\n  created: {}",
            color::header(&p.id),
            p.status,
            p.port_type,
            p.owner_session.clone().unwrap_or_else(|| "-".to_string()),
            p.created_at_ms,
        )
    })
}

async fn status(ctx: &Context, id: &str) -> Result<(), ExitError> {
    let port = fetch_port(ctx, id).await?;
    println!("{}", port.status);
    Ok(())
}

async fn fetch_port(ctx: &Context, id: &str) -> Result<Port, ExitError> {
    if let Some(discovery) = ctx.daemon() {
        let url = format!("{}/api/v2/ports/{id}", discovery.base_url());
        let response = ctx.client().get(&url).send().await.map_err(|e| ExitError::new(3, format!("failed to reach daemon: {e}")))?;
        if !response.status().is_success() {
            return Err(problem::response_to_exit_error(response).await);
        }
        response.json().await.map_err(|e| ExitError::new(3, format!("failed to parse daemon response: {e}")))
    } else {
        let store = ctx.open_store()?;
        let port = store.query(|s| s.get_port(id).cloned());
        ctx.close_store(store)?;
        port.ok_or_else(|| ExitError::new(2, format!("port not found: {id}")))
    }
}

async fn retry(ctx: &Context, id: &str, reason: Option<String>) -> Result<(), ExitError> {
    if let Some(discovery) = ctx.daemon() {
        let url = format!("{}/api/v2/ports/{id}/retry", discovery.base_url());
        let response = ctx
            .client()
            .post(&url)
            .json(&PortRetryRequest { reason })
            .send()
            .await
            .map_err(|e| ExitError::new(3, format!("failed to reach daemon: {e}")))?;
        if !response.status().is_success() {
            return Err(problem::response_to_exit_error(response).await);
        }
    } else {
        let mut store = ctx.open_store()?;
        Scheduler::retry_port(&mut store, id).map_err(to_exit_error)?;
        ctx.close_store(store)?;
    }
    println!("{} port {}", color::header("retried"), color::literal(id));
    Ok(())
}

fn store_project_root(ctx: &Context, port_id: &str) -> Result<String, ExitError> {
    let store = ctx.open_store()?;
    let root = store.query(|s| {
        let port = s.get_port(port_id)?;
        let owner = port.owner_session.as_ref()?;
        s.get_session(owner).map(|sess| sess.project_root.clone())
    });
    ctx.close_store(store)?;
    root.ok_or_else(|| ExitError::new(2, format!("port {port_id} has no running owner session")))
}

fn to_exit_error(err: pal_core::CoreError) -> ExitError {
    ExitError::new(err.exit_code(), err.to_string())
}

#[cfg(test)]
#[path = "port_tests.rs"]
mod tests;
