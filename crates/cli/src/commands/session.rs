// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pal session {list|tree|rename|children|info}` (SPEC_FULL.md §6).
//!
//! `rename` commits `StoreEvent::SessionRenamed`, a title-mutation event
//! added alongside the rest of this command since no existing hook or
//! manager ever needs to change a session's title after creation -- only
//! an operator correcting the placeholder `cwd` title `hooks::session_start`
//! assigns at session creation.

use crate::color;
use crate::context::Context;
use crate::exit_error::ExitError;
use crate::output::{format_ago, format_or_json, handle_list, OutputFormat};
use crate::problem;
use clap::{Args, Subcommand};
use pal_core::{Clock, Session, SessionTree, SystemClock};
use pal_engine::SessionManager;

#[derive(Args)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub action: SessionAction,
}

#[derive(Subcommand)]
pub enum SessionAction {
    /// List every session.
    List {
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Show a root session's full descendant tree.
    Tree {
        id: String,
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Set a session's title (does not affect `project_name`/`cwd`).
    Rename { id: String, title: String },
    /// List a session's immediate children.
    Children {
        id: String,
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Show a single session's full row.
    Info {
        id: String,
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
}

pub async fn run(ctx: &Context, action: SessionAction) -> Result<(), ExitError> {
    match action {
        SessionAction::List { format } => list(ctx, format).await,
        SessionAction::Tree { id, format } => tree(ctx, &id, format).await,
        SessionAction::Rename { id, title } => rename(ctx, &id, &title),
        SessionAction::Children { id, format } => children(ctx, &id, format).await,
        SessionAction::Info { id, format } => info(ctx, &id, format).await,
    }
}

async fn list(ctx: &Context, format: OutputFormat) -> Result<(), ExitError> {
    let sessions: Vec<Session> = if let Some(discovery) = ctx.daemon() {
        let url = format!("{}/api/v2/sessions", discovery.base_url());
        let response = ctx.client().get(&url).send().await.map_err(|e| ExitError::new(3, format!("failed to reach daemon: {e}")))?;
        if !response.status().is_success() {
            return Err(problem::response_to_exit_error(response).await);
        }
        response.json().await.map_err(|e| ExitError::new(3, format!("failed to parse daemon response: {e}")))?
    } else {
        let store = ctx.open_store()?;
        let sessions = store.query(|s| s.sessions.values().cloned().collect());
        ctx.close_store(store)?;
        sessions
    };

    let now = SystemClock.epoch_ms();
    handle_list(format, &sessions, "no sessions", &["ID", "TITLE", "STATUS", "DEPTH", "UPDATED"], |s| {
        vec![s.id.clone(), s.title.clone(), s.status.to_string(), s.depth.to_string(), format_ago(now, s.created_at_ms)]
    })
}

async fn fetch_tree(ctx: &Context, id: &str) -> Result<SessionTree, ExitError> {
    if let Some(discovery) = ctx.daemon() {
        let url = format!("{}/api/v2/sessions/{id}/hierarchy", discovery.base_url());
        let response = ctx.client().get(&url).send().await.map_err(|e| ExitError::new(3, format!("failed to reach daemon: {e}")))?;
        if !response.status().is_success() {
            return Err(problem::response_to_exit_error(response).await);
        }
        response.json().await.map_err(|e| ExitError::new(3, format!("failed to parse daemon response: {e}")))
    } else {
        let store = ctx.open_store()?;
        let tree = SessionManager::get_hierarchy(&store, id, false).map_err(|e| ExitError::new(e.exit_code(), e.to_string()));
        ctx.close_store(store)?;
        tree
    }
}

fn render_tree(tree: &SessionTree, depth: usize) -> String {
    let indent = color::context(&"  ".repeat(depth));
    let mut lines = vec![format!("{indent}{} {} ({})", color::literal(&tree.session.id), tree.session.title, tree.session.status)];
    for child in &tree.children {
        lines.push(render_tree(child, depth + 1));
    }
    lines.join("\n")
}

async fn tree(ctx: &Context, id: &str, format: OutputFormat) -> Result<(), ExitError> {
    let tree = fetch_tree(ctx, id).await?;
    format_or_json(format, &tree, |t| render_tree(t, 0))
}

fn rename(ctx: &Context, id: &str, title: &str) -> Result<(), ExitError> {
    let mut store = ctx.open_store()?;
    store
        .query(|s| s.get_session(id).cloned())
        .ok_or_else(|| ExitError::new(2, format!("session not found: {id}")))?;
    store
        .commit(pal_storage::StoreEvent::SessionRenamed { session_id: id.to_string(), title: title.to_string() })
        .map_err(|e| ExitError::new(3, format!("failed to rename session: {e}")))?;
    ctx.close_store(store)?;
    println!("{} session {} -> {}", color::header("renamed"), color::literal(id), title);
    Ok(())
}

async fn children(ctx: &Context, id: &str, format: OutputFormat) -> Result<(), ExitError> {
    let tree = fetch_tree(ctx, id).await?;
    let children: Vec<Session> = tree.children.into_iter().map(|c| c.session).collect();
    let now = SystemClock.epoch_ms();
    handle_list(format, &children, "no children", &["ID", "TITLE", "STATUS", "DEPTH", "UPDATED"], |s| {
        vec![s.id.clone(), s.title.clone(), s.status.to_string(), s.depth.to_string(), format_ago(now, s.created_at_ms)]
    })
}

async fn fetch_session(ctx: &Context, id: &str) -> Result<Session, ExitError> {
    if let Some(discovery) = ctx.daemon() {
        let url = format!("{}/api/v2/sessions/{id}", discovery.base_url());
        let response = ctx.client().get(&url).send().await.map_err(|e| ExitError::new(3, format!("failed to reach daemon: {e}")))?;
        if !response.status().is_success() {
            return Err(problem::response_to_exit_error(response).await);
        }
        response.json().await.map_err(|e| ExitError::new(3, format!("failed to parse daemon response: {e}")))
    } else {
        let store = ctx.open_store()?;
        let session = store.query(|s| s.get_session(id).cloned());
        ctx.close_store(store)?;
        session.ok_or_else(|| ExitError::new(2, format!("session not found: {id}")))
    }
}

async fn info(ctx: &Context, id: &str, format: OutputFormat) -> Result<(), ExitError> {
    let session = fetch_session(ctx, id).await?;
    format_or_json(format, &session, |s| {
        format!(
            "{}\n  title:   {}\n  status:  {}\n  type:    {}\n  parent:  {}\n  depth:   {}\n  usage:   {} input / {} output (${:.4})",
            color::header(&s.id),
            s.title,
            s.status,
            s.session_type,
            s.parent_id.clone().unwrap_or_else(|| "-".to_string()),
            s.depth,
            s.usage.input_tokens,
            s.usage.output_tokens,
            s.usage.cost_usd,
        )
    })
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
