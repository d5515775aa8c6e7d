// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pal data {check|repair|stats}` (SPEC_FULL.md §4.10, §6).
//!
//! `check`/`stats` always read the store directly -- a read-only query is
//! always safe whether or not `pald` currently owns the directory. `repair`
//! forwards to `POST /api/v2/data/repair` when a daemon is running, since a
//! live daemon's own runtime holds the canonical in-memory state and its
//! refresh task would otherwise briefly race a second, independently
//! opened `Store` writing its own checkpoint; embedded otherwise.

use crate::color;
use crate::context::Context;
use crate::exit_error::ExitError;
use crate::output::{format_or_json, OutputFormat};
use crate::problem;
use clap::{Args, Subcommand};
use pal_storage::integrity::{self, FindingLevel};
use serde::Serialize;

#[derive(Args)]
pub struct DataArgs {
    #[command(subcommand)]
    pub action: DataAction,
}

#[derive(Subcommand)]
pub enum DataAction {
    /// Run the store's reference scan plus per-table invariant checks.
    Check {
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Consolidate the WAL into a fresh snapshot.
    Repair,
    /// Print row counts per entity.
    Stats {
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
}

pub async fn run(ctx: &Context, action: DataAction) -> Result<(), ExitError> {
    match action {
        DataAction::Check { format } => check(ctx, format),
        DataAction::Repair => repair(ctx).await,
        DataAction::Stats { format } => stats(ctx, format),
    }
}

fn check(ctx: &Context, format: OutputFormat) -> Result<(), ExitError> {
    let store = ctx.open_store()?;
    let report = store.query(integrity::check);
    ctx.close_store(store)?;

    let has_errors = report.has_errors();
    format_or_json(format, &report, |r| {
        let mut lines = vec![color::header("pal data check")];
        for finding in &r.findings {
            let (label, colorize): (&str, fn(&str) -> String) = match finding.level {
                FindingLevel::Ok => ("ok", |s| color::literal(s)),
                FindingLevel::Warning => ("warning", |s| color::context(s)),
                FindingLevel::Error => ("error", |s| color::header(s)),
            };
            let mut line = format!("  [{}] {}", colorize(label), finding.message);
            if let Some(remediation) = &finding.remediation {
                line.push_str(&format!(" -- {remediation}"));
            }
            lines.push(line);
        }
        lines.join("\n")
    })?;

    if has_errors {
        return Err(ExitError::new(1, "integrity check found errors"));
    }
    Ok(())
}

async fn repair(ctx: &Context) -> Result<(), ExitError> {
    if let Some(discovery) = ctx.daemon() {
        let url = format!("{}/api/v2/data/repair", discovery.base_url());
        let response = ctx.client().post(&url).send().await.map_err(|e| ExitError::new(3, format!("failed to reach daemon: {e}")))?;
        if !response.status().is_success() {
            return Err(problem::response_to_exit_error(response).await);
        }
    } else {
        let mut store = ctx.open_store()?;
        store.checkpoint().map_err(|e| ExitError::new(3, format!("failed to repair store: {e}")))?;
        ctx.close_store(store)?;
    }
    println!("{}", color::header("repaired"));
    Ok(())
}

#[derive(Debug, Serialize)]
struct DataStats {
    sessions: usize,
    ports: usize,
    pipelines: usize,
    escalations: usize,
    direct_channels: usize,
    direct_messages: usize,
    locks: usize,
    store_version: u64,
}

fn stats(ctx: &Context, format: OutputFormat) -> Result<(), ExitError> {
    let store = ctx.open_store()?;
    let version = store.version();
    let stats = store.query(|s| DataStats {
        sessions: s.sessions.len(),
        ports: s.ports.len(),
        pipelines: s.pipelines.len(),
        escalations: s.escalations.len(),
        direct_channels: s.direct_channels.len(),
        direct_messages: s.direct_messages.len(),
        locks: s.locks.len(),
        store_version: version,
    });
    ctx.close_store(store)?;

    format_or_json(format, &stats, |s| {
        format!(
            "{}\n  sessions:        {}\n  ports:           {}\n  pipelines:       {}\n  escalations:     {}\n  direct channels: {}\n  direct messages: {}\n  locks:           {}\n  store version:   {}",
            color::header("pal data stats"),
            s.sessions,
            s.ports,
            s.pipelines,
            s.escalations,
            s.direct_channels,
            s.direct_messages,
            s.locks,
            s.store_version,
        )
    })
}

#[cfg(test)]
#[path = "data_tests.rs"]
mod tests;
