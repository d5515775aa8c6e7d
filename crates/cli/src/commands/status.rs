// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pal status`: a project-wide overview (SPEC_FULL.md §6). Always reads the
//! store directly rather than forwarding — there is no daemon endpoint for
//! an aggregate summary, and the store itself is always safe to read
//! read-only regardless of whether `pald` currently owns it.

use crate::color;
use crate::context::Context;
use crate::exit_error::ExitError;
use crate::output::{format_or_json, OutputFormat};
use pal_core::{PortStatus, SessionStatus};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct StatusView {
    pub daemon_running: bool,
    pub daemon_pid: Option<u32>,
    pub daemon_port: Option<u16>,
    pub sessions_total: usize,
    pub sessions_running: usize,
    pub ports_total: usize,
    pub ports_running: usize,
    pub ports_blocked: usize,
    pub pipelines_total: usize,
    pub escalations_open: usize,
    pub store_version: u64,
}

pub fn run(ctx: &Context, format: OutputFormat) -> Result<(), ExitError> {
    let discovery = ctx.daemon();
    let store = ctx.open_store()?;
    let version = store.version();
    let view = store.query(|state| StatusView {
        daemon_running: discovery.is_some(),
        daemon_pid: discovery.as_ref().map(|d| d.pid),
        daemon_port: discovery.as_ref().map(|d| d.port),
        sessions_total: state.sessions.len(),
        sessions_running: state.sessions.values().filter(|s| s.status == SessionStatus::Running).count(),
        ports_total: state.ports.len(),
        ports_running: state.ports.values().filter(|p| p.status == PortStatus::Running).count(),
        ports_blocked: state.ports.values().filter(|p| p.status == PortStatus::Blocked).count(),
        pipelines_total: state.pipelines.len(),
        escalations_open: state.escalations.values().filter(|e| e.status == pal_core::EscalationStatus::Open).count(),
        store_version: version,
    });
    ctx.close_store(store)?;

    format_or_json(format, &view, |v| {
        let daemon_line = match (v.daemon_running, v.daemon_pid, v.daemon_port) {
            (true, Some(pid), Some(port)) => format!("{} (pid {pid}, port {port})", color::literal("running")),
            _ => color::muted("not running").to_string(),
        };
        format!(
            "{}\n  daemon:      {daemon_line}\n  store version: {}\n  sessions:    {} ({} running)\n  ports:       {} ({} running, {} blocked)\n  pipelines:   {}\n  escalations: {} open",
            color::header("pal status"),
            v.store_version,
            v.sessions_total,
            v.sessions_running,
            v.ports_total,
            v.ports_running,
            v.ports_blocked,
            v.pipelines_total,
            v.escalations_open,
        )
    })
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
