// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pal pipeline {create|add|plan|run|status}` (SPEC_FULL.md §6).
//!
//! A pipeline is created complete — every port it schedules is named at
//! creation time — because `StoreEvent::PipelineCreated`'s apply handler is
//! an insert-if-absent (`crates/storage/src/state/pipelines.rs`), not an
//! upsert: re-committing it against an existing pipeline id is silently
//! ignored rather than replacing the row. `pal pipeline add` therefore only
//! adds a dependency edge between two ports already named in the pipeline,
//! not a new port membership.

use crate::color;
use crate::context::Context;
use crate::exit_error::ExitError;
use crate::output::{format_or_json, OutputFormat};
use crate::problem;
use clap::{Args, Subcommand, ValueEnum};
use pal_core::{Clock, DependencyType, Pipeline, PipelineStatus, PortDependency, SystemClock};
use pal_engine::Scheduler;
use serde::{Deserialize, Serialize};

#[derive(Args)]
pub struct PipelineArgs {
    #[command(subcommand)]
    pub action: PipelineAction,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DependencyTypeArg {
    FinishToStart,
    Output,
}

impl From<DependencyTypeArg> for DependencyType {
    fn from(value: DependencyTypeArg) -> Self {
        match value {
            DependencyTypeArg::FinishToStart => DependencyType::FinishToStart,
            DependencyTypeArg::Output => DependencyType::Output,
        }
    }
}

#[derive(Subcommand)]
pub enum PipelineAction {
    /// Create a pipeline with its full port membership up front.
    Create {
        id: String,
        title: String,
        #[arg(long, default_value_t = 3)]
        max_concurrency: u32,
        /// Repeatable `<port-id>[:<group-order>]`, group defaults to 0.
        #[arg(long = "port")]
        ports: Vec<String>,
    },
    /// Add a dependency edge between two ports already in the pipeline.
    Add {
        pipeline_id: String,
        port_id: String,
        #[arg(long)]
        depends_on: String,
        #[arg(long = "type", value_enum, default_value_t = DependencyTypeArg::FinishToStart)]
        dependency_type: DependencyTypeArg,
    },
    /// Show topological levels and current status.
    Plan {
        id: String,
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Start every port eligible to run right now, owned by `--session`.
    Run {
        id: String,
        #[arg(long)]
        session: String,
    },
    /// Print just the pipeline's derived status.
    Status { id: String },
}

#[derive(Debug, Serialize, Deserialize)]
struct PipelinePlanView {
    #[serde(flatten)]
    pipeline: Pipeline,
    status: PipelineStatus,
    levels: Vec<Vec<String>>,
}

pub async fn run(ctx: &Context, action: PipelineAction) -> Result<(), ExitError> {
    match action {
        PipelineAction::Create { id, title, max_concurrency, ports } => create(ctx, id, title, max_concurrency, ports),
        PipelineAction::Add { pipeline_id, port_id, depends_on, dependency_type } => {
            add_dependency(ctx, &pipeline_id, &port_id, &depends_on, dependency_type.into())
        }
        PipelineAction::Plan { id, format } => plan(ctx, &id, format).await,
        PipelineAction::Run { id, session } => start_eligible(ctx, &id, &session),
        PipelineAction::Status { id } => status(ctx, &id).await,
    }
}

fn parse_port_group(entry: &str) -> (String, i64) {
    match entry.split_once(':') {
        Some((id, group)) => (id.to_string(), group.parse().unwrap_or(0)),
        None => (entry.to_string(), 0),
    }
}

fn create(ctx: &Context, id: String, title: String, max_concurrency: u32, ports: Vec<String>) -> Result<(), ExitError> {
    let mut store = ctx.open_store()?;
    let now = SystemClock.epoch_ms();
    let mut pipeline = Pipeline::new(id, title, max_concurrency, now);
    for entry in &ports {
        let (port_id, group) = parse_port_group(entry);
        pipeline.add_port(port_id, group);
    }
    store
        .commit(pal_storage::StoreEvent::PipelineCreated { pipeline: Box::new(pipeline.clone()) })
        .map_err(|e| ExitError::new(3, format!("failed to create pipeline: {e}")))?;
    ctx.close_store(store)?;
    println!("{} pipeline {} ({} port(s))", color::header("created"), color::literal(&pipeline.id), pipeline.port_groups.len());
    Ok(())
}

fn add_dependency(ctx: &Context, pipeline_id: &str, port_id: &str, depends_on: &str, dependency_type: DependencyType) -> Result<(), ExitError> {
    let mut store = ctx.open_store()?;
    let pipeline = store
        .query(|s| s.pipelines.get(pipeline_id).cloned())
        .ok_or_else(|| ExitError::new(2, format!("pipeline not found: {pipeline_id}")))?;
    if pipeline.group_order_of(port_id).is_none() {
        return Err(ExitError::new(2, format!("port {port_id} is not a member of pipeline {pipeline_id}")));
    }
    if pipeline.group_order_of(depends_on).is_none() {
        return Err(ExitError::new(2, format!("port {depends_on} is not a member of pipeline {pipeline_id}")));
    }
    let dependency = PortDependency::new(port_id, depends_on, dependency_type);
    store
        .commit(pal_storage::StoreEvent::DependencyAdded { dependency: Box::new(dependency) })
        .map_err(|e| ExitError::new(3, format!("failed to add dependency: {e}")))?;
    ctx.close_store(store)?;
    println!("{} {port_id} -> {depends_on}", color::header("dependency added"));
    Ok(())
}

async fn fetch_plan(ctx: &Context, id: &str) -> Result<PipelinePlanView, ExitError> {
    if let Some(discovery) = ctx.daemon() {
        let url = format!("{}/api/v2/pipelines/{id}", discovery.base_url());
        let response = ctx.client().get(&url).send().await.map_err(|e| ExitError::new(3, format!("failed to reach daemon: {e}")))?;
        if !response.status().is_success() {
            return Err(problem::response_to_exit_error(response).await);
        }
        response.json().await.map_err(|e| ExitError::new(3, format!("failed to parse daemon response: {e}")))
    } else {
        let store = ctx.open_store()?;
        let pipeline = store
            .query(|s| s.pipelines.get(id).cloned())
            .ok_or_else(|| ExitError::new(2, format!("pipeline not found: {id}")))?;
        let (status, levels) =
            store.query(|s| (Scheduler::pipeline_status(s, &pipeline), Scheduler::topological_levels(s, &pipeline).unwrap_or_default()));
        ctx.close_store(store)?;
        Ok(PipelinePlanView { pipeline, status, levels })
    }
}

async fn plan(ctx: &Context, id: &str, format: OutputFormat) -> Result<(), ExitError> {
    let view = fetch_plan(ctx, id).await?;
    format_or_json(format, &view, |v| {
        let mut lines = vec![format!("{} ({})", color::header(&v.pipeline.id), v.status)];
        for (i, level) in v.levels.iter().enumerate() {
            lines.push(format!("  level {i}: {}", level.join(", ")));
        }
        lines.join("\n")
    })
}

async fn status(ctx: &Context, id: &str) -> Result<(), ExitError> {
    let view = fetch_plan(ctx, id).await?;
    println!("{}", view.status);
    Ok(())
}

fn start_eligible(ctx: &Context, id: &str, session_id: &str) -> Result<(), ExitError> {
    let mut store = ctx.open_store()?;
    let pipeline = store
        .query(|s| s.pipelines.get(id).cloned())
        .ok_or_else(|| ExitError::new(2, format!("pipeline not found: {id}")))?;
    let eligible = store.query(|s| Scheduler::eligible_to_start(s, &pipeline, pipeline.max_concurrency));
    if eligible.is_empty() {
        ctx.close_store(store)?;
        println!("{}", color::muted("no ports eligible to start"));
        return Ok(());
    }
    let mut started = Vec::new();
    for port_id in &eligible {
        let port = Scheduler::start_port(&mut store, &SystemClock, port_id, session_id).map_err(|e| ExitError::new(e.exit_code(), e.to_string()))?;
        started.push(port.id);
    }
    ctx.close_store(store)?;
    println!("{} {}", color::header("started"), started.join(", "));
    Ok(())
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
