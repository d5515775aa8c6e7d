// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline + PortDependency: the DAG of ports a pipeline schedules by
//! topological level (spec.md §3/§4.5).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyType {
    /// The dependency must simply reach `complete`.
    FinishToStart,
    /// The dependency must produce the outputs named in `required_outputs`.
    Output,
}

crate::simple_display! {
    DependencyType {
        FinishToStart => "finish_to_start",
        Output => "output",
    }
}

/// An edge `port_id -> depends_on`. Invariant: the dependency graph is
/// acyclic over non-archived ports (spec.md §3, invariant 7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortDependency {
    pub port_id: String,
    pub depends_on: String,
    pub dependency_type: DependencyType,
    pub required_outputs: serde_json::Value,
    pub satisfied: bool,
}

impl PortDependency {
    pub fn new(port_id: impl Into<String>, depends_on: impl Into<String>, dependency_type: DependencyType) -> Self {
        Self {
            port_id: port_id.into(),
            depends_on: depends_on.into(),
            dependency_type,
            required_outputs: serde_json::Value::Null,
            satisfied: false,
        }
    }

    pub fn satisfy(&mut self) {
        self.satisfied = true;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    Pending,
    Running,
    Complete,
    Failed,
}

crate::simple_display! {
    PipelineStatus {
        Pending => "pending",
        Running => "running",
        Complete => "complete",
        Failed => "failed",
    }
}

/// A named collection of ports annotated with `group_order` for
/// tie-breaking parallel dispatch within a topological level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    pub id: String,
    pub title: String,
    /// Port ID -> group_order. Ports with the same group and no unsatisfied
    /// dependencies are eligible to run in parallel.
    pub port_groups: Vec<(String, i64)>,
    pub max_concurrency: u32,
    pub created_at_ms: u64,
}

impl Pipeline {
    pub fn new(id: impl Into<String>, title: impl Into<String>, max_concurrency: u32, created_at_ms: u64) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            port_groups: Vec::new(),
            max_concurrency,
            created_at_ms,
        }
    }

    pub fn add_port(&mut self, port_id: impl Into<String>, group_order: i64) {
        self.port_groups.push((port_id.into(), group_order));
    }

    pub fn port_ids(&self) -> impl Iterator<Item = &str> {
        self.port_groups.iter().map(|(id, _)| id.as_str())
    }

    pub fn group_order_of(&self, port_id: &str) -> Option<i64> {
        self.port_groups.iter().find(|(id, _)| id == port_id).map(|(_, g)| *g)
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
