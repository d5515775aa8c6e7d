// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session: a scoped, hierarchical execution context for an agent.
//!
//! Sessions form a tree via `parent_id`/`root_id`/`path`. `path` is the
//! `/`-joined chain of ancestor IDs ending in the session's own ID; `depth`
//! and `root_id` are always derived from the parent at creation time and
//! never recomputed (see `Session::child_of`).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Session status. `running` is the only non-terminal, non-pending state;
/// `blocked` is recoverable (a terminated parent or an ended owning port
/// leaves children `blocked`, not `failed`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Pending,
    Running,
    Complete,
    Failed,
    Blocked,
}

crate::simple_display! {
    SessionStatus {
        Pending => "pending",
        Running => "running",
        Complete => "complete",
        Failed => "failed",
        Blocked => "blocked",
    }
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Complete | SessionStatus::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    Build,
    Operator,
    Worker,
    Test,
    Single,
}

crate::simple_display! {
    SessionType {
        Build => "build",
        Operator => "operator",
        Worker => "worker",
        Test => "test",
        Single => "single",
    }
}

/// Cumulative token/cost usage for a session. Updates are monotone
/// non-decreasing (see `Session::update_usage`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_read_tokens: u64,
    pub cache_create_tokens: u64,
    pub cost_usd: f64,
}

impl Usage {
    /// Tokens counted against the attention budget (cache reads excluded by
    /// policy — see SPEC_FULL.md §9 open question).
    pub fn tokens_used(&self) -> u64 {
        self.input_tokens + self.output_tokens + self.cache_create_tokens
    }
}

/// Options for [`Session`] creation, mirroring `StartHierarchical`'s input.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub id: String,
    pub title: String,
    pub session_type: SessionType,
    pub parent_id: Option<String>,
    pub token_budget: u64,
    pub project_root: String,
    pub project_name: String,
    pub claude_session_id: Option<String>,
    pub cwd: String,
}

impl SessionConfig {
    pub fn builder(id: impl Into<String>) -> SessionConfigBuilder {
        let id = id.into();
        SessionConfigBuilder {
            id: id.clone(),
            title: id,
            session_type: SessionType::Single,
            parent_id: None,
            token_budget: 15_000,
            project_root: String::new(),
            project_name: String::new(),
            claude_session_id: None,
            cwd: String::new(),
        }
    }
}

pub struct SessionConfigBuilder {
    id: String,
    title: String,
    session_type: SessionType,
    parent_id: Option<String>,
    token_budget: u64,
    project_root: String,
    project_name: String,
    claude_session_id: Option<String>,
    cwd: String,
}

impl SessionConfigBuilder {
    crate::setters! {
        into {
            title: String,
            project_root: String,
            project_name: String,
            cwd: String,
        }
        set {
            session_type: SessionType,
            token_budget: u64,
        }
        option {
            parent_id: String,
            claude_session_id: String,
        }
    }

    pub fn build(self) -> SessionConfig {
        SessionConfig {
            id: self.id,
            title: self.title,
            session_type: self.session_type,
            parent_id: self.parent_id,
            token_budget: self.token_budget,
            project_root: self.project_root,
            project_name: self.project_name,
            claude_session_id: self.claude_session_id,
            cwd: self.cwd,
        }
    }
}

/// A session row. Rows are never deleted, only archived (tracked by the
/// materialized state, not a field here — archival is a store-level view).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub title: String,
    pub status: SessionStatus,
    pub session_type: SessionType,
    pub parent_id: Option<String>,
    pub root_id: String,
    pub depth: u32,
    /// `/`-joined chain of ancestor IDs, ending in `id`.
    pub path: String,
    pub active_port: Option<String>,
    pub token_budget: u64,
    pub usage: Usage,
    pub compact_count: u32,
    pub last_compact_at: Option<u64>,
    pub project_root: String,
    pub project_name: String,
    pub claude_session_id: Option<String>,
    pub cwd: String,
    pub output_summary: Option<serde_json::Value>,
    pub context_snapshot_id: Option<String>,
    pub created_at_ms: u64,
    pub ended_at_ms: Option<u64>,
    /// Last usage ratio observed at a `pre-tool-use` hook, for one-shot
    /// auto-checkpoint threshold detection (spec.md §4.4). Not itself part
    /// of the documented data model; carried here because it must be
    /// updated atomically with the session row in the same commit.
    #[serde(default)]
    pub last_attention_ratio: f64,
}

impl Session {
    /// Create a root session (no parent): `depth = 0`, `root_id = id`,
    /// `path = id`.
    pub fn new_root(config: SessionConfig, created_at_ms: u64) -> Self {
        let path = config.id.clone();
        let root_id = config.id.clone();
        Self::from_parts(config, 0, root_id, path, created_at_ms)
    }

    /// Create a child session under `parent`. `depth`, `root_id`, and `path`
    /// are inherited and extended, never recomputed from scratch.
    pub fn child_of(config: SessionConfig, parent: &Session, created_at_ms: u64) -> Self {
        let depth = parent.depth + 1;
        let root_id = parent.root_id.clone();
        let path = format!("{}/{}", parent.path, config.id);
        Self::from_parts(config, depth, root_id, path, created_at_ms)
    }

    fn from_parts(
        config: SessionConfig,
        depth: u32,
        root_id: String,
        path: String,
        created_at_ms: u64,
    ) -> Self {
        Self {
            id: config.id,
            title: config.title,
            status: SessionStatus::Pending,
            session_type: config.session_type,
            parent_id: config.parent_id,
            root_id,
            depth,
            path,
            active_port: None,
            token_budget: config.token_budget,
            usage: Usage::default(),
            compact_count: 0,
            last_compact_at: None,
            project_root: config.project_root,
            project_name: config.project_name,
            claude_session_id: config.claude_session_id,
            cwd: config.cwd,
            output_summary: None,
            context_snapshot_id: None,
            created_at_ms,
            ended_at_ms: None,
            last_attention_ratio: 0.0,
        }
    }

    /// Invariant (1) from spec.md §8: `depth = len(split(path, '/')) - 1`.
    pub fn expected_depth(&self) -> u32 {
        self.path.split('/').count() as u32 - 1
    }

    /// Invariant (1) continued: `root_id = first(split(path, '/'))`.
    pub fn expected_root_id(&self) -> &str {
        self.path.split('/').next().unwrap_or(&self.path)
    }

    pub fn is_descendant_path(&self, root_id: &str) -> bool {
        self.path == root_id || self.path.starts_with(&format!("{root_id}/"))
    }

    /// `usage_ratio = tokens_used / token_budget`. `token_budget = 0`
    /// disables attention thresholds entirely (spec.md §8 boundary case).
    pub fn usage_ratio(&self) -> f64 {
        if self.token_budget == 0 {
            return 0.0;
        }
        self.usage.tokens_used() as f64 / self.token_budget as f64
    }

    pub fn attention_enabled(&self) -> bool {
        self.token_budget > 0
    }

    /// Idempotent cumulative update; never decreases values.
    pub fn update_usage(&mut self, input: u64, output: u64, cache_read: u64, cache_create: u64, cost_usd: f64) {
        self.usage.input_tokens = self.usage.input_tokens.max(input);
        self.usage.output_tokens = self.usage.output_tokens.max(output);
        self.usage.cache_read_tokens = self.usage.cache_read_tokens.max(cache_read);
        self.usage.cache_create_tokens = self.usage.cache_create_tokens.max(cache_create);
        self.usage.cost_usd = self.usage.cost_usd.max(cost_usd);
    }

    pub fn increment_compact(&mut self, now_ms: u64) {
        self.compact_count += 1;
        self.last_compact_at = Some(now_ms);
    }

    pub fn end(&mut self, status: SessionStatus, summary: Option<serde_json::Value>, now_ms: u64) {
        self.status = status;
        self.output_summary = summary;
        self.ended_at_ms = Some(now_ms);
    }
}

/// A node in the hierarchy tree returned by `GetHierarchy`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTree {
    pub session: Session,
    pub children: Vec<SessionTree>,
}

/// Per-session event bookkeeping used for detecting direct-channel
/// namespace maps and extra metadata not strictly part of the session row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionVars(pub HashMap<String, String>);

crate::builder! {
    pub struct SessionBuilder => Session {
        into {
            id: String = "test-session",
            title: String = "test session",
            root_id: String = "test-session",
            path: String = "test-session",
            project_root: String = "/tmp/project",
            project_name: String = "project",
            cwd: String = "/tmp/project",
        }
        set {
            status: SessionStatus = SessionStatus::Pending,
            session_type: SessionType = SessionType::Single,
            depth: u32 = 0,
            token_budget: u64 = 15_000,
            usage: Usage = Usage::default(),
            compact_count: u32 = 0,
            created_at_ms: u64 = 0,
            last_attention_ratio: f64 = 0.0,
        }
        option {
            parent_id: String = None,
            active_port: String = None,
            last_compact_at: u64 = None,
            claude_session_id: String = None,
            context_snapshot_id: String = None,
            ended_at_ms: u64 = None,
        }
        computed {
            output_summary: Option<serde_json::Value> = None,
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
