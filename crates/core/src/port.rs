// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Port: a unit of work with a dependency-ordered state machine.
//!
//! Port IDs are human-readable slugs, unique per project, unlike the
//! random-suffix IDs generated by [`crate::define_id!`] — a port slug is
//! chosen by the operator or the host assistant, not minted by the core.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortStatus {
    Pending,
    Running,
    Complete,
    Blocked,
    Failed,
}

crate::simple_display! {
    PortStatus {
        Pending => "pending",
        Running => "running",
        Complete => "complete",
        Blocked => "blocked",
        Failed => "failed",
    }
}

impl PortStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, PortStatus::Complete | PortStatus::Failed)
    }

    /// Validates a single state-machine edge per spec.md §4.5. Does not
    /// itself check the side conditions (dependencies satisfied, lock
    /// ownership, checklist gate) — those live in `pal-engine`'s scheduler.
    pub fn can_transition_to(self, next: PortStatus) -> bool {
        use PortStatus::*;
        matches!(
            (self, next),
            (Pending, Running)
                | (Running, Complete)
                | (Running, Blocked)
                | (Running, Failed)
                | (Blocked, Running)
                | (Blocked, Failed)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortType {
    Atomic,
    Orchestration,
}

crate::simple_display! {
    PortType {
        Atomic => "atomic",
        Orchestration => "orchestration",
    }
}

/// Token + cost accounting for a port, accumulated from its owning
/// session's usage while the port was active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PortUsage {
    pub tokens: u64,
    pub cost_usd: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Port {
    pub id: String,
    pub title: String,
    pub status: PortStatus,
    pub port_type: PortType,
    pub owner_session: Option<String>,
    pub spec_path: Option<String>,
    pub assigned_agent_id: Option<String>,
    pub created_at_ms: u64,
    pub started_at_ms: Option<u64>,
    pub completed_at_ms: Option<u64>,
    pub usage: PortUsage,
    pub duration_s: Option<u64>,
    /// Resource locks declared by the port spec, acquired at `port-start`
    /// and released at `port-end` (spec.md §5 shared-resource policy).
    #[serde(default)]
    pub declared_file_locks: Vec<String>,
    #[serde(default)]
    pub timeout_s: Option<u64>,
}

impl Port {
    pub fn new(id: impl Into<String>, title: impl Into<String>, port_type: PortType, created_at_ms: u64) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            status: PortStatus::Pending,
            port_type,
            owner_session: None,
            spec_path: None,
            assigned_agent_id: None,
            created_at_ms,
            started_at_ms: None,
            completed_at_ms: None,
            usage: PortUsage::default(),
            duration_s: None,
            declared_file_locks: Vec::new(),
            timeout_s: None,
        }
    }

    pub fn lock_resource(&self) -> String {
        format!("port:{}", self.id)
    }

    pub fn start(&mut self, session_id: impl Into<String>, now_ms: u64) {
        self.status = PortStatus::Running;
        self.owner_session = Some(session_id.into());
        self.started_at_ms = Some(now_ms);
    }

    pub fn complete(&mut self, now_ms: u64) {
        self.status = PortStatus::Complete;
        self.completed_at_ms = Some(now_ms);
        if let Some(started) = self.started_at_ms {
            self.duration_s = Some((now_ms.saturating_sub(started)) / 1000);
        }
    }

    pub fn block(&mut self) {
        self.status = PortStatus::Blocked;
    }

    /// `blocked -> pending`: clears ownership so the port is claimable by
    /// the next `port-start`, without touching dependency-satisfaction
    /// flags or history (`completed_at_ms`/`duration_s` stay `None`).
    pub fn retry(&mut self) {
        self.status = PortStatus::Pending;
        self.owner_session = None;
        self.started_at_ms = None;
    }

    pub fn fail(&mut self, now_ms: u64) {
        self.status = PortStatus::Failed;
        self.completed_at_ms = Some(now_ms);
    }
}

crate::builder! {
    pub struct PortBuilder => Port {
        into {
            id: String = "user-entity",
            title: String = "user entity",
        }
        set {
            status: PortStatus = PortStatus::Pending,
            port_type: PortType = PortType::Atomic,
            created_at_ms: u64 = 0,
            usage: PortUsage = PortUsage::default(),
            declared_file_locks: Vec<String> = Vec::new(),
        }
        option {
            owner_session: String = None,
            spec_path: String = None,
            assigned_agent_id: String = None,
            started_at_ms: u64 = None,
            completed_at_ms: u64 = None,
            duration_s: u64 = None,
            timeout_s: u64 = None,
        }
    }
}

#[cfg(test)]
#[path = "port_tests.rs"]
mod tests;
