// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Escalation: a labeled, severity-bearing condition reported to an
//! ancestor session for resolution (spec.md §3/§4.6).

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Random ID for an escalation row.
    pub struct EscalationId("esc-");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationType {
    General,
    Blocked,
    Decision,
    TestFailure,
    TokenExhausted,
    Timeout,
    Conflict,
    Dependency,
    Quality,
}

crate::simple_display! {
    EscalationType {
        General => "general",
        Blocked => "blocked",
        Decision => "decision",
        TestFailure => "test_failure",
        TokenExhausted => "token_exhausted",
        Timeout => "timeout",
        Conflict => "conflict",
        Dependency => "dependency",
        Quality => "quality",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

crate::simple_display! {
    Severity {
        Low => "low",
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
}

impl EscalationType {
    /// Severity for the automatic triggers table in spec.md §4.6. `Quality`
    /// escalations are explicit (from the `quality_warning` hook field) and
    /// carry their own severity, so they have no fixed mapping here.
    pub fn default_severity(self) -> Option<Severity> {
        match self {
            EscalationType::TestFailure => Some(Severity::High),
            EscalationType::TokenExhausted => Some(Severity::Medium),
            EscalationType::Timeout => Some(Severity::High),
            EscalationType::Dependency => Some(Severity::Critical),
            EscalationType::Quality => None,
            EscalationType::General
            | EscalationType::Blocked
            | EscalationType::Decision
            | EscalationType::Conflict => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationStatus {
    Open,
    Resolved,
    Dismissed,
}

crate::simple_display! {
    EscalationStatus {
        Open => "open",
        Resolved => "resolved",
        Dismissed => "dismissed",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Escalation {
    pub id: EscalationId,
    pub issue: String,
    pub session_id: String,
    pub port_id: Option<String>,
    pub escalation_type: EscalationType,
    pub severity: Severity,
    pub context: serde_json::Value,
    pub suggestion: Option<String>,
    pub status: EscalationStatus,
    pub resolution: Option<String>,
    pub resolved_by: Option<String>,
    pub created_at_ms: u64,
    pub resolved_at_ms: Option<u64>,
}

impl Escalation {
    pub fn new(
        session_id: impl Into<String>,
        escalation_type: EscalationType,
        severity: Severity,
        issue: impl Into<String>,
        created_at_ms: u64,
    ) -> Self {
        Self {
            id: EscalationId::new(),
            issue: issue.into(),
            session_id: session_id.into(),
            port_id: None,
            escalation_type,
            severity,
            context: serde_json::Value::Null,
            suggestion: None,
            status: EscalationStatus::Open,
            resolution: None,
            resolved_by: None,
            created_at_ms,
            resolved_at_ms: None,
        }
    }

    pub fn resolve(&mut self, resolution: impl Into<String>, resolved_by: impl Into<String>, now_ms: u64) {
        self.status = EscalationStatus::Resolved;
        self.resolution = Some(resolution.into());
        self.resolved_by = Some(resolved_by.into());
        self.resolved_at_ms = Some(now_ms);
    }

    pub fn dismiss(&mut self, resolved_by: impl Into<String>, now_ms: u64) {
        self.status = EscalationStatus::Dismissed;
        self.resolved_by = Some(resolved_by.into());
        self.resolved_at_ms = Some(now_ms);
    }
}

crate::builder! {
    pub struct EscalationBuilder => Escalation {
        into {
            issue: String = "test escalation",
            session_id: String = "s1",
        }
        set {
            escalation_type: EscalationType = EscalationType::General,
            severity: Severity = Severity::Low,
            status: EscalationStatus = EscalationStatus::Open,
            context: serde_json::Value = serde_json::Value::Null,
            created_at_ms: u64 = 0,
        }
        option {
            port_id: String = None,
            suggestion: String = None,
            resolution: String = None,
            resolved_by: String = None,
            resolved_at_ms: u64 = None,
        }
        computed {
            id: EscalationId = EscalationId::new(),
        }
    }
}

#[cfg(test)]
#[path = "escalation_tests.rs"]
mod tests;
