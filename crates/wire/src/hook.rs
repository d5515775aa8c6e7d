// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hook stdin/stdout DTOs (spec.md §6): the JSON contract the host
//! assistant's hook subprocess invocations speak to `pal hook <event>` (or,
//! via `pal-daemon::hooks`, to a running `pald`).

use serde::{Deserialize, Serialize};

/// One of the eight recognized hook event names (spec.md §4.7/§6).
/// `session-end` is listed in §6's CLI surface but not spelled out in the
/// §4.7 per-event table; it is dispatched onto
/// `SessionManager::end_with_summary` (§4.3) the same way `port-end` is
/// dispatched onto the checklist gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HookEvent {
    SessionStart,
    SessionEnd,
    PreToolUse,
    PostToolUse,
    PreCompact,
    Stop,
    PortStart,
    PortEnd,
}

impl HookEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            HookEvent::SessionStart => "session-start",
            HookEvent::SessionEnd => "session-end",
            HookEvent::PreToolUse => "pre-tool-use",
            HookEvent::PostToolUse => "post-tool-use",
            HookEvent::PreCompact => "pre-compact",
            HookEvent::Stop => "stop",
            HookEvent::PortStart => "port-start",
            HookEvent::PortEnd => "port-end",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Self> {
        Some(match s {
            "session-start" => HookEvent::SessionStart,
            "session-end" => HookEvent::SessionEnd,
            "pre-tool-use" => HookEvent::PreToolUse,
            "post-tool-use" => HookEvent::PostToolUse,
            "pre-compact" => HookEvent::PreCompact,
            "stop" => HookEvent::Stop,
            "port-start" => HookEvent::PortStart,
            "port-end" => HookEvent::PortEnd,
            _ => return None,
        })
    }
}

/// The JSON record read from stdin by every hook invocation (spec.md §6
/// input shape). Field presence varies by `hook_event_name`; absent
/// event-specific fields deserialize to `None`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct HookInput {
    pub session_id: String,
    #[serde(default)]
    pub transcript_path: String,
    #[serde(default)]
    pub cwd: String,
    pub hook_event_name: String,

    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,

    #[serde(default)]
    pub tool_name: Option<String>,
    #[serde(default)]
    pub tool_input: Option<serde_json::Value>,
    #[serde(default)]
    pub tool_response: Option<serde_json::Value>,
    #[serde(default)]
    pub tool_use_id: Option<String>,

    #[serde(default)]
    pub trigger: Option<String>,
    #[serde(default)]
    pub custom_instructions: Option<String>,

    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub notification_type: Option<String>,
}

impl HookInput {
    pub fn event(&self) -> Option<HookEvent> {
        HookEvent::from_str_loose(&self.hook_event_name)
    }
}

/// The hook's decision, mapped onto the process exit code by the CLI
/// (spec.md §6: 0 normal, 1 hook-blocked).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approve,
    Block,
    Allow,
    Deny,
    Ask,
}

impl Decision {
    pub fn is_blocking(self) -> bool {
        matches!(self, Decision::Block | Decision::Deny)
    }

    pub fn exit_code(self) -> i32 {
        if self.is_blocking() {
            1
        } else {
            0
        }
    }
}

/// `hookSpecificOutput` (spec.md §6 output shape).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct HookSpecificOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notifications: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// The JSON record written to stdout by every hook invocation (spec.md §6
/// output shape).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct HookOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision: Option<Decision>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "continue")]
    pub continue_: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hook_specific_output: Option<HookSpecificOutput>,
}

impl HookOutput {
    pub fn approve() -> Self {
        Self { decision: Some(Decision::Approve), ..Default::default() }
    }

    pub fn block(reason: impl Into<String>) -> Self {
        Self { decision: Some(Decision::Block), reason: Some(reason.into()), ..Default::default() }
    }

    pub fn with_specific(mut self, specific: HookSpecificOutput) -> Self {
        self.hook_specific_output = Some(specific);
        self
    }

    /// Process exit code per spec.md §6: defaults to 0 (no decision means
    /// purely observational hooks like `stop`) unless the decision blocks.
    pub fn exit_code(&self) -> i32 {
        self.decision.map(Decision::exit_code).unwrap_or(0)
    }
}

#[cfg(test)]
#[path = "hook_tests.rs"]
mod tests;
