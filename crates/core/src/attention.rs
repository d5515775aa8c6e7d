// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! AttentionState: one row per session, tracking loaded/available tokens
//! against the session's budget (spec.md §3/§4.4).

use serde::{Deserialize, Serialize};

/// Invariant: `loaded_tokens + available_tokens = token_budget` at every
/// committed mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttentionState {
    pub session_id: String,
    pub loaded_tokens: u64,
    pub available_tokens: u64,
    pub token_budget: u64,
    pub focus_score: f64,
    pub drift_score: f64,
    pub drift_count: u32,
    pub last_compact_at_ms: Option<u64>,
    pub loaded_files: Vec<String>,
    pub loaded_conventions: Vec<String>,
    pub context_hash: String,
}

impl AttentionState {
    pub fn new(session_id: impl Into<String>, token_budget: u64) -> Self {
        Self {
            session_id: session_id.into(),
            loaded_tokens: 0,
            available_tokens: token_budget,
            token_budget,
            focus_score: 1.0,
            drift_score: 0.0,
            drift_count: 0,
            last_compact_at_ms: None,
            loaded_files: Vec::new(),
            loaded_conventions: Vec::new(),
            context_hash: String::new(),
        }
    }

    /// Re-derives `available_tokens` from `loaded_tokens` so the invariant
    /// holds after any mutation to `loaded_tokens` or `token_budget`.
    pub fn recompute_available(&mut self) {
        self.available_tokens = self.token_budget.saturating_sub(self.loaded_tokens);
    }

    pub fn set_loaded_tokens(&mut self, loaded_tokens: u64) {
        self.loaded_tokens = loaded_tokens;
        self.recompute_available();
    }

    pub fn record_file_loaded(&mut self, path: impl Into<String>) {
        let path = path.into();
        if !self.loaded_files.contains(&path) {
            self.loaded_files.push(path);
        }
    }

    pub fn record_drift(&mut self) {
        self.drift_count += 1;
    }
}

crate::builder! {
    pub struct AttentionStateBuilder => AttentionState {
        into {
            session_id: String = "s1",
            context_hash: String = "",
        }
        set {
            loaded_tokens: u64 = 0,
            available_tokens: u64 = 15_000,
            token_budget: u64 = 15_000,
            focus_score: f64 = 1.0,
            drift_score: f64 = 0.0,
            drift_count: u32 = 0,
            loaded_files: Vec<String> = Vec::new(),
            loaded_conventions: Vec<String> = Vec::new(),
        }
        option {
            last_compact_at_ms: u64 = None,
        }
    }
}

#[cfg(test)]
#[path = "attention_tests.rs"]
mod tests;
