// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The coordination core's error taxonomy.
//!
//! Every component operation returns one of these kinds rather than
//! panicking. The hook dispatcher and HTTP surface map them to stderr
//! advisories, JSON `reason` fields, and problem documents respectively;
//! none of them represent a corrupted store.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A structured per-step checklist outcome, carried by [`CoreError::ChecklistFailed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistFailure {
    pub step: String,
    pub command: String,
    pub exit_code: Option<i32>,
    /// Captured output, truncated to 5 lines per the checklist gate contract.
    pub output: String,
}

#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum CoreError {
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    #[error("already locked by session {owner_session}")]
    AlreadyLocked { owner_session: String },

    #[error("conflict: {reason}")]
    Conflict { reason: String },

    #[error("invalid transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("dependency cycle detected in pipeline {pipeline_id}")]
    DependencyCycle { pipeline_id: String },

    #[error("checklist failed on port {port_id}")]
    ChecklistFailed {
        port_id: String,
        failures: Vec<ChecklistFailure>,
    },

    #[error("token budget exhausted for session {session_id}: {usage_ratio:.2}")]
    TokenExhausted {
        session_id: String,
        usage_ratio: f64,
    },

    #[error("parent session {parent_id} has terminated")]
    ParentTerminated { parent_id: String },

    #[error("storage error: {message}")]
    Storage { message: String },

    #[error("invalid configuration: {message}")]
    ConfigInvalid { message: String },
}

impl CoreError {
    /// Process exit code per the hook contract (spec §6): 0 normal, 1
    /// hook-blocked, 2 usage error, 3 internal store failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            CoreError::Storage { .. } => 3,
            CoreError::ChecklistFailed { .. }
            | CoreError::AlreadyLocked { .. }
            | CoreError::Conflict { .. }
            | CoreError::InvalidTransition { .. }
            | CoreError::DependencyCycle { .. }
            | CoreError::TokenExhausted { .. }
            | CoreError::ParentTerminated { .. } => 1,
            CoreError::NotFound { .. } | CoreError::ConfigInvalid { .. } => 2,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
