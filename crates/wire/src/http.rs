// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP request/response DTOs for the loopback query/command surface
//! (spec.md §4.9). The read endpoints (`GET /api/v2/sessions`, `/ports`,
//! `/pipelines/:id`, `/escalations`, ...) serialize `pal-core` domain types
//! directly; this module covers the command-endpoint request bodies and
//! the shared JSON error document.

use pal_core::error::CoreError;
use serde::{Deserialize, Serialize};

/// `POST /api/v2/ports/:id/retry` body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PortRetryRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

/// `POST /api/v2/escalations/:id/resolve` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ResolveEscalationRequest {
    pub resolution: String,
}

/// `pal backup restore` / `POST /api/v2/data/repair`-adjacent restore
/// request (spec.md §4.10): `--replace` overwrites the store file
/// atomically, `--merge` performs a row-by-row `INSERT OR IGNORE` merge.
/// `dry_run` returns the set of rows that would change without writing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RestoreRequest {
    pub archive_path: String,
    #[serde(default)]
    pub mode: RestoreMode,
    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestoreMode {
    #[default]
    Replace,
    Merge,
}

/// JSON error body for every non-2xx response (spec.md §4.9 ambient
/// grounding note: `Problem` mapped from [`CoreError`], the HTTP analogue of
/// the teacher's `ExitError{code,message}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Problem {
    pub kind: String,
    pub status: u16,
    pub detail: String,
}

impl Problem {
    /// HTTP status mapped from a [`CoreError`] variant. `NotFound`/
    /// `ConfigInvalid` → 404/400 (exit code 2 in the CLI); `InvalidTransition`/
    /// `Conflict`/`AlreadyLocked`/`DependencyCycle`/`TokenExhausted`/
    /// `ParentTerminated`/`ChecklistFailed` → 409 (exit code 1); `Storage` →
    /// 500 (exit code 3).
    pub fn status_for(error: &CoreError) -> u16 {
        match error {
            CoreError::NotFound { .. } => 404,
            CoreError::ConfigInvalid { .. } => 400,
            CoreError::Storage { .. } => 500,
            CoreError::AlreadyLocked { .. }
            | CoreError::Conflict { .. }
            | CoreError::InvalidTransition { .. }
            | CoreError::DependencyCycle { .. }
            | CoreError::ChecklistFailed { .. }
            | CoreError::TokenExhausted { .. }
            | CoreError::ParentTerminated { .. } => 409,
        }
    }

    fn kind_for(error: &CoreError) -> &'static str {
        match error {
            CoreError::NotFound { .. } => "not_found",
            CoreError::AlreadyLocked { .. } => "already_locked",
            CoreError::Conflict { .. } => "conflict",
            CoreError::InvalidTransition { .. } => "invalid_transition",
            CoreError::DependencyCycle { .. } => "dependency_cycle",
            CoreError::ChecklistFailed { .. } => "checklist_failed",
            CoreError::TokenExhausted { .. } => "token_exhausted",
            CoreError::ParentTerminated { .. } => "parent_terminated",
            CoreError::Storage { .. } => "storage",
            CoreError::ConfigInvalid { .. } => "config_invalid",
        }
    }
}

impl From<&CoreError> for Problem {
    fn from(error: &CoreError) -> Self {
        Problem { kind: Self::kind_for(error).to_string(), status: Self::status_for(error), detail: error.to_string() }
    }
}

impl From<CoreError> for Problem {
    fn from(error: CoreError) -> Self {
        Problem::from(&error)
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
