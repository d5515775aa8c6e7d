// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Maps a forwarded daemon response's [`Problem`] body onto the same exit
//! codes an embedded [`pal_core::CoreError`] would produce (SPEC_FULL.md
//! §6), so a command behaves identically whether `pald` is running or not.

use crate::exit_error::ExitError;
use pal_wire::Problem;

/// Exit code for a `Problem.kind`, mirroring `CoreError::exit_code()`:
/// `storage` -> 3; `not_found`/`config_invalid` -> 2; everything else
/// (domain-rule conflicts) -> 1.
fn exit_code_for_kind(kind: &str) -> i32 {
    match kind {
        "storage" => 3,
        "not_found" | "config_invalid" => 2,
        _ => 1,
    }
}

pub fn to_exit_error(problem: Problem) -> ExitError {
    ExitError::new(exit_code_for_kind(&problem.kind), problem.detail)
}

pub async fn response_to_exit_error(response: reqwest::Response) -> ExitError {
    match response.json::<Problem>().await {
        Ok(problem) => to_exit_error(problem),
        Err(err) => ExitError::new(3, format!("daemon returned an unreadable error body: {err}")),
    }
}
