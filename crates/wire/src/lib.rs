// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pal-wire: hook and HTTP request/response DTOs shared between `pal-cli`
//! and `pal-daemon` (spec.md §6, §4.9).
//!
//! No orchestration logic lives here, matching the teacher's `oj-wire`
//! split (DTO crate with zero storage/engine dependency): these are flat,
//! `#[serde(rename_all = "snake_case")]` structs both binaries depend on so
//! the wire shape is defined exactly once.

pub mod hook;
pub mod http;

pub use hook::{Decision, HookInput, HookOutput, HookSpecificOutput};
pub use http::{PortRetryRequest, Problem, ResolveEscalationRequest, RestoreRequest};
