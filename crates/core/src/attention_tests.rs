// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn new_state_satisfies_budget_invariant() {
    let state = AttentionState::new("s1", 10_000);
    assert_eq!(state.loaded_tokens + state.available_tokens, state.token_budget);
}

#[test]
fn set_loaded_tokens_preserves_invariant() {
    let mut state = AttentionState::new("s1", 10_000);
    state.set_loaded_tokens(8_100);
    assert_eq!(state.loaded_tokens + state.available_tokens, state.token_budget);
    assert_eq!(state.available_tokens, 1_900);
}

#[test]
fn record_file_loaded_is_idempotent() {
    let mut state = AttentionState::new("s1", 10_000);
    state.record_file_loaded("src/main.rs");
    state.record_file_loaded("src/main.rs");
    assert_eq!(state.loaded_files.len(), 1);
}
