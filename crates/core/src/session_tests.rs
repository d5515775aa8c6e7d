// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn root_session_has_depth_zero_and_self_path() {
    let cfg = SessionConfig::builder("b1").build();
    let s = Session::new_root(cfg, 1000);
    assert_eq!(s.depth, 0);
    assert_eq!(s.root_id, "b1");
    assert_eq!(s.path, "b1");
    assert_eq!(s.expected_depth(), 0);
    assert_eq!(s.expected_root_id(), "b1");
}

#[test]
fn child_session_inherits_root_and_extends_path() {
    let root = Session::new_root(SessionConfig::builder("b1").build(), 1000);
    let child_cfg = SessionConfig::builder("op1").parent_id("b1").build();
    let child = Session::child_of(child_cfg, &root, 1001);
    assert_eq!(child.depth, 1);
    assert_eq!(child.root_id, "b1");
    assert_eq!(child.path, "b1/op1");

    let grandchild_cfg = SessionConfig::builder("w1").parent_id("op1").build();
    let grandchild = Session::child_of(grandchild_cfg, &child, 1002);
    assert_eq!(grandchild.depth, 2);
    assert_eq!(grandchild.root_id, "b1");
    assert_eq!(grandchild.path, "b1/op1/w1");
    assert_eq!(grandchild.expected_depth(), 2);
    assert_eq!(grandchild.expected_root_id(), "b1");
}

#[test]
fn usage_ratio_excludes_cache_reads() {
    let mut s = Session::builder().token_budget(1000).build();
    s.update_usage(400, 100, 9999, 100, 0.01);
    // 400 + 100 + 100 = 600 / 1000
    assert!((s.usage_ratio() - 0.6).abs() < 1e-9);
}

#[test]
fn zero_budget_disables_attention() {
    let s = Session::builder().token_budget(0).build();
    assert!(!s.attention_enabled());
    assert_eq!(s.usage_ratio(), 0.0);
}

#[test]
fn update_usage_is_monotone() {
    let mut s = Session::builder().build();
    s.update_usage(100, 50, 0, 0, 1.0);
    s.update_usage(50, 20, 0, 0, 0.5);
    assert_eq!(s.usage.input_tokens, 100);
    assert_eq!(s.usage.output_tokens, 50);
    assert_eq!(s.usage.cost_usd, 1.0);
}

#[test]
fn increment_compact_is_monotone_non_decreasing() {
    let mut s = Session::builder().build();
    assert_eq!(s.compact_count, 0);
    s.increment_compact(10);
    s.increment_compact(20);
    assert_eq!(s.compact_count, 2);
    assert_eq!(s.last_compact_at, Some(20));
}

#[test]
fn is_descendant_path_matches_prefix() {
    let leaf = Session::builder().id("w1").path("b1/op1/w1").build();
    assert!(leaf.is_descendant_path("b1"));
    assert!(leaf.is_descendant_path("b1/op1"));
    assert!(!leaf.is_descendant_path("b2"));
}
