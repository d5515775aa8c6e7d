// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn defaults_match_spec_table() {
    let config = Config::default();
    assert_eq!(config.tracking.mode, TrackingMode::Warn);
    assert!(!config.tracking.auto_create);
    assert_eq!(config.orchestration.max_concurrency, 3);
    assert!(config.orchestration.parallel_enabled);
    assert_eq!(config.orchestration.timeout_per_port_s, 1800);
    assert_eq!(config.attention.token_budget_default, 15_000);
    assert_eq!(config.attention.warn_ratio, 0.80);
    assert_eq!(config.attention.critical_ratio, 0.90);
    assert_eq!(config.attention.escalate_ratio, 0.95);
    assert!(!config.backup.auto_enabled);
    assert_eq!(config.backup.schedule, BackupSchedule::Daily);
    assert_eq!(config.backup.retention.count, 7);
    assert_eq!(config.backup.retention.days, 30);
    assert_eq!(config.server.port, 8080);
    assert!(config.server.loopback_only);
}

#[test]
fn deserializes_partial_document_with_defaults() {
    // `serde(default)` applies regardless of wire format; JSON exercises the
    // same codepath `pal-daemon`'s `serde_yaml` loader relies on without
    // adding a YAML dev-dependency to this I/O-free crate.
    let partial = serde_json::json!({ "orchestration": { "max_concurrency": 1 } });
    let config: Config = serde_json::from_value(partial).unwrap();
    assert_eq!(config.orchestration.max_concurrency, 1);
    assert_eq!(config.attention.token_budget_default, 15_000);
}
