// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::TempDir;

#[test]
fn missing_file_yields_defaults() {
    let dir = TempDir::new().unwrap();
    let config = load_config(&dir.path().join("config.yml")).unwrap();
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.attention.warn_ratio, 0.80);
}

#[test]
fn partial_yaml_fills_remaining_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yml");
    std::fs::write(&path, "orchestration:\n  max_concurrency: 5\n").unwrap();
    let config = load_config(&path).unwrap();
    assert_eq!(config.orchestration.max_concurrency, 5);
    assert!(config.orchestration.parallel_enabled);
    assert_eq!(config.backup.retention.count, 7);
}

#[test]
fn unknown_top_level_key_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yml");
    std::fs::write(&path, "tracking:\n  mode: strict\nbogus_section:\n  foo: 1\n").unwrap();
    let err = load_config(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}
