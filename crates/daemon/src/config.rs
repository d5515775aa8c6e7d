// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Strict loader for `.pal/config.yml` (SPEC_FULL.md §6 ambient config
//! loading).
//!
//! `pal_core::Config` is the permissive, always-constructible shape every
//! other crate depends on (`#[serde(default)]` on every field, so it never
//! fails to build). This module is the one place that actually reads YAML
//! off disk: it deserializes into a `deny_unknown_fields` mirror first so a
//! typo'd key surfaces as `CoreError::ConfigInvalid` instead of silently
//! falling back to the default, then converts into the permissive shape.

use pal_core::config::{AttentionConfig, BackupConfig, OrchestrationConfig, ServerConfig, TrackingConfig};
use pal_core::{Config, CoreError};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read { path: String, source: std::io::Error },
    #[error("invalid config at {path}: {source}")]
    Parse { path: String, source: serde_yaml::Error },
}

impl From<ConfigError> for CoreError {
    fn from(err: ConfigError) -> Self {
        CoreError::ConfigInvalid { message: err.to_string() }
    }
}

/// Mirrors `pal_core::Config` field-for-field but rejects unknown keys, so
/// this is the only type that ever sees the raw YAML document.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct StrictConfig {
    tracking: TrackingConfig,
    orchestration: OrchestrationConfig,
    attention: AttentionConfig,
    backup: BackupConfig,
    server: ServerConfig,
}

impl Default for StrictConfig {
    fn default() -> Self {
        let defaults = Config::default();
        Self {
            tracking: defaults.tracking,
            orchestration: defaults.orchestration,
            attention: defaults.attention,
            backup: defaults.backup,
            server: defaults.server,
        }
    }
}

impl From<StrictConfig> for Config {
    fn from(strict: StrictConfig) -> Self {
        Config {
            tracking: strict.tracking,
            orchestration: strict.orchestration,
            attention: strict.attention,
            backup: strict.backup,
            server: strict.server,
        }
    }
}

/// Loads `config_path`. A missing file yields every field at its default
/// (SPEC_FULL.md §6: "missing file ⇒ all defaults"); an unknown top-level
/// or nested key is rejected rather than ignored.
pub fn load_config(config_path: &Path) -> Result<Config, ConfigError> {
    if !config_path.exists() {
        return Ok(Config::default());
    }
    let raw = std::fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
        path: config_path.display().to_string(),
        source,
    })?;
    let strict: StrictConfig = serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: config_path.display().to_string(),
        source,
    })?;
    Ok(strict.into())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
