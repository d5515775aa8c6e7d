// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Config: typed mirror of the project-local YAML configuration
//! (spec.md §6, SPEC_FULL.md §6 "ambient Config loading").
//!
//! Loaded by `pal-daemon` via `serde_yaml`; defined here (I/O-free) so both
//! `pal-engine` and `pal-daemon` can depend on the same typed shape without
//! `pal-engine` pulling in a YAML parser.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingMode {
    Strict,
    Warn,
    Off,
}

impl Default for TrackingMode {
    fn default() -> Self {
        TrackingMode::Warn
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub mode: TrackingMode,
    pub auto_create: bool,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            mode: TrackingMode::default(),
            auto_create: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestrationConfig {
    pub max_concurrency: u32,
    pub parallel_enabled: bool,
    /// Seconds. Defaults to 30 minutes, matching `timeout_per_port` (30m).
    pub timeout_per_port_s: u64,
}

impl Default for OrchestrationConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 3,
            parallel_enabled: true,
            timeout_per_port_s: 30 * 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AttentionConfig {
    pub token_budget_default: u64,
    pub warn_ratio: f64,
    pub critical_ratio: f64,
    pub escalate_ratio: f64,
}

impl Default for AttentionConfig {
    fn default() -> Self {
        Self {
            token_budget_default: 15_000,
            warn_ratio: 0.80,
            critical_ratio: 0.90,
            escalate_ratio: 0.95,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackupSchedule {
    Daily,
    Weekly,
    OnSessionEnd,
}

impl Default for BackupSchedule {
    fn default() -> Self {
        BackupSchedule::Daily
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupRetention {
    pub count: u32,
    pub days: u32,
}

impl Default for BackupRetention {
    fn default() -> Self {
        Self { count: 7, days: 30 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    pub auto_enabled: bool,
    pub schedule: BackupSchedule,
    pub retention: BackupRetention,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            auto_enabled: false,
            schedule: BackupSchedule::default(),
            retention: BackupRetention::default(),
            include: vec!["store".to_string(), "sessions".to_string()],
            exclude: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub loopback_only: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            loopback_only: true,
        }
    }
}

/// The full project-local `.pal/config.yml`. Missing file -> all defaults;
/// unknown top-level key -> `CoreError::ConfigInvalid` (enforced by the
/// loader in `pal-daemon::config`, which uses `serde_yaml`'s
/// `deny_unknown_fields` via a strict intermediate struct — kept here as
/// the permissive, always-constructible default-filled shape so callers
/// that only need defaults never depend on `pal-daemon`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tracking: TrackingConfig,
    pub orchestration: OrchestrationConfig,
    pub attention: AttentionConfig,
    pub backup: BackupConfig,
    pub server: ServerConfig,
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
