// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot persistence for crash recovery (spec.md §4.1).
//!
//! A snapshot stores the complete `MaterializedState` at a point in time,
//! identified by the WAL sequence number it was taken after. Recovery loads
//! the snapshot and replays WAL entries with `seq` greater than that
//! number. The on-disk body is zstd-compressed JSON (`pal-storage` promotes
//! the teacher's dev-only `zstd` dependency to a runtime one for this).

use crate::migration::MigrationRegistry;
use crate::state::MaterializedState;
use crate::util::rotate_bak_path;
use crate::StoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Current snapshot schema version.
pub const CURRENT_SNAPSHOT_VERSION: u32 = 1;

const ZSTD_LEVEL: i32 = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "v")]
    pub version: u32,
    pub seq: u64,
    pub state: MaterializedState,
    pub created_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(seq: u64, state: MaterializedState, created_at: DateTime<Utc>) -> Self {
        Self {
            version: CURRENT_SNAPSHOT_VERSION,
            seq,
            state,
            created_at,
        }
    }

    /// Writes this snapshot to `path`, zstd-compressed. An existing file at
    /// `path` is rotated to `.bak` first (see [`rotate_bak_path`]).
    pub fn write(&self, path: &Path) -> Result<(), StoreError> {
        if path.exists() {
            let bak = rotate_bak_path(path);
            fs::rename(path, bak)?;
        }
        let compressed = self.to_compressed_bytes()?;
        fs::write(path, compressed)?;
        Ok(())
    }

    /// Reads and migrates a snapshot from `path`, if it exists.
    pub fn read(path: &Path, registry: &MigrationRegistry) -> Result<Option<Self>, StoreError> {
        if !path.exists() {
            return Ok(None);
        }
        let compressed = fs::read(path)?;
        Ok(Some(Self::from_compressed_bytes(&compressed, registry)?))
    }

    /// Decodes and migrates a snapshot from already-read zstd-compressed
    /// bytes (shared with backup restore, which extracts the snapshot from
    /// a tar archive rather than a bare file).
    pub fn from_compressed_bytes(compressed: &[u8], registry: &MigrationRegistry) -> Result<Self, StoreError> {
        let json = zstd::decode_all(compressed)?;
        let raw: serde_json::Value = serde_json::from_slice(&json)?;

        let found_version = raw["v"].as_u64().unwrap_or(0) as u32;
        if found_version > CURRENT_SNAPSHOT_VERSION {
            return Err(StoreError::SnapshotTooNew {
                found: found_version,
                supported: CURRENT_SNAPSHOT_VERSION,
            });
        }

        let migrated = registry.migrate_to(raw, CURRENT_SNAPSHOT_VERSION)?;
        let snapshot: Snapshot = serde_json::from_value(migrated)?;
        Ok(snapshot)
    }

    /// Serializes and zstd-compresses this snapshot without touching disk
    /// (used when bundling a snapshot into a backup archive in memory).
    pub fn to_compressed_bytes(&self) -> Result<Vec<u8>, StoreError> {
        let json = serde_json::to_vec(self)?;
        Ok(zstd::encode_all(json.as_slice(), ZSTD_LEVEL)?)
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
