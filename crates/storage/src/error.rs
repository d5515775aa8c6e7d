// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! StoreError: failures from the WAL, snapshot, migration, and backup
//! layers. Converted into `pal_core::CoreError::Storage` at the crate
//! boundary (§6 ambient error-handling note), matching the teacher's
//! layered `WalError`/`ExecuteError` stack.

use crate::migration::MigrationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("migration error: {0}")]
    Migration(#[from] MigrationError),

    #[error("wal entry at seq {0} is corrupt: {1}")]
    CorruptEntry(u64, String),

    #[error("snapshot schema version {found} is newer than supported {supported}")]
    SnapshotTooNew { found: u32, supported: u32 },

    #[error("no snapshot or wal found at {0}")]
    NotInitialized(String),
}

impl From<StoreError> for pal_core::CoreError {
    fn from(err: StoreError) -> Self {
        pal_core::CoreError::Storage {
            message: err.to_string(),
        }
    }
}
