// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pal-storage: the embedded, single-process store (spec.md §4.1).
//!
//! A WAL append is the transaction boundary; the single-threaded
//! `MaterializedState::apply_event` replay under a `parking_lot::RwLock` is
//! the isolation mechanism. No SQL engine is used — this generalizes the
//! teacher's own hand-rolled WAL + materialized-state approach rather than
//! reaching for a database crate, per the resolved Open Question recorded
//! in the grounding ledger.

pub mod backup;
pub mod error;
pub mod event;
pub mod integrity;
pub mod migration;
pub mod snapshot;
pub mod state;
mod util;
mod wal;

pub use backup::{BackupManifest, BackupStats, RestoreMode, RestoreReport};
pub use error::StoreError;
pub use event::StoreEvent;
pub use integrity::{Finding, FindingLevel, IntegrityReport};
pub use migration::{Migration, MigrationError, MigrationRegistry};
pub use snapshot::{Snapshot, CURRENT_SNAPSHOT_VERSION};
pub use state::{MaterializedState, MergeStats, SessionEvent};
pub use wal::{Wal, WalEntry};

use chrono::Utc;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const SNAPSHOT_FILE: &str = "snapshot.zst";
const WAL_FILE: &str = "wal.jsonl";

/// An open store: a directory holding `snapshot.zst` and `wal.jsonl`, plus
/// the derived in-memory state they reconstruct.
pub struct Store {
    dir: PathBuf,
    wal: Wal,
    state: RwLock<MaterializedState>,
}

impl Store {
    /// Opens the store rooted at `dir`, creating it if absent. Loads the
    /// most recent snapshot (migrating it forward if needed), then replays
    /// every WAL entry past the snapshot's `seq` to reach current state.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;

        let registry = MigrationRegistry::new();
        let snapshot_path = dir.join(SNAPSHOT_FILE);
        let loaded = Snapshot::read(&snapshot_path, &registry)?;

        let (mut state, snapshot_seq) = match loaded {
            Some(snapshot) => (snapshot.state, snapshot.seq),
            None => (MaterializedState::default(), 0),
        };

        let mut wal = Wal::open(dir.join(WAL_FILE), snapshot_seq)?;
        let mut replayed = 0u64;
        while let Some(entry) = wal.next_unprocessed()? {
            state.apply_event(&entry.event);
            wal.mark_processed(entry.seq);
            replayed += 1;
        }
        debug!(replayed, snapshot_seq, "replayed wal entries on open");

        Ok(Self {
            dir,
            wal,
            state: RwLock::new(state),
        })
    }

    /// Commits `event`: appends it to the WAL (the transaction boundary),
    /// then applies it to the materialized state. Flushes the WAL if the
    /// flush threshold has been crossed.
    pub fn commit(&mut self, event: StoreEvent) -> Result<u64, StoreError> {
        let seq = self.wal.append(&event)?;
        self.state.write().apply_event(&event);
        self.wal.mark_processed(seq);
        if self.wal.needs_flush() {
            self.wal.flush()?;
        }
        Ok(seq)
    }

    /// Runs `f` against the current materialized state under a read lock.
    pub fn query<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&MaterializedState) -> T,
    {
        f(&self.state.read())
    }

    /// The sequence number of the most recently committed event.
    pub fn version(&self) -> u64 {
        self.wal.write_seq()
    }

    /// Flushes the WAL and writes a fresh snapshot, then truncates WAL
    /// entries the snapshot has made redundant (spec.md §4.1 checkpoint).
    pub fn checkpoint(&mut self) -> Result<(), StoreError> {
        self.wal.flush()?;
        let seq = self.wal.write_seq();
        let snapshot = Snapshot::new(seq, self.state.read().clone(), Utc::now());
        snapshot.write(&self.dir.join(SNAPSHOT_FILE))?;
        self.wal.truncate_before(seq + 1)?;
        info!(seq, "wrote checkpoint snapshot");
        Ok(())
    }

    /// Flushes any unwritten WAL entries. Does not checkpoint.
    pub fn close(&mut self) -> Result<(), StoreError> {
        self.wal.flush()
    }

    /// Path to this store's snapshot file, for backup/restore callers.
    pub fn snapshot_path(&self) -> PathBuf {
        self.dir.join(SNAPSHOT_FILE)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
