// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Write-ahead log: the store's transaction boundary (spec.md §4.1). Every
//! committed mutation is appended here as one [`StoreEvent`] before it is
//! applied to `MaterializedState`; a WAL append is the commit point, and the
//! store's single-threaded replay is the isolation mechanism.
//!
//! Generalizes the teacher's own WAL (unseen in this retrieval pack except
//! through its test suite, `wal_tests.rs`) to carry `StoreEvent` instead of
//! the teacher's job/agent event enum; the on-disk format, corruption
//! handling, and flush-threshold behavior are reconstructed from that test
//! suite's observable contract.

use crate::event::StoreEvent;
use crate::util::rotate_bak_path;
use crate::StoreError;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const FLUSH_COUNT_THRESHOLD: usize = 100;
const FLUSH_INTERVAL: Duration = Duration::from_secs(5);

/// One committed WAL entry: a sequence number plus the event it recorded.
#[derive(Debug, Clone)]
pub struct WalEntry {
    pub seq: u64,
    pub event: StoreEvent,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct WalLine {
    seq: u64,
    event: StoreEvent,
}

/// An open, append-only write-ahead log.
pub struct Wal {
    path: PathBuf,
    writer: File,
    entries: Vec<WalEntry>,
    write_seq: u64,
    processed_seq: u64,
    next_unprocessed_idx: usize,
    unflushed_count: usize,
    last_flush: Instant,
}

impl Wal {
    /// Opens (creating if absent) the WAL at `path`, replaying existing
    /// entries into memory. `processed_seq` is the sequence number the
    /// caller has already materialized (typically from a snapshot header);
    /// entries at or below it are loaded but excluded from
    /// [`Wal::next_unprocessed`]'s stream.
    ///
    /// A corrupt tail (invalid JSON, e.g. a partial write from a crash) is
    /// rotated to a `.bak` file (see [`rotate_bak_path`]) and the clean
    /// prefix is kept.
    pub fn open(path: impl AsRef<Path>, processed_seq: u64) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let (entries, corrupt) = if path.exists() {
            Self::read_entries(&path)?
        } else {
            (Vec::new(), false)
        };

        if corrupt {
            let bak = rotate_bak_path(&path);
            fs::rename(&path, &bak)?;
            Self::rewrite_clean(&path, &entries)?;
        }

        let write_seq = entries.last().map(|e| e.seq).unwrap_or(0);
        let next_unprocessed_idx = entries.iter().take_while(|e| e.seq <= processed_seq).count();

        let writer = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            writer,
            entries,
            write_seq,
            processed_seq,
            next_unprocessed_idx,
            unflushed_count: 0,
            last_flush: Instant::now(),
        })
    }

    /// Reads and parses every line, stopping at the first malformed one.
    /// Returns the valid prefix and whether a corrupt tail was found.
    fn read_entries(path: &Path) -> Result<(Vec<WalEntry>, bool), StoreError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut entries = Vec::new();
        let mut corrupt = false;

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<WalLine>(&line) {
                Ok(parsed) => entries.push(WalEntry {
                    seq: parsed.seq,
                    event: parsed.event,
                }),
                Err(_) => {
                    corrupt = true;
                    break;
                }
            }
        }

        Ok((entries, corrupt))
    }

    fn rewrite_clean(path: &Path, entries: &[WalEntry]) -> Result<(), StoreError> {
        let mut file = File::create(path)?;
        for entry in entries {
            Self::write_line(&mut file, entry.seq, &entry.event)?;
        }
        file.flush()?;
        Ok(())
    }

    fn write_line(file: &mut File, seq: u64, event: &StoreEvent) -> Result<(), StoreError> {
        let line = WalLine {
            seq,
            event: event.clone(),
        };
        let json = serde_json::to_string(&line)?;
        writeln!(file, "{json}")?;
        Ok(())
    }

    /// Appends `event`, assigning it the next sequence number (1-indexed).
    /// Written to the OS file buffer immediately; call [`Wal::flush`] for a
    /// durability barrier.
    pub fn append(&mut self, event: &StoreEvent) -> Result<u64, StoreError> {
        let seq = self.write_seq + 1;
        Self::write_line(&mut self.writer, seq, event)?;
        self.entries.push(WalEntry {
            seq,
            event: event.clone(),
        });
        self.write_seq = seq;
        self.unflushed_count += 1;
        Ok(seq)
    }

    /// Flushes and fsyncs the underlying file.
    pub fn flush(&mut self) -> Result<(), StoreError> {
        self.writer.flush()?;
        self.writer.sync_data()?;
        self.unflushed_count = 0;
        self.last_flush = Instant::now();
        Ok(())
    }

    /// True once enough unflushed writes have accumulated (or enough time
    /// has passed) that the caller should call [`Wal::flush`].
    pub fn needs_flush(&self) -> bool {
        self.unflushed_count >= FLUSH_COUNT_THRESHOLD || self.last_flush.elapsed() >= FLUSH_INTERVAL
    }

    pub fn write_seq(&self) -> u64 {
        self.write_seq
    }

    pub fn processed_seq(&self) -> u64 {
        self.processed_seq
    }

    /// Records that state has been materialized up to and including `seq`
    /// (typically right after a snapshot write).
    pub fn mark_processed(&mut self, seq: u64) {
        self.processed_seq = self.processed_seq.max(seq);
    }

    /// Returns the next entry past the read cursor, advancing it. Does not
    /// depend on [`Wal::mark_processed`] — this is a separate forward-only
    /// iteration over the whole log, used during replay.
    pub fn next_unprocessed(&mut self) -> Result<Option<WalEntry>, StoreError> {
        if self.next_unprocessed_idx >= self.entries.len() {
            return Ok(None);
        }
        let entry = self.entries[self.next_unprocessed_idx].clone();
        self.next_unprocessed_idx += 1;
        Ok(Some(entry))
    }

    /// All entries with `seq > after`, in order.
    pub fn entries_after(&self, after: u64) -> Result<Vec<WalEntry>, StoreError> {
        Ok(self.entries.iter().filter(|e| e.seq > after).cloned().collect())
    }

    /// Drops entries with `seq < keep_from` from memory and rewrites the
    /// on-disk file to match (used after a snapshot makes them redundant).
    pub fn truncate_before(&mut self, keep_from: u64) -> Result<(), StoreError> {
        self.entries.retain(|e| e.seq >= keep_from);
        self.next_unprocessed_idx = self.entries.iter().take_while(|e| e.seq <= self.processed_seq).count();
        Self::rewrite_clean(&self.path, &self.entries)?;
        self.writer = OpenOptions::new().create(true).append(true).open(&self.path)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
