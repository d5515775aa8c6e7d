// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Backup, restore, and integrity checking (spec.md §4.10).
//!
//! An archive is a single `tar` stream, zstd-compressed, containing
//! `manifest.json` and a `store/snapshot.zst` entry. Generalizes the
//! teacher's single-file `rotate_bak_path()` snapshot rotation
//! (`util::rotate_bak_path`) to a self-describing, portable bundle; `tar`
//! is a new dependency this crate needed that the teacher never did, since
//! its snapshot was always a single file with no manifest to bundle.

use crate::migration::MigrationRegistry;
use crate::snapshot::{Snapshot, CURRENT_SNAPSHOT_VERSION};
use crate::state::{MaterializedState, MergeStats};
use crate::StoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

const ARCHIVE_FORMAT_VERSION: u32 = 1;
const MANIFEST_ENTRY: &str = "manifest.json";
const SNAPSHOT_ENTRY: &str = "store/snapshot.zst";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupStats {
    pub sessions: usize,
    pub ports: usize,
    pub pipelines: usize,
    pub escalations: usize,
    pub direct_messages: usize,
}

impl BackupStats {
    fn from_state(state: &MaterializedState) -> Self {
        Self {
            sessions: state.sessions.len(),
            ports: state.ports.len(),
            pipelines: state.pipelines.len(),
            escalations: state.escalations.len(),
            direct_messages: state.direct_messages.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupManifest {
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub schema_version: u32,
    pub project: String,
    pub contents: Vec<String>,
    pub stats: BackupStats,
    pub checksum: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreMode {
    Replace,
    Merge,
}

#[derive(Debug, Clone)]
pub struct RestoreReport {
    pub dry_run: bool,
    pub mode: RestoreMode,
    pub manifest: BackupManifest,
    pub merged: Option<MergeStats>,
}

fn checksum_of(bytes: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    bytes.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

fn archive_filename(at: DateTime<Utc>) -> String {
    format!("backup-{}.pal.tar.zst", at.format("%Y%m%dT%H%M%SZ"))
}

/// Builds a backup archive from the snapshot currently on disk at
/// `snapshot_path`, writing it into `backups_dir`. Returns the archive's
/// path. Callers are expected to have just checkpointed (flushed the WAL
/// and written a fresh snapshot) before calling this.
pub fn create(snapshot_path: &Path, backups_dir: &Path, project: &str) -> Result<PathBuf, StoreError> {
    if !snapshot_path.exists() {
        return Err(StoreError::NotInitialized(snapshot_path.display().to_string()));
    }
    let registry = MigrationRegistry::new();
    let snapshot = Snapshot::read(snapshot_path, &registry)?
        .ok_or_else(|| StoreError::NotInitialized(snapshot_path.display().to_string()))?;
    let snapshot_bytes = snapshot.to_compressed_bytes()?;

    let manifest = BackupManifest {
        version: ARCHIVE_FORMAT_VERSION,
        created_at: Utc::now(),
        schema_version: snapshot.version,
        project: project.to_string(),
        contents: vec!["store".to_string()],
        stats: BackupStats::from_state(&snapshot.state),
        checksum: checksum_of(&snapshot_bytes),
    };
    let manifest_bytes = serde_json::to_vec_pretty(&manifest)?;

    let mut tar_bytes = Vec::new();
    {
        let mut builder = tar::Builder::new(&mut tar_bytes);
        append_entry(&mut builder, MANIFEST_ENTRY, &manifest_bytes)?;
        append_entry(&mut builder, SNAPSHOT_ENTRY, &snapshot_bytes)?;
        builder.finish()?;
    }
    let compressed = zstd::encode_all(tar_bytes.as_slice(), 3)?;

    std::fs::create_dir_all(backups_dir)?;
    let dest = backups_dir.join(archive_filename(manifest.created_at));
    std::fs::write(&dest, compressed)?;
    Ok(dest)
}

fn append_entry<W: std::io::Write>(builder: &mut tar::Builder<W>, name: &str, bytes: &[u8]) -> Result<(), StoreError> {
    let mut header = tar::Header::new_gnu();
    header.set_size(bytes.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder.append_data(&mut header, name, Cursor::new(bytes))?;
    Ok(())
}

/// Lists backup archives in `backups_dir`, most recent first.
pub fn list(backups_dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
    if !backups_dir.exists() {
        return Ok(Vec::new());
    }
    let mut entries: Vec<PathBuf> = std::fs::read_dir(backups_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("zst"))
        .collect();
    entries.sort();
    entries.reverse();
    Ok(entries)
}

fn read_archive(archive: &Path) -> Result<(BackupManifest, Vec<u8>), StoreError> {
    let compressed = std::fs::read(archive)?;
    let tar_bytes = zstd::decode_all(compressed.as_slice())?;
    let mut tar = tar::Archive::new(Cursor::new(&tar_bytes));

    let mut manifest: Option<BackupManifest> = None;
    let mut snapshot_bytes: Option<Vec<u8>> = None;
    for entry in tar.entries()? {
        let mut entry = entry?;
        let path = entry.path()?.to_path_buf();
        let mut buf = Vec::new();
        entry.read_to_end(&mut buf)?;
        match path.to_str() {
            Some(MANIFEST_ENTRY) => manifest = Some(serde_json::from_slice(&buf)?),
            Some(SNAPSHOT_ENTRY) => snapshot_bytes = Some(buf),
            _ => {}
        }
    }

    let manifest = manifest.ok_or_else(|| StoreError::NotInitialized(archive.display().to_string()))?;
    let snapshot_bytes = snapshot_bytes.ok_or_else(|| StoreError::NotInitialized(archive.display().to_string()))?;
    Ok((manifest, snapshot_bytes))
}

/// Reads just the manifest of an archive (`pal backup info`).
pub fn info(archive: &Path) -> Result<BackupManifest, StoreError> {
    let (manifest, _) = read_archive(archive)?;
    Ok(manifest)
}

/// Restores `archive` into the store rooted at `snapshot_path`.
///
/// `Replace` overwrites the destination snapshot outright (through
/// [`Snapshot::write`], which rotates the prior file to `.bak`).  `Merge`
/// loads the destination's current state (if any) and inserts only rows
/// absent there, leaving existing rows untouched. `dry_run` computes and
/// returns the report without writing anything.
pub fn restore(
    archive: &Path,
    snapshot_path: &Path,
    mode: RestoreMode,
    dry_run: bool,
) -> Result<RestoreReport, StoreError> {
    let (manifest, snapshot_bytes) = read_archive(archive)?;
    if manifest.schema_version > CURRENT_SNAPSHOT_VERSION {
        return Err(StoreError::SnapshotTooNew {
            found: manifest.schema_version,
            supported: CURRENT_SNAPSHOT_VERSION,
        });
    }

    let registry = MigrationRegistry::new();
    let incoming = Snapshot::from_compressed_bytes(&snapshot_bytes, &registry)?;

    match mode {
        RestoreMode::Replace => {
            if !dry_run {
                incoming.write(snapshot_path)?;
            }
            Ok(RestoreReport {
                dry_run,
                mode,
                manifest,
                merged: None,
            })
        }
        RestoreMode::Merge => {
            let mut current = Snapshot::read(snapshot_path, &registry)?
                .map(|s| s.state)
                .unwrap_or_default();
            let stats = current.merge_from(&incoming.state);
            if !dry_run {
                let next_seq = incoming.seq.max(
                    Snapshot::read(snapshot_path, &registry)?
                        .map(|s| s.seq)
                        .unwrap_or(0),
                );
                Snapshot::new(next_seq, current, Utc::now()).write(snapshot_path)?;
            }
            Ok(RestoreReport {
                dry_run,
                mode,
                manifest,
                merged: Some(stats),
            })
        }
    }
}

#[cfg(test)]
#[path = "backup_tests.rs"]
mod tests;
