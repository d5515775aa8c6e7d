// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project-local `.pal/` directory resolution (SPEC_FULL.md §6 persisted
//! state layout). Shared by `pal-daemon`'s own startup and `pal-cli`'s
//! embedded and forwarding paths, so both agree on where the store, the
//! discovery file, and the lock file live.
//!
//! Generalizes `env.rs`'s centralized environment-variable-with-override
//! convention (`OJ_STATE_DIR` > `XDG_STATE_HOME` > default) to a single
//! `PAL_DIR` override over a project-relative default, since PAL Kit's
//! state is project-local rather than a per-user XDG directory.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

/// Resolved `.pal/` directory and the well-known paths inside it.
#[derive(Debug, Clone)]
pub struct PalPaths {
    root: PathBuf,
}

impl PalPaths {
    /// Resolves `.pal/` under `project_root`, honoring a `PAL_DIR` override
    /// (an absolute path, used by tests and by hosts that keep state outside
    /// the project tree).
    pub fn resolve(project_root: impl AsRef<Path>) -> Self {
        let root = match std::env::var("PAL_DIR") {
            Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => project_root.as_ref().join(".pal"),
        };
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates `.pal/` and its fixed subdirectories if absent.
    pub fn ensure(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(self.sessions_dir())?;
        std::fs::create_dir_all(self.decisions_dir())?;
        std::fs::create_dir_all(self.context_cache_dir())?;
        std::fs::create_dir_all(self.backups_dir())?;
        Ok(())
    }

    /// The store directory passed to `pal_storage::Store::open` — holds
    /// `snapshot.zst` and `wal.jsonl` directly under `.pal/`.
    pub fn store_dir(&self) -> PathBuf {
        self.root.clone()
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.yml")
    }

    pub fn lock_path(&self) -> PathBuf {
        self.root.join("pald.lock")
    }

    pub fn discovery_path(&self) -> PathBuf {
        self.root.join("pald.json")
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.root.join("sessions")
    }

    pub fn decisions_dir(&self) -> PathBuf {
        self.root.join("decisions")
    }

    pub fn context_cache_dir(&self) -> PathBuf {
        self.root.join("context")
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.root.join("backups")
    }
}

/// Written by `pald` to `.pal/pald.json` at bind time, removed on clean
/// shutdown (SPEC_FULL.md §5). `pal hook` reads this to decide whether to
/// forward rather than run embedded.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Discovery {
    pub pid: u32,
    pub port: u16,
    pub started_at_ms: u64,
}

impl Discovery {
    /// Reads the discovery file at `path`, treating any read or parse
    /// failure as "no daemon reachable" rather than an error — a stale or
    /// half-written file from a crashed `pald` must never block a hook.
    pub fn read(path: &Path) -> Option<Self> {
        let bytes = std::fs::read(path).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    pub fn write(&self, path: &Path) -> io::Result<()> {
        let bytes = serde_json::to_vec_pretty(self).map_err(io::Error::other)?;
        std::fs::write(path, bytes)
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;
