// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pald` startup and shutdown (SPEC_FULL.md §4.1, §5).
//!
//! Simpler than the teacher's `lifecycle::startup` (`crates/daemon/src/
//! lifecycle/startup.rs`) since `pal_storage::Store::open` already performs
//! the snapshot-load-then-WAL-replay the teacher's daemon used to do by
//! hand. What carries over verbatim is the shape: acquire an exclusive lock
//! on a lock file before touching anything else, write the holder's PID
//! into it, and only bind network resources — and advertise them via the
//! discovery file — after every fallible step has succeeded.
//!
//! `pald` is the sole long-lived writer. Its background refresh task
//! re-opens the store directory every two seconds so reads (`http`) see
//! mutations committed by a `pal` CLI invocation that wrote directly
//! (no daemon running, or a command other than `pal hook`).

use crate::config::{load_config, ConfigError};
use crate::paths::{Discovery, PalPaths};
use fs2::FileExt;
use pal_core::{Clock, Config, SystemClock};
use pal_engine::Runtime;
use pal_storage::{Store, StoreError};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("another pald is already running against this project (lock held at {path})")]
    LockHeld { path: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Everything a running `pald` needs to keep alive for its process
/// lifetime.
pub struct StartupResult {
    pub paths: PalPaths,
    pub config: Config,
    pub runtime: Arc<Runtime<SystemClock>>,
    lock_file: File,
    refresh_task: JoinHandle<()>,
}

impl StartupResult {
    /// Writes the discovery file. Callers invoke this only after the axum
    /// listener has successfully bound, so a reader never observes a port
    /// nothing is listening on.
    pub fn publish_discovery(&self, port: u16) -> Result<(), LifecycleError> {
        let discovery = Discovery {
            pid: std::process::id(),
            port,
            started_at_ms: SystemClock.epoch_ms(),
        };
        discovery.write(&self.paths.discovery_path())?;
        Ok(())
    }

    /// Flushes and checkpoints the store, then removes the discovery and
    /// lock files. The lock itself is released implicitly when `lock_file`
    /// drops.
    pub async fn shutdown(self) -> Result<(), LifecycleError> {
        self.refresh_task.abort();
        self.runtime.store().lock().checkpoint()?;
        let _ = std::fs::remove_file(self.paths.discovery_path());
        drop(self.lock_file);
        let _ = std::fs::remove_file(self.paths.lock_path());
        Ok(())
    }
}

/// Acquires the project lock, opens the store, loads config, and spawns the
/// background refresh task. Does not bind any network resource and does not
/// write the discovery file — `main.rs` does both once the listener is up.
pub async fn startup(project_root: &Path) -> Result<StartupResult, LifecycleError> {
    let paths = PalPaths::resolve(project_root);
    paths.ensure()?;

    let lock_file = acquire_lock(&paths)?;

    match startup_inner(paths.clone(), lock_file).await {
        Ok(result) => Ok(result),
        Err(err) => {
            cleanup_on_failure(&paths);
            Err(err)
        }
    }
}

async fn startup_inner(paths: PalPaths, lock_file: File) -> Result<StartupResult, LifecycleError> {
    let config = load_config(&paths.config_path())?;
    let store = Store::open(paths.store_dir())?;
    let runtime = Arc::new(Runtime::new(Arc::new(Mutex::new(store)), SystemClock));

    let refresh_task = spawn_refresh_task(paths.store_dir(), runtime.store());

    Ok(StartupResult { paths, config, runtime, lock_file, refresh_task })
}

/// Re-opens the store directory every two seconds and swaps it into the
/// runtime's shared handle, so GET/SSE readers reflect commits made by a
/// concurrently-running `pal` CLI process. Open failures (a WAL mid-write)
/// are skipped; the previous state stays in place until the next tick.
fn spawn_refresh_task(store_dir: std::path::PathBuf, shared: Arc<Mutex<Store>>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(2));
        loop {
            interval.tick().await;
            if let Ok(fresh) = Store::open(&store_dir) {
                *shared.lock() = fresh;
            }
        }
    })
}

fn acquire_lock(paths: &PalPaths) -> Result<File, LifecycleError> {
    let lock_path = paths.lock_path();
    let lock_file = OpenOptions::new().write(true).create(true).truncate(false).open(&lock_path)?;
    lock_file.try_lock_exclusive().map_err(|_| LifecycleError::LockHeld {
        path: lock_path.display().to_string(),
    })?;
    lock_file.set_len(0)?;
    let mut handle = &lock_file;
    writeln!(handle, "{}", std::process::id())?;
    Ok(lock_file)
}

fn cleanup_on_failure(paths: &PalPaths) {
    let _ = std::fs::remove_file(paths.discovery_path());
    let _ = std::fs::remove_file(paths.lock_path());
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
