// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Embedded-vs-daemon backend resolution (SPEC_FULL.md §5, §6).
//!
//! Every `pal` subcommand either forwards to a running `pald` over its
//! loopback HTTP surface or opens the store directly for a single
//! commit-and-exit cycle. `Context::daemon` is the one place that decides
//! which is reachable: a present, parseable `.pal/pald.json` is treated as
//! "a daemon is running" the same way `pal-daemon::hooks` treats a stale or
//! half-written file as "no daemon" rather than an error.

use crate::exit_error::ExitError;
use pal_core::{Config, SystemClock};
use pal_daemon::{load_config, Discovery, PalPaths};
use pal_engine::Runtime;
use pal_storage::Store;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;

pub struct Context {
    pub paths: PalPaths,
    pub config: Config,
    client: reqwest::Client,
}

impl Context {
    /// Resolves `.pal/` under the current working directory and loads its
    /// config, creating the directory tree if this is the first command run
    /// against this project.
    pub fn resolve() -> Result<Self, ExitError> {
        let project_root =
            std::env::current_dir().map_err(|e| ExitError::new(2, format!("failed to resolve current directory: {e}")))?;
        Self::resolve_in(&project_root)
    }

    pub fn resolve_in(project_root: &PathBuf) -> Result<Self, ExitError> {
        let paths = PalPaths::resolve(project_root);
        paths.ensure().map_err(|e| ExitError::new(3, format!("failed to create .pal directory: {e}")))?;
        let config = load_config(&paths.config_path()).map_err(|e| ExitError::new(2, e.to_string()))?;
        Ok(Self { paths, config, client: reqwest::Client::new() })
    }

    /// A running `pald`'s discovery record, if reachable. `None` covers both
    /// "no daemon was ever started" and "the last one crashed without
    /// cleaning up its files" — both fall back to the embedded path.
    pub fn daemon(&self) -> Option<Discovery> {
        Discovery::read(&self.paths.discovery_path())
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Opens the store directly for a single commit-and-exit cycle. Callers
    /// that mutate it must call `close_store` before the process exits so
    /// the WAL is flushed; `pald` is the only writer that otherwise survives
    /// to flush on a timer.
    pub fn open_store(&self) -> Result<Store, ExitError> {
        Store::open(self.paths.store_dir()).map_err(|e| ExitError::new(3, format!("failed to open store: {e}")))
    }

    pub fn close_store(&self, mut store: Store) -> Result<(), ExitError> {
        store.close().map_err(|e| ExitError::new(3, format!("failed to flush store: {e}")))
    }

    /// Opens the store wrapped in a one-shot embedded `Runtime`, for
    /// commands that need an effect (`RunChecklistGate`, `Emit`) rather than
    /// a bare commit. Mirrors `pald`'s own `startup_inner` construction
    /// minus the background refresh task, since this runtime does not
    /// outlive a single command invocation.
    pub fn open_runtime(&self) -> Result<Runtime<SystemClock>, ExitError> {
        let store = self.open_store()?;
        Ok(Runtime::new(Arc::new(Mutex::new(store)), SystemClock))
    }

    pub fn close_runtime(&self, runtime: Runtime<SystemClock>) -> Result<(), ExitError> {
        runtime.store().lock().close().map_err(|e| ExitError::new(3, format!("failed to flush store: {e}")))
    }
}
