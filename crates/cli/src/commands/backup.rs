// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pal backup {create|list|info|restore}` (SPEC_FULL.md §4.10, §6).
//!
//! Always runs embedded against `pal-storage::backup` directly rather than
//! forwarding to a daemon, even when one is running: `restore --replace`
//! overwrites the snapshot file outright, which a live `pald` would only
//! observe two seconds later on its own refresh tick (`lifecycle.rs`'s
//! `spawn_refresh_task`), and `create` needs a `checkpoint()` immediately
//! before archiving -- both are easiest to reason about as a single
//! commit-and-exit cycle against the project's own store directory, the
//! same posture `pal port create`/`pal session rename` already take for
//! writes with no daemon HTTP endpoint.

use crate::color;
use crate::context::Context;
use crate::exit_error::ExitError;
use crate::output::{format_or_json, print_json, OutputFormat};
use clap::{Args, Subcommand, ValueEnum};
use pal_storage::backup::{self, RestoreMode as StorageRestoreMode};
use pal_storage::StoreError;

#[derive(Args)]
pub struct BackupArgs {
    #[command(subcommand)]
    pub action: BackupAction,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum RestoreModeArg {
    Replace,
    Merge,
}

impl From<RestoreModeArg> for StorageRestoreMode {
    fn from(value: RestoreModeArg) -> Self {
        match value {
            RestoreModeArg::Replace => StorageRestoreMode::Replace,
            RestoreModeArg::Merge => StorageRestoreMode::Merge,
        }
    }
}

#[derive(Subcommand)]
pub enum BackupAction {
    /// Checkpoint the store and archive its snapshot.
    Create {
        /// Project label recorded in the manifest (defaults to the `.pal`
        /// parent directory's name).
        #[arg(long)]
        project: Option<String>,
    },
    /// List archives under `.pal/backups`, most recent first.
    List {
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Print an archive's manifest.
    Info {
        archive: String,
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Restore an archive into this project's store.
    Restore {
        archive: String,
        #[arg(long, value_enum, default_value_t = RestoreModeArg::Replace)]
        mode: RestoreModeArg,
        /// Compute and print the rows that would change without writing.
        #[arg(long)]
        dry_run: bool,
    },
}

pub fn run(ctx: &Context, action: BackupAction) -> Result<(), ExitError> {
    match action {
        BackupAction::Create { project } => create(ctx, project),
        BackupAction::List { format } => list(ctx, format),
        BackupAction::Info { archive, format } => info(ctx, &archive, format),
        BackupAction::Restore { archive, mode, dry_run } => restore(ctx, &archive, mode.into(), dry_run),
    }
}

fn project_label(ctx: &Context, project: Option<String>) -> String {
    project.unwrap_or_else(|| {
        ctx.paths
            .root()
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .unwrap_or("default")
            .to_string()
    })
}

fn create(ctx: &Context, project: Option<String>) -> Result<(), ExitError> {
    let mut store = ctx.open_store()?;
    store.checkpoint().map_err(to_exit_error)?;
    let snapshot_path = store.snapshot_path();
    ctx.close_store(store)?;

    let project = project_label(ctx, project);
    let archive = backup::create(&snapshot_path, &ctx.paths.backups_dir(), &project).map_err(to_exit_error)?;
    println!("{} {}", color::header("created backup"), color::literal(&archive.display().to_string()));
    Ok(())
}

fn list(ctx: &Context, format: OutputFormat) -> Result<(), ExitError> {
    let archives = backup::list(&ctx.paths.backups_dir()).map_err(to_exit_error)?;
    match format {
        OutputFormat::Json => {
            let paths: Vec<String> = archives.iter().map(|p| p.display().to_string()).collect();
            print_json(&paths)
        }
        OutputFormat::Text => {
            if archives.is_empty() {
                println!("{}", color::muted("no backups"));
                return Ok(());
            }
            for archive in &archives {
                println!("{}", color::literal(&archive.display().to_string()));
            }
            Ok(())
        }
    }
}

fn info(ctx: &Context, archive: &str, format: OutputFormat) -> Result<(), ExitError> {
    let path = resolve_archive_path(ctx, archive);
    let manifest = backup::info(&path).map_err(to_exit_error)?;
    format_or_json(format, &manifest, |m| {
        format!(
            "{}\n  schema version: {}\n  project:        {}\n  created at:     {}\n  sessions:       {}\n  ports:          {}\n  pipelines:      {}\n  escalations:    {}",
            color::header(&path.display().to_string()),
            m.schema_version,
            m.project,
            m.created_at,
            m.stats.sessions,
            m.stats.ports,
            m.stats.pipelines,
            m.stats.escalations,
        )
    })
}

fn restore(ctx: &Context, archive: &str, mode: StorageRestoreMode, dry_run: bool) -> Result<(), ExitError> {
    let path = resolve_archive_path(ctx, archive);
    let snapshot_path = ctx.paths.store_dir().join("snapshot.zst");
    let report = backup::restore(&path, &snapshot_path, mode, dry_run).map_err(to_exit_error)?;

    if dry_run {
        println!("{} (dry run, schema v{})", color::header("would restore"), report.manifest.schema_version);
    } else {
        println!("{} (schema v{})", color::header("restored"), report.manifest.schema_version);
    }
    if let Some(stats) = &report.merged {
        println!(
            "  merged: {} sessions, {} ports, {} pipelines, {} escalations inserted (existing rows untouched)",
            stats.sessions, stats.ports, stats.pipelines, stats.escalations,
        );
    }
    Ok(())
}

/// An archive argument may be a bare filename (resolved under
/// `.pal/backups`) or a path the caller already qualified.
fn resolve_archive_path(ctx: &Context, archive: &str) -> std::path::PathBuf {
    let path = std::path::Path::new(archive);
    if path.is_absolute() || path.exists() {
        path.to_path_buf()
    } else {
        ctx.paths.backups_dir().join(archive)
    }
}

fn to_exit_error(err: StoreError) -> ExitError {
    ExitError::new(3, err.to_string())
}

#[cfg(test)]
#[path = "backup_tests.rs"]
mod tests;
