// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use pal_core::{Clock, Port, PortType, SystemClock};
use tempfile::TempDir;

fn ctx_in(dir: &TempDir) -> Context {
    Context::resolve_in(&dir.path().to_path_buf()).expect("context resolves")
}

fn seed_a_port(ctx: &Context) {
    let mut store = ctx.open_store().unwrap();
    let port = Port::new("p1", "demo port", PortType::Atomic, SystemClock.epoch_ms());
    store.commit(pal_storage::StoreEvent::PortCreated { port: Box::new(port) }).unwrap();
    ctx.close_store(store).unwrap();
}

#[test]
fn create_then_list_then_info_round_trips() {
    let dir = TempDir::new().unwrap();
    let ctx = ctx_in(&dir);
    seed_a_port(&ctx);

    create(&ctx, Some("demo-project".to_string())).unwrap();

    let archives = backup::list(&ctx.paths.backups_dir()).unwrap();
    assert_eq!(archives.len(), 1);

    let archive_name = archives[0].file_name().unwrap().to_str().unwrap().to_string();
    info(&ctx, &archive_name, OutputFormat::Json).unwrap();

    let manifest = backup::info(&archives[0]).unwrap();
    assert_eq!(manifest.project, "demo-project");
    assert_eq!(manifest.stats.ports, 1);
}

#[test]
fn restore_dry_run_reports_without_mutating() {
    let dir = TempDir::new().unwrap();
    let ctx = ctx_in(&dir);
    seed_a_port(&ctx);
    create(&ctx, None).unwrap();

    let archive = backup::list(&ctx.paths.backups_dir()).unwrap().remove(0);
    let before = std::fs::read(ctx.paths.store_dir().join("snapshot.zst")).unwrap();

    restore(&ctx, archive.file_name().unwrap().to_str().unwrap(), StorageRestoreMode::Replace, true).unwrap();

    let after = std::fs::read(ctx.paths.store_dir().join("snapshot.zst")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn restore_replace_overwrites_the_snapshot() {
    let dir = TempDir::new().unwrap();
    let ctx = ctx_in(&dir);
    seed_a_port(&ctx);
    create(&ctx, None).unwrap();
    let archive = backup::list(&ctx.paths.backups_dir()).unwrap().remove(0);

    // Mutate the store after the backup so restore has something to undo.
    let mut store = ctx.open_store().unwrap();
    let port2 = Port::new("p2", "second port", PortType::Atomic, SystemClock.epoch_ms());
    store.commit(pal_storage::StoreEvent::PortCreated { port: Box::new(port2) }).unwrap();
    store.checkpoint().unwrap();
    ctx.close_store(store).unwrap();

    restore(&ctx, archive.file_name().unwrap().to_str().unwrap(), StorageRestoreMode::Replace, false).unwrap();

    let store = ctx.open_store().unwrap();
    let ports = store.query(|s| s.ports.len());
    ctx.close_store(store).unwrap();
    assert_eq!(ports, 1);
}

#[test]
fn info_on_missing_archive_fails() {
    let dir = TempDir::new().unwrap();
    let ctx = ctx_in(&dir);
    let result = info(&ctx, "nonexistent.pal.tar.zst", OutputFormat::Text);
    assert!(result.is_err());
    assert_eq!(result.unwrap_err().code, 3);
}
