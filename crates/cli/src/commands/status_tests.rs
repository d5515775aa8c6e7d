// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::TempDir;

fn ctx_in(dir: &TempDir) -> Context {
    Context::resolve_in(&dir.path().to_path_buf()).expect("context resolves")
}

#[test]
fn run_on_empty_project_reports_zero_counts() {
    let dir = TempDir::new().unwrap();
    let ctx = ctx_in(&dir);
    assert!(run(&ctx, OutputFormat::Json).is_ok());
}

#[test]
fn run_reports_no_daemon_by_default() {
    let dir = TempDir::new().unwrap();
    let ctx = ctx_in(&dir);
    assert!(ctx.daemon().is_none());
    assert!(run(&ctx, OutputFormat::Text).is_ok());
}
