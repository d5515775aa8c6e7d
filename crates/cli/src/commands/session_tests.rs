// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use pal_core::SessionConfig;
use tempfile::TempDir;

fn ctx_in(dir: &TempDir) -> Context {
    Context::resolve_in(&dir.path().to_path_buf()).expect("context resolves")
}

fn create_root(ctx: &Context, id: &str, title: &str) {
    let mut store = ctx.open_store().unwrap();
    let config = SessionConfig::builder(id).title(title).project_root(".").project_name("proj").cwd(".").build();
    let session = pal_core::Session::new_root(config, 0);
    store.commit(pal_storage::StoreEvent::SessionCreated { session: Box::new(session) }).unwrap();
    ctx.close_store(store).unwrap();
}

#[test]
fn rename_updates_title() {
    let dir = TempDir::new().unwrap();
    let ctx = ctx_in(&dir);
    create_root(&ctx, "root", "old title");

    rename(&ctx, "root", "new title").unwrap();

    let store = ctx.open_store().unwrap();
    let session = store.query(|s| s.get_session("root").cloned()).unwrap();
    assert_eq!(session.title, "new title");
}

#[test]
fn rename_missing_session_fails() {
    let dir = TempDir::new().unwrap();
    let ctx = ctx_in(&dir);
    let result = rename(&ctx, "missing", "new title");
    assert!(result.is_err());
    assert_eq!(result.unwrap_err().code, 2);
}

#[tokio::test]
async fn tree_on_root_with_no_children_has_empty_children() {
    let dir = TempDir::new().unwrap();
    let ctx = ctx_in(&dir);
    create_root(&ctx, "root", "title");

    let tree = fetch_tree(&ctx, "root").await.unwrap();
    assert_eq!(tree.session.id, "root");
    assert!(tree.children.is_empty());
}
