//! Backup/restore specs (SPEC_FULL.md §4.10, §8).

use crate::prelude::*;

#[test]
fn create_then_list_then_info_round_trip() {
    let project = Project::empty();
    project.pal().args(["port", "create", "p1", "write the docs"]).run().passes();

    project.pal().args(["backup", "create", "--project", "demo"]).run().passes();

    let list = project.pal().args(["backup", "list", "--format", "json"]).run().passes();
    let archives = list.stdout_json();
    assert_eq!(archives.as_array().unwrap().len(), 1);

    let archive_path = archives[0].as_str().unwrap().to_string();
    let archive_name = std::path::Path::new(&archive_path).file_name().unwrap().to_str().unwrap();

    project
        .pal()
        .args(["backup", "info", archive_name, "--format", "json"])
        .run()
        .passes()
        .stdout_has("demo");
}

#[test]
fn restore_replace_reverts_a_later_mutation() {
    let project = Project::empty();
    project.pal().args(["port", "create", "p1", "write the docs"]).run().passes();
    project.pal().args(["backup", "create"]).run().passes();

    project.pal().args(["port", "create", "p2", "a second port"]).run().passes();
    project.pal().args(["data", "repair"]).run().passes();

    let list = project.pal().args(["backup", "list", "--format", "json"]).run().passes();
    let archive_path = list.stdout_json()[0].as_str().unwrap().to_string();
    let archive_name = std::path::Path::new(&archive_path).file_name().unwrap().to_str().unwrap();

    project.pal().args(["backup", "restore", archive_name, "--mode", "replace"]).run().passes();

    let ports = project.pal().args(["port", "list", "--format", "json"]).run().passes();
    let value = ports.stdout_json();
    assert_eq!(value.as_array().unwrap().len(), 1);
}

#[test]
fn restore_dry_run_does_not_mutate_the_store() {
    let project = Project::empty();
    project.pal().args(["port", "create", "p1", "write the docs"]).run().passes();
    project.pal().args(["backup", "create"]).run().passes();
    project.pal().args(["port", "create", "p2", "a second port"]).run().passes();

    let list = project.pal().args(["backup", "list", "--format", "json"]).run().passes();
    let archive_path = list.stdout_json()[0].as_str().unwrap().to_string();
    let archive_name = std::path::Path::new(&archive_path).file_name().unwrap().to_str().unwrap();

    project.pal().args(["backup", "restore", archive_name, "--dry-run"]).run().passes();

    let ports = project.pal().args(["port", "list", "--format", "json"]).run().passes();
    assert_eq!(ports.stdout_json().as_array().unwrap().len(), 2);
}

#[test]
fn info_on_a_missing_archive_fails_with_a_store_error() {
    let project = Project::empty();
    project.pal().args(["backup", "info", "nonexistent.pal.tar.zst"]).run().fails_with(3);
}
