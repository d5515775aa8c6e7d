//! `pal data` specs (SPEC_FULL.md §4.10, §8).

use crate::prelude::*;

#[test]
fn check_on_a_healthy_project_reports_no_errors() {
    let project = Project::empty();
    project.pal().args(["port", "create", "p1", "write the docs"]).run().passes();

    project.pal().args(["data", "check"]).run().passes();
}

#[test]
fn stats_counts_created_entities() {
    let project = Project::empty();
    project.pal().args(["port", "create", "p1", "write the docs"]).run().passes();
    project.pal().args(["port", "create", "p2", "write more docs"]).run().passes();

    let ran = project.pal().args(["data", "stats", "--format", "json"]).run().passes();
    let stats = ran.stdout_json();
    assert_eq!(stats["ports"], 2);
    assert_eq!(stats["sessions"], 0);
}

#[test]
fn repair_succeeds_without_a_running_daemon() {
    let project = Project::empty();
    project.pal().args(["port", "create", "p1", "write the docs"]).run().passes();

    project.pal().args(["data", "repair"]).run().passes();

    // A checkpoint truncates the WAL; the store must still read back intact.
    let ran = project.pal().args(["port", "list", "--format", "json"]).run().passes();
    assert_eq!(ran.stdout_json().as_array().unwrap().len(), 1);
}
