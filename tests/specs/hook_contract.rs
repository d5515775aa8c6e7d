//! Hook stdin/stdout contract specs (SPEC_FULL.md §6).

use crate::prelude::*;

#[test]
fn session_start_approves_and_is_valid_json() {
    let project = Project::empty();
    let input = serde_json::json!({
        "session_id": "claude-1",
        "cwd": project.path().to_str().unwrap(),
        "hook_event_name": "session-start",
    });

    let ran = project.pal().args(["hook", "session-start"]).run_with_stdin(&input.to_string()).passes();
    let output = ran.stdout_json();
    assert_eq!(output["decision"], "approve");
}

#[test]
fn session_end_with_no_prior_session_start_still_approves() {
    let project = Project::empty();
    let input = serde_json::json!({
        "session_id": "never-started",
        "cwd": project.path().to_str().unwrap(),
        "hook_event_name": "session-end",
    });

    project.pal().args(["hook", "session-end"]).run_with_stdin(&input.to_string()).passes();
}

#[test]
fn port_end_blocks_with_exit_code_one_on_a_failing_build_step() {
    let project = Project::empty();
    project.file("Cargo.toml", "[package]\nname = \"demo\"\nversion = \"0.1.0\"\n");
    let session_input = serde_json::json!({
        "session_id": "claude-1",
        "cwd": project.path().to_str().unwrap(),
        "hook_event_name": "session-start",
    });
    project.pal().args(["hook", "session-start"]).run_with_stdin(&session_input.to_string()).passes();
    project.pal().args(["port", "create", "p1", "write the docs"]).run().passes();
    project.pal().args(["port", "start", "p1", "--session", "claude-1"]).run().passes();

    let end_input = serde_json::json!({
        "session_id": "claude-1",
        "cwd": project.path().to_str().unwrap(),
        "hook_event_name": "port-end",
    });
    // No source files for the detected `cargo build` step, so the gate fails
    // and the hook must block with exit 1 and a JSON `decision`.
    let ran = project
        .pal()
        .args(["hook", "port-end", "--port", "p1"])
        .run_with_stdin(&end_input.to_string())
        .fails_with(1);
    let output = ran.stdout_json();
    assert_eq!(output["decision"], "block");
}

#[test]
fn malformed_stdin_fails_with_exit_code_two() {
    let project = Project::empty();
    project.pal().args(["hook", "session-start"]).run_with_stdin("not json").fails_with(2);
}

#[test]
fn sync_approves_against_a_freshly_initialized_project() {
    let project = Project::empty();
    let ran = project.pal().args(["hook", "sync"]).run().passes();
    let output = ran.stdout_json();
    assert_eq!(output["decision"], "approve");
}
