//! Session read/rename specs (SPEC_FULL.md §4.3, §8). Sessions only come
//! into existence through the `session-start` hook, so every spec here
//! bootstraps one before exercising the read-side `pal session` commands.

use crate::prelude::*;

fn start_session(project: &Project, claude_session_id: &str) {
    let input = serde_json::json!({
        "session_id": claude_session_id,
        "cwd": project.path().to_str().unwrap(),
        "hook_event_name": "session-start",
    });
    project
        .pal()
        .args(["hook", "session-start"])
        .run_with_stdin(&input.to_string())
        .passes();
}

#[test]
fn session_start_is_idempotent_for_the_same_claude_session_id() {
    let project = Project::empty();
    start_session(&project, "claude-1");
    start_session(&project, "claude-1");

    let ran = project.pal().args(["session", "list", "--format", "json"]).run().passes();
    let sessions = ran.stdout_json();
    assert_eq!(sessions.as_array().unwrap().len(), 1);
}

#[test]
fn list_then_info_shows_the_started_session() {
    let project = Project::empty();
    start_session(&project, "claude-1");

    let list = project.pal().args(["session", "list", "--format", "json"]).run().passes();
    let sessions = list.stdout_json();
    let id = sessions[0]["id"].as_str().unwrap().to_string();

    project
        .pal()
        .args(["session", "info", &id, "--format", "json"])
        .run()
        .passes()
        .stdout_has(&id);
}

#[test]
fn rename_changes_the_title_but_not_the_id() {
    let project = Project::empty();
    start_session(&project, "claude-1");
    let list = project.pal().args(["session", "list", "--format", "json"]).run().passes();
    let id = list.stdout_json()[0]["id"].as_str().unwrap().to_string();

    project.pal().args(["session", "rename", &id, "renamed title"]).run().passes();

    let info = project.pal().args(["session", "info", &id, "--format", "json"]).run().passes();
    let value = info.stdout_json();
    assert_eq!(value["id"], id);
    assert_eq!(value["title"], "renamed title");
}

#[test]
fn tree_of_a_freshly_started_session_has_no_children() {
    let project = Project::empty();
    start_session(&project, "claude-1");
    let list = project.pal().args(["session", "list", "--format", "json"]).run().passes();
    let id = list.stdout_json()[0]["id"].as_str().unwrap().to_string();

    let tree = project.pal().args(["session", "tree", &id, "--format", "json"]).run().passes();
    let value = tree.stdout_json();
    assert_eq!(value["session"]["id"], id);
    assert!(value["children"].as_array().unwrap().is_empty());
}
