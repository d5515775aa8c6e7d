//! CLI help/usage specs (SPEC_FULL.md §6 CLI surface).

use crate::prelude::*;

#[test]
fn pal_help_shows_usage() {
    pal().arg("--help").run().passes().stdout_has("Usage:");
}

#[test]
fn pal_version_shows_version() {
    pal().arg("--version").run().passes().stdout_has("pal");
}

#[test]
fn pal_port_help_shows_subcommands() {
    pal()
        .args(["port", "--help"])
        .run()
        .passes()
        .stdout_has("create")
        .stdout_has("start")
        .stdout_has("end");
}

#[test]
fn pal_hook_help_shows_subcommands() {
    pal()
        .args(["hook", "--help"])
        .run()
        .passes()
        .stdout_has("session-start")
        .stdout_has("session-end")
        .stdout_has("sync");
}

#[test]
fn pal_backup_help_shows_subcommands() {
    pal()
        .args(["backup", "--help"])
        .run()
        .passes()
        .stdout_has("create")
        .stdout_has("restore");
}

#[test]
fn pal_with_no_args_fails_with_usage() {
    pal().run().fails_with(2).stderr_has("Usage:");
}
