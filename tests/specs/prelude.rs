// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared harness for `tests/specs/*`: a disposable project directory plus
//! a thin `assert_cmd` wrapper that reads like the commands it exercises.

use assert_cmd::Command;
use std::path::Path;
use tempfile::TempDir;

/// A disposable `.pal`-less project directory every spec starts from.
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self { dir: TempDir::new().expect("tempdir") }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes `contents` to `relative_path`, creating parent directories.
    pub fn file(&self, relative_path: &str, contents: &str) -> &Self {
        let full = self.dir.path().join(relative_path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).expect("create parent dirs");
        }
        std::fs::write(&full, contents).expect("write file");
        self
    }

    pub fn read(&self, relative_path: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(relative_path)).expect("read file")
    }

    pub fn exists(&self, relative_path: &str) -> bool {
        self.dir.path().join(relative_path).exists()
    }

    /// A fresh `pal` invocation rooted at this project.
    pub fn pal(&self) -> Command {
        let mut cmd = Command::cargo_bin("pal").expect("pal binary builds");
        cmd.current_dir(self.path());
        cmd
    }
}

/// A project-less `pal` invocation, for specs that only care about
/// argument parsing (`--help`, `--version`) and never touch `.pal/`.
pub fn pal() -> Command {
    Command::cargo_bin("pal").expect("pal binary builds")
}

/// Runs `cmd` and captures stdout/stderr/status for chained assertions.
/// Exists instead of `assert_cmd::assert::Assert`'s `predicate`-based API
/// so specs read as plain string checks without a second dev-dependency.
pub struct Ran {
    pub stdout: String,
    pub stderr: String,
    pub code: Option<i32>,
}

pub trait CommandExt {
    fn run(&mut self) -> Ran;
    fn run_with_stdin(&mut self, input: &str) -> Ran;
}

impl CommandExt for Command {
    fn run(&mut self) -> Ran {
        let output = self.output().expect("pal process runs");
        Ran {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            code: output.status.code(),
        }
    }

    fn run_with_stdin(&mut self, input: &str) -> Ran {
        use std::io::Write;
        use std::process::Stdio;
        self.stdin(Stdio::piped()).stdout(Stdio::piped()).stderr(Stdio::piped());
        let mut child = self.spawn().expect("pal process spawns");
        child
            .stdin
            .as_mut()
            .expect("stdin piped")
            .write_all(input.as_bytes())
            .expect("write stdin");
        let output = child.wait_with_output().expect("pal process runs");
        Ran {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            code: output.status.code(),
        }
    }
}

impl Ran {
    pub fn passes(self) -> Self {
        assert_eq!(self.code, Some(0), "expected exit 0, stderr:\n{}", self.stderr);
        self
    }

    pub fn fails_with(self, code: i32) -> Self {
        assert_eq!(self.code, Some(code), "expected exit {code}, stderr:\n{}", self.stderr);
        self
    }

    pub fn stdout_has(self, needle: &str) -> Self {
        assert!(self.stdout.contains(needle), "stdout missing {needle:?}:\n{}", self.stdout);
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        assert!(self.stderr.contains(needle), "stderr missing {needle:?}:\n{}", self.stderr);
        self
    }

    pub fn stdout_json(&self) -> serde_json::Value {
        serde_json::from_str(&self.stdout).expect("stdout is valid JSON")
    }
}
