// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Checklist gate (spec.md §4.5.2): the language-agnostic build/test/lint
//! verification run at `port-end`. Grounded on `oj-engine`'s
//! `runtime::gate::run_gate_command` (bounded external-command execution
//! over `tokio::process`, with stderr captured and truncated on failure),
//! generalized from a single fixed gate command to a detected
//! build/test/lint sequence.

use pal_core::error::ChecklistFailure;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

/// Ceiling on any single checklist step. A step that hangs past this is
/// reported as a failure rather than blocking the gate indefinitely.
const CHECKLIST_STEP_TIMEOUT: Duration = Duration::from_secs(300);

/// Outcome of a single checklist step.
#[derive(Debug, Clone)]
pub struct ChecklistStepOutcome {
    pub step: &'static str,
    pub command: String,
    pub exit_code: Option<i32>,
    pub passed: bool,
    /// Captured stdout+stderr, truncated to the last 5 lines when `!passed`.
    pub output: String,
}

/// The full gate result for one `port-end` invocation.
#[derive(Debug, Clone)]
pub struct ChecklistReport {
    pub port_id: String,
    /// `build` and `test` steps gate this; a failing `lint` step is
    /// advisory and never flips this to `false`.
    pub passed: bool,
    pub steps: Vec<ChecklistStepOutcome>,
    pub duration_ms: u64,
}

impl ChecklistReport {
    /// Converts a failing report into the structured error the scheduler's
    /// `port-end` handler propagates (spec.md §4.5.2: "the hook response
    /// includes the structured result so the host assistant can
    /// self-correct").
    pub fn into_failures(self) -> Vec<ChecklistFailure> {
        self.steps
            .into_iter()
            .filter(|s| !s.passed && s.step != "lint")
            .map(|s| ChecklistFailure {
                step: s.step.to_string(),
                command: s.command,
                exit_code: s.exit_code,
                output: s.output,
            })
            .collect()
    }
}

/// A detected build/test/lint command plan for a project root.
#[derive(Debug, Clone, Default)]
struct Plan {
    build: Option<String>,
    test: Option<String>,
    lint: Option<String>,
}

pub struct Checklist;

impl Checklist {
    /// Detects the build/test/lint commands from `project_root`'s markers
    /// (spec.md §4.5.2) and runs them via a `sh -c` subprocess, in order.
    /// `build`/`test` failures stop the sequence and gate the port; `lint`
    /// always runs last and never gates.
    pub async fn run(port_id: &str, project_root: &Path) -> ChecklistReport {
        let start = std::time::Instant::now();
        let plan = detect_plan(project_root);
        let mut steps = Vec::new();
        let mut passed = true;

        if let Some(cmd) = &plan.build {
            let outcome = run_step("build", cmd, project_root).await;
            passed &= outcome.passed;
            let stop = !outcome.passed;
            steps.push(outcome);
            if stop {
                return ChecklistReport { port_id: port_id.to_string(), passed, steps, duration_ms: elapsed_ms(start) };
            }
        }

        if let Some(cmd) = &plan.test {
            let outcome = run_step("test", cmd, project_root).await;
            passed &= outcome.passed;
            let stop = !outcome.passed;
            steps.push(outcome);
            if stop {
                return ChecklistReport { port_id: port_id.to_string(), passed, steps, duration_ms: elapsed_ms(start) };
            }
        }

        if let Some(cmd) = &plan.lint {
            steps.push(run_step("lint", cmd, project_root).await);
        }

        ChecklistReport { port_id: port_id.to_string(), passed, steps, duration_ms: elapsed_ms(start) }
    }
}

fn elapsed_ms(start: std::time::Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

fn detect_plan(project_root: &Path) -> Plan {
    if project_root.join("Cargo.toml").is_file() {
        return Plan {
            build: Some("cargo build".to_string()),
            test: Some("cargo test".to_string()),
            lint: Some("cargo clippy".to_string()),
        };
    }
    if project_root.join("go.mod").is_file() {
        return Plan {
            build: Some("go build ./...".to_string()),
            test: Some("go test ./...".to_string()),
            lint: Some("go vet ./...".to_string()),
        };
    }
    if project_root.join("package.json").is_file() {
        let scripts = read_npm_scripts(project_root);
        return Plan {
            build: scripts.contains(&"build".to_string()).then(|| "npm run build".to_string()),
            test: Some("npm test".to_string()),
            lint: scripts.contains(&"lint".to_string()).then(|| "npm run lint".to_string()),
        };
    }
    if project_root.join("pyproject.toml").is_file() || project_root.join("setup.py").is_file() {
        let files = python_source_files(project_root);
        let build = (!files.is_empty()).then(|| format!("python -m py_compile {}", files.join(" ")));
        return Plan { build, test: Some("python -m pytest".to_string()), lint: None };
    }
    Plan::default()
}

fn read_npm_scripts(project_root: &Path) -> Vec<String> {
    let Ok(contents) = std::fs::read_to_string(project_root.join("package.json")) else {
        return Vec::new();
    };
    let Ok(value) = serde_json::from_str::<serde_json::Value>(&contents) else {
        return Vec::new();
    };
    value
        .get("scripts")
        .and_then(|s| s.as_object())
        .map(|scripts| scripts.keys().cloned().collect())
        .unwrap_or_default()
}

fn python_source_files(project_root: &Path) -> Vec<String> {
    let mut out = Vec::new();
    collect_py_files(project_root, &mut out);
    out
}

fn collect_py_files(dir: &Path, out: &mut Vec<String>) {
    let Ok(entries) = std::fs::read_dir(dir) else { return };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if matches!(path.file_name().and_then(|n| n.to_str()), Some(".venv" | "venv" | "__pycache__" | ".git")) {
                continue;
            }
            collect_py_files(&path, out);
        } else if path.extension().and_then(|e| e.to_str()) == Some("py") {
            if let Some(s) = path.to_str() {
                out.push(s.to_string());
            }
        }
    }
}

async fn run_step(step: &'static str, command: &str, cwd: &Path) -> ChecklistStepOutcome {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command).current_dir(cwd);

    match timeout(CHECKLIST_STEP_TIMEOUT, cmd.output()).await {
        Ok(Ok(output)) => {
            let passed = output.status.success();
            let combined = format!(
                "{}{}",
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            );
            ChecklistStepOutcome {
                step,
                command: command.to_string(),
                exit_code: output.status.code(),
                passed,
                output: if passed { String::new() } else { truncate_tail(&combined, 5) },
            }
        }
        Ok(Err(e)) => ChecklistStepOutcome {
            step,
            command: command.to_string(),
            exit_code: None,
            passed: false,
            output: format!("failed to execute: {e}"),
        },
        Err(_) => ChecklistStepOutcome {
            step,
            command: command.to_string(),
            exit_code: None,
            passed: false,
            output: format!("timed out after {}s", CHECKLIST_STEP_TIMEOUT.as_secs()),
        },
    }
}

/// Keeps the last `n` non-empty lines of `text` (spec.md §4.5.2: "captured
/// output truncated to 5 lines per failure").
fn truncate_tail(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}

#[cfg(test)]
#[path = "checklist_tests.rs"]
mod tests;
