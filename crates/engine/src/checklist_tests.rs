use super::*;

#[tokio::test]
async fn no_markers_yields_an_empty_passing_plan() {
    let dir = tempfile::tempdir().unwrap();
    let report = Checklist::run("p1", dir.path()).await;
    assert!(report.passed);
    assert!(report.steps.is_empty());
}

#[test]
fn detect_plan_go_project() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("go.mod"), "module example.com/x\n").unwrap();
    let plan = detect_plan(dir.path());
    assert_eq!(plan.build.as_deref(), Some("go build ./..."));
    assert_eq!(plan.test.as_deref(), Some("go test ./..."));
    assert_eq!(plan.lint.as_deref(), Some("go vet ./..."));
}

#[test]
fn detect_plan_rust_project() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("Cargo.toml"), "[package]\nname = \"x\"\n").unwrap();
    let plan = detect_plan(dir.path());
    assert_eq!(plan.build.as_deref(), Some("cargo build"));
    assert_eq!(plan.test.as_deref(), Some("cargo test"));
    assert_eq!(plan.lint.as_deref(), Some("cargo clippy"));
}

#[test]
fn detect_plan_npm_project_only_adds_scripts_that_exist() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("package.json"), r#"{"scripts": {"test": "jest"}}"#).unwrap();
    let plan = detect_plan(dir.path());
    assert_eq!(plan.build, None);
    assert_eq!(plan.test.as_deref(), Some("npm test"));
    assert_eq!(plan.lint, None);
}

#[test]
fn detect_plan_npm_project_with_build_and_lint_scripts() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("package.json"),
        r#"{"scripts": {"build": "tsc", "test": "jest", "lint": "eslint ."}}"#,
    )
    .unwrap();
    let plan = detect_plan(dir.path());
    assert_eq!(plan.build.as_deref(), Some("npm run build"));
    assert_eq!(plan.lint.as_deref(), Some("npm run lint"));
}

#[test]
fn detect_plan_python_project_collects_source_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("pyproject.toml"), "[project]\nname = \"x\"\n").unwrap();
    std::fs::write(dir.path().join("main.py"), "print(1)\n").unwrap();
    let plan = detect_plan(dir.path());
    assert!(plan.build.as_deref().unwrap().starts_with("python -m py_compile"));
    assert!(plan.build.as_deref().unwrap().contains("main.py"));
    assert_eq!(plan.test.as_deref(), Some("python -m pytest"));
    assert_eq!(plan.lint, None);
}

#[test]
fn detect_plan_prefers_nothing_when_no_markers_present() {
    let dir = tempfile::tempdir().unwrap();
    let plan = detect_plan(dir.path());
    assert_eq!(plan.build, None);
    assert_eq!(plan.test, None);
    assert_eq!(plan.lint, None);
}

#[tokio::test]
async fn run_step_records_success() {
    let dir = tempfile::tempdir().unwrap();
    let outcome = run_step("build", "true", dir.path()).await;
    assert!(outcome.passed);
    assert_eq!(outcome.exit_code, Some(0));
    assert!(outcome.output.is_empty());
}

#[tokio::test]
async fn run_step_records_failure_with_captured_output() {
    let dir = tempfile::tempdir().unwrap();
    let outcome = run_step("test", "echo boom && false", dir.path()).await;
    assert!(!outcome.passed);
    assert_eq!(outcome.exit_code, Some(1));
    assert!(outcome.output.contains("boom"));
}

#[test]
fn truncate_tail_keeps_last_n_nonempty_lines() {
    let text = "a\n\nb\nc\nd\ne\nf\n";
    assert_eq!(truncate_tail(text, 3), "d\ne\nf");
}

#[test]
fn into_failures_excludes_advisory_lint_steps() {
    let report = ChecklistReport {
        port_id: "p1".to_string(),
        passed: false,
        steps: vec![
            ChecklistStepOutcome {
                step: "test",
                command: "npm test".to_string(),
                exit_code: Some(1),
                passed: false,
                output: "--- FAIL".to_string(),
            },
            ChecklistStepOutcome {
                step: "lint",
                command: "npm run lint".to_string(),
                exit_code: Some(1),
                passed: false,
                output: "style warning".to_string(),
            },
        ],
        duration_ms: 10,
    };
    let failures = report.into_failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].step, "test");
}
