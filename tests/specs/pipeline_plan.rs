//! Pipeline planning specs (SPEC_FULL.md §4.4, §8 scenario 2).

use crate::prelude::*;

fn create_port(project: &Project, id: &str) {
    project.pal().args(["port", "create", id, &format!("port {id}")]).run().passes();
}

#[test]
fn plan_groups_independent_ports_at_the_same_level() {
    let project = Project::empty();
    for id in ["a", "b", "c", "d"] {
        create_port(&project, id);
    }

    project
        .pal()
        .args(["pipeline", "create", "pipe1", "fan-in pipeline", "--port", "a", "--port", "b", "--port", "c", "--port", "d"])
        .run()
        .passes();

    for dep in ["a", "b", "c"] {
        project
            .pal()
            .args(["pipeline", "add", "pipe1", "d", "--depends-on", dep])
            .run()
            .passes();
    }

    let plan = project.pal().args(["pipeline", "plan", "pipe1", "--format", "json"]).run().passes();
    let value = plan.stdout_json();
    let levels = value["levels"].as_array().unwrap();
    assert_eq!(levels.len(), 2);
    let first_level: Vec<&str> = levels[0].as_array().unwrap().iter().map(|v| v.as_str().unwrap()).collect();
    assert_eq!(first_level.len(), 3);
    assert_eq!(levels[1].as_array().unwrap(), &[serde_json::json!("d")]);
}

#[test]
fn run_starts_only_the_ports_with_satisfied_dependencies() {
    let project = Project::empty();
    for id in ["a", "d"] {
        create_port(&project, id);
    }
    project
        .pal()
        .args(["pipeline", "create", "pipe1", "two step", "--port", "a", "--port", "d"])
        .run()
        .passes();
    project.pal().args(["pipeline", "add", "pipe1", "d", "--depends-on", "a"]).run().passes();

    project.pal().args(["pipeline", "run", "pipe1", "--session", "ses-1"]).run().passes();

    let a_status = project.pal().args(["port", "status", "a"]).run().passes();
    assert_eq!(a_status.stdout.trim(), "running");
    let d_status = project.pal().args(["port", "status", "d"]).run().passes();
    assert_eq!(d_status.stdout.trim(), "pending");
}

#[test]
fn add_dependency_on_a_port_outside_the_pipeline_is_rejected() {
    let project = Project::empty();
    create_port(&project, "a");
    project.pal().args(["pipeline", "create", "pipe1", "solo", "--port", "a"]).run().passes();

    project
        .pal()
        .args(["pipeline", "add", "pipe1", "a", "--depends-on", "not-a-member"])
        .run()
        .fails_with(2);
}
