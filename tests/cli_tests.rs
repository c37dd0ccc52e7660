#![cfg(feature = "cli")]

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains as str_contains;
use std::io::Write;
use tempfile::NamedTempFile;

#[allow(deprecated)]
fn run_cli(script: &str) -> assert_cmd::assert::Assert {
    let mut cmd = Command::cargo_bin("cli").expect("cli binary");
    cmd.env_remove("SPRINT_CAPACITY_DAILY_CAPACITY")
        .env_remove("SPRINT_CAPACITY_CACHE_CAPACITY")
        .env_remove("SPRINT_CAPACITY_HTTP_ADDR");
    cmd.write_stdin(script.to_string()).assert()
}

fn sprint_snapshot() -> NamedTempFile {
    let mut tmp = NamedTempFile::new().expect("create temp file");
    write!(
        tmp,
        r#"{{"items": [
            {{"id": "t-1", "projectId": "p1", "status": {{"kind": "task", "status": "in_progress"}},
              "storyPoints": 5, "sprintId": "s1", "dueDate": "2025-05-12", "assignees": ["ana"]}},
            {{"id": "t-2", "projectId": "p1", "status": {{"kind": "task", "status": "todo"}},
              "storyPoints": 2, "sprintId": "s1", "dueDate": "2025-05-11", "assignees": ["ben"]}},
            {{"id": "t-3", "projectId": "p1", "status": {{"kind": "task", "status": "done"}},
              "storyPoints": 8, "sprintId": "s1", "dueDate": "2025-05-12"}},
            {{"id": "us-1", "projectId": "p1", "status": {{"kind": "story", "status": "ready"}},
              "storyPoints": 13}}
        ]}}"#
    )
    .expect("write snapshot");
    tmp
}

fn script_path(tmp: &NamedTempFile) -> String {
    tmp.path().to_string_lossy().replace('\\', "\\\\")
}

#[test]
fn cli_plans_new_work_across_days() {
    run_cli("plan 0 20 8 2025-01-06\nquit\n")
        .success()
        .stdout(str_contains("extra_days=2"))
        .stdout(str_contains("2025-01-08=4"));
}

#[test]
fn cli_rejects_fractional_points() {
    run_cli("plan 1 2.5\nquit\n")
        .success()
        .stdout(str_contains("Error:"))
        .stdout(str_contains("whole number"));
}

#[test]
fn cli_rejects_zero_capacity() {
    run_cli("capacity 0\nplan 3 5 0 2025-01-06\nquit\n")
        .success()
        .stdout(str_contains("daily capacity"))
        .stdout(str_contains("Daily capacity set to").not());
}

#[test]
fn cli_plans_a_loaded_sprint() {
    let tmp = sprint_snapshot();
    let path = script_path(&tmp);
    let script = format!("load json {path}\nsprint s1 2025-05-12 9\nquit\n");
    run_cli(&script)
        .success()
        .stdout(str_contains("Loaded 4 work items from"))
        .stdout(str_contains("Sprint s1 (2 load-bearing, backlog=0)"))
        .stdout(str_contains("today=7, extra_days=1"));
}

#[test]
fn cli_suggests_least_loaded_assignee() {
    let tmp = sprint_snapshot();
    let path = script_path(&tmp);
    let script = format!("load json {path}\nassignees s1 2025-05-12 4\nquit\n");
    run_cli(&script)
        .success()
        .stdout(str_contains("ana: today=5"))
        .stdout(str_contains("ben: today=2"))
        .stdout(str_contains("Suggested assignee: ben"));
}

#[test]
fn cli_reports_unplanned_backlog() {
    let tmp = sprint_snapshot();
    let path = script_path(&tmp);
    let script = format!("load json {path}\nbacklog p1\nquit\n");
    run_cli(&script)
        .success()
        .stdout(str_contains("Unplanned points in p1: 13"));
}

#[test]
fn cli_save_and_load_csv_round_trip() {
    let source = sprint_snapshot();
    let target = NamedTempFile::new().expect("create temp file");
    let script = format!(
        "load json {}\nsave csv {}\nload csv {}\nselect s1 2025-05-12\nquit\n",
        script_path(&source),
        script_path(&target),
        script_path(&target)
    );
    let assert = run_cli(&script).success();
    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(output.contains("Saved 4 work items to"));
    assert!(
        output.contains("2 load-bearing items, today=7, backlog=0"),
        "unexpected selection output:\n{output}"
    );
}

#[test]
fn cli_reports_unknown_commands() {
    run_cli("frobnicate\nquit\n")
        .success()
        .stdout(str_contains("Unknown command 'frobnicate'"));
}
