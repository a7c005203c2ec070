//! Integration tests for the `cubeq` binary

use serde_json::Value;
use std::path::Path;
use std::process::{Command, Output};

fn run_cubeq(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cubeq"))
        .args(args)
        .output()
        .expect("run cubeq")
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout is not JSON ({}): {}",
            e,
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

fn write(dir: &Path, name: &str, contents: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path.display().to_string()
}

#[test]
fn test_validate_prints_canonical_query() {
    let output = run_cubeq(&[
        "validate",
        "tests/test_data/nested_filters.json",
        "--catalog",
        "tests/test_data/employees.yaml",
    ]);
    assert!(
        output.status.success(),
        "validate failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let json = stdout_json(&output);
    assert_eq!(json["measures"][0], "Employees.count");
    assert_eq!(json["limit"], 100);
    assert_eq!(json["timeDimensions"][0]["dateRange"][0], "2023-01-01");
}

#[test]
fn test_validation_failure_prints_payload_and_exits_1() {
    let dir = tempfile::tempdir().unwrap();
    let query = write(dir.path(), "empty.json", r#"{"measures": []}"#);

    let output = run_cubeq(&["validate", &query]);
    assert_eq!(output.status.code(), Some(1));

    let json = stdout_json(&output);
    assert_eq!(json["kind"], "EmptyQuery");
    assert_eq!(json["path"], "");
    assert_eq!(json["error"], "query must have at least one measure or dimension");
}

#[test]
fn test_validate_with_config_and_context() {
    let dir = tempfile::tempdir().unwrap();
    let query = write(
        dir.path(),
        "query.yaml",
        "measures:\n  - Employees.count\nungrouped: true\n",
    );
    let context = write(dir.path(), "context.json", r#"{"tenant": "acme"}"#);

    let output = run_cubeq(&["validate", &query, "--config", "tests/test_data/strict.yaml"]);
    assert_eq!(output.status.code(), Some(1));
    let json = stdout_json(&output);
    assert_eq!(json["kind"], "MalformedQuery");
    assert_eq!(json["path"], "ungrouped");

    let output = run_cubeq(&["validate", &query, "--context", &context]);
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["query"]["measures"][0], "Employees.count");
    assert_eq!(json["securityContext"]["tenant"], "acme");
}

#[test]
fn test_meta_lists_catalog() {
    let output = run_cubeq(&["meta", "--catalog", "tests/test_data/employees.yaml"]);
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["cubes"][0]["name"], "Employees");
    assert_eq!(json["cubes"][1]["measures"][0], "Departments.count");
}

#[test]
fn test_unreadable_inputs_fail_with_context() {
    let output = run_cubeq(&["meta", "--catalog", "tests/test_data/missing.yaml"]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing.yaml"), "{}", stderr);

    let dir = tempfile::tempdir().unwrap();
    let query = write(dir.path(), "query.json", r#"{"measures": ["Employees.count"]}"#);
    let context = write(dir.path(), "context.json", "{not json");
    let output = run_cubeq(&["validate", &query, "--context", &context]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("parsing context"), "{}", stderr);
}
