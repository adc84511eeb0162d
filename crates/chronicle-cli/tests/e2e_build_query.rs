//! E2E CLI tests for `chron build`, `chron query`, `chron analyze` and
//! `chron verify`.
//!
//! Each test runs the `chron` binary as a subprocess in an isolated temp
//! directory with the user config directory pointed inside it.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test Harness
// ---------------------------------------------------------------------------

/// Build a Command targeting the chron binary, rooted in `dir`.
fn chron_cmd(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("chron").expect("chron binary must exist");
    cmd.current_dir(dir);
    cmd.env("CHRONICLE_LOG", "error");
    cmd.env("HOME", dir);
    cmd.env("XDG_CONFIG_HOME", dir.join(".config"));
    cmd.env_remove("FORMAT");
    cmd.env_remove("CHRONICLE_RELATION_THRESHOLD");
    cmd.env_remove("CHRONICLE_WINDOW");
    cmd
}

fn write_file(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).expect("write fixture");
    path
}

/// Two events joined by an explicit result marker.
fn write_causal_pair(dir: &Path) -> PathBuf {
    let events = json!({
        "title": "Rate decision",
        "items": [
            {
                "id": "a",
                "title": "Rate hike",
                "date_iso": "2020-03-01",
                "description": "The central bank raised rates.",
                "category": "economy",
                "people": ["Sato"]
            },
            {
                "id": "b",
                "title": "Yen rally",
                "date_iso": "2020-03-02",
                "description": "As a result, the yen rose.",
                "category": "economy",
                "people": ["Sato"]
            }
        ]
    });
    write_file(dir, "events.json", &events.to_string())
}

/// Build the causal pair into `graph.json` and return its path.
fn build_graph(dir: &Path) -> PathBuf {
    let events = write_causal_pair(dir);
    let out = dir.join("graph.json");
    chron_cmd(dir)
        .args(["build", "--events"])
        .arg(&events)
        .arg("-o")
        .arg(&out)
        .assert()
        .success();
    out
}

fn stdout_json(cmd: &mut Command) -> Value {
    let output = cmd.output().expect("command should not crash");
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

// ---------------------------------------------------------------------------
// build
// ---------------------------------------------------------------------------

#[test]
fn build_writes_graph_and_reports_summary() {
    let dir = TempDir::new().unwrap();
    let events = write_causal_pair(dir.path());
    let out = dir.path().join("graph.json");

    let summary = stdout_json(
        chron_cmd(dir.path())
            .args(["build", "--format", "json", "--events"])
            .arg(&events)
            .arg("-o")
            .arg(&out),
    );
    assert_eq!(summary["node_count"], 2);
    assert_eq!(summary["edge_count"], 1);
    assert_eq!(summary["critical_path"], json!(["a", "b"]));

    let graph: Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(graph["id"], summary["id"]);
    assert!(graph["id"].as_str().unwrap().starts_with("dag-"));
    assert_eq!(graph["title"], "Rate decision");
    assert_eq!(graph["edges"][0]["relation_type"], "causal");
    assert_eq!(graph["nodes"][0]["is_parent"], true);
}

#[test]
fn build_without_out_prints_graph() {
    let dir = TempDir::new().unwrap();
    let events = write_causal_pair(dir.path());

    let graph = stdout_json(
        chron_cmd(dir.path())
            .args(["build", "--format", "text", "--events"])
            .arg(&events),
    );
    assert_eq!(graph["stats"]["edge_count"], 1);
    assert_eq!(graph["total_events"], 2);
}

#[test]
fn build_threshold_flag_drops_weak_edges() {
    let dir = TempDir::new().unwrap();
    let events = write_causal_pair(dir.path());

    let graph = stdout_json(
        chron_cmd(dir.path())
            .args(["build", "--format", "text", "--threshold", "1.0", "--events"])
            .arg(&events),
    );
    assert_eq!(graph["stats"]["edge_count"], 0);
}

#[test]
fn build_reads_threshold_from_project_config() {
    let dir = TempDir::new().unwrap();
    let events = write_causal_pair(dir.path());
    write_file(dir.path(), "chronicle.toml", "[engine]\nrelation_threshold = 1.0\n");

    let graph = stdout_json(
        chron_cmd(dir.path())
            .args(["build", "--format", "text", "--events"])
            .arg(&events),
    );
    assert_eq!(graph["stats"]["edge_count"], 0);
}

#[test]
fn build_with_generous_timeout_succeeds() {
    let dir = TempDir::new().unwrap();
    let events = write_causal_pair(dir.path());

    chron_cmd(dir.path())
        .args(["build", "--format", "text", "--timeout-ms", "60000", "--events"])
        .arg(&events)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"edges\""));
}

#[test]
fn empty_events_fail_with_error_code() {
    let dir = TempDir::new().unwrap();
    let events = write_file(dir.path(), "events.json", "[]");

    let output = chron_cmd(dir.path())
        .args(["build", "--format", "json", "--events"])
        .arg(&events)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let err: Value = serde_json::from_slice(&output.stderr).expect("stderr should be JSON");
    assert_eq!(err["error"]["error_code"], "E1001");
    assert_eq!(err["error"]["stage"], "validation");
    assert!(err["error"]["suggestion"].is_string());
}

#[test]
fn duplicate_ids_fail_in_text_mode() {
    let dir = TempDir::new().unwrap();
    let events = write_file(
        dir.path(),
        "events.json",
        r#"[{"id":"x","title":"one"},{"id":"x","title":"two"}]"#,
    );

    chron_cmd(dir.path())
        .args(["build", "--format", "text", "--events"])
        .arg(&events)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("error[E1002]"));
}

// ---------------------------------------------------------------------------
// query
// ---------------------------------------------------------------------------

#[test]
fn query_flags_answer_each_type() {
    let dir = TempDir::new().unwrap();
    let graph = build_graph(dir.path());
    let run = |args: &[&str]| {
        stdout_json(
            chron_cmd(dir.path())
                .args(["query", "--format", "json", "--graph"])
                .arg(&graph)
                .args(args),
        )
    };

    let path = run(&["--type", "path", "--start", "a", "--end", "b"]);
    assert_eq!(path["query_type"], "path");
    assert_eq!(path["result"]["paths"], json!([["a", "b"]]));

    let impact = run(&["--type", "impact", "--node", "a"]);
    assert_eq!(impact["result"]["node_ids"], json!(["b"]));

    let prerequisites = run(&["--type", "prerequisite", "--node", "b"]);
    assert_eq!(prerequisites["result"]["node_ids"], json!([]));

    let chain = run(&["--type", "causal-chain", "--start", "a"]);
    assert_eq!(chain["result"]["node_ids"], json!(["b"]));

    let influence = run(&["--type", "influence", "--start", "b", "--end", "a"]);
    assert_eq!(influence["result"]["influenced"], false);
    assert_eq!(influence["result"]["confidence"], 0.0);
}

#[test]
fn query_reads_request_file() {
    let dir = TempDir::new().unwrap();
    let graph = build_graph(dir.path());
    let request = write_file(
        dir.path(),
        "q.json",
        r#"{"query_type":"influence","start_node_id":"a","end_node_id":"b"}"#,
    );

    let response = stdout_json(
        chron_cmd(dir.path())
            .args(["query", "--format", "json", "--graph"])
            .arg(&graph)
            .arg("--request")
            .arg(&request),
    );
    assert_eq!(response["result"]["influenced"], true);
    assert!(response["result"]["confidence"].as_f64().unwrap() >= 0.85);
}

#[test]
fn query_missing_parameter_is_invalid_query() {
    let dir = TempDir::new().unwrap();
    let graph = build_graph(dir.path());

    let output = chron_cmd(dir.path())
        .args(["query", "--format", "json", "--type", "path", "--start", "a", "--graph"])
        .arg(&graph)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let err: Value = serde_json::from_slice(&output.stderr).unwrap();
    assert_eq!(err["error"]["error_code"], "E1202");
}

#[test]
fn query_unknown_relation_is_rejected() {
    let dir = TempDir::new().unwrap();
    let graph = build_graph(dir.path());

    chron_cmd(dir.path())
        .args(["query", "--format", "text", "--type", "impact", "--node", "a"])
        .args(["--relation", "sideways", "--graph"])
        .arg(&graph)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("error[E1201]"));
}

#[test]
fn query_text_output_lists_nodes() {
    let dir = TempDir::new().unwrap();
    let graph = build_graph(dir.path());

    chron_cmd(dir.path())
        .args(["query", "--format", "text", "--type", "impact", "--node", "a", "--graph"])
        .arg(&graph)
        .assert()
        .success()
        .stdout(predicate::str::contains("b"));
}

// ---------------------------------------------------------------------------
// analyze / verify
// ---------------------------------------------------------------------------

#[test]
fn analyze_reports_critical_path() {
    let dir = TempDir::new().unwrap();
    let graph = build_graph(dir.path());

    let report = stdout_json(
        chron_cmd(dir.path())
            .args(["analyze", "--format", "json", "--graph"])
            .arg(&graph),
    );
    assert_eq!(report["topology"]["critical_path"], json!(["a", "b"]));
    assert_eq!(report["topology"]["levels"], json!([["a"], ["b"]]));
    assert_eq!(report["edges"]["count"], 1);

    chron_cmd(dir.path())
        .args(["analyze", "--format", "pretty", "--graph"])
        .arg(&graph)
        .assert()
        .success()
        .stdout(predicate::str::contains("Critical path"));
}

#[test]
fn verify_accepts_built_graph() {
    let dir = TempDir::new().unwrap();
    let graph = build_graph(dir.path());

    let report = stdout_json(
        chron_cmd(dir.path())
            .args(["verify", "--format", "json", "--graph"])
            .arg(&graph),
    );
    assert_eq!(report["ok"], true);
    assert_eq!(report["violations"], json!([]));
}

#[test]
fn verify_flags_tampered_graph() {
    let dir = TempDir::new().unwrap();
    let graph_path = build_graph(dir.path());
    let mut graph: Value = serde_json::from_str(&fs::read_to_string(&graph_path).unwrap()).unwrap();
    graph["edges"][0]["relation_strength"] = json!(0.1);
    fs::write(&graph_path, graph.to_string()).unwrap();

    let output = chron_cmd(dir.path())
        .args(["verify", "--format", "json", "--graph"])
        .arg(&graph_path)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["ok"], false);
    assert_eq!(report["violations"][0]["kind"], "below_threshold");
}

#[test]
fn completions_emit_script() {
    let dir = TempDir::new().unwrap();
    chron_cmd(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("chron"));
}
