//! Match pipeline integration tests
//!
//! Runs the binary end to end with the offline mock provider

mod common;

use std::fs;
use std::time::Duration;

use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

use common::{fixture_path, match_fixture, matcher_cmd, stdout_json, valid_config_fixture};

fn soft_total(report: &Value) -> f64 {
    report["candidates"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["soft_score"].as_f64().unwrap())
        .sum()
}

// ─────────────────────────────────────────────────────────────────
// Scenario Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_single_backend_match() {
    let output = match_fixture("single_backend.json").output().unwrap();
    assert!(output.status.success());

    let response = stdout_json(&output);
    assert_eq!(response["assignments"]["Backend"], "Ann");

    let report = &response["reports"][0];
    assert_eq!(report["role"], "Backend");
    assert_eq!(report["winner"], "Ann");
    assert_eq!(report["candidates"][0]["soft_score"].as_f64(), Some(1.0));
    assert!(report["log"].as_str().unwrap().contains("assigned Ann"));
}

#[test]
fn test_mirrored_pairing() {
    let output = match_fixture("mirrored.json").output().unwrap();
    assert!(output.status.success());

    let response = stdout_json(&output);
    assert_eq!(response["assignments"]["Frontend"], "Bo");
    assert_eq!(response["assignments"]["Backend"], "Ann");

    let matrix = &response["similarity_matrix"];
    assert!(matrix["Frontend"]["Bo"].as_f64().unwrap() > matrix["Frontend"]["Ann"].as_f64().unwrap());
    assert!(matrix["Backend"]["Ann"].as_f64().unwrap() > matrix["Backend"]["Bo"].as_f64().unwrap());

    for report in response["reports"].as_array().unwrap() {
        assert!((soft_total(report) - 1.0).abs() < 1e-9);
    }
}

#[test]
fn test_three_roles_one_member() {
    let output = match_fixture("three_roles_one_member.json").output().unwrap();
    assert!(output.status.success());

    let response = stdout_json(&output);
    let assignments = response["assignments"].as_object().unwrap();
    assert_eq!(assignments.len(), 1);
    assert_eq!(assignments["Frontend"], "Ann");

    let reports = response["reports"].as_array().unwrap();
    assert_eq!(reports.len(), 3);
    for report in reports {
        assert_eq!(report["candidates"][0]["member"], "Ann");
    }
    assert!(reports[0]["winner"].is_null());
    assert!(reports[0]["log"].as_str().unwrap().contains("unassigned"));
}

#[test]
fn test_boost_disabled_by_request() {
    let temp = TempDir::new().unwrap();
    let request = temp.path().join("request.json");
    let mut body: Value = serde_json::from_str(&fs::read_to_string(fixture_path("mirrored.json")).unwrap()).unwrap();
    body["domain_boost"] = serde_json::json!({ "enabled": false });
    fs::write(&request, body.to_string()).unwrap();

    let output = matcher_cmd()
        .arg("match")
        .arg("--config")
        .arg(valid_config_fixture())
        .arg("--input")
        .arg(&request)
        .output()
        .unwrap();
    assert!(output.status.success());

    let response = stdout_json(&output);
    assert!(response["debug"].get("domain").is_none());
    assert_eq!(response["assignments"]["Backend"], "Ann");
}

#[test]
fn test_debug_block_present() {
    let output = match_fixture("mirrored.json").output().unwrap();
    let response = stdout_json(&output);
    let debug = &response["debug"];

    assert_eq!(debug["top_k"], 10);
    assert_eq!(debug["roles"][0]["text"], "Core skills: React, TypeScript, CSS");
    assert!(debug["members"][0]["text"].as_str().unwrap().starts_with("Top skills: Go, PostgreSQL, REST APIs."));
    assert_eq!(debug["domain"]["method"], "peak");
    assert_eq!(debug["embedding"]["provider"], "mock");
    assert_eq!(debug["embedding"]["model"], "mock-hash-256");
    assert!(debug["request_id"].as_str().is_some());
}

#[test]
fn test_flexible_member_fields() {
    let output = match_fixture("aliases.json").output().unwrap();
    assert!(output.status.success());

    let response = stdout_json(&output);
    let debug = &response["debug"];
    assert_eq!(debug["roles"][0]["role"], "Backend");
    assert_eq!(debug["roles"][1]["role"], "Role 2");
    assert_eq!(debug["members"][0]["name"], "7");
    assert_eq!(debug["members"][0]["languages"], serde_json::json!(["Go"]));
    assert_eq!(debug["members"][0]["keywords"], serde_json::json!(["databases"]));
    assert_eq!(debug["members"][2]["name"], "Bo (2)");
    assert_eq!(response["similarity_matrix"]["Backend"].as_object().unwrap().len(), 3);
}

#[test]
fn test_stdin_and_output_file() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("result.json");
    let request = fs::read_to_string(fixture_path("single_backend.json")).unwrap();

    matcher_cmd()
        .arg("match")
        .arg("--config")
        .arg(valid_config_fixture())
        .arg("--output")
        .arg(&out)
        .arg("--pretty")
        .write_stdin(request)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let written = fs::read_to_string(&out).unwrap();
    assert!(written.contains("\n  \"assignments\""));
    let response: Value = serde_json::from_str(&written).unwrap();
    assert_eq!(response["assignments"]["Backend"], "Ann");
}

#[test]
fn test_deterministic_output() {
    let first = stdout_json(&match_fixture("mirrored.json").output().unwrap());
    let second = stdout_json(&match_fixture("mirrored.json").output().unwrap());

    assert_eq!(first["assignments"], second["assignments"]);
    assert_eq!(first["similarity_matrix"], second["similarity_matrix"]);
    assert_eq!(first["reports"], second["reports"]);
}

#[test]
fn test_disk_cache_reused_across_runs() {
    let temp = TempDir::new().unwrap();
    let run = || {
        let output = match_fixture("mirrored.json")
            .env("TEAMSKILLS_CACHE_ENABLED", "true")
            .env("TEAMSKILLS_CACHE_DIR", temp.path())
            .output()
            .unwrap();
        assert!(output.status.success());
        stdout_json(&output)
    };

    let first = run();
    assert!(first["debug"]["embedding"]["upstream_calls"].as_u64().unwrap() > 0);

    let second = run();
    assert_eq!(second["debug"]["embedding"]["upstream_calls"], 0);
    assert_eq!(first["similarity_matrix"], second["similarity_matrix"]);
}

// ─────────────────────────────────────────────────────────────────
// Error Scenario Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_bad_top_k_is_config_error() {
    match_fixture("bad_top_k.json")
        .assert()
        .code(10)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("E102"))
        .stderr(predicate::str::contains("top_k"))
        .stderr(predicate::str::contains("Hint"));
}

#[test]
fn test_malformed_request_json() {
    matcher_cmd()
        .arg("match")
        .arg("--config")
        .arg(valid_config_fixture())
        .write_stdin("{ not json")
        .assert()
        .code(40)
        .stderr(predicate::str::contains("E400"));
}

#[test]
fn test_missing_input_file() {
    matcher_cmd()
        .arg("match")
        .arg("--config")
        .arg(valid_config_fixture())
        .arg("--input")
        .arg("/nonexistent/request.json")
        .assert()
        .code(20);
}

#[test]
fn test_missing_config_exit_code() {
    matcher_cmd()
        .arg("match")
        .arg("--config")
        .arg("/nonexistent/path/matcher.toml")
        .arg("--input")
        .arg(fixture_path("single_backend.json"))
        .assert()
        .code(10);
}

#[test]
fn test_unreachable_provider_fails_whole_request() {
    matcher_cmd()
        .arg("match")
        .arg("--config")
        .arg(valid_config_fixture())
        .arg("--input")
        .arg(fixture_path("single_backend.json"))
        .env("TEAMSKILLS_PROVIDER", "openai")
        .env("TEAMSKILLS_BASE_URL", "http://127.0.0.1:9/v1")
        .env("TEAMSKILLS_API_KEY", "test-key")
        .env("TEAMSKILLS_TIMEOUT_SECS", "2")
        .timeout(Duration::from_secs(60))
        .assert()
        .code(30)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("E30"));
}

// ─────────────────────────────────────────────────────────────────
// Performance Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_startup_time() {
    use std::time::Instant;

    let start = Instant::now();
    matcher_cmd().arg("version").assert().success();

    assert!(
        start.elapsed() < Duration::from_secs(2),
        "Startup too slow: {:?}",
        start.elapsed()
    );
}
