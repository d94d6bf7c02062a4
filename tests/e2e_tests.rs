//! End-to-end tests against a mock books service
//!
//! The binary runs as a child process; wiremock serves `/books` and
//! `/new-books` on a local port.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::process::{Command, Output};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn books_service(books_status: u16, new_books_status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/books"))
        .respond_with(ResponseTemplate::new(books_status).set_body_string("[]"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new-books"))
        .respond_with(ResponseTemplate::new(new_books_status).set_body_string("[]"))
        .mount(&server)
        .await;
    server
}

/// Run the binary off the async runtime so the mock server keeps serving
async fn run_blt(dir: &TempDir, args: &[&str], base_url: Option<&str>) -> Output {
    let mut cmd = Command::cargo_bin("blt").unwrap();
    cmd.current_dir(dir.path())
        .env("NO_COLOR", "1")
        .env_remove("LOAD_PLAN")
        .env_remove("REQUEST_TIMEOUT_SECONDS")
        .env_remove("ENABLE_COLOR")
        .args(args);
    match base_url {
        Some(url) => cmd.env("BASE_URL", url),
        None => cmd.env_remove("BASE_URL"),
    };

    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

/// URL of a local port that was just released, so nothing listens on it
fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

fn read_summary(dir: &TempDir) -> Value {
    let content = fs::read_to_string(dir.path().join("summary.json")).unwrap();
    serde_json::from_str(&content).unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_warmup_passes_against_healthy_service() {
    let server = books_service(200, 200).await;
    let dir = TempDir::new().unwrap();

    let output = run_blt(
        &dir,
        &["--vus", "2", "--iterations", "3", "--summary-export", "summary.json"],
        Some(&server.uri()),
    )
    .await;

    output.assert().success().stdout(
        predicate::str::contains("All thresholds passed")
            .and(predicate::str::contains("✓ status was 200 {books:list-books}: 6 passed, 0 failed")),
    );

    let summary = read_summary(&dir);
    assert_eq!(summary["plan"], "warmup");
    assert_eq!(summary["totals"]["http_reqs"], 12);
    assert_eq!(summary["totals"]["iterations"], 6);
    assert_eq!(summary["scenarios"][0]["stop_reason"], "completed");
    assert_eq!(summary["endpoints"]["new-books"]["path"], "/new-books");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 12);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_failed_checks_do_not_change_exit_code() {
    let server = books_service(200, 503).await;
    let dir = TempDir::new().unwrap();

    let output = run_blt(
        &dir,
        &["--vus", "2", "--iterations", "2", "--summary-export", "summary.json"],
        Some(&server.uri()),
    )
    .await;

    output
        .assert()
        .success()
        .stdout(predicate::str::contains("✗ status was 200 {books:new-books}: 0 passed, 4 failed"));

    let summary = read_summary(&dir);
    assert_eq!(summary["totals"]["failed_reqs"], 4);
    // Every iteration still ran to completion
    assert_eq!(summary["scenarios"][0]["completed_iterations"], 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_crossed_threshold_exits_99() {
    let server = books_service(200, 500).await;
    let dir = TempDir::new().unwrap();

    let output = run_blt(
        &dir,
        &[
            "--vus", "1",
            "--iterations", "2",
            "--threshold", "http_req_failed{books:new-books}=rate<0.01",
            "--summary-export", "summary.json",
        ],
        Some(&server.uri()),
    )
    .await;

    output
        .assert()
        .code(99)
        .stdout(predicate::str::contains("✗ http_req_failed{books:new-books}: rate < 0.01"))
        .stderr(predicate::str::contains("[THRESHOLDS]"));

    // The summary is exported even when thresholds fail
    let summary = read_summary(&dir);
    let crossed: Vec<&Value> = summary["thresholds"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|t| t["passed"] == false)
        .collect();
    assert_eq!(crossed.len(), 1);
    assert_eq!(crossed[0]["observed"], 1.0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_main_plan_runs_one_scenario_per_endpoint() {
    let server = books_service(200, 200).await;
    let dir = TempDir::new().unwrap();

    let output = run_blt(
        &dir,
        &[
            "--plan", "main",
            "--base-url", &server.uri(),
            "--vus", "2",
            "--iterations", "2",
            "--quiet",
            "--summary-export", "summary.json",
        ],
        Some("http://unused.invalid"),
    )
    .await;

    output.assert().success().stdout(predicate::str::is_empty());

    let summary = read_summary(&dir);
    let scenarios: Vec<&str> = summary["scenarios"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(scenarios, vec!["list_books", "new_books"]);
    assert_eq!(summary["endpoints"]["list-books"]["http_reqs"], 4);
    assert_eq!(summary["endpoints"]["new-books"]["http_reqs"], 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unreachable_service_records_failures_without_latency_data() {
    let dir = TempDir::new().unwrap();
    let base_url = closed_port_url();

    let output = run_blt(
        &dir,
        &["--vus", "1", "--iterations", "1", "--timeout", "5", "--summary-export", "summary.json"],
        Some(&base_url),
    )
    .await;

    // No response means no http_req_duration samples, so latency thresholds have no data
    output.assert().success().stdout(predicate::str::contains("no data"));

    let summary = read_summary(&dir);
    assert_eq!(summary["totals"]["http_reqs"], 2);
    assert_eq!(summary["totals"]["failed_reqs"], 2);
    assert!(summary["thresholds"][0]["observed"].is_null());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_no_color_keeps_logs_free_of_escape_codes() {
    let server = books_service(200, 200).await;
    let dir = TempDir::new().unwrap();

    // A threshold on an unknown books tag produces a WARN log line
    let output = run_blt(
        &dir,
        &[
            "--vus", "1",
            "--iterations", "1",
            "--threshold", "http_req_duration{books:old-books}=p(99)<1000",
        ],
        Some(&server.uri()),
    )
    .await;

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("WARN"), "expected a warning, got: {}", stderr);
    assert!(!stderr.contains('\x1b'), "escape codes in stderr: {:?}", stderr);
    assert!(!String::from_utf8_lossy(&output.stdout).contains('\x1b'));
    output.assert().success();
}
