//! CLI options interaction tests
//!
//! These run the binary without a books service: every case exits before
//! the first request is sent.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

const ENV_VARS: [&str; 4] = ["BASE_URL", "LOAD_PLAN", "REQUEST_TIMEOUT_SECONDS", "ENABLE_COLOR"];

/// Binary in an empty working directory with a clean environment
fn create_test_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("blt").unwrap();
    cmd.current_dir(dir.path()).env("NO_COLOR", "1");
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn test_help_and_version() {
    let dir = TempDir::new().unwrap();

    create_test_cmd(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--base-url"))
        .stdout(predicate::str::contains("--threshold"));

    create_test_cmd(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("books-load-tester "));
}

#[test]
fn test_list_plans() {
    let dir = TempDir::new().unwrap();

    create_test_cmd(&dir)
        .arg("--list-plans")
        .assert()
        .success()
        .stdout(predicate::str::contains("plan: warmup"))
        .stdout(predicate::str::contains("plan: main"))
        .stdout(predicate::str::contains("* warmup: 20 iterations for each of 10 VUs"))
        .stdout(predicate::str::contains("* new_books: 500 iterations for each of 100 VUs"));
}

#[test]
fn test_help_topics() {
    let dir = TempDir::new().unwrap();

    for (topic, expected) in [
        ("plans", "PLANS:"),
        ("config", "CONFIGURATION REFERENCE:"),
        ("thresholds", "EXIT CODES:"),
        ("examples", "EXAMPLES:"),
    ] {
        create_test_cmd(&dir)
            .args(["--help-topic", topic])
            .assert()
            .success()
            .stdout(predicate::str::contains(expected));
    }

    create_test_cmd(&dir)
        .args(["--help-topic", "metrics"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Unknown help topic: 'metrics'"));
}

#[test]
fn test_invalid_configuration_exits_with_config_code() {
    let dir = TempDir::new().unwrap();

    create_test_cmd(&dir)
        .args(["--plan", "soak"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unknown plan 'soak'"));

    create_test_cmd(&dir)
        .args(["--base-url", "ftp://books.example.com"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("[CONFIG]"));

    create_test_cmd(&dir)
        .args(["--threshold", "http_req_failed<0.01"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid threshold"));

    create_test_cmd(&dir)
        .args(["--threshold", "http_req_failed=p(99)<1"])
        .assert()
        .code(1);
}

#[test]
fn test_invalid_environment_exits_with_config_code() {
    let dir = TempDir::new().unwrap();

    create_test_cmd(&dir)
        .env("REQUEST_TIMEOUT_SECONDS", "soon")
        .arg("--list-plans")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("REQUEST_TIMEOUT_SECONDS"));

    create_test_cmd(&dir)
        .env("LOAD_PLAN", "soak")
        .arg("--list-plans")
        .assert()
        .code(1);

    // CLI wins over the environment
    create_test_cmd(&dir)
        .env("LOAD_PLAN", "soak")
        .args(["--plan", "warmup", "--list-plans"])
        .assert()
        .success();
}

#[test]
fn test_env_file_is_loaded_from_working_directory() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(".env"), "LOAD_PLAN=main\nBASE_URL=http://books.internal:9000\n").unwrap();

    create_test_cmd(&dir)
        .args(["--debug", "--list-plans"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Plan: main"))
        .stderr(predicate::str::contains("Base URL: http://books.internal:9000"))
        .stdout(predicate::str::contains("base url: http://books.internal:9000"));
}

#[test]
fn test_empty_base_url_falls_back_to_default() {
    let dir = TempDir::new().unwrap();

    create_test_cmd(&dir)
        .env("BASE_URL", "")
        .arg("--list-plans")
        .assert()
        .success()
        .stdout(predicate::str::contains("base url: http://localhost:8080"));
}

#[test]
fn test_argument_errors() {
    let dir = TempDir::new().unwrap();

    create_test_cmd(&dir)
        .args(["--max-duration", "forever"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--max-duration"));

    create_test_cmd(&dir)
        .args(["--timeout", "0"])
        .assert()
        .failure();

    create_test_cmd(&dir)
        .args(["--quiet", "--verbose"])
        .assert()
        .failure();
}
