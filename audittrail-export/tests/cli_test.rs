//! Tests for the audittrail-export binary: exit codes and error messages
//!
//! Each run happens in an empty temporary directory with the credential and
//! hostname variables removed, so no .env file or shell setting leaks in.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn export_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("audittrail-export").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("DOMINO_HOSTNAME")
        .env_remove("JWT")
        .env_remove("API_KEY")
        .env_remove("AUDITTRAIL_DISABLE_CERT_VALIDATION");
    cmd
}

#[test]
fn test_missing_credential_exits_with_usage_error() {
    let dir = TempDir::new().unwrap();
    export_cmd(&dir)
        .args(["--hostname", "https://domino.example.com"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("exactly one credential required"));

    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_both_credentials_exit_with_usage_error() {
    let dir = TempDir::new().unwrap();
    export_cmd(&dir)
        .args([
            "--hostname",
            "https://domino.example.com",
            "--jwt",
            "token",
            "--api-key",
            "key",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("exactly one credential required"));
}

#[test]
fn test_credential_from_environment_conflicts_with_flag() {
    let dir = TempDir::new().unwrap();
    export_cmd(&dir)
        .env("JWT", "token-from-env")
        .args(["--hostname", "https://domino.example.com", "--api-key", "key"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not both"));
}

#[tokio::test]
async fn test_malformed_start_date_names_the_field() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"events": []})))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let uri = server.uri();
    export_cmd(&dir)
        .args([
            "--hostname",
            uri.as_str(),
            "--api-key",
            "key",
            "--start_date",
            "2024-13-40",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--start_date"));

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[test]
fn test_missing_hostname() {
    let dir = TempDir::new().unwrap();
    export_cmd(&dir)
        .args(["--api-key", "key"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("hostname required"));
}

#[test]
fn test_unknown_flag_is_a_usage_error() {
    let dir = TempDir::new().unwrap();
    export_cmd(&dir).arg("--bogus").assert().code(2);
}

#[tokio::test]
async fn test_env_file_supplies_hostname_and_credential() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/audittrail/v1/auditevents"))
        .and(header("X-Domino-Api-Key", "key-from-dotenv"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "events": [{
                "timestamp": 1729185360064_i64,
                "actor": {"name": "alice"},
                "action": {"eventName": "Create Project"}
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(".env"),
        format!("DOMINO_HOSTNAME={}\nAPI_KEY=key-from-dotenv\n", server.uri()),
    )
    .unwrap();

    export_cmd(&dir)
        .args(["--output", "out/export.csv"])
        .assert()
        .success();

    let content = fs::read_to_string(dir.path().join("out/export.csv")).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with("2024-10-17 17:16:00,alice,Create Project"));
}

#[tokio::test]
async fn test_server_error_exits_with_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/audittrail/v1/auditevents"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let uri = server.uri();
    export_cmd(&dir)
        .args([
            "--hostname",
            uri.as_str(),
            "--jwt",
            "token",
            "--output",
            "export.csv",
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("403"));

    assert!(!dir.path().join("export.csv").exists());
}
