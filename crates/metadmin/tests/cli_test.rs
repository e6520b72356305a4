//! Integration tests for the `metadmin` CLI binary.
//!
//! Argument parsing, config handling and error exit codes run without a
//! backend. The session flow runs against a wiremock server.
#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

const METADATA: &str = r#"{
  "services": [
    {
      "name": "users",
      "entities": [
        {
          "name": "user",
          "fields": [
            {"name": "id", "kind": "uuid", "read_only": true},
            {"name": "email", "kind": "email", "required": true},
            {"name": "age", "kind": "integer"}
          ],
          "columns": ["id", "email"],
          "human_name_field": "email"
        }
      ]
    }
  ]
}"#;

/// Build a [`Command`] for the `metadmin` binary with env isolation.
///
/// Clears every `METADMIN_*` variable and points config and data
/// directories into `home` so tests never touch real configuration.
fn metadmin_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("metadmin");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("METADMIN_PROFILE")
        .env_remove("METADMIN_HOST")
        .env_remove("METADMIN_PORT")
        .env_remove("METADMIN_METADATA")
        .env_remove("METADMIN_OUTPUT")
        .env_remove("METADMIN_TIMEOUT")
        .env_remove("METADMIN_EMAIL");
    cmd
}

fn write_metadata(home: &Path) -> PathBuf {
    let path = home.join("app.json");
    std::fs::write(&path, METADATA).unwrap();
    path
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn ok_envelope(data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"data": data, "status_code": 200}))
}

/// `--host/--port/--metadata` pointing at a mock backend.
fn backend_args(server: &MockServer, metadata: &Path) -> Vec<String> {
    let address = server.address();
    vec![
        "--host".to_owned(),
        address.ip().to_string(),
        "--port".to_owned(),
        address.port().to_string(),
        "--metadata".to_owned(),
        metadata.display().to_string(),
    ]
}

/// Run the binary off the async runtime so the mock server keeps serving.
async fn run_against(
    home: &Path,
    backend: &[String],
    args: &[&str],
    stdin: Option<&'static str>,
) -> std::process::Output {
    let mut cmd = metadmin_cmd(home);
    cmd.args(backend).args(args);
    if let Some(input) = stdin {
        cmd.write_stdin(input);
    }
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

/// Mount the login endpoint and sign in, leaving a session on disk.
async fn signed_in(server: &MockServer, home: &Path, backend: &[String]) {
    Mock::given(method("POST"))
        .and(path("/v1/users/authenticate"))
        .respond_with(ok_envelope(json!({"token": "t9"})))
        .mount(server)
        .await;
    let login = run_against(
        home,
        backend,
        &["login", "--email", "a@x.com", "--password-stdin"],
        Some("pw\n"),
    )
    .await;
    assert!(login.status.success(), "{}", combined_output(&login));
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let home = TempDir::new().unwrap();
    let output = metadmin_cmd(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    let home = TempDir::new().unwrap();
    metadmin_cmd(home.path()).arg("--help").assert().success().stdout(
        predicate::str::contains("list")
            .and(predicate::str::contains("login"))
            .and(predicate::str::contains("services")),
    );
}

#[test]
fn test_version_flag() {
    let home = TempDir::new().unwrap();
    metadmin_cmd(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("metadmin"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_zsh() {
    let home = TempDir::new().unwrap();
    metadmin_cmd(home.path())
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_completions_bash() {
    let home = TempDir::new().unwrap();
    metadmin_cmd(home.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let home = TempDir::new().unwrap();
    let output = metadmin_cmd(home.path()).arg("foobar").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_invalid_output_format() {
    let home = TempDir::new().unwrap();
    let output = metadmin_cmd(home.path())
        .args(["--output", "xml", "services"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_services_without_metadata() {
    let home = TempDir::new().unwrap();
    let output = metadmin_cmd(home.path()).arg("services").output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected usage exit code");
    let text = combined_output(&output);
    assert!(text.contains("metadata"), "Expected metadata hint:\n{text}");
}

#[test]
fn test_unknown_entity_is_not_found() {
    let home = TempDir::new().unwrap();
    let metadata = write_metadata(home.path());
    let output = metadmin_cmd(home.path())
        .arg("--metadata")
        .arg(&metadata)
        .args(["list", "users", "ghost"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    let text = combined_output(&output);
    assert!(text.contains("ghost"), "Expected entity name in error:\n{text}");
}

#[test]
fn test_list_requires_login() {
    let home = TempDir::new().unwrap();
    let metadata = write_metadata(home.path());
    let output = metadmin_cmd(home.path())
        .arg("--metadata")
        .arg(&metadata)
        .args(["list", "users", "user"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    let text = combined_output(&output);
    assert!(text.contains("metadmin login"), "Expected login hint:\n{text}");
}

#[test]
fn test_unknown_profile() {
    let home = TempDir::new().unwrap();
    let output = metadmin_cmd(home.path())
        .args(["--profile", "nope", "status"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(combined_output(&output).contains("nope"));
}

// ── Metadata-only commands ──────────────────────────────────────────

#[test]
fn test_services_lists_menu() {
    let home = TempDir::new().unwrap();
    let metadata = write_metadata(home.path());
    metadmin_cmd(home.path())
        .arg("--metadata")
        .arg(&metadata)
        .args(["--output", "plain", "services"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/users/user/list"));
}

#[test]
fn test_fields_json() {
    let home = TempDir::new().unwrap();
    let metadata = write_metadata(home.path());
    let output = metadmin_cmd(home.path())
        .arg("--metadata")
        .arg(&metadata)
        .args(["-o", "json", "fields", "users", "user"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<_> = rows
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap().to_owned())
        .collect();
    assert_eq!(names, ["id", "email", "age"]);
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_set_then_show() {
    let home = TempDir::new().unwrap();
    metadmin_cmd(home.path())
        .args(["config", "set", "port", "9090"])
        .assert()
        .success();
    metadmin_cmd(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("port = 9090"));
}

#[test]
fn test_config_set_rejects_unknown_key() {
    let home = TempDir::new().unwrap();
    let output = metadmin_cmd(home.path())
        .args(["config", "set", "colour", "red"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_config_path_points_into_config_home() {
    let home = TempDir::new().unwrap();
    metadmin_cmd(home.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

// ── Session flow ────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_login_list_logout() {
    let server = MockServer::start().await;
    let address = server.address();

    Mock::given(method("POST"))
        .and(path("/v1/users/authenticate"))
        .and(body_json(json!({"email": "a@x.com", "password": "pw"})))
        .respond_with(ok_envelope(json!({"token": "t9"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/users/user/list"))
        .and(header("authorization", "Bearer t9"))
        .and(query_param("req", "{}"))
        .respond_with(ok_envelope(json!({"items": [
            {"id": "u1", "email": "a@x.com", "age": 30}
        ]})))
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let metadata = write_metadata(home.path());
    let backend = [
        "--host".to_owned(),
        address.ip().to_string(),
        "--port".to_owned(),
        address.port().to_string(),
        "--metadata".to_owned(),
        metadata.display().to_string(),
    ];

    let run = |args: Vec<String>, stdin: Option<&'static str>| {
        let mut cmd = metadmin_cmd(home.path());
        cmd.args(&backend).args(args);
        if let Some(input) = stdin {
            cmd.write_stdin(input);
        }
        tokio::task::spawn_blocking(move || cmd.output().unwrap())
    };

    let login = run(
        ["login", "--email", "a@x.com", "--password-stdin"]
            .map(String::from)
            .to_vec(),
        Some("pw\n"),
    )
    .await
    .unwrap();
    assert!(login.status.success(), "{}", combined_output(&login));

    let list = run(
        ["-o", "json", "list", "users", "user"].map(String::from).to_vec(),
        None,
    )
    .await
    .unwrap();
    assert!(list.status.success(), "{}", combined_output(&list));
    assert!(String::from_utf8_lossy(&list.stdout).contains("a@x.com"));

    let logout = run(vec!["logout".to_owned()], None).await.unwrap();
    assert!(logout.status.success());

    let after = run(["list", "users", "user"].map(String::from).to_vec(), None)
        .await
        .unwrap();
    assert_eq!(after.status.code(), Some(3));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_expired_token_exits_with_auth_code() {
    let server = MockServer::start().await;
    let home = TempDir::new().unwrap();
    let metadata = write_metadata(home.path());
    let backend = backend_args(&server, &metadata);
    signed_in(&server, home.path(), &backend).await;

    Mock::given(method("GET"))
        .and(path("/v1/users/user/list"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "token expired"})))
        .mount(&server)
        .await;

    let list = run_against(home.path(), &backend, &["list", "users", "user"], None).await;
    assert_eq!(list.status.code(), Some(3), "{}", combined_output(&list));
    let text = combined_output(&list);
    assert!(text.contains("token expired"), "Expected backend message:\n{text}");
    assert!(text.contains("metadmin login"), "Expected login hint:\n{text}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_edit_keeps_fields_not_set() {
    let server = MockServer::start().await;
    let home = TempDir::new().unwrap();
    let metadata = write_metadata(home.path());
    let backend = backend_args(&server, &metadata);
    signed_in(&server, home.path(), &backend).await;

    Mock::given(method("GET"))
        .and(path("/v1/users/user"))
        .and(query_param("req", r#"{"id":"u1"}"#))
        .respond_with(ok_envelope(json!({"id": "u1", "email": "a@x.com", "age": 30})))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/users/user"))
        .and(body_json(json!({"object": {"id": "u1", "email": "a@x.com", "age": 31}})))
        .respond_with(ok_envelope(json!({"id": "u1", "email": "a@x.com", "age": 31})))
        .expect(1)
        .mount(&server)
        .await;

    let edit = run_against(
        home.path(),
        &backend,
        &["edit", "users", "user", "u1", "--set", "age=31"],
        None,
    )
    .await;
    assert!(edit.status.success(), "{}", combined_output(&edit));
}
