//! Integration tests for the `marquee` CLI binary.
//!
//! Argument parsing, help output, completions and config handling run
//! offline. The list/permission tests point the binary at a wiremock
//! catalog API.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `marquee` binary with env isolation.
///
/// Clears all `MARQUEE_*` env vars and points config directories at
/// `home` so tests never touch the user's real configuration.
fn marquee_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("marquee");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("MARQUEE_PROFILE")
        .env_remove("MARQUEE_API")
        .env_remove("MARQUEE_API_KEY")
        .env_remove("MARQUEE_OUTPUT")
        .env_remove("MARQUEE_INSECURE")
        .env_remove("MARQUEE_TIMEOUT")
        .env_remove("MARQUEE_EMAIL")
        .env_remove("MARQUEE_PASSWORD")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

async fn catalog_api(grants: serde_json::Value) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": { "id": "u1", "email": "ops@example.com" },
            "permissions": grants
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/genres"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "id": "g-1", "name": "Drama" },
                { "id": "g-2", "name": "Noir" }
            ],
            "total_count": 2
        })))
        .mount(&server)
        .await;
    server
}

/// Run the binary off the async runtime so the mock server keeps serving.
async fn run_against(server: &MockServer, args: &[&str]) -> std::process::Output {
    let api = format!("{}/api", server.uri());
    let args: Vec<String> = args.iter().map(ToString::to_string).collect();
    tokio::task::spawn_blocking(move || {
        let home = tempfile::tempdir().unwrap();
        marquee_cmd(home.path())
            .args(["--api", &api, "--api-key", "svc-key"])
            .args(&args)
            .output()
            .unwrap()
    })
    .await
    .unwrap()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let home = tempfile::tempdir().unwrap();
    let output = marquee_cmd(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_lists_resources() {
    let home = tempfile::tempdir().unwrap();
    marquee_cmd(home.path()).arg("--help").assert().success().stdout(
        predicate::str::contains("genres")
            .and(predicate::str::contains("movies"))
            .and(predicate::str::contains("upload"))
            .and(predicate::str::contains("whoami")),
    );
}

#[test]
fn test_version_flag() {
    let home = tempfile::tempdir().unwrap();
    marquee_cmd(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("marquee"));
}

#[test]
fn test_completions_zsh() {
    let home = tempfile::tempdir().unwrap();
    marquee_cmd(home.path())
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_invalid_rental_status_is_a_usage_error() {
    let home = tempfile::tempdir().unwrap();
    marquee_cmd(home.path())
        .args(["rentals", "update", "r-1", "--status", "lost"])
        .assert()
        .code(2);
}

// ── Configuration ───────────────────────────────────────────────────

#[test]
fn test_list_without_config_explains_setup() {
    let home = tempfile::tempdir().unwrap();
    marquee_cmd(home.path())
        .args(["genres", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("marquee config init"));
}

#[test]
fn test_unknown_profile_is_reported() {
    let home = tempfile::tempdir().unwrap();
    marquee_cmd(home.path())
        .args(["--profile", "nope", "genres", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Profile 'nope' not found"));
}

#[test]
fn test_config_set_then_show() {
    let home = tempfile::tempdir().unwrap();
    marquee_cmd(home.path())
        .args(["config", "set", "api", "https://catalog.example.com/api"])
        .assert()
        .success();
    marquee_cmd(home.path())
        .args(["config", "set", "api_key", "sk-live-123"])
        .assert()
        .success();

    marquee_cmd(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("https://catalog.example.com/api")
                .and(predicate::str::contains("sk-live-123").not()),
        );
}

#[test]
fn test_config_set_rejects_bad_url() {
    let home = tempfile::tempdir().unwrap();
    marquee_cmd(home.path())
        .args(["config", "set", "api", "not a url"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid URL"));
}

// ── Against a catalog API ───────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_genres_list_json() {
    let server = catalog_api(json!([{ "resource": "genres", "action": "view" }])).await;
    let output = run_against(&server, &["-o", "json", "genres", "list"]).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let items: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(items[0]["name"], "Drama");
    assert_eq!(items.as_array().unwrap().len(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_list_without_view_grant_is_not_found() {
    let server = catalog_api(json!([])).await;
    let output = run_against(&server, &["genres", "list"]).await;
    assert_eq!(output.status.code(), Some(4), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_delete_without_grant_is_denied_before_prompting() {
    let server = catalog_api(json!([{ "resource": "genres", "action": "view" }])).await;
    let output = run_against(&server, &["genres", "delete", "g-1"]).await;
    assert_eq!(output.status.code(), Some(5), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("permission to delete genres"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_create_with_invalid_input_never_calls_api() {
    let server = catalog_api(json!([{ "resource": "genres", "action": "create" }])).await;
    let output = run_against(&server, &["genres", "create", "--name", "  "]).await;

    assert_eq!(output.status.code(), Some(2), "{}", combined_output(&output));
    let posts = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.method.as_str() == "POST")
        .count();
    assert_eq!(posts, 0);
}
