//! Integration tests for the phoenix binary
//!
//! Runs the compiled CLI against a wiremock registry with an isolated home
//! directory, checking JSON output and exit codes.

use serde_json::Value;
use std::process::{Command, Output};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RELEASES_PATH: &str = "/repos/phoenix-cli/phoenix/releases";

/// Run the binary with `args`, pointed at `api_url`
async fn run_phoenix(api_url: &str, args: &[&str]) -> Output {
    let home = TempDir::new().unwrap();
    let mut command = Command::new(env!("CARGO_BIN_EXE_phoenix"));
    command
        .args(args)
        .env("HOME", home.path())
        .env("USERPROFILE", home.path())
        .env("PHOENIX_API_URL", api_url)
        .env("PHOENIX_TOKEN_ENV", "PHOENIX_TEST_UNSET_TOKEN")
        .env_remove("PHOENIX_SLUG")
        .env_remove("PHOENIX_TEST_UNSET_TOKEN");

    let output = tokio::task::spawn_blocking(move || command.output())
        .await
        .unwrap()
        .unwrap();
    drop(home);
    output
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

#[tokio::test(flavor = "multi_thread")]
async fn test_version_json() {
    let output = run_phoenix("http://127.0.0.1:9", &["version", "--json"]).await;

    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["version"], concat!("v", env!("CARGO_PKG_VERSION")));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_check_without_releases() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(RELEASES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let output = run_phoenix(&server.uri(), &["-q", "upgrade", "--check", "--json"]).await;

    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["status"], "failed");
    assert_eq!(json["kind"], "ReleaseNotDetected");
    assert!(json.get("update-available").is_none());

    let output = run_phoenix(&server.uri(), &["-q", "upgrade", "--check"]).await;

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("try again later"), "stderr: {}", stderr);
    assert!(!String::from_utf8_lossy(&output.stdout).contains("Already on the latest version"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_release_not_detected_exits_zero() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(RELEASES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let output = run_phoenix(&server.uri(), &["-q", "upgrade", "--json"]).await;

    assert_eq!(output.status.code(), Some(0));
    let json = stdout_json(&output);
    assert_eq!(json["status"], "failed");
    assert_eq!(json["kind"], "ReleaseNotDetected");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_repository_exits_one() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let output = run_phoenix(&server.uri(), &["-q", "upgrade", "--json"]).await;

    assert_eq!(output.status.code(), Some(1));
    let json = stdout_json(&output);
    assert_eq!(json["kind"], "RepositoryNotFound");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_invalid_slug_makes_no_request() {
    let server = MockServer::start().await;

    let output = run_phoenix(
        &server.uri(),
        &["-q", "upgrade", "--slug", "not-a-slug", "--json"],
    )
    .await;

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout_json(&output)["kind"], "InvalidSlug");
    assert!(server.received_requests().await.unwrap().is_empty());
}
