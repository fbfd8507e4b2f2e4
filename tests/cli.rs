use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("carmate").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: carmate [OPTIONS] <COMMAND>"))
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("chat"))
        .stdout(predicate::str::contains("describe"))
        .stdout(predicate::str::contains("--ollama-url <OLLAMA_URL>"))
        .stdout(predicate::str::contains("--prompt-variant <PROMPT_VARIANT>"))
        .stdout(predicate::str::contains("--version"));
}

#[test]
fn test_cli_serve_help() {
    let mut cmd = Command::cargo_bin("carmate").unwrap();
    cmd.arg("serve")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--host <HOST>"))
        .stdout(predicate::str::contains("--port <PORT>"));
}

#[test]
fn test_cli_describe_requires_fields() {
    let mut cmd = Command::cargo_bin("carmate").unwrap();
    cmd.args(["describe", "--make", "Toyota"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--model <MODEL>"));
}

#[test]
fn test_cli_rejects_unknown_prompt_variant() {
    let mut cmd = Command::cargo_bin("carmate").unwrap();
    cmd.args(["--prompt-variant", "latex", "chat"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value 'latex'"));
}

#[test]
fn test_cli_help_lists_environment_variables() {
    let mut cmd = Command::cargo_bin("carmate").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--llm-model <LLM_MODEL>"))
        .stdout(predicate::str::contains("env: OLLAMA_URL"))
        .stdout(predicate::str::contains("env: CARMATE_MODEL"))
        .stdout(predicate::str::contains("env: CARMATE_PROMPT_VARIANT"))
        .stdout(predicate::str::contains("env: CARMATE_REQUEST_TIMEOUT_SECS"));
}

#[test]
fn test_cli_reads_prompt_variant_from_env() {
    let mut cmd = Command::cargo_bin("carmate").unwrap();
    cmd.env("CARMATE_PROMPT_VARIANT", "latex")
        .arg("chat")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value 'latex'"));
}

#[test]
fn test_cli_no_command() {
    let mut cmd = Command::cargo_bin("carmate").unwrap();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage: carmate [OPTIONS] <COMMAND>"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cli_describe_prints_description() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "test-model",
            "created_at": "2025-01-01T00:00:00Z",
            "response": "{\"description\": \"Spotless Corolla, ready to go.\"}",
            "done": true
        })))
        .mount(&server)
        .await;

    let uri = server.uri();
    let assert = tokio::task::spawn_blocking(move || {
        Command::cargo_bin("carmate")
            .unwrap()
            .args([
                "describe", "--make", "Toyota", "--model", "Corolla", "--year", "2020", "--mileage", "30000",
                "--condition", "good", "--features", "sunroof, navigation",
                "--selling-points", "low mileage, fuel-efficient", "--ollama-url", uri.as_str(),
            ])
            .assert()
    })
    .await
    .unwrap();

    assert.success().stdout(predicate::str::contains("Spotless Corolla, ready to go."));
}

#[test]
fn test_cli_describe_reports_failure() {
    let mut cmd = Command::cargo_bin("carmate").unwrap();
    cmd.args([
        "describe", "--make", "Toyota", "--model", "Corolla", "--year", "2020", "--mileage", "30000",
        "--condition", "good", "--features", "", "--selling-points", "",
        "--ollama-url", "http://127.0.0.1:1",
    ])
    .assert()
    .failure()
    .stdout(predicate::str::contains("Sorry, I couldn't generate a description at this time."));
}
