//! Integration tests for `fetch-spec`, `validate` and `track` against a mock server.

mod common;

use common::{SPEC_PATH, TRACK_PATH, fixture_path, inspector_cmd_with_server, load_fixture};
use predicates::prelude::*;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_checkout_spec(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(SPEC_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(load_fixture("event_spec/checkout.json")),
        )
        .mount(server)
        .await;
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[tokio::test]
async fn test_fetch_spec_prints_parsed_spec() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SPEC_PATH))
        .and(query_param("eventName", "Checkout Completed"))
        .and(query_param("streamId", "stream-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(load_fixture("event_spec/checkout.json")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let assert = inspector_cmd_with_server(&server.uri())
        .args([
            "fetch-spec",
            "--event",
            "Checkout Completed",
            "--stream-id",
            "stream-1",
        ])
        .assert()
        .success();

    let spec = stdout_json(assert.get_output());
    assert_eq!(spec["metadata"]["schemaId"], "schema_1");
    assert_eq!(spec["events"][0]["baseEventId"], "evt_checkout");
    assert_eq!(spec["events"][0]["variantIds"][0], "var_card");
}

#[tokio::test]
async fn test_fetch_spec_in_prod_prints_null_without_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SPEC_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    inspector_cmd_with_server(&server.uri())
        .args(["--env", "prod", "fetch-spec", "--event", "Signup"])
        .assert()
        .success()
        .stdout("null\n");
}

#[tokio::test]
async fn test_fetch_spec_server_error_prints_null() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SPEC_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    inspector_cmd_with_server(&server.uri())
        .args(["fetch-spec", "--event", "Signup"])
        .assert()
        .success()
        .stdout("null\n");
}

#[tokio::test]
async fn test_validate_valid_event() {
    let server = MockServer::start().await;
    mount_checkout_spec(&server).await;

    let assert = inspector_cmd_with_server(&server.uri())
        .args(["validate", "--event", "Checkout Completed", "--strict"])
        .arg(fixture_path("events/checkout_valid.json"))
        .assert()
        .success();

    let result = stdout_json(assert.get_output());
    assert_eq!(result["eventId"], "evt_checkout");
    assert_eq!(result["errors"], serde_json::json!([]));
}

#[tokio::test]
async fn test_validate_strict_fails_on_errors() {
    let server = MockServer::start().await;
    mount_checkout_spec(&server).await;

    inspector_cmd_with_server(&server.uri())
        .args(["validate", "--event", "Checkout Completed", "--strict", "-"])
        .write_stdin(r#"{"payment_method": "bitcoin", "total": 12.5}"#)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("ValueNotAllowed"))
        .stdout(predicate::str::contains("bitcoin").not())
        .stderr(predicate::str::contains("failed validation"));
}

#[tokio::test]
async fn test_validate_without_strict_reports_errors_and_succeeds() {
    let server = MockServer::start().await;
    mount_checkout_spec(&server).await;

    inspector_cmd_with_server(&server.uri())
        .args(["validate", "--event", "Checkout Completed", "-"])
        .write_stdin(r#"{"payment_method": "bitcoin", "total": 12.5}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains("payment_method"));
}

#[tokio::test]
async fn test_validate_without_spec_prints_null() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SPEC_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    inspector_cmd_with_server(&server.uri())
        .args(["validate", "--event", "Unknown", "--strict", "-"])
        .write_stdin("{}")
        .assert()
        .success()
        .stdout("null\n");
}

#[tokio::test]
async fn test_track_sends_immediately_with_spec() {
    let server = MockServer::start().await;
    mount_checkout_spec(&server).await;
    Mock::given(method("POST"))
        .and(path(TRACK_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let assert = inspector_cmd_with_server(&server.uri())
        .args(["track", "--event", "Checkout Completed"])
        .arg(fixture_path("events/checkout_valid.json"))
        .assert()
        .success();

    let report = stdout_json(assert.get_output());
    assert_eq!(report["delivery"]["path"], "immediate");
    assert_eq!(report["delivery"]["validation"]["eventId"], "evt_checkout");
    assert_eq!(report["schema"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_track_in_prod_uses_batched_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SPEC_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(TRACK_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    inspector_cmd_with_server(&server.uri())
        .args(["--env", "prod", "-o", "text", "track", "--event", "Signup", "-"])
        .write_stdin(r#"{"plan": "pro"}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains("Delivery: batched"));
}

#[tokio::test]
async fn test_track_persists_identity_in_storage_file() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TRACK_PATH))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let storage = dir.path().join("identity.json");

    inspector_cmd_with_server(&server.uri())
        .args(["--env", "prod", "--storage-path"])
        .arg(&storage)
        .args(["track", "--event", "Signup", "-"])
        .write_stdin("{}")
        .assert()
        .success();

    assert!(storage.exists());
}
