//! Integration tests for the offline `schema` and `keygen` commands.

mod common;

use common::{fixture_path, inspector_cmd};
use predicates::prelude::*;

#[test]
fn test_schema_from_file() {
    let output = inspector_cmd()
        .arg("schema")
        .arg(fixture_path("events/checkout_valid.json"))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let schema: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let names: Vec<&str> = schema
        .as_array()
        .unwrap()
        .iter()
        .map(|node| node["propertyName"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["payment_method", "total", "coupon_code", "items"]);
    assert_eq!(schema[1]["propertyType"], "float");
    assert_eq!(schema[3]["propertyType"], "list(object)");
}

#[test]
fn test_schema_from_stdin_compact() {
    inspector_cmd()
        .args(["--output", "compact", "schema", "-"])
        .write_stdin(r#"{"count": 3, "tags": ["a", "b"]}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r#"{"propertyName":"count","propertyType":"int"}"#,
        ))
        .stdout(predicate::str::contains(r#""children":["string"]"#));
}

#[test]
fn test_schema_text_output() {
    inspector_cmd()
        .args(["-o", "text", "schema", "-"])
        .write_stdin(r#"{"user": {"id": 7}}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains("user: object\n  id: int"));
}

#[test]
fn test_schema_of_non_object_is_empty() {
    inspector_cmd()
        .args(["-o", "compact", "schema", "-"])
        .write_stdin("[1, 2, 3]")
        .assert()
        .success()
        .stdout("[]\n");
}

#[test]
fn test_schema_never_prints_values() {
    inspector_cmd()
        .args(["schema", "-"])
        .write_stdin(r#"{"email": "person@example.com"}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains("person@example.com").not());
}

#[test]
fn test_schema_with_encryption_key_in_dev() {
    let key = "0f".repeat(32);
    let output = inspector_cmd()
        .args(["--env", "dev", "--public-encryption-key", key.as_str(), "schema", "-"])
        .write_stdin(r#"{"email": "person@example.com"}"#)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let schema: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert!(schema[0]["encryptedPropertyValue"].is_string());
}

#[test]
fn test_schema_does_not_need_api_key() {
    inspector_cmd()
        .env_remove("INSPECTOR_API_KEY")
        .args(["schema", "-"])
        .write_stdin("{}")
        .assert()
        .success();
}

#[test]
fn test_keygen_prints_hex_key() {
    let output = inspector_cmd()
        .env_remove("INSPECTOR_API_KEY")
        .args(["-o", "text", "keygen"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let key = String::from_utf8(output).unwrap();
    let key = key.trim();
    assert_eq!(key.len(), 64);
    assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn test_keygen_json_output() {
    inspector_cmd()
        .arg("keygen")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"key\""));
}
