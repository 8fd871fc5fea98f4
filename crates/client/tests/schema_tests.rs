//! Schema inference tests.
//!
//! # Invariants
//! - Inference is deterministic for the same input
//! - Lists are typed by their first element; empty lists are `list(unknown)`
//! - Primitive list element tags are deduplicated in first-seen order
//! - Ciphertext is attached only to primitive leaves in dev/staging

mod common;

use common::*;
use inspector_client::encryption::{AesGcmValueEncryptor, EncryptionContext, ValueEncryptor};
use inspector_client::schema::{SchemaChild, SchemaType, extract_schema};
use inspector_client::testing::generators::{arb_properties, arb_value};
use inspector_config::{Encryptor, Environment};
use proptest::prelude::*;
use serde_json::json;

fn type_tags(children: &[SchemaChild]) -> Vec<String> {
    children
        .iter()
        .map(|child| match child {
            SchemaChild::Type(tag) => tag.to_string(),
            SchemaChild::Properties(_) => "object".to_string(),
            SchemaChild::List(_) => "list".to_string(),
        })
        .collect()
}

#[test]
fn test_primitive_properties_in_order() {
    // `prop4` stands in for an undefined value: it is simply absent.
    let nodes = extract_schema(
        &json!({"prop0": true, "prop1": 1, "prop2": "str", "prop3": 0.5, "prop5": null}),
        None,
    );

    let summary: Vec<(String, String)> = nodes
        .iter()
        .map(|n| (n.property_name.clone(), n.property_type.to_string()))
        .collect();
    assert_eq!(
        summary,
        [
            ("prop0".to_string(), "boolean".to_string()),
            ("prop1".to_string(), "int".to_string()),
            ("prop2".to_string(), "string".to_string()),
            ("prop3".to_string(), "float".to_string()),
            ("prop5".to_string(), "null".to_string()),
        ]
    );
}

#[test]
fn test_serialize_entry_point_skips_absent_fields() {
    #[derive(serde::Serialize)]
    struct Props {
        prop0: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        prop4: Option<i32>,
        prop5: Option<i32>,
    }

    let nodes = inspector_client::SchemaParser::new().extract_from(&Props {
        prop0: true,
        prop4: None,
        prop5: None,
    });
    let names: Vec<_> = nodes.iter().map(|n| n.property_name.as_str()).collect();
    assert_eq!(names, ["prop0", "prop5"]);
    assert_eq!(nodes[1].property_type, SchemaType::Null);
}

#[test]
fn test_mixed_list_typed_by_first_element() {
    let nodes = extract_schema(&json!({"arr": [1, 2, 3, "four"]}), None);

    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].property_type.to_string(), "list(int)");
    assert_eq!(type_tags(nodes[0].elements().unwrap()), ["int", "string"]);
}

#[test]
fn test_duplicate_primitives_collapse() {
    let nodes = extract_schema(&json!({"a": [1, "1", 1, true, true]}), None);
    assert_eq!(
        type_tags(nodes[0].elements().unwrap()),
        ["int", "string", "boolean"]
    );
}

#[test]
fn test_wire_format_matches_collector_contract() {
    let nodes = extract_schema(
        &json!({"user": {"id": 7, "tags": ["a", "b"]}, "items": [{"sku": "x"}]}),
        None,
    );
    assert_eq!(
        serde_json::to_value(&nodes).unwrap(),
        json!([
            {
                "propertyName": "user",
                "propertyType": "object",
                "children": [
                    {"propertyName": "id", "propertyType": "int"},
                    {"propertyName": "tags", "propertyType": "list(string)", "children": ["string"]}
                ]
            },
            {
                "propertyName": "items",
                "propertyType": "list(object)",
                "children": [[{"propertyName": "sku", "propertyType": "string"}]]
            }
        ])
    );
}

#[test]
fn test_encrypted_values_decrypt_to_originals() {
    let key = Encryptor::generate_key();
    let ctx = EncryptionContext::new(Environment::Staging, Some(key.clone()));
    let nodes = extract_schema(&json!({"email": "a@b.c", "age": 42}), Some(&ctx));

    let decrypted: Vec<_> = nodes
        .iter()
        .map(|n| {
            let ciphertext = n.encrypted_property_value.as_deref().unwrap();
            AesGcmValueEncryptor.decrypt(ciphertext, &key).unwrap()
        })
        .collect();
    assert_eq!(decrypted, [json!("a@b.c"), json!(42)]);

    let wire = serde_json::to_string(&nodes).unwrap();
    assert!(!wire.contains("a@b.c"));
}

#[test]
fn test_fixture_event_infers_nested_lists() {
    let nodes = extract_schema(&load_fixture("events/checkout_valid.json"), None);
    let items = nodes.iter().find(|n| n.property_name == "items").unwrap();
    assert_eq!(items.property_type.to_string(), "list(object)");
    assert_eq!(items.elements().unwrap().len(), 2);
}

proptest! {
    #[test]
    fn prop_inference_is_idempotent(props in arb_properties()) {
        prop_assert_eq!(extract_schema(&props, None), extract_schema(&props, None));
    }

    #[test]
    fn prop_list_type_follows_first_element(items in prop::collection::vec(arb_value(), 0..6)) {
        let first = items.first().map(SchemaType::of).unwrap_or(SchemaType::Unknown);
        let nodes = extract_schema(&json!({"a": items}), None);
        prop_assert_eq!(nodes[0].property_type.to_string(), format!("list({})", first));
    }

    #[test]
    fn prop_primitive_tags_are_unique(items in prop::collection::vec(
        prop_oneof![any::<i32>().prop_map(|v| json!(v)), any::<bool>().prop_map(|v| json!(v)), "[a-z]{0,3}".prop_map(|v| json!(v))],
        0..20,
    )) {
        let nodes = extract_schema(&json!({"a": items}), None);
        let tags = type_tags(nodes[0].elements().unwrap());
        let mut unique = tags.clone();
        unique.dedup();
        unique.sort();
        unique.dedup();
        prop_assert_eq!(tags.len(), unique.len());
    }

    #[test]
    fn prop_property_count_matches_keys(props in arb_properties()) {
        let keys = props.as_object().map(|m| m.len()).unwrap_or(0);
        prop_assert_eq!(extract_schema(&props, None).len(), keys);
    }
}
