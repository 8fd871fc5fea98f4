//! End-to-end track-call tests with a mock spec service and a recording transport.
//!
//! # Invariants
//! - With a spec available, events are validated and sent immediately
//! - Without one, events go through the batched path unvalidated
//! - A failed immediate send falls back to the batched path with validation kept

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use inspector_client::{Delivery, Inspector, MemoryStorage};
use inspector_config::{Environment, InspectorConfig};
use serde_json::json;
use wiremock::matchers::{method, path};

fn inspector(config: InspectorConfig, transport: &Arc<RecordingTransport>) -> Inspector {
    Inspector::builder(config)
        .transport(transport.clone())
        .storage(Arc::new(MemoryStorage::new()))
        .build()
        .expect("inspector should build")
}

#[tokio::test]
async fn test_spec_available_sends_validated_immediately() {
    let server = MockServer::start().await;
    mount_spec(&server, "event_spec/checkout.json").await;
    let transport = Arc::new(RecordingTransport::new());
    let inspector = inspector(config_for(&server.uri(), Environment::Dev), &transport);

    let report = inspector
        .track_schema_from_event(
            "Checkout Completed",
            &json!({"payment_method": "bitcoin", "total": 12.5}),
        )
        .await;

    let Delivery::Immediate { validation } = &report.delivery else {
        panic!("expected immediate delivery, got {:?}", report.delivery);
    };
    assert_eq!(validation.errors.len(), 1);

    let sent = transport.immediate();
    assert_eq!(sent.len(), 1);
    assert!(transport.batches().is_empty());

    let body = &sent[0];
    assert_eq!(body.event_name, "Checkout Completed");
    assert_eq!(body.event_id.as_deref(), Some("evt_checkout"));
    assert_eq!(body.event_spec_metadata.as_ref().unwrap().latest_action_id, "action_42");
    assert_eq!(body.validation_errors.as_ref().unwrap().len(), 1);
    assert_eq!(body.event_properties, report.schema);
    assert_eq!(body.stream_id, inspector.identity().anonymous_id());
}

#[tokio::test]
async fn test_valid_event_carries_empty_error_list() {
    let server = MockServer::start().await;
    mount_spec(&server, "event_spec/checkout.json").await;
    let transport = Arc::new(RecordingTransport::new());
    let inspector = inspector(config_for(&server.uri(), Environment::Staging), &transport);

    inspector
        .track_schema_from_event("Checkout Completed", &load_fixture("events/checkout_valid.json"))
        .await;

    let body = serde_json::to_value(&transport.immediate()[0]).unwrap();
    assert_eq!(body["validationErrors"], json!([]));
    assert_eq!(body["eventId"], "evt_checkout");
    assert_eq!(body["type"], "event");
    assert_eq!(body["env"], "staging");
}

#[tokio::test]
async fn test_prod_uses_batched_path_without_fetching() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let transport = Arc::new(RecordingTransport::new());
    let inspector = inspector(config_for(&server.uri(), Environment::Prod), &transport);

    let report = inspector
        .track_schema_from_event("Checkout Completed", &json!({"total": 1}))
        .await;

    assert_eq!(report.delivery, Delivery::Batched);
    assert!(transport.immediate().is_empty());
    let batched = transport.batched();
    assert_eq!(batched.len(), 1);
    assert!(!batched[0].is_validated());
    assert!(batched[0].validation_errors.is_none());
}

#[tokio::test]
async fn test_fetch_failure_uses_batched_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SPEC_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let transport = Arc::new(RecordingTransport::new());
    let inspector = inspector(config_for(&server.uri(), Environment::Dev), &transport);

    let report = inspector
        .track_schema_from_event("Checkout Completed", &json!({"total": 1}))
        .await;

    assert_eq!(report.delivery, Delivery::Batched);
    assert_eq!(transport.batched().len(), 1);
    assert_eq!(inspector.cache().size(), 0);
}

#[tokio::test]
async fn test_immediate_failure_falls_back_to_batch() {
    let server = MockServer::start().await;
    mount_spec(&server, "event_spec/checkout.json").await;
    let transport = Arc::new(RecordingTransport::new().failing_immediate());
    let inspector = inspector(config_for(&server.uri(), Environment::Dev), &transport);

    let report = inspector
        .track_schema_from_event("Checkout Completed", &json!({"payment_method": "cash", "total": 3}))
        .await;

    assert_eq!(report.delivery, Delivery::FellBackToBatch);
    assert_eq!(transport.immediate().len(), 1);
    let batches = transport.batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), 1);
    assert!(batches[0][0].is_validated());
    assert_eq!(batches[0][0].message_id, transport.immediate()[0].message_id);
}

#[tokio::test]
async fn test_batch_failure_does_not_fail_tracking() {
    let transport = Arc::new(RecordingTransport::new().failing_batch());
    let inspector = inspector(
        config_for("http://127.0.0.1:1", Environment::Prod),
        &transport,
    );

    let report = inspector.track_schema_from_event("Opened", &json!({})).await;

    assert_eq!(report.delivery, Delivery::Batched);
    assert_eq!(transport.batches().len(), 1);
}

#[tokio::test]
async fn test_cached_spec_is_reused() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SPEC_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(load_fixture("event_spec/checkout.json")),
        )
        .expect(1)
        .mount(&server)
        .await;
    let transport = Arc::new(RecordingTransport::new());
    let inspector = inspector(config_for(&server.uri(), Environment::Dev), &transport);

    for _ in 0..3 {
        let report = inspector
            .track_schema_from_event("Checkout Completed", &json!({"total": 1}))
            .await;
        assert!(matches!(report.delivery, Delivery::Immediate { .. }));
    }

    assert_eq!(inspector.cache().size(), 1);
    assert_eq!(transport.immediate().len(), 3);
}

#[tokio::test]
async fn test_slow_spec_lookup_is_bounded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SPEC_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(load_fixture("event_spec/checkout.json"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;
    let transport = Arc::new(RecordingTransport::new());
    let mut config = config_for(&server.uri(), Environment::Dev);
    config.spec_fetch_timeout = Duration::from_millis(100);
    let inspector = inspector(config, &transport);

    let started = std::time::Instant::now();
    let report = inspector
        .track_schema_from_event("Checkout Completed", &json!({"total": 1}))
        .await;

    assert_eq!(report.delivery, Delivery::Batched);
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_validate_without_sending() {
    let server = MockServer::start().await;
    mount_spec(&server, "event_spec/required_only.json").await;
    let transport = Arc::new(RecordingTransport::new());
    let inspector = inspector(config_for(&server.uri(), Environment::Dev), &transport);

    let result = inspector
        .validate("Settings Saved", &json!({"optional_prop": 50}))
        .await
        .expect("spec should be available");

    assert_eq!(result.errors.len(), 1);
    assert!(transport.immediate().is_empty());
    assert!(transport.batches().is_empty());
}

#[tokio::test]
async fn test_stream_id_override_is_sent() {
    let transport = Arc::new(RecordingTransport::new());
    let inspector = inspector(
        config_for("http://127.0.0.1:1", Environment::Prod),
        &transport,
    );
    inspector.identity().set_stream_id(Some("stream-42".to_string()));

    inspector.track_schema_from_event("Opened", &json!({})).await;

    assert_eq!(transport.batched()[0].stream_id, "stream-42");
}

#[tokio::test]
async fn test_encrypted_values_attached_in_dev() {
    let transport = Arc::new(RecordingTransport::new());
    let mut config = config_for("http://127.0.0.1:1", Environment::Dev);
    config.public_encryption_key = Some(inspector_config::Encryptor::generate_key());
    config.spec_fetch_timeout = Duration::from_millis(200);
    let inspector = inspector(config, &transport);

    let report = inspector
        .track_schema_from_event("Opened", &json!({"email": "a@b.c"}))
        .await;

    assert!(report.schema[0].encrypted_property_value.is_some());
    let wire = serde_json::to_string(&transport.batched()).unwrap();
    assert!(!wire.contains("a@b.c"));
}
