//! Common test utilities for integration tests.
//!
//! Re-exports fixture loading, wiremock types and helpers that build
//! configurations pointed at a mock server.
//!
//! # What this does NOT handle
//! - Mock setup for individual endpoints (use wiremock directly in tests)

use std::time::Duration;

use inspector_client::EventSpecResponse;
use inspector_config::{Environment, InspectorConfig};
use secrecy::SecretString;

#[allow(unused_imports)]
pub use inspector_client::testing::{RecordingTransport, load_fixture, sample_body};
#[allow(unused_imports)]
pub use wiremock::{Mock, MockServer, ResponseTemplate};

pub const API_KEY: &str = "test-api-key";
pub const SPEC_PATH: &str = "/trackingPlan/eventSpec";
pub const TRACK_PATH: &str = "/inspector/v1/track";

/// Configuration for `env` with both endpoints pointed at `server_uri`.
#[allow(dead_code)]
pub fn config_for(server_uri: &str, env: Environment) -> InspectorConfig {
    let mut config = InspectorConfig::new(SecretString::from(API_KEY.to_string()), env, "1.0.0");
    config.app_name = "test-app".to_string();
    config.endpoint = server_uri.to_string();
    config.spec_base_url = server_uri.to_string();
    config.spec_fetch_timeout = Duration::from_secs(2);
    config.log_enabled = true;
    config
}

/// Parse a spec fixture.
#[allow(dead_code)]
pub fn spec_fixture(name: &str) -> EventSpecResponse {
    EventSpecResponse::from_value(load_fixture(name)).expect("valid spec fixture")
}

/// Mount a spec response for any event name.
#[allow(dead_code)]
pub async fn mount_spec(server: &MockServer, fixture: &str) {
    use wiremock::matchers::{method, path};

    Mock::given(method("GET"))
        .and(path(SPEC_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(load_fixture(fixture)))
        .mount(server)
        .await;
}
