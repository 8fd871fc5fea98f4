//! Tracking plan event spec endpoint.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::endpoints::request::{RequestLabels, RetryPolicy, send_request_with_retry};
use crate::error::{ClientError, Result};
use crate::event_spec::{EventSpecResponse, FetchParams};
use crate::metrics::MetricsCollector;
use inspector_config::constants::EVENT_SPEC_PATH;

/// Fetch and parse the spec for one event name.
///
/// Sends exactly one request. Any status other than 200 is an error.
/// Diagnostics are emitted only when `log_enabled` is set.
pub async fn get_event_spec(
    client: &Client,
    base_url: &str,
    params: &FetchParams,
    timeout: Duration,
    metrics: &MetricsCollector,
    log_enabled: bool,
) -> Result<EventSpecResponse> {
    let url = format!("{}{}", base_url.trim_end_matches('/'), EVENT_SPEC_PATH);
    if log_enabled {
        debug!(event_name = %params.event_name, "Fetching event spec");
    }

    let builder = client
        .get(&url)
        .query(&[
            ("apiKey", params.api_key.as_str()),
            ("streamId", params.stream_id.as_str()),
            ("eventName", params.event_name.as_str()),
        ])
        .timeout(timeout);
    let builder = crate::tracing::inject_trace_context(builder);

    let labels = RequestLabels {
        endpoint: EVENT_SPEC_PATH,
        method: "GET",
    };
    let response = send_request_with_retry(
        builder,
        RetryPolicy::new(0).with_logging(log_enabled),
        labels,
        metrics,
    )
    .await
    .map_err(|e| match e {
        ClientError::HttpError(e) if e.is_timeout() => ClientError::Timeout(timeout),
        other => other,
    })?;

    if response.status() != StatusCode::OK {
        return Err(ClientError::ApiError {
            status: response.status().as_u16(),
            url,
            message: "expected 200 OK".to_string(),
        });
    }

    let body = response.text().await.map_err(|e| {
        if e.is_timeout() {
            ClientError::Timeout(timeout)
        } else {
            ClientError::HttpError(e)
        }
    })?;
    EventSpecResponse::parse_logged(&body, log_enabled)
}
