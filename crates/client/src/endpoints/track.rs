//! Collector track endpoint.

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::endpoints::request::{RequestLabels, RetryPolicy, send_request_with_retry};
use crate::error::Result;
use crate::metrics::MetricsCollector;
use crate::models::EventSchemaBody;
use inspector_config::constants::{API_KEY_HEADER, TRACK_PATH};

/// POST a JSON array of event bodies to the collector.
pub async fn post_events(
    client: &Client,
    endpoint: &str,
    api_key: &SecretString,
    events: &[EventSchemaBody],
    policy: RetryPolicy,
    metrics: &MetricsCollector,
) -> Result<()> {
    let url = format!("{}{}", endpoint.trim_end_matches('/'), TRACK_PATH);
    debug!(count = events.len(), "Sending event schemas");

    let builder = client
        .post(&url)
        .header(API_KEY_HEADER, api_key.expose_secret())
        .json(events);
    let builder = crate::tracing::inject_trace_context(builder);

    let labels = RequestLabels {
        endpoint: TRACK_PATH,
        method: "POST",
    };
    send_request_with_retry(builder, policy, labels, metrics).await?;
    Ok(())
}
