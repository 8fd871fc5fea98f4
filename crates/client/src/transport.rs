//! Delivery of event schema records to the collector.
//!
//! Responsibilities:
//! - Define the [`EventTransport`] seam with batched and immediate paths.
//! - Provide [`HttpTransport`], which POSTs JSON arrays with retry.
//! - Apply sampling on the batched path only.
//!
//! Does NOT handle:
//! - Queueing or timed flushing of batches (callers decide when to send).
//!
//! Invariants:
//! - `send_immediate` never samples: validated events are never dropped.

use std::time::Duration;

use async_trait::async_trait;
use inspector_config::InspectorConfig;
use reqwest::Client;
use secrecy::SecretString;
use tracing::debug;

use crate::endpoints::{self, RetryPolicy};
use crate::error::{ClientError, Result};
use crate::metrics::MetricsCollector;
use crate::models::EventSchemaBody;

/// Outbound path for schema records.
#[async_trait]
pub trait EventTransport: Send + Sync {
    /// Send records through the sampled batch path.
    async fn send_batch(&self, events: Vec<EventSchemaBody>) -> Result<()>;

    /// Send one record right away, bypassing sampling.
    async fn send_immediate(&self, event: EventSchemaBody) -> Result<()>;
}

/// Keep each event with probability `rate`.
pub fn apply_sampling(events: Vec<EventSchemaBody>, rate: f64) -> Vec<EventSchemaBody> {
    if rate >= 1.0 {
        return events;
    }
    events
        .into_iter()
        .filter(|_| rand::random::<f64>() < rate)
        .collect()
}

/// HTTP transport to the collector's track endpoint.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
    endpoint: String,
    api_key: SecretString,
    sampling_rate: f64,
    retry: RetryPolicy,
    metrics: MetricsCollector,
}

impl HttpTransport {
    /// Build a transport from configuration.
    ///
    /// # Errors
    /// Fails if the HTTP client cannot be constructed.
    pub fn from_config(config: &InspectorConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(ClientError::from)?;
        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            sampling_rate: config.sampling_rate,
            retry: RetryPolicy::new(config.max_retries),
            metrics: MetricsCollector::disabled(),
        })
    }

    pub fn with_metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry = self.retry.with_base_backoff(backoff);
        self
    }

    pub fn with_sampling_rate(mut self, rate: f64) -> Self {
        self.sampling_rate = rate.clamp(0.0, 1.0);
        self
    }

    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    async fn post(&self, events: &[EventSchemaBody]) -> Result<()> {
        endpoints::post_events(
            &self.http,
            &self.endpoint,
            &self.api_key,
            events,
            self.retry,
            &self.metrics,
        )
        .await
    }
}

#[async_trait]
impl EventTransport for HttpTransport {
    async fn send_batch(&self, events: Vec<EventSchemaBody>) -> Result<()> {
        let total = events.len();
        let events = apply_sampling(events, self.sampling_rate);
        if events.is_empty() {
            debug!(dropped = total, "All events dropped by sampling");
            return Ok(());
        }
        if events.len() < total {
            debug!(dropped = total - events.len(), "Events dropped by sampling");
        }
        self.post(&events).await
    }

    async fn send_immediate(&self, event: EventSchemaBody) -> Result<()> {
        self.post(std::slice::from_ref(&event)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_body;

    #[test]
    fn test_full_rate_keeps_everything() {
        let events = vec![sample_body("a"), sample_body("b")];
        assert_eq!(apply_sampling(events, 1.0).len(), 2);
    }

    #[test]
    fn test_zero_rate_drops_everything() {
        let events = vec![sample_body("a"), sample_body("b")];
        assert!(apply_sampling(events, 0.0).is_empty());
    }

    #[test]
    fn test_sampling_rate_is_clamped() {
        let config = InspectorConfig::new(
            SecretString::from("key".to_string()),
            inspector_config::Environment::Dev,
            "1.0.0",
        );
        let transport = HttpTransport::from_config(&config)
            .unwrap()
            .with_sampling_rate(4.0);
        assert_eq!(transport.sampling_rate(), 1.0);
    }
}
