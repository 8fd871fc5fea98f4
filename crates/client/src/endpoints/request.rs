//! Retry helper for HTTP requests with exponential backoff.
//!
//! Retries requests that fail with a retryable status (429, 502, 503, 504)
//! or a transient transport error, doubling the delay between attempts.

use std::time::{Duration, Instant};

use reqwest::{RequestBuilder, Response};
use tracing::debug;

use crate::error::{ClientError, Result};
use crate::metrics::{ErrorCategory, MetricsCollector};

/// Default delay before the first retry.
pub const DEFAULT_BASE_BACKOFF: Duration = Duration::from_millis(500);

/// How a request is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt. `0` sends once.
    pub max_retries: usize,
    /// Delay before the first retry; doubled for each subsequent one.
    pub base_backoff: Duration,
    /// Emit retry diagnostics.
    pub log_enabled: bool,
}

impl RetryPolicy {
    pub fn new(max_retries: usize) -> Self {
        Self {
            max_retries,
            base_backoff: DEFAULT_BASE_BACKOFF,
            log_enabled: true,
        }
    }

    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.log_enabled = enabled;
        self
    }

    pub fn with_base_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff = backoff;
        self
    }

    fn backoff(&self, attempt: usize) -> Duration {
        self.base_backoff
            .saturating_mul(2u32.saturating_pow(attempt.min(16) as u32))
    }
}

/// Labels identifying a request in metrics.
#[derive(Debug, Clone, Copy)]
pub struct RequestLabels<'a> {
    pub endpoint: &'a str,
    pub method: &'a str,
}

/// Sends a request, retrying retryable failures with exponential backoff.
///
/// # Errors
///
/// - `ApiError` for a non-success, non-retryable status.
/// - `MaxRetriesExceeded` once every attempt has failed with a retryable status.
/// - `HttpError` for a transport failure on the last attempt.
pub async fn send_request_with_retry(
    builder: RequestBuilder,
    policy: RetryPolicy,
    labels: RequestLabels<'_>,
    metrics: &MetricsCollector,
) -> Result<Response> {
    let attempts = policy.max_retries + 1;

    for attempt in 0..attempts {
        let Some(attempt_builder) = builder.try_clone() else {
            if policy.log_enabled {
                debug!("Request builder cannot be cloned, single attempt only");
            }
            return send_once(builder, labels, metrics).await;
        };

        if attempt > 0 {
            metrics.record_retry(labels.endpoint, labels.method, attempt);
        }

        let last = attempt + 1 == attempts;
        match send_once(attempt_builder, labels, metrics).await {
            Ok(response) => {
                if attempt > 0 && policy.log_enabled {
                    debug!(attempt = attempt + 1, "Request succeeded after retry");
                }
                return Ok(response);
            }
            Err(e) if is_retryable(&e) && !last => {
                let backoff = policy.backoff(attempt);
                if policy.log_enabled {
                    debug!(
                        attempt = attempt + 1,
                        attempts,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "Retryable request failure, backing off"
                    );
                }
                tokio::time::sleep(backoff).await;
            }
            Err(ClientError::ApiError { status, .. }) if ClientError::is_retryable_status(status) => {
                if policy.log_enabled {
                    debug!(attempts, status, "Max retries exhausted");
                }
                return Err(ClientError::MaxRetriesExceeded(attempts));
            }
            Err(e) => return Err(e),
        }
    }

    Err(ClientError::MaxRetriesExceeded(attempts))
}

fn is_retryable(error: &ClientError) -> bool {
    match error {
        ClientError::ApiError { status, .. } => ClientError::is_retryable_status(*status),
        other => other.is_retryable(),
    }
}

async fn send_once(
    builder: RequestBuilder,
    labels: RequestLabels<'_>,
    metrics: &MetricsCollector,
) -> Result<Response> {
    metrics.record_request(labels.endpoint, labels.method);
    let started = Instant::now();

    let result = match builder.send().await {
        Ok(response) if response.status().is_success() => Ok(response),
        Ok(response) => {
            let status = response.status().as_u16();
            let url = response.url().to_string();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response body".to_string());
            Err(ClientError::ApiError {
                status,
                url,
                message,
            })
        }
        Err(e) => Err(ClientError::from(e)),
    };

    let status = match &result {
        Ok(response) => Some(response.status().as_u16()),
        Err(ClientError::ApiError { status, .. }) => Some(*status),
        Err(_) => None,
    };
    metrics.record_request_duration(labels.endpoint, labels.method, started.elapsed(), status);
    if let Err(e) = &result {
        metrics.record_error(labels.endpoint, labels.method, ErrorCategory::from(e));
    }

    result
}
