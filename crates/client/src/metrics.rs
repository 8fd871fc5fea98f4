//! Metrics collection for the inspector pipeline.
//!
//! This module records:
//! - HTTP request latency and attempt/retry/error counters
//! - Event spec cache hits, misses and evictions
//! - Event spec fetch outcomes
//! - Tracked events by delivery path
//!
//! # What this module does NOT handle:
//! - Metrics exposition/export (see [`crate::metrics_exporter`])
//! - Persistent storage of metrics
//!
//! # Invariants
//! - Label names are consistent: `endpoint`, `method`, `status`, `error_category`, `outcome`, `reason`, `path`
//! - Metric recording is infallible and never disrupts tracking
//! - Zero-cost when no metrics recorder is installed

use crate::error::ClientError;
use std::time::Duration;

/// Metric name for request duration histogram.
pub const METRIC_REQUEST_DURATION: &str = "inspector_request_duration_seconds";

/// Metric name for total request counter.
pub const METRIC_REQUESTS_TOTAL: &str = "inspector_requests_total";

/// Metric name for retry counter.
pub const METRIC_RETRIES_TOTAL: &str = "inspector_retries_total";

/// Metric name for error counter.
pub const METRIC_ERRORS_TOTAL: &str = "inspector_errors_total";

/// Metric name for spec cache hit counter.
pub const METRIC_SPEC_CACHE_HITS: &str = "inspector_spec_cache_hits_total";

/// Metric name for spec cache miss counter.
pub const METRIC_SPEC_CACHE_MISSES: &str = "inspector_spec_cache_misses_total";

/// Metric name for spec cache eviction counter.
pub const METRIC_SPEC_CACHE_EVICTIONS: &str = "inspector_spec_cache_evictions_total";

/// Metric name for spec fetch counter.
pub const METRIC_SPEC_FETCHES: &str = "inspector_spec_fetches_total";

/// Metric name for tracked event counter.
pub const METRIC_EVENTS_TRACKED: &str = "inspector_events_tracked_total";

/// Metric name for validation error counter.
pub const METRIC_VALIDATION_ERRORS: &str = "inspector_validation_errors_total";

/// Error categories for metrics labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Transport-level errors (connection refused, DNS, etc.)
    Transport,
    /// HTTP 4xx client errors
    Http4xx,
    /// HTTP 5xx server errors
    Http5xx,
    /// Malformed response body
    InvalidResponse,
    /// Request timeout
    Timeout,
    /// Unknown/unclassified errors
    Unknown,
}

impl ErrorCategory {
    /// Returns the string label for this error category.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Transport => "transport",
            ErrorCategory::Http4xx => "http_4xx",
            ErrorCategory::Http5xx => "http_5xx",
            ErrorCategory::InvalidResponse => "invalid_response",
            ErrorCategory::Timeout => "timeout",
            ErrorCategory::Unknown => "unknown",
        }
    }
}

impl From<&ClientError> for ErrorCategory {
    fn from(error: &ClientError) -> Self {
        match error {
            ClientError::Timeout(_) => ErrorCategory::Timeout,
            ClientError::ApiError { status, .. } => {
                if (400..500).contains(status) {
                    ErrorCategory::Http4xx
                } else if (500..600).contains(status) {
                    ErrorCategory::Http5xx
                } else {
                    ErrorCategory::Unknown
                }
            }
            ClientError::HttpError(e) if e.is_timeout() => ErrorCategory::Timeout,
            ClientError::HttpError(e) if e.is_connect() || e.is_request() => {
                ErrorCategory::Transport
            }
            ClientError::InvalidResponse(_) | ClientError::Serialization(_) => {
                ErrorCategory::InvalidResponse
            }
            _ => ErrorCategory::Unknown,
        }
    }
}

/// Outcome of one spec fetch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A spec was returned.
    Success,
    /// The request failed or returned an unusable body.
    Failed,
    /// The environment does not allow fetching.
    Skipped,
    /// The caller joined an in-flight request.
    Coalesced,
}

impl FetchOutcome {
    pub const fn as_str(&self) -> &'static str {
        match self {
            FetchOutcome::Success => "success",
            FetchOutcome::Failed => "failed",
            FetchOutcome::Skipped => "skipped",
            FetchOutcome::Coalesced => "coalesced",
        }
    }
}

/// Why a cache entry left the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionReason {
    /// Entry outlived its TTL.
    Expired,
    /// Entry reached its hit limit.
    HitLimit,
    /// Globally oldest entry dropped on hit-count rotation.
    Rotation,
}

impl EvictionReason {
    pub const fn as_str(&self) -> &'static str {
        match self {
            EvictionReason::Expired => "expired",
            EvictionReason::HitLimit => "hit_limit",
            EvictionReason::Rotation => "rotation",
        }
    }
}

/// Metrics collector for the inspector pipeline.
///
/// A thin wrapper over the `metrics` crate macros with consistent labels.
#[derive(Debug, Clone, Default)]
pub struct MetricsCollector {
    /// Whether metrics collection is enabled.
    enabled: bool,
}

impl MetricsCollector {
    /// Create an enabled metrics collector.
    pub fn new() -> Self {
        Self { enabled: true }
    }

    /// Create a disabled metrics collector.
    pub fn disabled() -> Self {
        Self { enabled: false }
    }

    /// Check if metrics collection is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Record the duration of an HTTP request.
    ///
    /// `status` is `None` when the request failed before a response arrived.
    pub fn record_request_duration(
        &self,
        endpoint: &str,
        method: &str,
        duration: Duration,
        status: Option<u16>,
    ) {
        if !self.enabled {
            return;
        }

        let status_label = status.map_or("error".to_string(), |s| s.to_string());

        metrics::histogram!(METRIC_REQUEST_DURATION,
            "endpoint" => endpoint.to_string(),
            "method" => method.to_string(),
            "status" => status_label,
        )
        .record(duration.as_secs_f64());
    }

    /// Record a request attempt, including retries.
    pub fn record_request(&self, endpoint: &str, method: &str) {
        if !self.enabled {
            return;
        }

        metrics::counter!(METRIC_REQUESTS_TOTAL,
            "endpoint" => endpoint.to_string(),
            "method" => method.to_string(),
        )
        .increment(1);
    }

    /// Record a retry attempt (1-based).
    pub fn record_retry(&self, endpoint: &str, method: &str, attempt: usize) {
        if !self.enabled {
            return;
        }

        metrics::counter!(METRIC_RETRIES_TOTAL,
            "endpoint" => endpoint.to_string(),
            "method" => method.to_string(),
            "attempt" => attempt.to_string(),
        )
        .increment(1);
    }

    /// Record a request error.
    pub fn record_error(&self, endpoint: &str, method: &str, category: ErrorCategory) {
        if !self.enabled {
            return;
        }

        metrics::counter!(METRIC_ERRORS_TOTAL,
            "endpoint" => endpoint.to_string(),
            "method" => method.to_string(),
            "error_category" => category.as_str(),
        )
        .increment(1);
    }

    pub fn record_spec_cache_hit(&self) {
        if !self.enabled {
            return;
        }
        metrics::counter!(METRIC_SPEC_CACHE_HITS).increment(1);
    }

    pub fn record_spec_cache_miss(&self) {
        if !self.enabled {
            return;
        }
        metrics::counter!(METRIC_SPEC_CACHE_MISSES).increment(1);
    }

    pub fn record_spec_cache_eviction(&self, reason: EvictionReason) {
        if !self.enabled {
            return;
        }
        metrics::counter!(METRIC_SPEC_CACHE_EVICTIONS, "reason" => reason.as_str()).increment(1);
    }

    pub fn record_spec_fetch(&self, outcome: FetchOutcome) {
        if !self.enabled {
            return;
        }
        metrics::counter!(METRIC_SPEC_FETCHES, "outcome" => outcome.as_str()).increment(1);
    }

    /// Record a tracked event by delivery path (`immediate`, `batched`, `fallback`).
    pub fn record_event_tracked(&self, path: &'static str) {
        if !self.enabled {
            return;
        }
        metrics::counter!(METRIC_EVENTS_TRACKED, "path" => path).increment(1);
    }

    pub fn record_validation_errors(&self, count: usize) {
        if !self.enabled || count == 0 {
            return;
        }
        metrics::counter!(METRIC_VALIDATION_ERRORS).increment(count as u64);
    }
}
