//! Event spec fetcher with in-flight request coalescing.
//!
//! Responsibilities:
//! - Fetch specs from the tracking plan service in dev/staging only.
//! - Share one request between concurrent callers asking for the same stream and event.
//! - Degrade every failure to `None`.
//!
//! Does NOT handle:
//! - Caching completed results (see [`super::cache`]).
//! - Retries: a failed fetch is reported as `None` immediately.
//!
//! Invariants:
//! - In-flight requests are keyed by `streamId:eventName`; the api key is not
//!   part of the key.
//! - A settled request is removed from the in-flight map, so later calls go
//!   to the network again. Each request runs as its own task and removes its
//!   own entry, even when every caller has stopped waiting.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use inspector_config::Environment;
use inspector_config::constants::{DEFAULT_SPEC_BASE_URL, DEFAULT_SPEC_FETCH_TIMEOUT_MS};
use reqwest::Client;
use tracing::{debug, warn};

use super::models::EventSpecResponse;
use crate::endpoints;
use crate::metrics::{FetchOutcome, MetricsCollector};

/// Parameters identifying one spec lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchParams {
    pub api_key: String,
    pub stream_id: String,
    pub event_name: String,
}

impl FetchParams {
    pub fn new(
        api_key: impl Into<String>,
        stream_id: impl Into<String>,
        event_name: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            stream_id: stream_id.into(),
            event_name: event_name.into(),
        }
    }

    fn in_flight_key(&self) -> String {
        format!("{}:{}", self.stream_id, self.event_name)
    }
}

type InFlight = Shared<BoxFuture<'static, Option<EventSpecResponse>>>;

struct InFlightEntry {
    id: u64,
    request: InFlight,
}

type InFlightMap = Arc<Mutex<HashMap<String, InFlightEntry>>>;

fn lock_map(
    map: &Mutex<HashMap<String, InFlightEntry>>,
) -> std::sync::MutexGuard<'_, HashMap<String, InFlightEntry>> {
    map.lock().unwrap_or_else(|e| e.into_inner())
}

/// Fetches event specs, coalescing concurrent identical requests.
pub struct EventSpecFetcher {
    http: Client,
    base_url: String,
    env: Environment,
    timeout: Duration,
    log_enabled: bool,
    metrics: MetricsCollector,
    in_flight: InFlightMap,
    next_request_id: AtomicU64,
}

impl std::fmt::Debug for EventSpecFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSpecFetcher")
            .field("base_url", &self.base_url)
            .field("env", &self.env)
            .field("timeout", &self.timeout)
            .field("in_flight", &self.in_flight_count())
            .finish()
    }
}

impl EventSpecFetcher {
    /// Create a fetcher against the default spec service.
    pub fn new(env: Environment) -> Self {
        Self {
            http: Client::new(),
            base_url: DEFAULT_SPEC_BASE_URL.to_string(),
            env,
            timeout: Duration::from_millis(DEFAULT_SPEC_FETCH_TIMEOUT_MS),
            log_enabled: false,
            metrics: MetricsCollector::disabled(),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            next_request_id: AtomicU64::new(0),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_http_client(mut self, http: Client) -> Self {
        self.http = http;
        self
    }

    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.log_enabled = enabled;
        self
    }

    pub fn with_metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = metrics;
        self
    }

    /// Whether this fetcher talks to the network at all.
    pub fn is_enabled(&self) -> bool {
        self.env.is_development_like()
    }

    /// Number of requests currently in flight.
    pub fn in_flight_count(&self) -> usize {
        lock_map(&self.in_flight).len()
    }

    /// Fetch the spec for `params`.
    ///
    /// Returns `None` outside dev/staging, and on any network, status,
    /// timeout or parse failure.
    pub async fn fetch(&self, params: &FetchParams) -> Option<EventSpecResponse> {
        if !self.is_enabled() {
            self.metrics.record_spec_fetch(FetchOutcome::Skipped);
            return None;
        }

        let key = params.in_flight_key();
        let shared = {
            let mut in_flight = lock_map(&self.in_flight);
            match in_flight.get(&key) {
                Some(existing) => {
                    if self.log_enabled {
                        debug!(event_name = %params.event_name, "Joining in-flight event spec request");
                    }
                    self.metrics.record_spec_fetch(FetchOutcome::Coalesced);
                    existing.request.clone()
                }
                None => {
                    let id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
                    let shared = self.spawn_request(params.clone(), key.clone(), id);
                    in_flight.insert(
                        key,
                        InFlightEntry {
                            id,
                            request: shared.clone(),
                        },
                    );
                    shared
                }
            }
        };

        shared.await
    }

    /// Run the request on its own task, which drops the `key` entry once the
    /// request settles. The entry is inserted under the map lock before the
    /// task can take that lock, so the removal always finds it.
    fn spawn_request(&self, params: FetchParams, key: String, id: u64) -> InFlight {
        let request = self.request(params);
        let in_flight = Arc::clone(&self.in_flight);

        let handle = tokio::spawn(async move {
            let result = request.await;
            let mut in_flight = lock_map(&in_flight);
            if in_flight.get(&key).is_some_and(|entry| entry.id == id) {
                in_flight.remove(&key);
            }
            result
        });

        handle.map(|joined| joined.ok().flatten()).boxed().shared()
    }

    fn request(
        &self,
        params: FetchParams,
    ) -> impl std::future::Future<Output = Option<EventSpecResponse>> + Send + 'static {
        let http = self.http.clone();
        let base_url = self.base_url.clone();
        let timeout = self.timeout;
        let log_enabled = self.log_enabled;
        let metrics = self.metrics.clone();

        async move {
            let result =
                endpoints::get_event_spec(&http, &base_url, &params, timeout, &metrics, log_enabled)
                    .await;
            match result {
                Ok(spec) => {
                    metrics.record_spec_fetch(FetchOutcome::Success);
                    if log_enabled {
                        debug!(
                            event_name = %params.event_name,
                            events = spec.events.len(),
                            "Fetched event spec"
                        );
                    }
                    Some(spec)
                }
                Err(e) => {
                    metrics.record_spec_fetch(FetchOutcome::Failed);
                    if log_enabled {
                        warn!(event_name = %params.event_name, error = %e, "Event spec fetch failed");
                    }
                    None
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_flight_key_ignores_api_key() {
        let a = FetchParams::new("key-a", "stream", "Signup");
        let b = FetchParams::new("key-b", "stream", "Signup");
        assert_eq!(a.in_flight_key(), b.in_flight_key());
        assert_eq!(a.in_flight_key(), "stream:Signup");
    }

    #[test]
    fn test_enabled_only_in_dev_like_envs() {
        assert!(EventSpecFetcher::new(Environment::Dev).is_enabled());
        assert!(EventSpecFetcher::new(Environment::Staging).is_enabled());
        assert!(!EventSpecFetcher::new(Environment::Prod).is_enabled());
    }

    #[tokio::test]
    async fn test_prod_returns_none_without_request() {
        let fetcher = EventSpecFetcher::new(Environment::Prod).with_base_url("http://127.0.0.1:9");
        let params = FetchParams::new("k", "s", "e");
        assert!(fetcher.fetch(&params).await.is_none());
        assert_eq!(fetcher.in_flight_count(), 0);
    }
}
