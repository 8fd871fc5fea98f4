//! Track-call orchestration.
//!
//! Responsibilities:
//! - Infer the schema of each tracked event.
//! - Look up the event spec (cache first, then a bounded fetch).
//! - Validate and send immediately when a spec is available, otherwise use
//!   the batched path.
//!
//! Does NOT handle:
//! - HTTP details (see [`crate::transport`]).
//! - Identity persistence (see [`crate::identity`]).
//!
//! Invariants:
//! - Tracking never fails: every pipeline failure degrades to the batched,
//!   unvalidated path.
//! - A failed immediate send falls back to the batched path.

mod builder;

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use inspector_config::InspectorConfig;
use inspector_config::constants::LIB_PLATFORM;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

pub use builder::InspectorBuilder;

use crate::event_spec::{
    EventSpecCache, EventSpecFetcher, EventSpecResponse, FetchParams, ValidationResult,
    validate_event_logged,
};
use crate::identity::IdentityContext;
use crate::metrics::MetricsCollector;
use crate::models::{EVENT_BODY_TYPE, EventSchemaBody};
use crate::schema::{SchemaNode, SchemaParser};
use crate::transport::EventTransport;

/// How a tracked event left the SDK.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "path", rename_all = "camelCase")]
pub enum Delivery {
    /// Validated and sent on the immediate path.
    Immediate { validation: ValidationResult },
    /// No spec was available; sent on the batched path.
    Batched,
    /// Validated, but the immediate send failed; sent on the batched path.
    FellBackToBatch,
}

impl Delivery {
    fn metric_label(&self) -> &'static str {
        match self {
            Delivery::Immediate { .. } => "immediate",
            Delivery::Batched => "batched",
            Delivery::FellBackToBatch => "fallback",
        }
    }
}

/// Result of one track call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackReport {
    pub schema: Vec<SchemaNode>,
    pub delivery: Delivery,
}

/// Schema tracker for one application.
pub struct Inspector {
    config: InspectorConfig,
    identity: Arc<IdentityContext>,
    cache: Arc<EventSpecCache>,
    fetcher: Arc<EventSpecFetcher>,
    transport: Arc<dyn EventTransport>,
    parser: SchemaParser,
    metrics: MetricsCollector,
}

impl std::fmt::Debug for Inspector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inspector")
            .field("config", &self.config)
            .field("cache", &self.cache.stats())
            .field("fetcher", &self.fetcher)
            .finish_non_exhaustive()
    }
}

impl Inspector {
    pub fn builder(config: InspectorConfig) -> InspectorBuilder {
        InspectorBuilder::new(config)
    }

    pub fn config(&self) -> &InspectorConfig {
        &self.config
    }

    pub fn identity(&self) -> &IdentityContext {
        &self.identity
    }

    pub fn cache(&self) -> &EventSpecCache {
        &self.cache
    }

    pub fn fetcher(&self) -> &EventSpecFetcher {
        &self.fetcher
    }

    /// Infer the schema of event properties with this tracker's encryption settings.
    pub fn extract_schema(&self, properties: &Value) -> Vec<SchemaNode> {
        self.parser.extract(properties)
    }

    /// Infer and track the schema of an event.
    pub async fn track_schema_from_event(&self, event_name: &str, properties: &Value) -> TrackReport {
        let schema = self.extract_schema(properties);
        self.track_schema(event_name, schema).await
    }

    /// Track an already inferred schema.
    pub async fn track_schema(&self, event_name: &str, schema: Vec<SchemaNode>) -> TrackReport {
        let stream_id = self.identity.stream_id();
        let spec = self.lookup_spec(event_name, &stream_id).await;

        let delivery = match spec {
            Some(spec) => self.send_validated(event_name, &schema, &spec).await,
            None => {
                let body = self.body(event_name, schema.clone());
                self.send_batched(body).await;
                Delivery::Batched
            }
        };

        self.metrics.record_event_tracked(delivery.metric_label());
        TrackReport { schema, delivery }
    }

    /// Validate event properties against the current spec, if one is available.
    pub async fn validate(&self, event_name: &str, properties: &Value) -> Option<ValidationResult> {
        let stream_id = self.identity.stream_id();
        let spec = self.lookup_spec(event_name, &stream_id).await?;
        Some(validate_event_logged(
            &self.extract_schema(properties),
            &spec,
            self.config.log_enabled,
        ))
    }

    /// Cache lookup, then a fetch bounded by the spec fetch timeout.
    ///
    /// A fetched spec is stored in the cache.
    pub async fn lookup_spec(&self, event_name: &str, stream_id: &str) -> Option<EventSpecResponse> {
        let api_key = self.config.api_key.expose_secret();
        if let Some(spec) = self.cache.get(api_key, stream_id, event_name) {
            return Some(spec);
        }
        if !self.fetcher.is_enabled() {
            return None;
        }

        let params = FetchParams::new(api_key, stream_id, event_name);
        let fetched =
            tokio::time::timeout(self.config.spec_fetch_timeout, self.fetcher.fetch(&params)).await;
        match fetched {
            Ok(Some(spec)) => {
                self.cache.set(api_key, stream_id, event_name, spec.clone());
                Some(spec)
            }
            Ok(None) => None,
            Err(_) => {
                if self.config.log_enabled {
                    debug!(event_name, "Event spec lookup timed out");
                }
                None
            }
        }
    }

    async fn send_validated(
        &self,
        event_name: &str,
        schema: &[SchemaNode],
        spec: &EventSpecResponse,
    ) -> Delivery {
        let validation = validate_event_logged(schema, spec, self.config.log_enabled);
        self.metrics.record_validation_errors(validation.errors.len());
        if self.config.log_enabled {
            debug!(
                event_name,
                errors = validation.errors.len(),
                variant = validation.variant_id.as_deref().unwrap_or(""),
                "Validated event against spec"
            );
        }

        let mut body = self.body(event_name, schema.to_vec());
        body.event_spec_metadata = Some(validation.metadata.clone());
        body.validation_errors = Some(validation.errors.clone());
        body.event_id = validation.event_id.clone();
        body.variant_id = validation.variant_id.clone();

        match self.transport.send_immediate(body.clone()).await {
            Ok(()) => Delivery::Immediate { validation },
            Err(e) => {
                if self.config.log_enabled {
                    warn!(event_name, error = %e, "Immediate send failed, falling back to batch");
                }
                self.send_batched(body).await;
                Delivery::FellBackToBatch
            }
        }
    }

    async fn send_batched(&self, body: EventSchemaBody) {
        let event_name = body.event_name.clone();
        if let Err(e) = self.transport.send_batch(vec![body]).await {
            warn!(event_name, error = %e, "Batched send failed");
        }
    }

    fn body(&self, event_name: &str, event_properties: Vec<SchemaNode>) -> EventSchemaBody {
        EventSchemaBody {
            api_key: self.config.api_key.expose_secret().to_string(),
            app_name: self.config.app_name.clone(),
            app_version: self.config.app_version.clone(),
            lib_version: env!("CARGO_PKG_VERSION").to_string(),
            lib_platform: LIB_PLATFORM.to_string(),
            env: self.config.env.as_str().to_string(),
            message_id: Uuid::new_v4().to_string(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            session_id: self.identity.session_id(),
            anonymous_id: self.identity.anonymous_id(),
            stream_id: self.identity.stream_id(),
            sampling_rate: self.config.sampling_rate,
            body_type: EVENT_BODY_TYPE.to_string(),
            event_name: event_name.to_string(),
            event_properties,
            event_spec_metadata: None,
            validation_errors: None,
            event_id: None,
            variant_id: None,
        }
    }
}
