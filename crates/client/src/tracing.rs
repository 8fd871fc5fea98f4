//! Tracing subscriber and OpenTelemetry setup.
//!
//! Installs an env-filtered `fmt` layer (writing to stderr) and, when an OTLP
//! endpoint is configured, an OpenTelemetry export layer.
//!
//! ```rust,ignore
//! use inspector_client::tracing::TracingConfig;
//!
//! let guard = TracingConfig::new()
//!     .with_otlp_endpoint("http://localhost:4317")
//!     .init()?;
//! // ...
//! guard.shutdown();
//! ```

use opentelemetry::trace::TracerProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding the OTLP endpoint.
pub const OTLP_ENDPOINT_ENV: &str = "INSPECTOR_OTLP_ENDPOINT";

/// Configuration for the tracing subscriber.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// OTLP endpoint (e.g., "http://localhost:4317")
    pub otlp_endpoint: Option<String>,
    pub service_name: String,
    pub service_version: String,
    /// Filter used when `RUST_LOG` is unset.
    pub default_filter: String,
    /// Whether to emit human-readable logs on stderr.
    pub enable_stderr: bool,
    /// OTLP export timeout
    pub timeout: Duration,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            otlp_endpoint: std::env::var(OTLP_ENDPOINT_ENV)
                .ok()
                .filter(|v| !v.trim().is_empty()),
            service_name: "inspector".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            default_filter: "warn".to_string(),
            enable_stderr: true,
            timeout: Duration::from_secs(5),
        }
    }
}

impl TracingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_otlp_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.otlp_endpoint = Some(endpoint.into());
        self
    }

    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }

    pub fn with_service_version(mut self, version: impl Into<String>) -> Self {
        self.service_version = version.into();
        self
    }

    pub fn with_default_filter(mut self, filter: impl Into<String>) -> Self {
        self.default_filter = filter.into();
        self
    }

    pub fn with_stderr(mut self, enable: bool) -> Self {
        self.enable_stderr = enable;
        self
    }

    /// Install the global subscriber.
    ///
    /// The returned guard must be held until shutdown so pending spans are flushed.
    ///
    /// # Errors
    /// Fails when the OTLP exporter cannot be built or a global subscriber
    /// is already installed.
    pub fn init(&self) -> Result<TracingGuard, TracingError> {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.default_filter));

        let provider = self
            .otlp_endpoint
            .as_deref()
            .map(|endpoint| self.create_tracer_provider(endpoint))
            .transpose()?;

        let otel_layer = provider.as_ref().map(|provider| {
            tracing_opentelemetry::layer().with_tracer(provider.tracer(self.service_name.clone()))
        });
        let fmt_layer = self
            .enable_stderr
            .then(|| fmt::layer().with_writer(std::io::stderr).with_target(false));

        tracing_subscriber::registry()
            .with(env_filter)
            .with(otel_layer)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TracingError::InitError(e.to_string()))?;

        Ok(TracingGuard { provider })
    }

    fn create_tracer_provider(&self, endpoint: &str) -> Result<SdkTracerProvider, TracingError> {
        use opentelemetry_otlp::{Protocol, WithExportConfig};
        use opentelemetry_sdk::trace::{BatchSpanProcessor, Sampler};

        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint)
            .with_timeout(self.timeout)
            .with_protocol(Protocol::Grpc)
            .build()
            .map_err(|e| TracingError::InitError(e.to_string()))?;

        let resource = opentelemetry_sdk::Resource::builder()
            .with_attributes(vec![
                opentelemetry::KeyValue::new("service.name", self.service_name.clone()),
                opentelemetry::KeyValue::new("service.version", self.service_version.clone()),
            ])
            .build();

        Ok(SdkTracerProvider::builder()
            .with_span_processor(BatchSpanProcessor::builder(exporter).build())
            .with_resource(resource)
            .with_sampler(Sampler::ParentBased(Box::new(Sampler::AlwaysOn)))
            .build())
    }
}

/// Keeps the tracer provider alive until shutdown.
pub struct TracingGuard {
    provider: Option<SdkTracerProvider>,
}

impl TracingGuard {
    /// Flush pending spans and stop the exporter.
    pub fn shutdown(&self) {
        if let Some(provider) = &self.provider {
            let _ = provider.shutdown();
        }
    }
}

/// Errors that can occur during tracing initialization.
#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    #[error("Failed to initialize tracing: {0}")]
    InitError(String),
}

/// Inject the current trace context into outgoing request headers
/// (W3C `traceparent`).
pub fn inject_trace_context(builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    use opentelemetry::propagation::TextMapPropagator;
    use opentelemetry_sdk::propagation::TraceContextPropagator;
    use std::collections::HashMap;

    let mut headers = HashMap::new();
    TraceContextPropagator::new().inject_context(&opentelemetry::Context::current(), &mut headers);

    headers
        .into_iter()
        .fold(builder, |builder, (key, value)| builder.header(key, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides() {
        let config = TracingConfig::new()
            .with_otlp_endpoint("http://localhost:4317")
            .with_service_name("inspector-test")
            .with_default_filter("debug")
            .with_stderr(false);

        assert_eq!(config.otlp_endpoint.as_deref(), Some("http://localhost:4317"));
        assert_eq!(config.service_name, "inspector-test");
        assert_eq!(config.default_filter, "debug");
        assert!(!config.enable_stderr);
    }

    #[test]
    fn test_inject_without_active_span_adds_no_parent() {
        let client = reqwest::Client::new();
        let request = inject_trace_context(client.get("http://localhost/"))
            .build()
            .unwrap();
        assert!(request.headers().get("traceparent").is_none());
    }
}
