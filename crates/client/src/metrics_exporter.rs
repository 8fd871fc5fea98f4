//! Prometheus metrics exporter.
//!
//! Serves the metrics recorded by [`crate::metrics::MetricsCollector`] in
//! Prometheus text format at `/metrics`.
//!
//! ```rust,ignore
//! use inspector_client::metrics_exporter::MetricsExporter;
//!
//! let exporter = MetricsExporter::install("127.0.0.1:9090")?;
//! ```

use std::net::SocketAddr;

use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use tracing::info;

use crate::metrics::METRIC_REQUEST_DURATION;

/// Request latency buckets in seconds. Spec fetches are bounded at a few
/// seconds, so the upper buckets stay small.
const REQUEST_DURATION_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 5.0];

/// Metrics exporter for Prometheus scraping.
///
/// Installs a global recorder and an HTTP listener on the bind address.
/// Must be called from within a tokio runtime.
pub struct MetricsExporter {
    bind_addr: SocketAddr,
}

impl MetricsExporter {
    /// Install the Prometheus exporter as the global metrics recorder.
    ///
    /// # Errors
    /// Fails when the address does not parse or a recorder is already installed.
    pub fn install(bind_addr: &str) -> Result<Self, MetricsExporterError> {
        let addr: SocketAddr = bind_addr
            .parse()
            .map_err(|e| MetricsExporterError::InvalidBindAddress(bind_addr.to_string(), e))?;

        PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Full(METRIC_REQUEST_DURATION.to_string()),
                REQUEST_DURATION_BUCKETS,
            )?
            .with_http_listener(addr)
            .install_recorder()
            .map_err(|_| MetricsExporterError::RecorderAlreadyInstalled)?;

        info!(%addr, "Prometheus metrics exporter started");

        Ok(Self { bind_addr: addr })
    }

    /// Get the bind address.
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}

/// Errors that can occur when installing the metrics exporter.
#[derive(Debug, thiserror::Error)]
pub enum MetricsExporterError {
    #[error("Invalid bind address '{0}': {1}")]
    InvalidBindAddress(String, std::net::AddrParseError),

    #[error("A metrics recorder is already installed")]
    RecorderAlreadyInstalled,

    #[error("Failed to build Prometheus recorder: {0}")]
    BuildError(String),
}

impl From<metrics_exporter_prometheus::BuildError> for MetricsExporterError {
    fn from(err: metrics_exporter_prometheus::BuildError) -> Self {
        MetricsExporterError::BuildError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_bind_address() {
        let result = MetricsExporter::install("not-a-valid-addr");
        assert!(matches!(
            result,
            Err(MetricsExporterError::InvalidBindAddress(_, _))
        ));
    }

    #[test]
    fn test_buckets_are_sorted() {
        assert!(REQUEST_DURATION_BUCKETS.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_error_display() {
        let parse_error = "invalid".parse::<SocketAddr>().unwrap_err();
        let error = MetricsExporterError::InvalidBindAddress("test".to_string(), parse_error);
        assert!(error.to_string().contains("Invalid bind address 'test'"));
        assert_eq!(
            MetricsExporterError::RecorderAlreadyInstalled.to_string(),
            "A metrics recorder is already installed"
        );
    }
}
