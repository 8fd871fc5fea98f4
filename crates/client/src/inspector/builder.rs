//! Builder for [`Inspector`] instances.
//!
//! Every collaborator has a default derived from [`InspectorConfig`]:
//! in-memory storage, the HTTP transport, the AES-GCM value encryptor and a
//! fetcher against `spec_base_url`.

use std::sync::Arc;

use inspector_config::InspectorConfig;
use tracing::debug;

use super::Inspector;
use crate::encryption::{AesGcmValueEncryptor, EncryptionContext, ValueEncryptor};
use crate::error::Result;
use crate::event_spec::{EventSpecCache, EventSpecFetcher};
use crate::identity::IdentityContext;
use crate::metrics::MetricsCollector;
use crate::schema::SchemaParser;
use crate::storage::{KeyValueStorage, MemoryStorage};
use crate::transport::{EventTransport, HttpTransport};

/// Builder for an [`Inspector`].
///
/// ```rust,ignore
/// let inspector = Inspector::builder(config)
///     .storage(Arc::new(FileStorage::open(FileStorage::default_path()?)?))
///     .metrics(MetricsCollector::new())
///     .build()?;
/// ```
pub struct InspectorBuilder {
    config: InspectorConfig,
    storage: Option<Arc<dyn KeyValueStorage>>,
    transport: Option<Arc<dyn EventTransport>>,
    encryptor: Option<Arc<dyn ValueEncryptor>>,
    cache: Option<Arc<EventSpecCache>>,
    metrics: MetricsCollector,
}

impl InspectorBuilder {
    pub fn new(config: InspectorConfig) -> Self {
        Self {
            config,
            storage: None,
            transport: None,
            encryptor: None,
            cache: None,
            metrics: MetricsCollector::disabled(),
        }
    }

    pub fn storage(mut self, storage: Arc<dyn KeyValueStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn EventTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn encryptor(mut self, encryptor: Arc<dyn ValueEncryptor>) -> Self {
        self.encryptor = Some(encryptor);
        self
    }

    /// Share a spec cache between trackers.
    pub fn cache(mut self, cache: Arc<EventSpecCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = metrics;
        self
    }

    /// Build the tracker.
    ///
    /// # Errors
    /// Fails only when the default HTTP transport cannot be constructed.
    pub fn build(self) -> Result<Inspector> {
        let config = self.config;
        let log_enabled = config.log_enabled;

        let transport: Arc<dyn EventTransport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::from_config(&config)?.with_metrics(self.metrics.clone())),
        };
        let storage = self
            .storage
            .unwrap_or_else(|| Arc::new(MemoryStorage::new()));
        let identity = Arc::new(IdentityContext::new(storage, config.session_timeout));

        let cache = self.cache.unwrap_or_else(|| {
            Arc::new(
                EventSpecCache::new()
                    .with_logging(log_enabled)
                    .with_metrics(self.metrics.clone()),
            )
        });
        let fetcher = Arc::new(
            EventSpecFetcher::new(config.env)
                .with_base_url(config.spec_base_url.clone())
                .with_timeout(config.spec_fetch_timeout)
                .with_logging(log_enabled)
                .with_metrics(self.metrics.clone()),
        );

        let encryptor = self
            .encryptor
            .unwrap_or_else(|| Arc::new(AesGcmValueEncryptor));
        let encryption = EncryptionContext::with_encryptor(
            config.env,
            config.public_encryption_key.clone(),
            encryptor,
        );
        if log_enabled {
            debug!(
                env = %config.env,
                encryption = encryption.is_active(),
                "Inspector initialized"
            );
        }

        Ok(Inspector {
            config,
            identity,
            cache,
            fetcher,
            transport,
            parser: SchemaParser::with_encryption(encryption),
            metrics: self.metrics,
        })
    }
}
