//! Schema inspector client.
//!
//! Infers the structural schema of analytics event payloads, validates them
//! against tracking plan event specs fetched from the remote service, and
//! delivers schema records to the collector.
//!
//! ```rust,ignore
//! use inspector_client::Inspector;
//!
//! let inspector = Inspector::builder(config).build()?;
//! let report = inspector
//!     .track_schema_from_event("Checkout", &serde_json::json!({"total": 12.5}))
//!     .await;
//! ```

pub mod encryption;
pub mod endpoints;
pub mod error;
pub mod event_spec;
pub mod identity;
pub mod inspector;
pub mod metrics;
pub mod metrics_exporter;
pub mod models;
pub mod schema;
pub mod storage;
pub mod tracing;
pub mod transport;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use encryption::{AesGcmValueEncryptor, EncryptionContext, ValueEncryptor};
pub use error::{ClientError, Result};
pub use event_spec::{
    EventSpecCache, EventSpecFetcher, EventSpecResponse, FetchParams, ValidationError,
    ValidationErrorCode, ValidationResult, validate_event, validate_event_logged,
};
pub use identity::IdentityContext;
pub use inspector::{Delivery, Inspector, InspectorBuilder, TrackReport};
pub use metrics::MetricsCollector;
pub use models::EventSchemaBody;
pub use schema::{SchemaNode, SchemaParser, SchemaType, extract_schema};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
pub use transport::{EventTransport, HttpTransport};
