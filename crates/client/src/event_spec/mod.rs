//! Tracking plan event specs: wire model, cache, fetcher and validator.
//!
//! A spec is fetched once per stream and event name, cached with TTL and
//! hit-count expiry, and used to validate the schema of each tracked event.

pub mod cache;
pub mod fetcher;
pub mod models;
pub mod validator;

pub use cache::{CacheEntryStats, CacheStats, EventSpecCache};
pub use fetcher::{EventSpecFetcher, FetchParams};
pub use models::{
    Constraint, EventSpecEntry, EventSpecMetadata, EventSpecResponse, MinMax, PropertyConstraints,
    PropertySpec,
};
pub use validator::{
    ValidationError, ValidationErrorCode, ValidationResult, validate_event, validate_event_logged,
};
