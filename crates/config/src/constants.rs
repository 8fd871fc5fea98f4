//! Centralized constants for the schema inspector workspace.
//!
//! This module contains default values used across crates to avoid
//! magic number duplication and improve maintainability.

// =============================================================================
// Endpoints
// =============================================================================

/// Default collector endpoint that receives schema records.
pub const DEFAULT_ENDPOINT: &str = "https://api.avo.app";

/// Default base URL of the tracking-plan event spec service.
pub const DEFAULT_SPEC_BASE_URL: &str = "https://api.avo.app";

/// Path of the event spec lookup, relative to the spec base URL.
pub const EVENT_SPEC_PATH: &str = "/trackingPlan/eventSpec";

/// Path of the schema record collector, relative to the endpoint.
pub const TRACK_PATH: &str = "/inspector/v1/track";

// =============================================================================
// Connection & Timeout Defaults
// =============================================================================

/// Default HTTP request timeout for the collector transport in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default timeout for a single event spec fetch in milliseconds.
pub const DEFAULT_SPEC_FETCH_TIMEOUT_MS: u64 = 2000;

/// Maximum allowed request timeout in seconds (1 hour).
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 3600;

/// Maximum allowed spec fetch timeout in milliseconds (1 minute).
pub const MAX_SPEC_FETCH_TIMEOUT_MS: u64 = 60_000;

/// Default maximum number of retries for failed collector requests.
pub const DEFAULT_MAX_RETRIES: usize = 3;

/// Maximum allowed value for max_retries.
pub const MAX_MAX_RETRIES: usize = 10;

// =============================================================================
// Sampling & Session Defaults
// =============================================================================

/// Default sampling rate for the batched path (keep everything).
pub const DEFAULT_SAMPLING_RATE: f64 = 1.0;

/// Default inactivity window after which a new session starts (5 minutes).
pub const DEFAULT_SESSION_TIMEOUT_SECS: u64 = 300;

// =============================================================================
// Event Spec Cache
// =============================================================================

/// Lifetime of a cached event spec (5 minutes).
pub const EVENT_SPEC_CACHE_TTL_SECS: u64 = 300;

/// Hits after which a cached spec (or the oldest spec, globally) is dropped.
pub const EVENT_SPEC_MAX_EVENT_COUNT: u32 = 50;

// =============================================================================
// Library identity
// =============================================================================

/// Platform tag attached to every schema record.
pub const LIB_PLATFORM: &str = "rust";

/// Header carrying the api key on collector requests.
pub const API_KEY_HEADER: &str = "api-key";
