//! Configuration types for the schema inspector.
//!
//! Responsibilities:
//! - Define the runtime [`Environment`] and its capability gates.
//! - Define the fully validated [`InspectorConfig`] consumed by the client crate.
//!
//! Does NOT handle:
//! - Loading or validating values (see `loader`).
//!
//! Invariants:
//! - Secrets (the api key) are held in `SecretString` and never appear in `Debug` output.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_ENDPOINT, DEFAULT_MAX_RETRIES, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SAMPLING_RATE,
    DEFAULT_SESSION_TIMEOUT_SECS, DEFAULT_SPEC_BASE_URL, DEFAULT_SPEC_FETCH_TIMEOUT_MS,
};

/// Deployment environment the SDK runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development.
    #[default]
    Dev,
    /// Pre-production.
    Staging,
    /// Production. Spec fetching and value encryption are disabled.
    Prod,
}

impl Environment {
    /// Returns the wire label for this environment.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Environment::Dev => "dev",
            Environment::Staging => "staging",
            Environment::Prod => "prod",
        }
    }

    /// Whether event specs may be fetched and values encrypted.
    pub const fn is_development_like(&self) -> bool {
        matches!(self, Environment::Dev | Environment::Staging)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when an environment label is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown environment '{0}' (expected dev, staging or prod)")]
pub struct ParseEnvironmentError(pub String);

impl FromStr for Environment {
    type Err = ParseEnvironmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Dev),
            "staging" => Ok(Environment::Staging),
            "prod" | "production" => Ok(Environment::Prod),
            other => Err(ParseEnvironmentError(other.to_string())),
        }
    }
}

/// Fully resolved SDK configuration.
#[derive(Debug, Clone)]
pub struct InspectorConfig {
    /// Api key identifying the tracking-plan source.
    pub api_key: SecretString,
    /// Runtime environment.
    pub env: Environment,
    /// Application name attached to schema records.
    pub app_name: String,
    /// Application version attached to schema records.
    pub app_version: String,
    /// Hex-encoded key used to encrypt property values in dev/staging.
    pub public_encryption_key: Option<String>,
    /// Collector endpoint receiving schema records.
    pub endpoint: String,
    /// Base URL of the event spec service.
    pub spec_base_url: String,
    /// Upper bound for a single spec lookup.
    pub spec_fetch_timeout: Duration,
    /// Timeout for collector requests.
    pub request_timeout: Duration,
    /// Retries for collector requests.
    pub max_retries: usize,
    /// Fraction of batched events that are transmitted, in `[0, 1]`.
    pub sampling_rate: f64,
    /// Inactivity window after which a new session id is issued.
    pub session_timeout: Duration,
    /// Emit spec pipeline diagnostics.
    pub log_enabled: bool,
}

impl InspectorConfig {
    /// Create a configuration with defaults for everything but the identity fields.
    pub fn new(api_key: SecretString, env: Environment, app_version: impl Into<String>) -> Self {
        Self {
            api_key,
            env,
            app_name: String::new(),
            app_version: app_version.into(),
            public_encryption_key: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            spec_base_url: DEFAULT_SPEC_BASE_URL.to_string(),
            spec_fetch_timeout: Duration::from_millis(DEFAULT_SPEC_FETCH_TIMEOUT_MS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            sampling_rate: DEFAULT_SAMPLING_RATE,
            session_timeout: Duration::from_secs(DEFAULT_SESSION_TIMEOUT_SECS),
            log_enabled: false,
        }
    }

    /// Whether property values should be encrypted before leaving the process.
    pub fn encryption_enabled(&self) -> bool {
        self.env.is_development_like()
            && self
                .public_encryption_key
                .as_deref()
                .is_some_and(|key| !key.trim().is_empty())
    }
}
