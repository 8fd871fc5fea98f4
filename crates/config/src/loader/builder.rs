//! Configuration loader builder implementation.
//!
//! Responsibilities:
//! - Provide a builder-pattern `ConfigLoader` for layered configuration merging.
//! - Build and validate the final `InspectorConfig`.
//!
//! Does NOT handle:
//! - Direct environment variable parsing logic (delegated to env.rs).
//!
//! Invariants / Assumptions:
//! - Builder methods take precedence over environment variables.
//! - `load_dotenv()` must be called explicitly to enable `.env` file loading.
//! - The `DOTENV_DISABLED` variable is checked before `dotenvy::dotenv()` is called.

use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

use super::env::apply_env;
use super::error::ConfigError;
use crate::constants::{
    DEFAULT_ENDPOINT, DEFAULT_MAX_RETRIES, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SAMPLING_RATE,
    DEFAULT_SESSION_TIMEOUT_SECS, DEFAULT_SPEC_BASE_URL, DEFAULT_SPEC_FETCH_TIMEOUT_MS,
    MAX_MAX_RETRIES, MAX_REQUEST_TIMEOUT_SECS, MAX_SPEC_FETCH_TIMEOUT_MS,
};
use crate::encryption::Encryptor;
use crate::types::{Environment, InspectorConfig};

/// Configuration loader that builds an [`InspectorConfig`] from layered sources.
#[derive(Default)]
pub struct ConfigLoader {
    api_key: Option<SecretString>,
    env: Option<Environment>,
    app_name: Option<String>,
    app_version: Option<String>,
    public_encryption_key: Option<String>,
    endpoint: Option<String>,
    spec_base_url: Option<String>,
    spec_fetch_timeout: Option<Duration>,
    request_timeout: Option<Duration>,
    max_retries: Option<usize>,
    sampling_rate: Option<f64>,
    session_timeout: Option<Duration>,
    log_enabled: Option<bool>,
}

impl ConfigLoader {
    /// Create a new configuration loader.
    pub fn new() -> Self {
        Self::default()
    }

    fn dotenv_disabled() -> bool {
        matches!(
            std::env::var("DOTENV_DISABLED").ok().as_deref(),
            Some("true") | Some("1")
        )
    }

    /// Load environment variables from .env file if present.
    ///
    /// If `DOTENV_DISABLED` environment variable is set to "true" or "1",
    /// the .env file will not be loaded (useful for testing).
    /// Missing `.env` files are silently ignored (returns `Ok(self)`).
    ///
    /// SAFETY: Error messages never include raw .env line contents to prevent secret leakage.
    pub fn load_dotenv(self) -> Result<Self, ConfigError> {
        if Self::dotenv_disabled() {
            return Ok(self);
        }

        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if Self::is_not_found(&e) => Ok(self),
            Err(dotenvy::Error::LineParse(_, idx)) => {
                Err(ConfigError::DotenvParse { error_index: idx })
            }
            Err(dotenvy::Error::Io(io_err)) => Err(ConfigError::DotenvIo {
                kind: io_err.kind(),
            }),
            Err(_) => Err(ConfigError::DotenvUnknown),
        }
    }

    /// Check if a dotenv error indicates the file was not found.
    fn is_not_found(err: &dotenvy::Error) -> bool {
        matches!(
            err,
            dotenvy::Error::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound
        )
    }

    /// Read configuration from `INSPECTOR_*` environment variables.
    pub fn from_env(mut self) -> Result<Self, ConfigError> {
        apply_env(&mut self)?;
        Ok(self)
    }

    /// Set the api key.
    pub fn with_api_key(mut self, key: String) -> Self {
        self.api_key = Some(SecretString::new(key.into()));
        self
    }

    /// Set the runtime environment.
    pub fn with_env(mut self, env: Environment) -> Self {
        self.env = Some(env);
        self
    }

    /// Set the application name.
    pub fn with_app_name(mut self, name: String) -> Self {
        self.app_name = Some(name);
        self
    }

    /// Set the application version.
    pub fn with_app_version(mut self, version: String) -> Self {
        self.app_version = Some(version);
        self
    }

    /// Set the hex-encoded value encryption key.
    pub fn with_public_encryption_key(mut self, key: String) -> Self {
        self.public_encryption_key = Some(key);
        self
    }

    /// Set the collector endpoint.
    pub fn with_endpoint(mut self, endpoint: String) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Set the event spec service base URL.
    pub fn with_spec_base_url(mut self, url: String) -> Self {
        self.spec_base_url = Some(url);
        self
    }

    /// Set the upper bound for one spec lookup.
    pub fn with_spec_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.spec_fetch_timeout = Some(timeout);
        self
    }

    /// Set the collector request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Set the maximum number of collector retries.
    pub fn with_max_retries(mut self, retries: usize) -> Self {
        self.max_retries = Some(retries);
        self
    }

    /// Set the batched-path sampling rate.
    pub fn with_sampling_rate(mut self, rate: f64) -> Self {
        self.sampling_rate = Some(rate);
        self
    }

    /// Set the session inactivity timeout.
    pub fn with_session_timeout(mut self, timeout: Duration) -> Self {
        self.session_timeout = Some(timeout);
        self
    }

    /// Enable or disable spec pipeline diagnostics.
    pub fn with_log_enabled(mut self, enabled: bool) -> Self {
        self.log_enabled = Some(enabled);
        self
    }

    /// Build the final configuration.
    pub fn build(self) -> Result<InspectorConfig, ConfigError> {
        let api_key = self
            .api_key
            .filter(|key| !key.expose_secret().trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)?;
        let app_version = self
            .app_version
            .filter(|version| !version.trim().is_empty())
            .ok_or(ConfigError::MissingAppVersion)?;

        let public_encryption_key = self
            .public_encryption_key
            .filter(|key| !key.trim().is_empty());
        if let Some(key) = &public_encryption_key {
            Encryptor::parse_key(key)
                .map_err(|e| ConfigError::InvalidEncryptionKey(e.to_string()))?;
        }

        let config = InspectorConfig {
            api_key,
            env: self.env.unwrap_or_default(),
            app_name: self.app_name.unwrap_or_default(),
            app_version,
            public_encryption_key,
            endpoint: validate_and_normalize_url(
                "endpoint",
                self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT),
            )?,
            spec_base_url: validate_and_normalize_url(
                "spec_base_url",
                self.spec_base_url.as_deref().unwrap_or(DEFAULT_SPEC_BASE_URL),
            )?,
            spec_fetch_timeout: self
                .spec_fetch_timeout
                .unwrap_or(Duration::from_millis(DEFAULT_SPEC_FETCH_TIMEOUT_MS)),
            request_timeout: self
                .request_timeout
                .unwrap_or(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)),
            max_retries: self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            sampling_rate: self.sampling_rate.unwrap_or(DEFAULT_SAMPLING_RATE),
            session_timeout: self
                .session_timeout
                .unwrap_or(Duration::from_secs(DEFAULT_SESSION_TIMEOUT_SECS)),
            log_enabled: self.log_enabled.unwrap_or(false),
        };

        Self::validate(&config)?;
        if config.public_encryption_key.is_some() && !config.encryption_enabled() {
            tracing::debug!(env = %config.env, "Value encryption key ignored outside dev and staging");
        }
        tracing::debug!(
            env = %config.env,
            endpoint = %config.endpoint,
            spec_base_url = %config.spec_base_url,
            "Inspector configuration loaded"
        );
        Ok(config)
    }

    /// Validates bounded numeric configuration values.
    ///
    /// Checks:
    /// - request_timeout is greater than 0 and not exceeding MAX_REQUEST_TIMEOUT_SECS
    /// - spec_fetch_timeout is greater than 0 and not exceeding MAX_SPEC_FETCH_TIMEOUT_MS
    /// - max_retries does not exceed MAX_MAX_RETRIES
    /// - sampling_rate is within [0, 1]
    fn validate(config: &InspectorConfig) -> Result<(), ConfigError> {
        if config.request_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout {
                message: "request timeout must be greater than 0 seconds".to_string(),
            });
        }
        if config.request_timeout.as_secs() > MAX_REQUEST_TIMEOUT_SECS {
            return Err(ConfigError::InvalidTimeout {
                message: format!(
                    "request timeout exceeds maximum allowed value of {} seconds",
                    MAX_REQUEST_TIMEOUT_SECS
                ),
            });
        }
        if config.spec_fetch_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout {
                message: "spec fetch timeout must be greater than 0 milliseconds".to_string(),
            });
        }
        if config.spec_fetch_timeout.as_millis() > u128::from(MAX_SPEC_FETCH_TIMEOUT_MS) {
            return Err(ConfigError::InvalidTimeout {
                message: format!(
                    "spec fetch timeout exceeds maximum allowed value of {} milliseconds",
                    MAX_SPEC_FETCH_TIMEOUT_MS
                ),
            });
        }
        if config.max_retries > MAX_MAX_RETRIES {
            return Err(ConfigError::InvalidMaxRetries {
                message: format!(
                    "must be between 0 and {} (got {})",
                    MAX_MAX_RETRIES, config.max_retries
                ),
            });
        }
        if !(0.0..=1.0).contains(&config.sampling_rate) {
            return Err(ConfigError::InvalidSamplingRate {
                message: format!("must be between 0 and 1 (got {})", config.sampling_rate),
            });
        }
        Ok(())
    }

    // Internal setters for use by other loader modules

    pub(crate) fn set_api_key(&mut self, key: Option<SecretString>) {
        self.api_key = key;
    }

    pub(crate) fn set_env(&mut self, env: Option<Environment>) {
        self.env = env;
    }

    pub(crate) fn set_app_name(&mut self, name: Option<String>) {
        self.app_name = name;
    }

    pub(crate) fn set_app_version(&mut self, version: Option<String>) {
        self.app_version = version;
    }

    pub(crate) fn set_public_encryption_key(&mut self, key: Option<String>) {
        self.public_encryption_key = key;
    }

    pub(crate) fn set_endpoint(&mut self, endpoint: Option<String>) {
        self.endpoint = endpoint;
    }

    pub(crate) fn set_spec_base_url(&mut self, url: Option<String>) {
        self.spec_base_url = url;
    }

    pub(crate) fn set_spec_fetch_timeout(&mut self, timeout: Option<Duration>) {
        self.spec_fetch_timeout = timeout;
    }

    pub(crate) fn set_request_timeout(&mut self, timeout: Option<Duration>) {
        self.request_timeout = timeout;
    }

    pub(crate) fn set_max_retries(&mut self, retries: Option<usize>) {
        self.max_retries = retries;
    }

    pub(crate) fn set_sampling_rate(&mut self, rate: Option<f64>) {
        self.sampling_rate = rate;
    }

    pub(crate) fn set_session_timeout(&mut self, timeout: Option<Duration>) {
        self.session_timeout = timeout;
    }

    pub(crate) fn set_log_enabled(&mut self, enabled: Option<bool>) {
        self.log_enabled = enabled;
    }
}

fn validate_and_normalize_url(var: &str, raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();

    let parsed = url::Url::parse(trimmed).map_err(|e| ConfigError::InvalidValue {
        var: var.to_string(),
        message: format!("must be an absolute http(s) URL with a host: {e}"),
    })?;

    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(ConfigError::InvalidValue {
            var: var.to_string(),
            message: format!("scheme must be http or https, got: {scheme}"),
        });
    }

    if parsed.host_str().is_none() {
        return Err(ConfigError::InvalidValue {
            var: var.to_string(),
            message: "host is required".into(),
        });
    }

    Ok(parsed.as_str().trim_end_matches('/').to_string())
}
