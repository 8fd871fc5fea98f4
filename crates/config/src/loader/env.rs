//! Environment variable parsing for configuration.
//!
//! Responsibilities:
//! - Read and parse `INSPECTOR_*` environment variables.
//! - Apply environment variable values to a ConfigLoader instance.
//!
//! Does NOT handle:
//! - Building the final config (see builder.rs).
//! - .env file loading (handled by ConfigLoader::load_dotenv).
//!
//! Invariants:
//! - Empty or whitespace-only environment variables are treated as unset.
//! - Returned values are trimmed (leading/trailing whitespace removed).
//! - Invalid values return ConfigError::InvalidValue without echoing the value.

use secrecy::SecretString;
use std::str::FromStr;
use std::time::Duration;

use super::builder::ConfigLoader;
use super::error::ConfigError;
use crate::types::Environment;

/// Read an environment variable, returning None if unset, empty, or whitespace-only.
/// Returns the trimmed value (leading/trailing whitespace removed) if present.
pub fn env_var_or_none(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else if trimmed.len() == s.len() {
            Some(s)
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn parse_env<T: FromStr>(var: &str, message: &str) -> Result<Option<T>, ConfigError> {
    env_var_or_none(var)
        .map(|raw| {
            raw.parse::<T>().map_err(|_| ConfigError::InvalidValue {
                var: var.to_string(),
                message: message.to_string(),
            })
        })
        .transpose()
}

/// Apply environment variable configuration to the loader.
pub fn apply_env(loader: &mut ConfigLoader) -> Result<(), ConfigError> {
    if let Some(key) = env_var_or_none("INSPECTOR_API_KEY") {
        loader.set_api_key(Some(SecretString::new(key.into())));
    }
    if let Some(env) = parse_env::<Environment>(
        "INSPECTOR_ENV",
        "must be one of dev, staging or prod",
    )? {
        loader.set_env(Some(env));
    }
    if let Some(name) = env_var_or_none("INSPECTOR_APP_NAME") {
        loader.set_app_name(Some(name));
    }
    if let Some(version) = env_var_or_none("INSPECTOR_APP_VERSION") {
        loader.set_app_version(Some(version));
    }
    if let Some(key) = env_var_or_none("INSPECTOR_PUBLIC_ENCRYPTION_KEY") {
        loader.set_public_encryption_key(Some(key));
    }
    if let Some(endpoint) = env_var_or_none("INSPECTOR_ENDPOINT") {
        loader.set_endpoint(Some(endpoint));
    }
    if let Some(url) = env_var_or_none("INSPECTOR_SPEC_BASE_URL") {
        loader.set_spec_base_url(Some(url));
    }
    if let Some(ms) = parse_env::<u64>("INSPECTOR_SPEC_FETCH_TIMEOUT_MS", "must be a number")? {
        loader.set_spec_fetch_timeout(Some(Duration::from_millis(ms)));
    }
    if let Some(secs) = parse_env::<u64>("INSPECTOR_TIMEOUT", "must be a number")? {
        loader.set_request_timeout(Some(Duration::from_secs(secs)));
    }
    if let Some(retries) = parse_env::<usize>(
        "INSPECTOR_MAX_RETRIES",
        "must be a non-negative integer",
    )? {
        loader.set_max_retries(Some(retries));
    }
    if let Some(rate) = parse_env::<f64>("INSPECTOR_SAMPLING_RATE", "must be a number")? {
        loader.set_sampling_rate(Some(rate));
    }
    if let Some(secs) = parse_env::<u64>("INSPECTOR_SESSION_TIMEOUT", "must be a number")? {
        loader.set_session_timeout(Some(Duration::from_secs(secs)));
    }
    if let Some(enabled) = parse_env::<bool>("INSPECTOR_LOG_ENABLED", "must be true or false")? {
        loader.set_log_enabled(Some(enabled));
    }
    Ok(())
}
