//! Configuration assembly for CLI commands.
//!
//! Responsibilities:
//! - Merge CLI flags over `INSPECTOR_*` environment variables into an
//!   [`InspectorConfig`].
//! - Distinguish commands with a real config from offline commands.
//! - Build the [`EncryptionContext`] used by the offline `schema` command.
//!
//! Does NOT handle:
//! - `.env` loading (done in `main()` before argument parsing).
//!
//! Invariants:
//! - CLI flags take precedence over environment variables.
//! - Offline commands never require an api key.
//! - The app version falls back to the CLI version so read-only commands
//!   work without one.

use std::time::Duration;

use anyhow::{Context, Result};
use inspector_client::EncryptionContext;
use inspector_config::{ConfigLoader, Encryptor, InspectorConfig};

use crate::args::Cli;

/// Context for command execution.
pub(crate) enum ConfigCommandContext {
    /// A validated config built from environment and CLI args.
    Real(Box<InspectorConfig>),
    /// Offline commands (`schema`, `keygen`) run without a config.
    Offline,
}

impl ConfigCommandContext {
    /// Extract the real config, failing for offline commands.
    pub(crate) fn into_real_config(self) -> Result<InspectorConfig> {
        match self {
            ConfigCommandContext::Real(config) => Ok(*config),
            ConfigCommandContext::Offline => anyhow::bail!(
                "Internal error: attempted to use an offline context for a command requiring configuration"
            ),
        }
    }
}

/// Build the SDK configuration for commands that talk to remote services.
pub fn build_config(cli: &Cli) -> Result<InspectorConfig> {
    let mut loader = ConfigLoader::new()
        .from_env()
        .context("Failed to load configuration from environment")?;

    if let Some(key) = &cli.api_key {
        loader = loader.with_api_key(key.clone());
    }
    if let Some(env) = cli.env {
        loader = loader.with_env(env);
    }
    if let Some(name) = &cli.app_name {
        loader = loader.with_app_name(name.clone());
    }
    loader = loader.with_app_version(
        cli.app_version
            .clone()
            .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
    );
    if let Some(key) = &cli.public_encryption_key {
        loader = loader.with_public_encryption_key(key.clone());
    }
    if let Some(endpoint) = &cli.endpoint {
        loader = loader.with_endpoint(endpoint.clone());
    }
    if let Some(url) = &cli.spec_base_url {
        loader = loader.with_spec_base_url(url.clone());
    }
    if let Some(ms) = cli.spec_fetch_timeout_ms {
        loader = loader.with_spec_fetch_timeout(Duration::from_millis(ms));
    }
    if let Some(secs) = cli.timeout {
        loader = loader.with_request_timeout(Duration::from_secs(secs));
    }
    if let Some(retries) = cli.max_retries {
        loader = loader.with_max_retries(retries);
    }
    if cli.log_enabled {
        loader = loader.with_log_enabled(true);
    }

    loader.build().context("Failed to build configuration")
}

/// Encryption settings for offline schema inference.
pub fn encryption_context(cli: &Cli) -> Result<Option<EncryptionContext>> {
    let Some(key) = cli
        .public_encryption_key
        .as_deref()
        .filter(|key| !key.trim().is_empty())
    else {
        return Ok(None);
    };
    Encryptor::parse_key(key).context("Invalid value encryption key")?;
    Ok(Some(EncryptionContext::new(
        cli.env.unwrap_or_default(),
        Some(key.to_string()),
    )))
}
