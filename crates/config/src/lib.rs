//! Configuration management for the schema inspector.
//!
//! This crate provides the configuration types, the layered loader
//! (defaults, `.env`, environment variables, builder calls) and the value
//! encryption primitive shared by the client and CLI crates.

pub mod constants;
pub mod encryption;
mod loader;
pub mod types;

pub use encryption::{EncryptionError, Encryptor};
pub use loader::{ConfigError, ConfigLoader, env_var_or_none};
pub use types::{Environment, InspectorConfig, ParseEnvironmentError};
