//! Property value encryption collaborator.
//!
//! Responsibilities:
//! - Define the [`ValueEncryptor`] seam used by schema inference.
//! - Provide the default AES-256-GCM implementation backed by `inspector_config::Encryptor`.
//! - Decide whether encryption is active for a given environment and key.
//!
//! Does NOT handle:
//! - Selecting which nodes carry ciphertext (see [`crate::schema`]).
//!
//! Invariants:
//! - Encryption is active only in dev/staging and only with a non-empty key.
//! - The plaintext is the JSON text of the value, so decryption restores its type.

use std::fmt;
use std::sync::Arc;

use inspector_config::{Encryptor, Environment};
use serde_json::Value;

use crate::error::Result;

/// Opaque encrypt/decrypt primitive for property values.
pub trait ValueEncryptor: Send + Sync {
    /// Encrypt `value` for the holder of `key`.
    fn encrypt(&self, value: &Value, key: &str) -> Result<String>;

    /// Decrypt a ciphertext produced by [`ValueEncryptor::encrypt`].
    fn decrypt(&self, ciphertext: &str, key: &str) -> Result<Value>;
}

/// AES-256-GCM value encryptor using hex-encoded 32-byte keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct AesGcmValueEncryptor;

impl ValueEncryptor for AesGcmValueEncryptor {
    fn encrypt(&self, value: &Value, key: &str) -> Result<String> {
        let key = Encryptor::parse_key(key)?;
        let plaintext = serde_json::to_vec(value)?;
        Ok(Encryptor::seal_hex(&plaintext, &key)?)
    }

    fn decrypt(&self, ciphertext: &str, key: &str) -> Result<Value> {
        let key = Encryptor::parse_key(key)?;
        let plaintext = Encryptor::open_hex(ciphertext, &key)?;
        Ok(serde_json::from_slice(&plaintext)?)
    }
}

/// Encryption settings applied during schema inference.
#[derive(Clone)]
pub struct EncryptionContext {
    env: Environment,
    key: Option<String>,
    encryptor: Arc<dyn ValueEncryptor>,
}

impl EncryptionContext {
    /// Create a context using the default AES-GCM encryptor.
    pub fn new(env: Environment, key: Option<String>) -> Self {
        Self::with_encryptor(env, key, Arc::new(AesGcmValueEncryptor))
    }

    /// Create a context with a custom encryptor.
    pub fn with_encryptor(
        env: Environment,
        key: Option<String>,
        encryptor: Arc<dyn ValueEncryptor>,
    ) -> Self {
        Self {
            env,
            key,
            encryptor,
        }
    }

    /// Whether primitive values should carry ciphertext.
    pub fn is_active(&self) -> bool {
        self.env.is_development_like() && self.active_key().is_some()
    }

    fn active_key(&self) -> Option<&str> {
        self.key.as_deref().filter(|key| !key.trim().is_empty())
    }

    /// Encrypt a primitive value. Returns `Ok(None)` when encryption is inactive.
    pub fn encrypt(&self, value: &Value) -> Result<Option<String>> {
        if !self.env.is_development_like() {
            return Ok(None);
        }
        match self.active_key() {
            Some(key) => self.encryptor.encrypt(value, key).map(Some),
            None => Ok(None),
        }
    }
}

impl fmt::Debug for EncryptionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionContext")
            .field("env", &self.env)
            .field("key_present", &self.active_key().is_some())
            .finish()
    }
}
