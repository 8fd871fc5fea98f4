//! Encryption utilities for property values.
//!
//! Responsibilities:
//! - Provide AES-256-GCM encryption and decryption.
//! - Parse and generate hex-encoded value keys.
//! - Define the self-contained ciphertext envelope (`hex(nonce || ciphertext+tag)`).
//!
//! Does NOT handle:
//! - Deciding whether a value should be encrypted (see the client's schema module).
//! - Key distribution (keys are supplied through configuration).

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::RngExt;
use thiserror::Error;

/// Length of an AES-256 key in bytes.
pub const KEY_LEN: usize = 32;

/// Length of an AES-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Errors that can occur during encryption operations.
#[derive(Debug, Error)]
pub enum EncryptionError {
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Invalid key size: expected 32 bytes")]
    InvalidKeySize,

    #[error("Invalid nonce size: expected 12 bytes")]
    InvalidNonceSize,

    #[error("Invalid hex encoding: {0}")]
    InvalidEncoding(String),
}

pub type Result<T> = std::result::Result<T, EncryptionError>;

/// Core cryptographic logic for AES-256-GCM.
pub struct Encryptor;

impl Encryptor {
    /// Encrypts data using AES-256-GCM.
    /// Returns (ciphertext + tag, nonce).
    pub fn encrypt(data: &[u8], key: &[u8; KEY_LEN]) -> Result<(Vec<u8>, [u8; NONCE_LEN])> {
        let cipher = Aes256Gcm::new(key.into());
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::rng().fill(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, data)
            .map_err(|e| EncryptionError::EncryptionFailed(e.to_string()))?;

        Ok((ciphertext, nonce_bytes))
    }

    /// Decrypts data using AES-256-GCM.
    pub fn decrypt(ciphertext: &[u8], key: &[u8; KEY_LEN], nonce: &[u8; NONCE_LEN]) -> Result<Vec<u8>> {
        let cipher = Aes256Gcm::new(key.into());
        let nonce = Nonce::from_slice(nonce);

        let plaintext = cipher
            .decrypt(nonce, ciphertext)
            .map_err(|e| EncryptionError::DecryptionFailed(e.to_string()))?;

        Ok(plaintext)
    }

    /// Encrypts `data` and returns the hex envelope `nonce || ciphertext+tag`.
    pub fn seal_hex(data: &[u8], key: &[u8; KEY_LEN]) -> Result<String> {
        let (ciphertext, nonce) = Self::encrypt(data, key)?;
        let mut envelope = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        envelope.extend_from_slice(&nonce);
        envelope.extend_from_slice(&ciphertext);
        Ok(hex::encode(envelope))
    }

    /// Opens an envelope produced by [`Encryptor::seal_hex`].
    pub fn open_hex(envelope: &str, key: &[u8; KEY_LEN]) -> Result<Vec<u8>> {
        let bytes = hex::decode(envelope.trim())
            .map_err(|e| EncryptionError::InvalidEncoding(e.to_string()))?;
        if bytes.len() < NONCE_LEN {
            return Err(EncryptionError::InvalidNonceSize);
        }
        let (nonce_bytes, ciphertext) = bytes.split_at(NONCE_LEN);
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(nonce_bytes);
        Self::decrypt(ciphertext, key, &nonce)
    }

    /// Parses a hex-encoded 32-byte key.
    pub fn parse_key(hex_key: &str) -> Result<[u8; KEY_LEN]> {
        let bytes = hex::decode(hex_key.trim())
            .map_err(|e| EncryptionError::InvalidEncoding(e.to_string()))?;
        if bytes.len() != KEY_LEN {
            return Err(EncryptionError::InvalidKeySize);
        }
        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(&bytes);
        Ok(key)
    }

    /// Generates a random key and returns it hex-encoded.
    pub fn generate_key() -> String {
        let mut key = [0u8; KEY_LEN];
        rand::rng().fill(&mut key);
        hex::encode(key)
    }
}
