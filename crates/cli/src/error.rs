//! CLI exit codes for scripting and automation.
//!
//! Responsibilities:
//! - Define structured exit codes that scripts can use to distinguish error types.
//! - Map errors found in an `anyhow` chain to exit codes.
//!
//! Does NOT handle:
//! - Error message formatting (handled by anyhow Display).
//!
//! Invariants:
//! - Exit code 130 is reserved for SIGINT (Unix standard: 128 + SIGINT).

use inspector_client::ClientError;
use inspector_config::{ConfigError, EncryptionError};

/// Structured exit codes for `inspector`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Command completed successfully.
    Success = 0,

    /// Unhandled or generic failure, including network and validation failures.
    GeneralError = 1,

    /// Missing or invalid configuration (api key, environment, URLs, keys).
    ///
    /// Scripts should fix the configuration and not retry.
    ConfigError = 2,

    /// Reading input or writing output failed.
    IoError = 3,

    /// Interrupted by SIGINT/Ctrl+C (128 + 2).
    Interrupted = 130,
}

impl ExitCode {
    /// Convert the exit code to an i32 for use with std::process::exit().
    pub const fn as_i32(self) -> i32 {
        self as u8 as i32
    }
}

impl From<&ClientError> for ExitCode {
    fn from(err: &ClientError) -> Self {
        match err {
            ClientError::Storage(_) => ExitCode::IoError,
            ClientError::Encryption(_) => ExitCode::ConfigError,
            _ => ExitCode::GeneralError,
        }
    }
}

/// Extension trait for anyhow::Error to extract exit codes.
pub trait ExitCodeExt {
    /// Extract the appropriate exit code from this error.
    ///
    /// Returns ExitCode::GeneralError if nothing in the chain is recognized.
    fn exit_code(&self) -> ExitCode;
}

impl ExitCodeExt for anyhow::Error {
    fn exit_code(&self) -> ExitCode {
        for cause in self.chain() {
            if cause.is::<ConfigError>() || cause.is::<EncryptionError>() {
                return ExitCode::ConfigError;
            }
            if cause.is::<std::io::Error>() {
                return ExitCode::IoError;
            }
            if let Some(client_err) = cause.downcast_ref::<ClientError>() {
                return ExitCode::from(client_err);
            }
        }
        ExitCode::GeneralError
    }
}
