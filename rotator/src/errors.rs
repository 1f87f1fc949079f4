//! Error types for the snapshot rotator
//!
//! Fatal errors (`ConfigError`, `BackupError`) end the run with exit code 2.
//! `CloudError` is what every provider call can fail with; outside of
//! exclusion resolution and connection setup it is logged and swallowed.

use thiserror::Error;

use crate::constants::exit;

/// Failure of a single cloud API call
#[derive(Debug, Error)]
pub enum CloudError {
    /// Request never produced a response (DNS, TLS, timeout, reset)
    #[error("Request to {operation} failed: {reason}")]
    Transport { operation: String, reason: String },

    /// Provider answered with a non-success status
    #[error("Provider rejected {operation} with status {status}: {message}")]
    Api {
        operation: String,
        status: u16,
        message: String,
    },

    /// Response body did not match the expected shape
    #[error("Failed to decode {operation} response: {reason}")]
    Decode { operation: String, reason: String },
}

impl CloudError {
    pub fn transport(operation: &str, err: impl std::fmt::Display) -> Self {
        CloudError::Transport {
            operation: operation.to_string(),
            reason: err.to_string(),
        }
    }

    pub fn decode(operation: &str, err: impl std::fmt::Display) -> Self {
        CloudError::Decode {
            operation: operation.to_string(),
            reason: err.to_string(),
        }
    }
}

/// Configuration error variants
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a configuration file
    #[error("Failed to load config from '{path}': {reason}")]
    LoadFailed { path: String, reason: String },

    /// File was readable but not valid TOML for its schema
    #[error("Failed to parse config '{path}': {reason}")]
    ParseError { path: String, reason: String },

    /// Invalid configuration value
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Retention arithmetic errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RetentionError {
    /// Cadence name outside daily/weekly/monthly
    #[error("Backup frequency '{0}' is not correct, expected daily, weekly or monthly")]
    InvalidCadence(String),

    /// Subtraction left the representable calendar range
    #[error("Cutoff date out of range: {0}")]
    OutOfRange(String),
}

/// Errors that abort a backup run
#[derive(Debug, Error)]
pub enum BackupError {
    /// Cannot establish a session with the cloud API
    #[error("Unable to connect to cloud region {region}: {source}")]
    Connection {
        region: String,
        #[source]
        source: CloudError,
    },

    /// An excluded instance name could not be resolved to exactly one instance
    #[error("Unable to resolve excluded instance '{name}': {reason}")]
    ExclusionResolution { name: String, reason: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Retention(#[from] RetentionError),
}

/// Process exit code for an error that ended the run.
///
/// Anything that is not a `BackupError` or `ConfigError` is unexpected.
pub fn exit_code_for(err: &anyhow::Error) -> u8 {
    if err.downcast_ref::<BackupError>().is_some() || err.downcast_ref::<ConfigError>().is_some() {
        exit::FATAL
    } else {
        exit::UNEXPECTED
    }
}
