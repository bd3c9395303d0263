//! Error types for asset-courier
//!
//! This module provides the error taxonomy used across the pipeline:
//! - Configuration errors (fatal, raised before any location is scanned)
//! - Object store errors (listing or download failures, recovered per location)
//! - Transfer errors (a group download aborted part way through)
//! - Delivery errors (logged, never abort a run)
//!
//! Each top-level error maps to a process exit code and a stable machine-readable code.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for asset-courier operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for asset-courier
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "S3_BUCKET_NAME")
        key: Option<String>,
    },

    /// Object store operation failed
    #[error("object store error: {0}")]
    Store(#[from] StoreError),

    /// Group download aborted
    #[error("transfer error: {0}")]
    Transfer(#[from] TransferError),

    /// Delivery channel rejected or failed to send a file
    #[error("delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for a configuration error tied to a specific key
    pub fn config(message: impl Into<String>, key: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }
}

/// Errors reported by an [`ObjectStore`](crate::store::ObjectStore) implementation
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested key does not exist
    #[error("object {key} not found in bucket {bucket}")]
    NotFound {
        /// Bucket that was queried
        bucket: String,
        /// Key that was requested
        key: String,
    },

    /// Network, permission or service error
    #[error("store request failed: {message}")]
    Network {
        /// Error message from the store
        message: String,
        /// Whether a retry could plausibly succeed
        retryable: bool,
    },

    /// Writing the downloaded bytes to disk failed
    #[error("I/O error at {path}: {message}")]
    Io {
        /// Local path being written
        path: PathBuf,
        /// Underlying error message
        message: String,
    },
}

/// Errors raised while downloading a validated asset group
#[derive(Debug, Error)]
pub enum TransferError {
    /// One of the group's objects failed to download; remaining objects were not requested
    #[error("download of {key} failed for group {basename}: {source}")]
    ObjectFailed {
        /// Basename of the group being downloaded
        basename: String,
        /// Key whose download failed
        key: String,
        /// Underlying store error
        #[source]
        source: StoreError,
    },

    /// The object key has no usable file name for the staging area
    #[error("object key {key} has no file name")]
    InvalidKey {
        /// The offending key
        key: String,
    },
}

/// Errors raised by a [`DeliveryChannel`](crate::delivery::DeliveryChannel)
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The endpoint answered with a non-success status
    #[error("delivery endpoint returned status {status}: {body}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Response body (truncated by the caller if needed)
        body: String,
    },

    /// The request never completed (connect failure, timeout, TLS error)
    #[error("delivery request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// The local file could not be read
    #[error("failed to read {path}: {message}")]
    Io {
        /// File that was being sent
        path: PathBuf,
        /// Underlying error message
        message: String,
    },
}

/// Convert errors to process exit codes for the CLI
///
/// This trait maps domain errors to the exit codes documented for the binary.
pub trait ToExitCode {
    /// Get the process exit code for this error
    fn exit_code(&self) -> u8;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToExitCode for Error {
    fn exit_code(&self) -> u8 {
        // Outcome-specific codes (2, 3) come from `RunOutcome::exit_code`
        match self {
            Error::Config { .. }
            | Error::Store(_)
            | Error::Transfer(_)
            | Error::Delivery(_)
            | Error::Io(_)
            | Error::Serialization(_)
            | Error::Other(_) => 1,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Store(e) => match e {
                StoreError::NotFound { .. } => "object_not_found",
                StoreError::Network { .. } => "store_network_error",
                StoreError::Io { .. } => "store_io_error",
            },
            Error::Transfer(e) => match e {
                TransferError::ObjectFailed { .. } => "transfer_failed",
                TransferError::InvalidKey { .. } => "invalid_key",
            },
            Error::Delivery(e) => match e {
                DeliveryError::Rejected { .. } => "delivery_rejected",
                DeliveryError::Network(_) => "delivery_network_error",
                DeliveryError::Io { .. } => "delivery_io_error",
            },
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::Other(_) => "internal_error",
        }
    }
}
