//! Object store access
//!
//! The pipeline only needs two operations from remote storage: list the keys under a
//! prefix and download one key to a local path. [`S3ObjectStore`] implements them
//! against any S3-compatible endpoint (AWS, Backblaze B2, MinIO).

use crate::error::StoreError;
use crate::types::ObjectEntry;
use async_trait::async_trait;
use std::path::Path;

mod s3;

pub use s3::S3ObjectStore;

/// Remote object storage used by the pipeline
///
/// Implementations must not retry internally; retry is an explicit opt-in handled by
/// the caller through [`crate::retry::with_retry`].
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List every object under `prefix`
    ///
    /// An empty vector means the prefix exists but holds nothing (or does not exist).
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectEntry>, StoreError>;

    /// Download `key` to `local_path`, overwriting any existing file
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the key does not exist
    /// - [`StoreError::Network`] for transport, permission or service failures
    /// - [`StoreError::Io`] if the local file cannot be written
    async fn download(&self, key: &str, local_path: &Path) -> Result<(), StoreError>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
