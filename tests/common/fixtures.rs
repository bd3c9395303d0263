//! In-memory collaborators for pipeline tests

use asset_courier::{DeliveryChannel, DeliveryError, ObjectEntry, ObjectStore, StoreError};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Object store backed by a map of key to bytes, recording every request
#[derive(Default)]
pub struct MemoryStore {
    objects: BTreeMap<String, Vec<u8>>,
    failing_downloads: HashSet<String>,
    failing_listings: HashSet<String>,
    listed: Mutex<Vec<String>>,
    downloaded: Mutex<Vec<String>>,
}

impl MemoryStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object whose content is its own key
    pub fn with_key(self, key: &str) -> Self {
        self.with_object(key, key.as_bytes().to_vec())
    }

    /// Add several objects whose content is their own key
    pub fn with_keys(self, keys: &[&str]) -> Self {
        keys.iter().fold(self, |store, key| store.with_key(key))
    }

    /// Add an object with explicit content
    pub fn with_object(mut self, key: &str, bytes: Vec<u8>) -> Self {
        self.objects.insert(key.to_string(), bytes);
        self
    }

    /// Make downloads of `key` fail with a non-retryable error
    pub fn failing_download(mut self, key: &str) -> Self {
        self.failing_downloads.insert(key.to_string());
        self
    }

    /// Make listings of `prefix` fail
    pub fn failing_listing(mut self, prefix: &str) -> Self {
        self.failing_listings.insert(prefix.to_string());
        self
    }

    /// Prefixes listed so far, in request order
    pub fn listed(&self) -> Vec<String> {
        self.listed.lock().unwrap().clone()
    }

    /// Keys requested for download so far, in request order
    pub fn downloaded(&self) -> Vec<String> {
        self.downloaded.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectEntry>, StoreError> {
        self.listed.lock().unwrap().push(prefix.to_string());
        if self.failing_listings.contains(prefix) {
            return Err(StoreError::Network {
                message: "403 AccessDenied".to_string(),
                retryable: false,
            });
        }
        Ok(self
            .objects
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, bytes)| ObjectEntry::new(key.clone(), bytes.len() as u64))
            .collect())
    }

    async fn download(&self, key: &str, local_path: &Path) -> Result<(), StoreError> {
        self.downloaded.lock().unwrap().push(key.to_string());
        if self.failing_downloads.contains(key) {
            return Err(StoreError::Network {
                message: "connection reset by peer".to_string(),
                retryable: false,
            });
        }
        let bytes = self.objects.get(key).ok_or_else(|| StoreError::NotFound {
            bucket: "memory".to_string(),
            key: key.to_string(),
        })?;
        std::fs::write(local_path, bytes).map_err(|e| StoreError::Io {
            path: local_path.to_path_buf(),
            message: e.to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Delivery channel that records file names; optionally rejects every request
#[derive(Default)]
pub struct RecordingChannel {
    reject: bool,
    documents: Mutex<Vec<PathBuf>>,
    messages: Mutex<Vec<String>>,
}

impl RecordingChannel {
    /// Channel accepting every request
    pub fn new() -> Self {
        Self::default()
    }

    /// Channel rejecting every request with HTTP 400
    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Default::default()
        }
    }

    /// File names of documents submitted so far, in order
    pub fn document_names(&self) -> Vec<String> {
        self.documents
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    /// Text messages submitted so far
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    fn result(&self) -> Result<(), DeliveryError> {
        if self.reject {
            return Err(DeliveryError::Rejected {
                status: 400,
                body: "{\"ok\":false,\"description\":\"Bad Request: chat not found\"}".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DeliveryChannel for RecordingChannel {
    async fn send_document(&self, path: &Path) -> Result<(), DeliveryError> {
        self.documents.lock().unwrap().push(path.to_path_buf());
        self.result()
    }

    async fn send_message(&self, text: &str) -> Result<(), DeliveryError> {
        self.messages.lock().unwrap().push(text.to_string());
        self.result()
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
