//! Delivery of downloaded files to a notification channel
//!
//! [`deliver_file`] applies the local size gate before anything reaches the channel:
//! files strictly larger than the limit are skipped and never submitted.

use crate::config::RetryConfig;
use crate::error::DeliveryError;
use crate::retry::with_retry;
use crate::types::DeliveryOutcome;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

mod telegram;

pub use telegram::TelegramChannel;

/// Channel that accepts local files and forwards them to an endpoint
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    /// Send one file as a document
    async fn send_document(&self, path: &Path) -> Result<(), DeliveryError>;

    /// Send a short text message
    async fn send_message(&self, text: &str) -> Result<(), DeliveryError>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Send one file through `channel`, enforcing the size limit first
///
/// Never fails: every problem is logged and reported as a [`DeliveryOutcome`].
/// A file of exactly `max_file_size` bytes is attempted.
pub async fn deliver_file(
    channel: &dyn DeliveryChannel,
    path: &Path,
    max_file_size: u64,
    retry: &RetryConfig,
) -> DeliveryOutcome {
    info!(path = %path.display(), channel = channel.name(), "sending file");

    let size = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata.len(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot read file for delivery");
            return DeliveryOutcome::Failed {
                path: path.to_path_buf(),
                error: e.to_string(),
            };
        }
    };

    if size > max_file_size {
        info!(
            path = %path.display(),
            size,
            limit = max_file_size,
            "file exceeds delivery size limit, skipping"
        );
        return DeliveryOutcome::Skipped {
            path: path.to_path_buf(),
            size,
            limit: max_file_size,
        };
    }

    match with_retry(retry, || channel.send_document(path)).await {
        Ok(()) => {
            info!(path = %path.display(), "file delivered");
            DeliveryOutcome::Delivered {
                path: path.to_path_buf(),
            }
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "file delivery failed");
            DeliveryOutcome::Failed {
                path: path.to_path_buf(),
                error: e.to_string(),
            }
        }
    }
}

/// Regular files directly inside `dir`, sorted by file name
pub async fn staged_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_MAX_FILE_SIZE;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Records every path it is asked to send; fails when `fail` is set
    #[derive(Default)]
    struct RecordingChannel {
        sent: Mutex<Vec<PathBuf>>,
        fail: bool,
    }

    #[async_trait]
    impl DeliveryChannel for RecordingChannel {
        async fn send_document(&self, path: &Path) -> Result<(), DeliveryError> {
            self.sent.lock().unwrap().push(path.to_path_buf());
            if self.fail {
                return Err(DeliveryError::Rejected {
                    status: 400,
                    body: "Bad Request: chat not found".into(),
                });
            }
            Ok(())
        }

        async fn send_message(&self, _text: &str) -> Result<(), DeliveryError> {
            Ok(())
        }

        fn name(&self) -> &'static str {
            "recording"
        }
    }

    fn sparse_file(dir: &Path, name: &str, len: u64) -> PathBuf {
        let path = dir.join(name);
        let file = std::fs::File::create(&path).unwrap();
        file.set_len(len).unwrap();
        path
    }

    #[tokio::test]
    async fn file_at_exact_limit_is_attempted() {
        let dir = tempdir().unwrap();
        let path = sparse_file(dir.path(), "exact.mp4", 52_428_800);
        let channel = RecordingChannel::default();

        let outcome = deliver_file(
            &channel,
            &path,
            DEFAULT_MAX_FILE_SIZE,
            &RetryConfig::default(),
        )
        .await;

        assert!(outcome.is_delivered());
        assert_eq!(channel.sent.lock().unwrap().as_slice(), &[path]);
    }

    #[tokio::test]
    async fn file_one_byte_over_limit_is_skipped_without_sending() {
        let dir = tempdir().unwrap();
        let path = sparse_file(dir.path(), "big.mp4", 52_428_801);
        let channel = RecordingChannel::default();

        let outcome = deliver_file(
            &channel,
            &path,
            DEFAULT_MAX_FILE_SIZE,
            &RetryConfig::default(),
        )
        .await;

        assert_eq!(
            outcome,
            DeliveryOutcome::Skipped {
                path,
                size: 52_428_801,
                limit: 52_428_800,
            }
        );
        assert!(channel.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn channel_failure_is_reported_not_raised() {
        let dir = tempdir().unwrap();
        let path = sparse_file(dir.path(), "g1.json", 12);
        let channel = RecordingChannel {
            fail: true,
            ..Default::default()
        };

        let outcome = deliver_file(&channel, &path, 100, &RetryConfig::default()).await;

        match outcome {
            DeliveryOutcome::Failed { error, .. } => assert!(error.contains("chat not found")),
            other => panic!("expected Failed, got {other:?}"),
        }
        assert_eq!(channel.sent.lock().unwrap().len(), 1, "no retry by default");
    }

    #[tokio::test]
    async fn missing_file_fails_without_sending() {
        let dir = tempdir().unwrap();
        let channel = RecordingChannel::default();

        let outcome = deliver_file(
            &channel,
            &dir.path().join("gone.png"),
            100,
            &RetryConfig::default(),
        )
        .await;

        assert!(matches!(outcome, DeliveryOutcome::Failed { .. }));
        assert!(channel.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn staged_files_are_sorted_and_skip_directories() {
        let dir = tempdir().unwrap();
        sparse_file(dir.path(), "b.png", 1);
        sparse_file(dir.path(), "a.json", 1);
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        let files = staged_files(dir.path()).await.unwrap();

        assert_eq!(
            files,
            vec![dir.path().join("a.json"), dir.path().join("b.png")]
        );
    }
}
