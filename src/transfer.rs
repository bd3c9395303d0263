//! Download orchestration for a validated asset group
//!
//! The three objects are fetched one after another in canonical order (metadata,
//! image, video). The first failure aborts the group: later objects are not
//! requested, and files already written stay in the staging area.

use crate::config::RetryConfig;
use crate::error::TransferError;
use crate::retry::with_retry;
use crate::store::ObjectStore;
use crate::types::{AssetGroup, AssetKind, Event};
use std::path::{Path, PathBuf};
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Local path in `staging_dir` for an object key (its final path segment)
///
/// An existing file at that path is overwritten by the next download.
pub fn staging_path(staging_dir: &Path, key: &str) -> Result<PathBuf, TransferError> {
    let file_name = key.rsplit('/').next().unwrap_or_default();
    if file_name.is_empty() || file_name == "." || file_name == ".." {
        return Err(TransferError::InvalidKey {
            key: key.to_string(),
        });
    }
    Ok(staging_dir.join(file_name))
}

/// Download every object of `group` into `staging_dir`
///
/// Returns the local paths in canonical order once all three objects are on disk.
pub async fn download_group(
    store: &dyn ObjectStore,
    group: &AssetGroup,
    staging_dir: &Path,
    retry: &RetryConfig,
    event_tx: &broadcast::Sender<Event>,
) -> Result<Vec<PathBuf>, TransferError> {
    let mut files = Vec::with_capacity(AssetKind::ALL.len());

    for kind in AssetKind::ALL {
        let key = group.key(kind);
        let local_path = staging_path(staging_dir, key)?;

        if let Err(source) = with_retry(retry, || store.download(key, &local_path)).await {
            warn!(
                location = %group.location,
                basename = %group.basename,
                key,
                %kind,
                error = %source,
                "download failed, abandoning group"
            );
            return Err(TransferError::ObjectFailed {
                basename: group.basename.clone(),
                key: key.to_string(),
                source,
            });
        }

        info!(key, path = %local_path.display(), %kind, "downloaded file");
        event_tx
            .send(Event::FileDownloaded {
                key: key.to_string(),
                path: local_path.clone(),
            })
            .ok();
        files.push(local_path);
    }

    Ok(files)
}
