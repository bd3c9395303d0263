//! Core types and events for asset-courier

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// One object returned by a store listing
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectEntry {
    /// Full object key (e.g. "555/g1.json")
    pub key: String,
    /// Object size in bytes
    pub size: u64,
}

impl ObjectEntry {
    /// Create a new listing entry
    pub fn new(key: impl Into<String>, size: u64) -> Self {
        Self {
            key: key.into(),
            size,
        }
    }
}

/// The three members of a complete asset group
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    /// Metadata document (default extension: json)
    Metadata,
    /// Still image (default extension: png)
    Image,
    /// Video clip (default extension: mp4)
    Video,
}

impl AssetKind {
    /// Canonical download order: metadata, image, video
    pub const ALL: [AssetKind; 3] = [AssetKind::Metadata, AssetKind::Image, AssetKind::Video];

    /// Position of this kind in the canonical order
    pub fn index(self) -> usize {
        match self {
            AssetKind::Metadata => 0,
            AssetKind::Image => 1,
            AssetKind::Video => 2,
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AssetKind::Metadata => "metadata",
            AssetKind::Image => "image",
            AssetKind::Video => "video",
        };
        f.write_str(name)
    }
}

/// Required extension set: exactly one extension per [`AssetKind`]
///
/// [`AssetExtensions::new`] and deserialization store extensions lowercased and
/// without a leading dot. Matching normalizes both sides, so a literal holding
/// "PNG" or ".json" still matches.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetExtensions {
    /// Metadata extension (default: "json")
    #[serde(default = "default_metadata_ext", deserialize_with = "deserialize_extension")]
    pub metadata: String,
    /// Image extension (default: "png")
    #[serde(default = "default_image_ext", deserialize_with = "deserialize_extension")]
    pub image: String,
    /// Video extension (default: "mp4")
    #[serde(default = "default_video_ext", deserialize_with = "deserialize_extension")]
    pub video: String,
}

impl Default for AssetExtensions {
    fn default() -> Self {
        Self {
            metadata: default_metadata_ext(),
            image: default_image_ext(),
            video: default_video_ext(),
        }
    }
}

impl AssetExtensions {
    /// Build an extension set, normalising case and stripping leading dots
    pub fn new(metadata: &str, image: &str, video: &str) -> Self {
        Self {
            metadata: normalize_extension(metadata),
            image: normalize_extension(image),
            video: normalize_extension(video),
        }
    }

    /// Extension configured for `kind`
    pub fn extension(&self, kind: AssetKind) -> &str {
        match kind {
            AssetKind::Metadata => &self.metadata,
            AssetKind::Image => &self.image,
            AssetKind::Video => &self.video,
        }
    }

    /// Map an observed extension (any case) back to its kind
    pub fn kind_of(&self, extension: &str) -> Option<AssetKind> {
        let extension = normalize_extension(extension);
        AssetKind::ALL
            .into_iter()
            .find(|kind| normalize_extension(self.extension(*kind)) == extension)
    }

    /// The three extensions in canonical order, normalized
    pub fn normalized(&self) -> [String; 3] {
        AssetKind::ALL.map(|kind| normalize_extension(self.extension(kind)))
    }
}

fn deserialize_extension<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(normalize_extension(&raw))
}

/// Lowercase an extension and strip any leading dots
pub fn normalize_extension(extension: &str) -> String {
    extension.trim().trim_start_matches('.').to_lowercase()
}

fn default_metadata_ext() -> String {
    "json".to_string()
}

fn default_image_ext() -> String {
    "png".to_string()
}

fn default_video_ext() -> String {
    "mp4".to_string()
}

/// A validated, complete asset group within one location
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetGroup {
    /// Location (prefix) the group was found under
    pub location: String,
    /// Logical basename shared by the three objects (key without extension)
    pub basename: String,
    /// Listed object keys in canonical order (metadata, image, video)
    pub keys: [String; 3],
}

impl AssetGroup {
    /// Object key listed for `kind`
    pub fn key(&self, kind: AssetKind) -> &str {
        &self.keys[kind.index()]
    }
}

/// Persisted record of the last published location
///
/// Serialized as `{"publish": "<location>", "empty": []}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationState {
    /// Location whose group was downloaded and handed to delivery
    pub publish: String,
    /// Reserved; always written as an empty array
    #[serde(default)]
    pub empty: Vec<serde_json::Value>,
}

impl PublicationState {
    /// State record for `location` with the reserved field empty
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            publish: location.into(),
            empty: Vec::new(),
        }
    }
}

/// Pipeline stage, used for logging and reporting
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Nothing started yet
    Idle,
    /// Listing a location
    Scanning,
    /// Looking for a complete group in a listing
    Validating,
    /// Downloading the selected group
    Downloading,
    /// Forwarding files to the delivery channel
    Delivering,
    /// Writing the publication state
    Publishing,
    /// Run finished
    Done,
    /// Run aborted on a fatal error
    Failed,
}

/// Result of handing one file to the delivery channel
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    /// Channel acknowledged the file
    Delivered {
        /// File that was sent
        path: PathBuf,
    },
    /// File exceeded the size limit and was never submitted
    Skipped {
        /// File that was skipped
        path: PathBuf,
        /// Size of the file in bytes
        size: u64,
        /// Configured limit in bytes
        limit: u64,
    },
    /// Channel or local read failed
    Failed {
        /// File that failed
        path: PathBuf,
        /// Error message
        error: String,
    },
}

impl DeliveryOutcome {
    /// Whether the channel acknowledged the file
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered { .. })
    }
}

/// Summary of a run that published a location
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishReport {
    /// The group that was downloaded
    pub group: AssetGroup,
    /// Local files written by the download, canonical order
    pub files: Vec<PathBuf>,
    /// Per-file delivery outcomes, in the order they were attempted
    pub deliveries: Vec<DeliveryOutcome>,
}

/// Terminal result of a pipeline run
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// A group was downloaded, delivery invoked and state written
    Published(PublishReport),
    /// Every location was exhausted without a successful download
    NothingFound {
        /// Number of locations that were listed (or attempted)
        locations_scanned: usize,
        /// Number of complete groups whose download failed
        download_failures: usize,
    },
}

impl RunOutcome {
    /// Process exit code for this outcome
    ///
    /// `0` published, `2` nothing found, `3` nothing published after a failed download.
    pub fn exit_code(&self) -> u8 {
        match self {
            RunOutcome::Published(_) => 0,
            RunOutcome::NothingFound {
                download_failures: 0,
                ..
            } => 2,
            RunOutcome::NothingFound { .. } => 3,
        }
    }
}

/// Pipeline events broadcast to subscribers
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// Listing of a location started
    ScanStarted {
        /// Location being listed
        location: String,
    },
    /// Location listing returned no objects
    LocationEmpty {
        /// Location that was empty
        location: String,
    },
    /// Location listing failed; the location is skipped
    ListingFailed {
        /// Location that failed
        location: String,
        /// Error message
        error: String,
    },
    /// Listing had objects but no complete group
    NoCompleteGroup {
        /// Location without a complete group
        location: String,
    },
    /// A complete group was selected
    GroupFound {
        /// Location holding the group
        location: String,
        /// Selected basename
        basename: String,
    },
    /// One object of the group was written to the staging area
    FileDownloaded {
        /// Object key
        key: String,
        /// Local path
        path: PathBuf,
    },
    /// Group download aborted; the location is skipped
    DownloadFailed {
        /// Location holding the group
        location: String,
        /// Group basename
        basename: String,
        /// Error message
        error: String,
    },
    /// File acknowledged by the delivery channel
    FileDelivered {
        /// File that was sent
        path: PathBuf,
    },
    /// File exceeded the size limit
    DeliverySkipped {
        /// File that was skipped
        path: PathBuf,
        /// File size in bytes
        size: u64,
    },
    /// Delivery of a file failed
    DeliveryFailed {
        /// File that failed
        path: PathBuf,
        /// Error message
        error: String,
    },
    /// Publication state written
    Published {
        /// Location recorded in the state file
        location: String,
    },
    /// All locations exhausted without publishing
    Exhausted,
}
