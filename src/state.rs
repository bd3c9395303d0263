//! Publication state persistence
//!
//! The state file records which location was last published:
//!
//! ```json
//! {
//!     "publish": "555/",
//!     "empty": []
//! }
//! ```
//!
//! Writes go to a temporary file in the same directory which is then renamed over the
//! target, so readers see either the old record or the new one. A single writer is
//! assumed; concurrent runs against the same file are not supported.

use crate::error::Result;
use crate::types::PublicationState;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Reads and overwrites the publication state file
#[derive(Clone, Debug)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    /// Store backed by `path` (created on first publish)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the state file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record `location` as published, replacing any previous record
    pub fn publish(&self, location: &str) -> Result<PublicationState> {
        let state = PublicationState::new(location);
        self.write(&state)?;
        tracing::info!(path = %self.path.display(), location, "publication state updated");
        Ok(state)
    }

    /// Read the current record, `None` if the file does not exist yet
    pub fn load(&self) -> Result<Option<PublicationState>> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, state: &PublicationState) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        // Four-space indent matches the files written by earlier tooling
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        state.serialize(&mut serializer)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&buf)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn publish_writes_indented_record() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path().join("config").join("config_public.json"));

        let state = store.publish("555/").unwrap();

        assert_eq!(state, PublicationState::new("555/"));
        let text = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(text, "{\n    \"publish\": \"555/\",\n    \"empty\": []\n}");
    }

    #[test]
    fn publish_overwrites_previous_record() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));

        store.publish("444/").unwrap();
        store.publish("666/").unwrap();

        assert_eq!(store.load().unwrap(), Some(PublicationState::new("666/")));
    }

    #[test]
    fn repeated_publish_is_byte_identical() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));

        store.publish("555/").unwrap();
        let first = std::fs::read(store.path()).unwrap();
        store.publish("555/").unwrap();
        let second = std::fs::read(store.path()).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn load_missing_file_returns_none() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path().join("absent.json"));
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn no_temp_files_left_behind() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));

        store.publish("555/").unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("state.json")]);
    }

    #[test]
    fn corrupt_file_is_a_serialization_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{not json").unwrap();

        let result = StateStore::new(path).load();

        assert!(matches!(result, Err(crate::Error::Serialization(_))));
    }
}
