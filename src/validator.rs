//! Asset group validation
//!
//! Partitions a location's listing by logical basename and picks the first basename
//! whose recognised extensions are exactly the required set. Basenames are visited
//! in ascending lexicographic order so the choice does not depend on listing order.

use crate::types::{AssetExtensions, AssetGroup, AssetKind, ObjectEntry};
use std::collections::BTreeMap;

/// Split an object key into `(basename, extension)`
///
/// The extension is the text after the last dot of the final path segment. A segment
/// whose only dot is its first character (".env") or a key ending in "/" has no
/// extension. The basename keeps the path prefix.
///
/// # Examples
///
/// ```
/// use asset_courier::validator::split_key;
///
/// assert_eq!(split_key("555/g1.json"), Some(("555/g1", "json")));
/// assert_eq!(split_key("555/clip.final.MP4"), Some(("555/clip.final", "MP4")));
/// assert_eq!(split_key("555/.hidden"), None);
/// assert_eq!(split_key("555/"), None);
/// ```
pub fn split_key(key: &str) -> Option<(&str, &str)> {
    let segment_start = key.rfind('/').map_or(0, |i| i + 1);
    let segment = &key[segment_start..];
    let dot = segment.rfind('.')?;
    // Leading dots belong to the name, not the extension
    if segment[..dot].chars().all(|c| c == '.') {
        return None;
    }
    let split_at = segment_start + dot;
    Some((&key[..split_at], &key[split_at + 1..]))
}

/// Kinds observed for one basename, with the key that supplied each kind
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObservedGroup {
    keys: [Option<String>; 3],
}

impl ObservedGroup {
    fn record(&mut self, kind: AssetKind, key: &str) {
        let slot = &mut self.keys[kind.index()];
        // Keep the smallest key when case variants collide ("g1.PNG" vs "g1.png")
        if slot.as_deref().is_none_or(|existing| key < existing) {
            *slot = Some(key.to_string());
        }
    }

    /// Whether every required kind was observed
    pub fn is_complete(&self) -> bool {
        self.keys.iter().all(Option::is_some)
    }

    /// Kinds that were observed, canonical order
    pub fn kinds(&self) -> Vec<AssetKind> {
        AssetKind::ALL
            .into_iter()
            .filter(|kind| self.keys[kind.index()].is_some())
            .collect()
    }

    /// Kinds that are missing, canonical order
    pub fn missing(&self) -> Vec<AssetKind> {
        AssetKind::ALL
            .into_iter()
            .filter(|kind| self.keys[kind.index()].is_none())
            .collect()
    }

    fn into_keys(self) -> Option<[String; 3]> {
        let [metadata, image, video] = self.keys;
        Some([metadata?, image?, video?])
    }
}

/// Group a listing by basename, keeping only required extensions
///
/// Keys with an unrelated extension are dropped here, so they never count against
/// a basename.
pub fn group_by_basename(
    entries: &[ObjectEntry],
    extensions: &AssetExtensions,
) -> BTreeMap<String, ObservedGroup> {
    let mut groups: BTreeMap<String, ObservedGroup> = BTreeMap::new();

    for entry in entries {
        let Some((basename, extension)) = split_key(&entry.key) else {
            continue;
        };
        let Some(kind) = extensions.kind_of(extension) else {
            continue;
        };
        groups
            .entry(basename.to_string())
            .or_default()
            .record(kind, &entry.key);
    }

    groups
}

/// Find the first complete group in a location's listing
///
/// Returns `None` when no basename has exactly the required extension set.
pub fn find_complete_group(
    location: &str,
    entries: &[ObjectEntry],
    extensions: &AssetExtensions,
) -> Option<AssetGroup> {
    let groups = group_by_basename(entries, extensions);

    for (basename, observed) in groups {
        if !observed.is_complete() {
            tracing::debug!(
                location,
                basename = %basename,
                missing = ?observed.missing(),
                "incomplete group"
            );
            continue;
        }
        let keys = observed.into_keys()?;
        return Some(AssetGroup {
            location: location.to_string(),
            basename,
            keys,
        });
    }

    None
}
