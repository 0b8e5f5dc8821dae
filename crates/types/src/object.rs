//! Object descriptors and entity tags

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A stored entity tag, normalized for comparison.
///
/// Backends quote the tag in listing and HEAD responses
/// (`"d41d8cd98f00b204e9800998ecf8427e"`); the surrounding quotes are
/// stripped at construction so comparisons are exact string matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityTag(String);

impl EntityTag {
    /// Create a tag from the raw wire value, stripping surrounding quotes.
    #[must_use]
    pub fn new(raw: &str) -> Self {
        Self(raw.trim_matches('"').to_string())
    }

    /// The normalized tag value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The multipart part count baked into the tag, if present.
    ///
    /// Multipart uploads leave a `-<part_count>` suffix on the tag
    /// (`"9bb58f26192e4ba00f01e2e7b136bbd8-3"`). A plain whole-object tag
    /// has no suffix and yields `None`.
    #[must_use]
    pub fn part_suffix(&self) -> Option<u32> {
        let (_, suffix) = self.0.rsplit_once('-')?;
        suffix.parse().ok()
    }
}

impl fmt::Display for EntityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One object as enumerated from a bucket listing.
///
/// Immutable once produced; uniquely identified by `key` within a single
/// sweep's listing snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectDescriptor {
    /// Object key within the bucket
    pub key: String,
    /// Declared content size in bytes
    pub size_bytes: u64,
    /// Entity tag recorded by the backend at upload time
    pub stored_tag: EntityTag,
    /// Part count, when the backend exposes it (listings usually do not)
    pub part_count: Option<u32>,
    /// Last modification timestamp, when the backend provides one
    pub last_modified: Option<DateTime<Utc>>,
}

impl ObjectDescriptor {
    /// Whether this key is a zero-byte "directory" placeholder some
    /// consoles create (`photos/` with no content).
    #[must_use]
    pub fn is_directory_placeholder(&self) -> bool {
        self.size_bytes == 0 && self.key.ends_with('/')
    }
}
