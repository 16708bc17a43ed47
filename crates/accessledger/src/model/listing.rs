//! Directory listing entries.

use std::fs::Metadata;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One child of a listed directory.
///
/// Keys are serialised in `PascalCase` (`Name`, `Directory`, `Size`, `Date`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListingEntry {
    /// File name.
    pub name: String,
    /// Entry is a directory.
    pub directory: bool,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time.
    pub date: DateTime<Utc>,
}

impl ListingEntry {
    /// Build an entry from filesystem metadata.
    ///
    /// Platforms without modification times report the Unix epoch.
    #[must_use]
    pub fn from_metadata(name: impl Into<String>, metadata: &Metadata) -> Self {
        Self {
            name: name.into(),
            directory: metadata.is_dir(),
            size: metadata.len(),
            date: metadata
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_default(),
        }
    }
}
