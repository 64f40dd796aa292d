//! Entry and listing model.
//!
//! Entries are immutable snapshots. A refresh discards the whole listing and
//! builds a new one; nothing is patched in place.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::storage::{EntryKind, RawEntry};

/// One remote file or directory, with URLs derived from the session base URL.
///
/// Serialized as camelCase for the frontend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub name: String,
    /// Absolute path from the storage root.
    pub path: String,
    pub kind: EntryKind,
    /// `baseUrl + path`; also the identity used by preview navigation.
    pub resource_url: String,
    /// Server-generated thumbnail location.
    pub thumbnail_url: String,
    /// Server-generated compressed (video) rendition location.
    pub compressed_url: String,
    pub modified_at: DateTime<Utc>,
    pub size: u64,
}

impl Entry {
    pub fn from_raw(raw: RawEntry, base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            resource_url: format!("{base}{}", raw.path),
            thumbnail_url: format!("{base}/.thumbnails{}.thumb.jpg", raw.path),
            compressed_url: format!("{base}/.compressed{}", raw.path),
            name: raw.name,
            path: raw.path,
            kind: raw.kind,
            modified_at: raw.modified,
            size: raw.size,
        }
    }

    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Where "open externally" and downloads point.
    pub fn download_url(&self) -> &str {
        &self.resource_url
    }

    /// Dot-prefixed names, such as the server's derivative folders.
    pub fn is_hidden(&self) -> bool {
        self.name.starts_with('.')
    }
}

/// Fetch status of a [`Listing`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "camelCase")]
pub enum ListingStatus {
    Idle,
    Loading,
    Ready,
    Error(String),
}

/// All entries of one directory plus their fetch status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub path: String,
    pub status: ListingStatus,
    pub entries: Vec<Entry>,
}

impl Default for Listing {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            status: ListingStatus::Idle,
            entries: Vec::new(),
        }
    }
}

impl Listing {
    pub fn loading(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            status: ListingStatus::Loading,
            entries: Vec::new(),
        }
    }

    pub fn ready(path: impl Into<String>, entries: Vec<Entry>) -> Self {
        Self {
            path: path.into(),
            status: ListingStatus::Ready,
            entries,
        }
    }

    pub fn failed(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            status: ListingStatus::Error(message.into()),
            entries: Vec::new(),
        }
    }

    pub fn find(&self, path: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.path == path)
    }
}
