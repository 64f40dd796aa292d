//! Remote storage capability.
//!
//! A [`Storage`] is the handle to one connected server: list, read, write,
//! mkdir, delete against absolute paths. A [`StorageConnector`] turns a
//! connection URL into such a handle. The explorer never looks behind these
//! traits; every error they return is treated as "operation failed".

pub mod local;
pub mod memory;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::StorageError;

/// Whether an entry is a directory or a regular file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntryKind {
    Directory,
    File,
}

/// One object as reported by a storage listing, before URL derivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub name: String,
    /// Absolute path from the storage root, always starting with `/`.
    pub path: String,
    pub kind: EntryKind,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

/// How file contents should be returned by [`Storage::read_file`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadFormat {
    Binary,
    Text,
}

/// File contents in the requested [`ReadFormat`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContents {
    Binary(Vec<u8>),
    Text(String),
}

impl FileContents {
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Binary(data) => data,
            Self::Text(text) => text.into_bytes(),
        }
    }

    /// Text view of the contents; invalid UTF-8 is replaced.
    pub fn into_text(self) -> String {
        match self {
            Self::Binary(data) => String::from_utf8_lossy(&data).into_owned(),
            Self::Text(text) => text,
        }
    }
}

/// Async storage capability for one connected server.
///
/// Uses `#[async_trait]` so handles can be shared as `Arc<dyn Storage>`.
#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// List the direct children of the directory at `path`.
    async fn list_directory(&self, path: &str) -> Result<Vec<RawEntry>, StorageError>;

    /// Read a file's contents.
    async fn read_file(&self, path: &str, format: ReadFormat)
        -> Result<FileContents, StorageError>;

    /// Write a file. With `overwrite == false` an existing file is an error.
    async fn write_file(&self, path: &str, data: &[u8], overwrite: bool)
        -> Result<(), StorageError>;

    /// Create a directory. The parent must exist.
    async fn make_directory(&self, path: &str) -> Result<(), StorageError>;

    /// Delete a file, or a directory together with its contents.
    async fn delete_entry(&self, path: &str) -> Result<(), StorageError>;
}

/// Builds storage handles from connection URLs.
pub trait StorageConnector: Send + Sync {
    /// Whether this connector understands the URL's scheme.
    fn supports(&self, url: &str) -> bool;

    /// Construct a handle for `url`. No network traffic is implied; the
    /// session probes the handle separately.
    fn open(&self, url: &str) -> Result<Arc<dyn Storage>, StorageError>;
}

/// Dispatches to the first registered connector that supports a URL.
#[derive(Default)]
pub struct ConnectorSet {
    connectors: Vec<Box<dyn StorageConnector>>,
}

impl ConnectorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connector. Earlier registrations take precedence.
    pub fn with(mut self, connector: impl StorageConnector + 'static) -> Self {
        self.connectors.push(Box::new(connector));
        self
    }
}

impl StorageConnector for ConnectorSet {
    fn supports(&self, url: &str) -> bool {
        self.connectors.iter().any(|c| c.supports(url))
    }

    fn open(&self, url: &str) -> Result<Arc<dyn Storage>, StorageError> {
        self.connectors
            .iter()
            .find(|c| c.supports(url))
            .ok_or_else(|| StorageError::InvalidUrl(url.to_string()))?
            .open(url)
    }
}

/// Normalize a remote path: leading `/`, no empty segments, no trailing `/`.
pub fn normalize_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

/// Join a child name onto a directory path with a single `/`.
pub fn join_path(dir: &str, name: &str) -> String {
    if dir.ends_with('/') {
        format!("{dir}{name}")
    } else {
        format!("{dir}/{name}")
    }
}

/// Parent directory of a normalized path; `None` for the root.
pub fn parent_path(path: &str) -> Option<String> {
    let normalized = normalize_path(path);
    if normalized == "/" {
        return None;
    }
    match normalized.rfind('/') {
        Some(0) => Some("/".to_string()),
        Some(idx) => Some(normalized[..idx].to_string()),
        None => None,
    }
}

/// Last segment of a path, or an empty string for the root.
pub fn file_name(path: &str) -> &str {
    path.trim_end_matches('/').rsplit('/').next().unwrap_or_default()
}
