//! Storage backed by a directory on the local filesystem (`file://` URLs).

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::{
    join_path, normalize_path, EntryKind, FileContents, RawEntry, ReadFormat, Storage,
    StorageConnector,
};
use crate::errors::StorageError;

const SCHEME: &str = "file://";

/// Serves remote paths from a local root directory.
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a remote absolute path onto the local root.
    ///
    /// `..` components are rejected so nothing outside the root is reachable.
    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let relative = normalize_path(path);
        let relative = relative.trim_start_matches('/');
        let mut resolved = self.root.clone();
        for component in Path::new(relative).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                _ => return Err(StorageError::PermissionDenied(path.to_string())),
            }
        }
        Ok(resolved)
    }
}

#[async_trait::async_trait]
impl Storage for LocalStorage {
    async fn list_directory(&self, path: &str) -> Result<Vec<RawEntry>, StorageError> {
        let dir = self.resolve(path)?;
        let remote = normalize_path(path);
        tokio::task::spawn_blocking(move || list_dir_sync(&dir, &remote))
            .await
            .map_err(|e| StorageError::OperationFailed(e.to_string()))?
    }

    async fn read_file(
        &self,
        path: &str,
        format: ReadFormat,
    ) -> Result<FileContents, StorageError> {
        let local = self.resolve(path)?;
        let remote = path.to_string();
        let data = tokio::task::spawn_blocking(move || {
            std::fs::read(&local).map_err(|e| map_io_error(e, &remote))
        })
        .await
        .map_err(|e| StorageError::OperationFailed(e.to_string()))??;

        Ok(match format {
            ReadFormat::Binary => FileContents::Binary(data),
            ReadFormat::Text => FileContents::Text(String::from_utf8_lossy(&data).into_owned()),
        })
    }

    async fn write_file(
        &self,
        path: &str,
        data: &[u8],
        overwrite: bool,
    ) -> Result<(), StorageError> {
        let local = self.resolve(path)?;
        let remote = path.to_string();
        let data = data.to_vec();
        tokio::task::spawn_blocking(move || {
            if local.is_dir() {
                return Err(StorageError::OperationFailed(format!(
                    "{remote}: is a directory"
                )));
            }
            if !overwrite && local.exists() {
                return Err(StorageError::AlreadyExists(remote));
            }
            std::fs::write(&local, &data).map_err(|e| map_io_error(e, &remote))
        })
        .await
        .map_err(|e| StorageError::OperationFailed(e.to_string()))?
    }

    async fn make_directory(&self, path: &str) -> Result<(), StorageError> {
        let local = self.resolve(path)?;
        let remote = path.to_string();
        tokio::task::spawn_blocking(move || {
            std::fs::create_dir(&local).map_err(|e| map_io_error(e, &remote))
        })
        .await
        .map_err(|e| StorageError::OperationFailed(e.to_string()))?
    }

    async fn delete_entry(&self, path: &str) -> Result<(), StorageError> {
        let local = self.resolve(path)?;
        if local == self.root {
            return Err(StorageError::PermissionDenied(path.to_string()));
        }
        let remote = path.to_string();
        tokio::task::spawn_blocking(move || {
            let metadata = std::fs::metadata(&local).map_err(|e| map_io_error(e, &remote))?;
            if metadata.is_dir() {
                std::fs::remove_dir_all(&local).map_err(|e| map_io_error(e, &remote))
            } else {
                std::fs::remove_file(&local).map_err(|e| map_io_error(e, &remote))
            }
        })
        .await
        .map_err(|e| StorageError::OperationFailed(e.to_string()))?
    }
}

/// Opens [`LocalStorage`] handles for `file:///absolute/root` URLs.
pub struct LocalConnector;

impl StorageConnector for LocalConnector {
    fn supports(&self, url: &str) -> bool {
        url.starts_with(SCHEME)
    }

    fn open(&self, url: &str) -> Result<Arc<dyn Storage>, StorageError> {
        let root = url
            .strip_prefix(SCHEME)
            .filter(|rest| rest.starts_with('/'))
            .ok_or_else(|| StorageError::InvalidUrl(url.to_string()))?;
        Ok(Arc::new(LocalStorage::new(root)))
    }
}

/// Map `std::io::Error` to `StorageError` based on error kind.
fn map_io_error(e: std::io::Error, path: &str) -> StorageError {
    match e.kind() {
        std::io::ErrorKind::NotFound => StorageError::NotFound(path.to_string()),
        std::io::ErrorKind::PermissionDenied => StorageError::PermissionDenied(path.to_string()),
        std::io::ErrorKind::AlreadyExists => StorageError::AlreadyExists(path.to_string()),
        _ => StorageError::OperationFailed(format!("{}: {}", path, e)),
    }
}

fn list_dir_sync(dir: &Path, remote: &str) -> Result<Vec<RawEntry>, StorageError> {
    let entries = std::fs::read_dir(dir).map_err(|e| map_io_error(e, remote))?;

    let mut result = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| map_io_error(e, remote))?;
        let name = entry.file_name().to_string_lossy().to_string();
        let metadata = entry.metadata().map_err(|e| map_io_error(e, remote))?;

        let kind = if metadata.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };
        let size = if metadata.is_dir() { 0 } else { metadata.len() };
        let modified = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_default();

        result.push(RawEntry {
            path: join_path(remote, &name),
            name,
            kind,
            size,
            modified,
        });
    }

    Ok(result)
}
