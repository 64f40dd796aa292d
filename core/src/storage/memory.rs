//! In-process storage tree served under `mem://` URLs.
//!
//! Used by the agent for demos and by tests. Subtrees can be marked as
//! denied, after which every operation touching them fails with
//! [`StorageError::PermissionDenied`].

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use super::{
    file_name, normalize_path, parent_path, EntryKind, FileContents, RawEntry, ReadFormat,
    Storage, StorageConnector,
};
use crate::errors::StorageError;

const SCHEME: &str = "mem://";

#[derive(Debug, Clone)]
struct Node {
    kind: EntryKind,
    data: Vec<u8>,
    modified: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Tree {
    nodes: BTreeMap<String, Node>,
    denied: HashSet<String>,
}

impl Tree {
    fn is_denied(&self, path: &str) -> bool {
        self.denied
            .iter()
            .any(|d| d == "/" || path == d || path.starts_with(&format!("{d}/")))
    }

    fn check(&self, path: &str) -> Result<(), StorageError> {
        if self.is_denied(path) {
            Err(StorageError::PermissionDenied(path.to_string()))
        } else {
            Ok(())
        }
    }

    fn is_dir(&self, path: &str) -> bool {
        path == "/"
            || self
                .nodes
                .get(path)
                .is_some_and(|n| n.kind == EntryKind::Directory)
    }

    fn require_parent_dir(&self, path: &str) -> Result<(), StorageError> {
        let parent = parent_path(path).unwrap_or_else(|| "/".to_string());
        if self.is_dir(&parent) {
            Ok(())
        } else {
            Err(StorageError::NotFound(parent))
        }
    }
}

/// A directory tree held in memory.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    tree: Mutex<Tree>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tree> {
        // A poisoned tree is still structurally valid; keep serving it.
        self.tree.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Insert a file (creating missing parent directories) with an explicit
    /// modification time.
    pub fn insert_file(&self, path: &str, data: impl Into<Vec<u8>>, modified: DateTime<Utc>) {
        let path = normalize_path(path);
        let mut tree = self.lock();
        insert_parents(&mut tree, &path, modified);
        tree.nodes.insert(
            path,
            Node {
                kind: EntryKind::File,
                data: data.into(),
                modified,
            },
        );
    }

    /// Insert a directory (creating missing parents).
    pub fn insert_dir(&self, path: &str, modified: DateTime<Utc>) {
        let path = normalize_path(path);
        if path == "/" {
            return;
        }
        let mut tree = self.lock();
        insert_parents(&mut tree, &path, modified);
        tree.nodes.insert(
            path,
            Node {
                kind: EntryKind::Directory,
                data: Vec::new(),
                modified,
            },
        );
    }

    /// Deny every operation on `path` and everything below it.
    pub fn deny(&self, path: &str) {
        self.lock().denied.insert(normalize_path(path));
    }

    /// Lift a previous [`deny`](Self::deny).
    pub fn allow(&self, path: &str) {
        self.lock().denied.remove(&normalize_path(path));
    }

    /// Whether a file or directory exists at `path`.
    pub fn exists(&self, path: &str) -> bool {
        let path = normalize_path(path);
        path == "/" || self.lock().nodes.contains_key(&path)
    }
}

fn insert_parents(tree: &mut Tree, path: &str, modified: DateTime<Utc>) {
    let mut current = parent_path(path);
    while let Some(dir) = current {
        if dir == "/" {
            break;
        }
        tree.nodes.entry(dir.clone()).or_insert(Node {
            kind: EntryKind::Directory,
            data: Vec::new(),
            modified,
        });
        current = parent_path(&dir);
    }
}

#[async_trait::async_trait]
impl Storage for MemoryStorage {
    async fn list_directory(&self, path: &str) -> Result<Vec<RawEntry>, StorageError> {
        let path = normalize_path(path);
        let tree = self.lock();
        tree.check(&path)?;
        if !tree.is_dir(&path) {
            return Err(StorageError::NotFound(path));
        }

        let entries = tree
            .nodes
            .iter()
            .filter(|(p, _)| parent_path(p).as_deref() == Some(path.as_str()))
            .map(|(p, node)| RawEntry {
                name: file_name(p).to_string(),
                path: p.clone(),
                kind: node.kind,
                size: node.data.len() as u64,
                modified: node.modified,
            })
            .collect();
        Ok(entries)
    }

    async fn read_file(
        &self,
        path: &str,
        format: ReadFormat,
    ) -> Result<FileContents, StorageError> {
        let path = normalize_path(path);
        let tree = self.lock();
        tree.check(&path)?;
        let node = tree
            .nodes
            .get(&path)
            .filter(|n| n.kind == EntryKind::File)
            .ok_or_else(|| StorageError::NotFound(path.clone()))?;

        Ok(match format {
            ReadFormat::Binary => FileContents::Binary(node.data.clone()),
            ReadFormat::Text => {
                FileContents::Text(String::from_utf8_lossy(&node.data).into_owned())
            }
        })
    }

    async fn write_file(
        &self,
        path: &str,
        data: &[u8],
        overwrite: bool,
    ) -> Result<(), StorageError> {
        let path = normalize_path(path);
        let mut tree = self.lock();
        tree.check(&path)?;
        tree.require_parent_dir(&path)?;

        match tree.nodes.get(&path) {
            Some(node) if node.kind == EntryKind::Directory => {
                return Err(StorageError::OperationFailed(format!(
                    "{path}: is a directory"
                )));
            }
            Some(_) if !overwrite => return Err(StorageError::AlreadyExists(path)),
            _ => {}
        }

        tree.nodes.insert(
            path,
            Node {
                kind: EntryKind::File,
                data: data.to_vec(),
                modified: Utc::now(),
            },
        );
        Ok(())
    }

    async fn make_directory(&self, path: &str) -> Result<(), StorageError> {
        let path = normalize_path(path);
        let mut tree = self.lock();
        tree.check(&path)?;
        if path == "/" || tree.nodes.contains_key(&path) {
            return Err(StorageError::AlreadyExists(path));
        }
        tree.require_parent_dir(&path)?;

        tree.nodes.insert(
            path,
            Node {
                kind: EntryKind::Directory,
                data: Vec::new(),
                modified: Utc::now(),
            },
        );
        Ok(())
    }

    async fn delete_entry(&self, path: &str) -> Result<(), StorageError> {
        let path = normalize_path(path);
        let mut tree = self.lock();
        tree.check(&path)?;
        if path == "/" {
            return Err(StorageError::PermissionDenied(path));
        }
        if tree.nodes.remove(&path).is_none() {
            return Err(StorageError::NotFound(path));
        }

        let prefix = format!("{path}/");
        tree.nodes.retain(|p, _| !p.starts_with(&prefix));
        Ok(())
    }
}

/// Opens [`MemoryStorage`] trees for `mem://<name>` URLs.
///
/// The same name always yields the same tree for the connector's lifetime,
/// so disconnecting and reconnecting sees earlier writes.
#[derive(Default)]
pub struct MemoryConnector {
    trees: Mutex<HashMap<String, Arc<MemoryStorage>>>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get (or create) the tree served for `url`.
    pub fn tree(&self, url: &str) -> Option<Arc<MemoryStorage>> {
        let name = url.strip_prefix(SCHEME)?.trim_end_matches('/');
        let mut trees = self.trees.lock().unwrap_or_else(|e| e.into_inner());
        Some(Arc::clone(trees.entry(name.to_string()).or_default()))
    }
}

impl StorageConnector for MemoryConnector {
    fn supports(&self, url: &str) -> bool {
        url.starts_with(SCHEME)
    }

    fn open(&self, url: &str) -> Result<Arc<dyn Storage>, StorageError> {
        let tree = self
            .tree(url)
            .ok_or_else(|| StorageError::InvalidUrl(url.to_string()))?;
        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[tokio::test]
    async fn list_returns_direct_children_only() {
        let storage = MemoryStorage::new();
        storage.insert_file("/docs/a.txt", "a", at(100));
        storage.insert_file("/docs/deep/b.txt", "b", at(200));
        storage.insert_file("/top.txt", "t", at(300));

        let mut root = storage.list_directory("/").await.unwrap();
        root.sort_by(|a, b| a.path.cmp(&b.path));
        let paths: Vec<&str> = root.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["/docs", "/top.txt"]);
        assert_eq!(root[0].kind, EntryKind::Directory);

        let docs = storage.list_directory("/docs").await.unwrap();
        assert_eq!(docs.len(), 2);
        let a = docs.iter().find(|e| e.name == "a.txt").unwrap();
        assert_eq!(a.modified, at(100));
        assert_eq!(a.size, 1);
    }

    #[tokio::test]
    async fn list_of_file_is_not_found() {
        let storage = MemoryStorage::new();
        storage.insert_file("/a.txt", "a", at(1));
        assert!(matches!(
            storage.list_directory("/a.txt").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn write_requires_existing_parent() {
        let storage = MemoryStorage::new();
        let err = storage
            .write_file("/missing/a.txt", b"x", true)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(p) if p == "/missing"));
    }

    #[tokio::test]
    async fn mkdir_then_delete_recursively() {
        let storage = MemoryStorage::new();
        storage.make_directory("/docs").await.unwrap();
        storage.write_file("/docs/a.txt", b"x", true).await.unwrap();
        assert!(storage.exists("/docs/a.txt"));

        storage.delete_entry("/docs").await.unwrap();
        assert!(!storage.exists("/docs"));
        assert!(!storage.exists("/docs/a.txt"));
    }

    #[tokio::test]
    async fn denied_subtree_fails_every_operation() {
        let storage = MemoryStorage::new();
        storage.insert_file("/locked/a.txt", "a", at(1));
        storage.insert_file("/open/b.txt", "b", at(1));
        storage.deny("/locked");

        assert!(matches!(
            storage.list_directory("/locked").await,
            Err(StorageError::PermissionDenied(_))
        ));
        assert!(matches!(
            storage.delete_entry("/locked/a.txt").await,
            Err(StorageError::PermissionDenied(_))
        ));
        assert!(storage.list_directory("/open").await.is_ok());

        storage.allow("/locked");
        assert!(storage.list_directory("/locked").await.is_ok());
    }

    #[tokio::test]
    async fn connector_reuses_tree_per_name() {
        let connector = MemoryConnector::new();
        let first = connector.open("mem://demo").unwrap();
        first.make_directory("/docs").await.unwrap();

        let second = connector.open("mem://demo/").unwrap();
        let listed = second.list_directory("/").await.unwrap();
        assert_eq!(listed.len(), 1);

        let other = connector.open("mem://other").unwrap();
        assert!(other.list_directory("/").await.unwrap().is_empty());
    }
}
