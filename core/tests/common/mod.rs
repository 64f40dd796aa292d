//! Shared test utilities for davshelf core integration tests.
//!
//! [`ScriptedStorage`] wraps the in-memory tree with call recording, write
//! failure injection and per-path listing gates, so tests can hold a
//! listing response in flight and release it later.

// Each integration test is compiled as its own crate, so not every test file
// uses every function from this shared module. Suppress dead_code warnings.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::Semaphore;

use davshelf_core::errors::StorageError;
use davshelf_core::storage::memory::MemoryStorage;
use davshelf_core::storage::{FileContents, RawEntry, ReadFormat, Storage, StorageConnector};

pub const URL: &str = "script://shelf";

/// Timestamp `secs` seconds after the epoch.
pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

#[derive(Default)]
struct Script {
    calls: Vec<String>,
    gates: HashMap<String, Arc<Semaphore>>,
    writes: usize,
    fail_writes_from: Option<usize>,
}

/// In-memory storage whose behavior tests can script.
#[derive(Default)]
pub struct ScriptedStorage {
    pub tree: MemoryStorage,
    script: Mutex<Script>,
}

impl ScriptedStorage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Hold listings of `path` until [`release`](Self::release) is called.
    pub fn gate(&self, path: &str) {
        self.script
            .lock()
            .unwrap()
            .gates
            .insert(path.to_string(), Arc::new(Semaphore::new(0)));
    }

    /// Let one held listing of `path` proceed.
    pub fn release(&self, path: &str) {
        if let Some(gate) = self.script.lock().unwrap().gates.get(path) {
            gate.add_permits(1);
        }
    }

    /// Fail every write starting with the `n`th (zero-based).
    pub fn fail_writes_from(&self, n: usize) {
        self.script.lock().unwrap().fail_writes_from = Some(n);
    }

    /// Operations seen so far, as `"<op> <path>"`.
    pub fn calls(&self) -> Vec<String> {
        self.script.lock().unwrap().calls.clone()
    }

    fn record(&self, op: &str, path: &str) {
        self.script
            .lock()
            .unwrap()
            .calls
            .push(format!("{op} {path}"));
    }
}

#[async_trait]
impl Storage for ScriptedStorage {
    async fn list_directory(&self, path: &str) -> Result<Vec<RawEntry>, StorageError> {
        self.record("list", path);
        let gate = self.script.lock().unwrap().gates.get(path).cloned();
        if let Some(gate) = gate {
            gate.acquire().await.unwrap().forget();
        }
        self.tree.list_directory(path).await
    }

    async fn read_file(&self, path: &str, format: ReadFormat) -> Result<FileContents, StorageError> {
        self.record("read", path);
        self.tree.read_file(path, format).await
    }

    async fn write_file(&self, path: &str, data: &[u8], overwrite: bool) -> Result<(), StorageError> {
        self.record("write", path);
        let failing = {
            let mut script = self.script.lock().unwrap();
            let index = script.writes;
            script.writes += 1;
            script.fail_writes_from.is_some_and(|n| index >= n)
        };
        if failing {
            return Err(StorageError::OperationFailed(format!("scripted failure: {path}")));
        }
        self.tree.write_file(path, data, overwrite).await
    }

    async fn make_directory(&self, path: &str) -> Result<(), StorageError> {
        self.record("mkdir", path);
        self.tree.make_directory(path).await
    }

    async fn delete_entry(&self, path: &str) -> Result<(), StorageError> {
        self.record("delete", path);
        self.tree.delete_entry(path).await
    }
}

/// Serves one shared [`ScriptedStorage`] for `script://` URLs.
pub struct ScriptedConnector {
    pub storage: Arc<ScriptedStorage>,
}

impl StorageConnector for ScriptedConnector {
    fn supports(&self, url: &str) -> bool {
        url.starts_with("script://")
    }

    fn open(&self, url: &str) -> Result<Arc<dyn Storage>, StorageError> {
        if !self.supports(url) {
            return Err(StorageError::InvalidUrl(url.to_string()));
        }
        Ok(self.storage.clone())
    }
}
