//! Durable storage of the last successfully connected URL.
//!
//! One key, read at startup, written on connect, removed on disconnect.
//! Persistence failures are logged and never fail the surrounding operation.

use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::config_dir;

/// Durable local state holding the last connected URL.
pub trait UrlStore: Send + Sync {
    fn load(&self) -> Option<String>;
    fn save(&self, url: &str);
    fn clear(&self);
}

/// Contents of `state.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_url: Option<String>,
}

/// [`UrlStore`] backed by a JSON file.
pub struct FileUrlStore {
    path: PathBuf,
}

impl FileUrlStore {
    /// Store at the default location: `<config dir>/state.json`.
    pub fn new() -> Self {
        Self::at(config_dir().join("state.json"))
    }

    /// Store at a specific path (for testing).
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_state(&self) -> PersistedState {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => match serde_json::from_str::<PersistedState>(&contents) {
                Ok(state) => state,
                Err(e) => {
                    warn!("Failed to parse state from {}: {}", self.path.display(), e);
                    PersistedState::default()
                }
            },
            Err(_) => {
                debug!("No state file at {}", self.path.display());
                PersistedState::default()
            }
        }
    }

    fn write_state(&self, state: &PersistedState) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!(
                    "Failed to create state directory {}: {}",
                    parent.display(),
                    e
                );
                return;
            }
        }
        match serde_json::to_string_pretty(state) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&self.path, json) {
                    warn!("Failed to write state to {}: {}", self.path.display(), e);
                }
            }
            Err(e) => warn!("Failed to serialize state: {}", e),
        }
    }
}

impl Default for FileUrlStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UrlStore for FileUrlStore {
    fn load(&self) -> Option<String> {
        self.read_state().last_url
    }

    fn save(&self, url: &str) {
        self.write_state(&PersistedState {
            last_url: Some(url.to_string()),
        });
    }

    fn clear(&self) {
        if !self.path.exists() {
            return;
        }
        self.write_state(&PersistedState::default());
    }
}

/// In-process [`UrlStore`].
#[derive(Debug, Default)]
pub struct MemoryUrlStore {
    url: Mutex<Option<String>>,
}

impl MemoryUrlStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: Mutex::new(Some(url.into())),
        }
    }
}

impl UrlStore for MemoryUrlStore {
    fn load(&self) -> Option<String> {
        self.url.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn save(&self, url: &str) {
        *self.url.lock().unwrap_or_else(|e| e.into_inner()) = Some(url.to_string());
    }

    fn clear(&self) {
        *self.url.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }
}
