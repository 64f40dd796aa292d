//! Connection lifecycle.
//!
//! A [`Session`] holds at most one storage capability. It only becomes
//! `Connected` after a listing probe of `/` succeeds, and the capability is
//! present exactly when the status is `Connected`.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::errors::ExplorerError;
use crate::persistence::UrlStore;
use crate::storage::{Storage, StorageConnector};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    Disconnected,
    Connecting,
    Connected,
}

/// The single active connection.
pub struct Session {
    status: SessionStatus,
    capability: Option<Arc<dyn Storage>>,
    base_url: Option<String>,
    connector: Arc<dyn StorageConnector>,
    store: Arc<dyn UrlStore>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("status", &self.status)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(connector: Arc<dyn StorageConnector>, store: Arc<dyn UrlStore>) -> Self {
        Self {
            status: SessionStatus::Disconnected,
            capability: None,
            base_url: None,
            connector,
            store,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_connected(&self) -> bool {
        self.status == SessionStatus::Connected
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// The connected capability and its base URL.
    pub fn handle(&self) -> Result<(Arc<dyn Storage>, String), ExplorerError> {
        match (&self.capability, &self.base_url) {
            (Some(storage), Some(base)) if self.is_connected() => {
                Ok((Arc::clone(storage), base.clone()))
            }
            _ => Err(ExplorerError::NotConnected),
        }
    }

    /// Connect to `url`, probing the root listing.
    ///
    /// On success the URL is persisted. On failure the session ends up
    /// disconnected, any previous connection is dropped, and nothing is
    /// persisted.
    pub async fn connect(&mut self, url: &str) -> Result<(), ExplorerError> {
        let url = url.trim();
        self.status = SessionStatus::Connecting;
        self.capability = None;
        self.base_url = None;

        let storage = match self.connector.open(url) {
            Ok(storage) => storage,
            Err(e) => {
                warn!("Cannot open storage for {}: {}", url, e);
                self.status = SessionStatus::Disconnected;
                return Err(ExplorerError::ConnectionFailed);
            }
        };

        if let Err(e) = storage.list_directory("/").await {
            warn!("Connection probe against {} failed: {}", url, e);
            self.status = SessionStatus::Disconnected;
            return Err(ExplorerError::ConnectionFailed);
        }

        self.capability = Some(storage);
        self.base_url = Some(url.to_string());
        self.status = SessionStatus::Connected;
        self.store.save(url);
        info!("Connected to {}", url);
        Ok(())
    }

    /// Drop the connection and forget the persisted URL. Idempotent.
    pub fn disconnect(&mut self) {
        if self.is_connected() {
            info!("Disconnected from {}", self.base_url.as_deref().unwrap_or_default());
        }
        self.capability = None;
        self.base_url = None;
        self.status = SessionStatus::Disconnected;
        self.store.clear();
    }

    /// Reconnect to the persisted URL, if any.
    ///
    /// Returns `false` when nothing was persisted or the reconnect failed;
    /// failures are logged only.
    pub async fn restore(&mut self) -> bool {
        let Some(url) = self.store.load() else {
            return false;
        };
        match self.connect(&url).await {
            Ok(()) => true,
            Err(_) => {
                warn!("Automatic reconnect to {} failed", url);
                false
            }
        }
    }
}
