//! Directory listing engine.
//!
//! Loads are split into [`ListingEngine::begin`] and
//! [`ListingEngine::finish`] so the fetch itself can run without holding the
//! engine. Every `begin` issues a new token and only the outcome carrying
//! the latest token is applied; older in-flight responses are dropped.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::entry::{Entry, Listing};
use crate::errors::{ExplorerError, StorageError};
use crate::session::Session;
use crate::storage::{normalize_path, Storage};

/// Identifies one issued load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    token: u64,
    path: String,
}

/// A fetch that has been issued but not yet run.
pub struct PendingLoad {
    ticket: LoadTicket,
    storage: Arc<dyn Storage>,
    base_url: String,
}

/// The result of running a [`PendingLoad`].
#[derive(Debug)]
pub struct LoadOutcome {
    ticket: LoadTicket,
    result: Result<Vec<Entry>, StorageError>,
}

impl PendingLoad {
    /// Fetch and map the directory contents.
    pub async fn run(self) -> LoadOutcome {
        let result = self
            .storage
            .list_directory(&self.ticket.path)
            .await
            .map(|raw| {
                raw.into_iter()
                    .map(|r| Entry::from_raw(r, &self.base_url))
                    .collect()
            });
        LoadOutcome {
            ticket: self.ticket,
            result,
        }
    }
}

/// Owns the current [`Listing`]. The single writer for it.
#[derive(Debug, Default)]
pub struct ListingEngine {
    listing: Listing,
    latest: u64,
}

impl ListingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listing(&self) -> &Listing {
        &self.listing
    }

    pub fn current_path(&self) -> &str {
        &self.listing.path
    }

    /// Issue a load for `path`, replacing the listing with a loading one.
    ///
    /// Fails without touching state when the session is not connected.
    pub fn begin(&mut self, session: &Session, path: &str) -> Result<PendingLoad, ExplorerError> {
        let (storage, base_url) = session.handle()?;
        let path = normalize_path(path);

        self.latest += 1;
        self.listing = Listing::loading(path.clone());
        debug!("Loading {} (token {})", path, self.latest);

        Ok(PendingLoad {
            ticket: LoadTicket {
                token: self.latest,
                path,
            },
            storage,
            base_url,
        })
    }

    /// Apply an outcome if it belongs to the latest issued load.
    ///
    /// Returns `Some(result)` when applied, `None` when the outcome was
    /// stale and discarded.
    pub fn finish(&mut self, outcome: LoadOutcome) -> Option<Result<(), ExplorerError>> {
        let LoadOutcome { ticket, result } = outcome;
        if ticket.token != self.latest {
            debug!(
                "Discarding stale listing for {} (token {}, latest {})",
                ticket.path, ticket.token, self.latest
            );
            return None;
        }

        match result {
            Ok(entries) => {
                debug!("Loaded {} entries for {}", entries.len(), ticket.path);
                self.listing = Listing::ready(ticket.path, entries);
                Some(Ok(()))
            }
            Err(e) => {
                warn!("Listing {} failed: {}", ticket.path, e);
                let err = ExplorerError::ListingFailed;
                self.listing = Listing::failed(ticket.path, err.user_message());
                Some(Err(err))
            }
        }
    }

    /// Begin, run, and finish a load in one step.
    pub async fn load(&mut self, session: &Session, path: &str) -> Result<(), ExplorerError> {
        let pending = self.begin(session, path)?;
        let outcome = pending.run().await;
        self.finish(outcome).unwrap_or(Ok(()))
    }

    /// Forget the listing and invalidate anything in flight.
    pub fn clear(&mut self) {
        self.latest += 1;
        self.listing = Listing::default();
    }
}
