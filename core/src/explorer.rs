//! Root composition of the browsing context.
//!
//! [`Explorer`] owns the session, the listing, the sorted view, the pending
//! file operations and the preview. It is the only writer for all of them;
//! hosts send intents through its methods and read state back through its
//! accessors.

use std::sync::Arc;

use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use crate::config::ExplorerConfig;
use crate::editor::{SaveEvent, SaveEventSender, TextEditor};
use crate::entry::{Entry, Listing};
use crate::errors::ExplorerError;
use crate::listing::{ListingEngine, LoadOutcome, PendingLoad};
use crate::location::Location;
use crate::operations::FileOperations;
use crate::persistence::UrlStore;
use crate::preview::{MediaKind, PrefetchRequest, PreviewContent, PreviewNavigator};
use crate::reveal::ScrollMetrics;
use crate::session::{Session, SessionStatus};
use crate::sort::{SortField, SortOrder, SortSpec};
use crate::storage::{parent_path, StorageConnector};
use crate::upload::{UploadBatch, UploadFile, UploadProgress};
use crate::view::ListingView;

pub struct Explorer {
    config: ExplorerConfig,
    session: Session,
    listing: ListingEngine,
    view: ListingView,
    operations: FileOperations,
    preview: PreviewNavigator,
    editor: Option<TextEditor>,
    save_events: Option<SaveEventSender>,
}

impl Explorer {
    pub fn new(
        config: ExplorerConfig,
        connector: Arc<dyn StorageConnector>,
        store: Arc<dyn UrlStore>,
    ) -> Self {
        Self {
            session: Session::new(connector, store),
            listing: ListingEngine::new(),
            view: ListingView::new(&config),
            operations: FileOperations::new(),
            preview: PreviewNavigator::new(config.prefetch_radius),
            editor: None,
            save_events: None,
            config,
        }
    }

    /// Use a seeded generator for random order.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.view = ListingView::with_rng(&self.config, rng);
        self
    }

    /// Report text save outcomes on `tx`.
    pub fn with_save_events(mut self, tx: SaveEventSender) -> Self {
        self.save_events = Some(tx);
        self
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    pub fn status(&self) -> SessionStatus {
        self.session.status()
    }

    pub fn base_url(&self) -> Option<&str> {
        self.session.base_url()
    }

    pub fn listing(&self) -> &Listing {
        self.listing.listing()
    }

    pub fn current_path(&self) -> &str {
        self.listing.current_path()
    }

    pub fn view(&self) -> &ListingView {
        &self.view
    }

    pub fn sort_spec(&self) -> SortSpec {
        self.view.spec()
    }

    pub fn operations(&self) -> &FileOperations {
        &self.operations
    }

    pub fn upload_batch(&self) -> &UploadBatch {
        self.operations.upload_batch()
    }

    pub fn preview(&self) -> &PreviewNavigator {
        &self.preview
    }

    pub fn editor(&self) -> Option<&TextEditor> {
        self.editor.as_ref()
    }

    /// Where the user currently is.
    pub fn location(&self) -> Location {
        if self.session.is_connected() {
            Location::Browse(self.current_path().to_string())
        } else {
            Location::Connect
        }
    }

    // ── session ─────────────────────────────────────────────────────

    /// Reconnect to the persisted URL, if any, and list the root.
    ///
    /// Never fails: a failed reconnect leaves the explorer on the connect
    /// form.
    pub async fn startup(&mut self) -> Location {
        if self.session.restore().await {
            if let Err(e) = self.navigate("/").await {
                warn!("Initial listing after reconnect failed: {}", e);
            }
        }
        self.location()
    }

    /// Connect to `url` and list its root.
    ///
    /// Any previous browsing state is discarded first. A failed listing
    /// after a successful probe leaves the session connected with an
    /// errored listing.
    pub async fn connect(&mut self, url: &str) -> Result<(), ExplorerError> {
        self.reset_browsing();
        self.session.connect(url).await?;
        self.navigate("/").await
    }

    pub fn disconnect(&mut self) {
        self.session.disconnect();
        self.reset_browsing();
    }

    fn reset_browsing(&mut self) {
        self.listing.clear();
        self.view.clear();
        self.operations = FileOperations::new();
        self.close_preview();
    }

    // ── browsing ────────────────────────────────────────────────────

    /// Move to `location`, redirecting to the connect form when there is
    /// no session. Returns the location actually shown.
    pub async fn open_location(&mut self, location: Location) -> Result<Location, ExplorerError> {
        match location.resolve(self.session.is_connected()) {
            Location::Browse(path) => {
                self.navigate(&path).await?;
                Ok(self.location())
            }
            Location::Connect => Ok(Location::Connect),
        }
    }

    /// Load `path` and make it the current directory.
    pub async fn navigate(&mut self, path: &str) -> Result<(), ExplorerError> {
        let pending = self.begin_load(path)?;
        let outcome = pending.run().await;
        self.finish_load(outcome).unwrap_or(Ok(()))
    }

    /// Go one level up. Returns `false` at the root.
    pub async fn go_up(&mut self) -> Result<bool, ExplorerError> {
        match parent_path(self.current_path()) {
            Some(parent) => {
                self.navigate(&parent).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Reload the current directory.
    pub async fn refresh(&mut self) -> Result<(), ExplorerError> {
        let path = self.current_path().to_string();
        self.navigate(&path).await
    }

    /// First half of a load: mark the listing as loading and hand back the
    /// fetch so it can run without borrowing the explorer.
    pub fn begin_load(&mut self, path: &str) -> Result<PendingLoad, ExplorerError> {
        let pending = self.listing.begin(&self.session, path)?;
        self.sync_view();
        Ok(pending)
    }

    /// Second half of a load. `None` when a newer load superseded this one.
    pub fn finish_load(&mut self, outcome: LoadOutcome) -> Option<Result<(), ExplorerError>> {
        let applied = self.listing.finish(outcome)?;
        self.sync_view();
        Some(applied)
    }

    async fn reload_after_mutation(&mut self) {
        if let Err(e) = self.refresh().await {
            debug!("Reload after mutation failed: {}", e);
        }
    }

    fn sync_view(&mut self) {
        self.view.set_listing(&self.listing.listing().entries);
        self.preview.reset_warmed();
    }

    // ── sort and reveal ─────────────────────────────────────────────

    /// Apply a sort change. The order is applied before the field, so a
    /// field sent together with `Random` is ignored.
    pub fn sort(&mut self, field: Option<SortField>, order: Option<SortOrder>) -> bool {
        let mut changed = false;
        if let Some(order) = order {
            changed |= self.view.set_order(order);
        }
        if let Some(field) = field {
            changed |= self.view.set_field(field);
        }
        if changed {
            self.preview.reset_warmed();
        }
        changed
    }

    pub fn scroll(&mut self, metrics: ScrollMetrics) -> bool {
        self.view.on_scroll(metrics)
    }

    // ── file operations ─────────────────────────────────────────────

    /// Stage the listed entry at `path` for deletion.
    pub fn request_delete(&mut self, path: &str) -> Result<(), ExplorerError> {
        if !self.session.is_connected() {
            return Err(ExplorerError::NotConnected);
        }
        let entry = self
            .listing
            .listing()
            .find(path)
            .cloned()
            .ok_or(ExplorerError::NothingPending)?;
        self.operations.request_delete(entry);
        Ok(())
    }

    pub fn cancel_delete(&mut self) {
        self.operations.cancel_delete();
    }

    /// Delete the pending entry and reload the current directory.
    pub async fn confirm_delete(&mut self) -> Result<Entry, ExplorerError> {
        let deleted = self.operations.confirm_delete(&self.session).await?;
        if self
            .preview
            .current()
            .is_some_and(|e| e.resource_url == deleted.resource_url)
        {
            self.close_preview();
        }
        self.reload_after_mutation().await;
        Ok(deleted)
    }

    pub fn open_folder_dialog(&mut self) {
        self.operations.open_folder_dialog();
    }

    pub fn cancel_folder_dialog(&mut self) {
        self.operations.cancel_folder_dialog();
    }

    /// Create a folder in the current directory and reload it.
    pub async fn create_folder(&mut self, name: &str) -> Result<String, ExplorerError> {
        let current = self.current_path().to_string();
        let created = self
            .operations
            .create_folder(&self.session, &current, name)
            .await?;
        self.reload_after_mutation().await;
        Ok(created)
    }

    pub fn add_uploads(&mut self, files: impl IntoIterator<Item = UploadFile>) {
        self.operations.add_uploads(files);
    }

    pub fn remove_upload(&mut self, index: usize) -> Option<UploadFile> {
        self.operations.remove_upload(index)
    }

    pub fn clear_uploads(&mut self) {
        self.operations.clear_uploads();
    }

    /// Upload the pending batch into the current directory and reload it
    /// on full success.
    pub async fn upload<F>(&mut self, on_progress: F) -> Result<usize, ExplorerError>
    where
        F: FnMut(UploadProgress),
    {
        let current = self.current_path().to_string();
        let count = self
            .operations
            .upload(&self.session, &current, on_progress)
            .await?;
        self.reload_after_mutation().await;
        Ok(count)
    }

    // ── preview ─────────────────────────────────────────────────────

    /// Preview the file at `path` from the current view.
    pub async fn open_preview(&mut self, path: &str) -> Result<PreviewContent, ExplorerError> {
        if !self.session.is_connected() {
            return Err(ExplorerError::NotConnected);
        }
        let entry = self
            .view
            .sorted()
            .iter()
            .find(|e| e.path == path && !e.is_directory())
            .cloned()
            .ok_or(ExplorerError::NothingPending)?;

        self.preview.open(entry);
        self.sync_editor().await;
        self.preview.content().ok_or(ExplorerError::NothingPending)
    }

    /// Step to the next entry. Returns `false` at the end of the sequence.
    pub async fn preview_next(&mut self) -> bool {
        let moved = self.preview.next(self.view.sorted());
        if moved {
            self.sync_editor().await;
        }
        moved
    }

    /// Step to the previous entry. Returns `false` at the start.
    pub async fn preview_previous(&mut self) -> bool {
        let moved = self.preview.previous(self.view.sorted());
        if moved {
            self.sync_editor().await;
        }
        moved
    }

    pub fn preview_content(&self) -> Option<PreviewContent> {
        self.preview.content()
    }

    pub fn preview_index(&self) -> Option<usize> {
        self.preview.current_index(self.view.sorted())
    }

    pub fn can_preview_next(&self) -> bool {
        self.preview.can_next(self.view.sorted())
    }

    pub fn can_preview_previous(&self) -> bool {
        self.preview.can_previous(self.view.sorted())
    }

    /// Neighbors to warm around the previewed entry.
    pub fn prefetch(&mut self) -> Vec<PrefetchRequest> {
        self.preview.prefetch(self.view.sorted())
    }

    pub fn mark_image_failed(&mut self) {
        self.preview.mark_image_failed();
    }

    /// Close the preview. A commit still waiting on its timer runs to
    /// completion.
    pub fn close_preview(&mut self) {
        self.preview.close();
        self.editor = None;
    }

    /// Replace the text buffer of the previewed file.
    pub fn edit_text(&mut self, text: impl Into<String>) -> Result<(), ExplorerError> {
        self.editor
            .as_mut()
            .ok_or(ExplorerError::NothingPending)?
            .edit(text);
        Ok(())
    }

    /// Apply the outcome of a debounced commit. A successful save reloads
    /// the current directory; a failed one changes nothing.
    pub async fn on_save_event(&mut self, event: &SaveEvent) -> Result<(), ExplorerError> {
        match event {
            SaveEvent::Saved { path } if self.session.is_connected() => {
                debug!("Reloading {} after save of {}", self.current_path(), path);
                self.refresh().await
            }
            _ => Ok(()),
        }
    }

    async fn sync_editor(&mut self) {
        self.editor = None;
        let Some(entry) = self.preview.current() else {
            return;
        };
        if MediaKind::classify(&entry.name) != MediaKind::Text {
            return;
        }
        let Ok((storage, _)) = self.session.handle() else {
            return;
        };
        info!("Opening {} for editing", entry.path);
        self.editor = Some(
            TextEditor::open(
                storage,
                entry,
                self.config.save_debounce(),
                self.save_events.clone(),
            )
            .await,
        );
    }
}
