//! Text edit session with debounced save.
//!
//! Each edit replaces the buffer and (re)starts a single save timer. When
//! the timer expires without a newer edit, the buffer as of that edit is
//! written back with overwrite. The outcome is reported as a [`SaveEvent`];
//! a failed save does not revert the buffer.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::entry::Entry;
use crate::errors::ExplorerError;
use crate::storage::{ReadFormat, Storage};

/// Outcome of a debounced commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum SaveEvent {
    Saved { path: String },
    Failed { path: String, message: String },
}

/// Channel on which commit outcomes are reported.
pub type SaveEventSender = mpsc::UnboundedSender<SaveEvent>;

/// Editable buffer bound to one text file.
pub struct TextEditor {
    path: String,
    buffer: String,
    delay: Duration,
    storage: Arc<dyn Storage>,
    events: Option<SaveEventSender>,
    pending: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for TextEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextEditor")
            .field("path", &self.path)
            .field("buffer_len", &self.buffer.len())
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

impl TextEditor {
    /// Load `entry` as text. A failed read is logged and yields an empty
    /// buffer rather than an error.
    pub async fn open(
        storage: Arc<dyn Storage>,
        entry: &Entry,
        delay: Duration,
        events: Option<SaveEventSender>,
    ) -> Self {
        let buffer = match storage.read_file(&entry.path, ReadFormat::Text).await {
            Ok(contents) => contents.into_text(),
            Err(e) => {
                warn!("Failed to read {} for editing: {}", entry.path, e);
                String::new()
            }
        };
        debug!("Opened editor for {} ({} bytes)", entry.path, buffer.len());
        Self {
            path: entry.path.clone(),
            buffer,
            delay,
            storage,
            events,
            pending: None,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Whether a commit timer is still waiting or writing.
    pub fn has_pending_commit(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Replace the buffer and restart the save timer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn edit(&mut self, text: impl Into<String>) {
        self.buffer = text.into();
        if let Some(previous) = self.pending.take() {
            previous.abort();
        }

        let storage = Arc::clone(&self.storage);
        let events = self.events.clone();
        let path = self.path.clone();
        let snapshot = self.buffer.clone();
        let delay = self.delay;

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let event = match storage.write_file(&path, snapshot.as_bytes(), true).await {
                Ok(()) => {
                    debug!("Saved {} ({} bytes)", path, snapshot.len());
                    SaveEvent::Saved { path }
                }
                Err(e) => {
                    warn!("Failed to save {}: {}", path, e);
                    SaveEvent::Failed {
                        path,
                        message: ExplorerError::SaveFailed.user_message().to_string(),
                    }
                }
            };
            if let Some(tx) = events {
                let _ = tx.send(event);
            }
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStorage;
    use crate::storage::{EntryKind, RawEntry};
    use chrono::Utc;

    const DELAY: Duration = Duration::from_millis(500);

    fn text_entry(path: &str) -> Entry {
        Entry::from_raw(
            RawEntry {
                name: crate::storage::file_name(path).to_string(),
                path: path.to_string(),
                kind: EntryKind::File,
                size: 0,
                modified: Utc::now(),
            },
            "mem://e",
        )
    }

    async fn contents(storage: &MemoryStorage, path: &str) -> String {
        storage
            .read_file(path, ReadFormat::Text)
            .await
            .unwrap()
            .into_text()
    }

    async fn settle() {
        // Let spawned save tasks observe the advanced clock and finish.
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn open_reads_text() {
        let storage = Arc::new(MemoryStorage::new());
        storage.insert_file("/notes.txt", "hello", Utc::now());
        let editor = TextEditor::open(storage, &text_entry("/notes.txt"), DELAY, None).await;
        assert_eq!(editor.buffer(), "hello");
        assert!(!editor.has_pending_commit());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_read_yields_empty_buffer() {
        let storage = Arc::new(MemoryStorage::new());
        let editor = TextEditor::open(storage, &text_entry("/missing.txt"), DELAY, None).await;
        assert_eq!(editor.buffer(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_edits_commit_once_with_last_text() {
        let storage = Arc::new(MemoryStorage::new());
        storage.insert_file("/notes.txt", "v0", Utc::now());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut editor =
            TextEditor::open(storage.clone(), &text_entry("/notes.txt"), DELAY, Some(tx)).await;

        editor.edit("v1");
        tokio::time::sleep(Duration::from_millis(200)).await;
        editor.edit("v2");
        tokio::time::sleep(Duration::from_millis(200)).await;
        editor.edit("v3");

        // 400ms after the last edit: nothing written yet.
        tokio::time::sleep(Duration::from_millis(400)).await;
        settle().await;
        assert_eq!(contents(&storage, "/notes.txt").await, "v0");
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_millis(150)).await;
        settle().await;
        assert_eq!(contents(&storage, "/notes.txt").await, "v3");
        assert_eq!(
            rx.try_recv().unwrap(),
            SaveEvent::Saved {
                path: "/notes.txt".into()
            }
        );
        assert!(rx.try_recv().is_err());
        assert!(!editor.has_pending_commit());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_commit_reports_and_keeps_buffer() {
        let storage = Arc::new(MemoryStorage::new());
        storage.insert_file("/locked.txt", "orig", Utc::now());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut editor =
            TextEditor::open(storage.clone(), &text_entry("/locked.txt"), DELAY, Some(tx)).await;
        storage.deny("/locked.txt");

        editor.edit("changed");
        tokio::time::sleep(DELAY + Duration::from_millis(10)).await;
        settle().await;

        assert_eq!(
            rx.try_recv().unwrap(),
            SaveEvent::Failed {
                path: "/locked.txt".into(),
                message: "Failed to save the file.".into(),
            }
        );
        assert_eq!(editor.buffer(), "changed");

        storage.allow("/locked.txt");
        assert_eq!(contents(&storage, "/locked.txt").await, "orig");
    }

    #[tokio::test(start_paused = true)]
    async fn pending_commit_survives_editor_drop() {
        let storage = Arc::new(MemoryStorage::new());
        storage.insert_file("/notes.txt", "v0", Utc::now());
        let mut editor =
            TextEditor::open(storage.clone(), &text_entry("/notes.txt"), DELAY, None).await;
        editor.edit("final");
        assert!(editor.has_pending_commit());
        drop(editor);

        tokio::time::sleep(DELAY + Duration::from_millis(10)).await;
        settle().await;
        assert_eq!(contents(&storage, "/notes.txt").await, "final");
    }
}
