//! File operation coordinator: the mutating operations.
//!
//! Each operation needs a connected session and reports a generic
//! [`ExplorerError`] on failure; the raw storage error is only logged.
//! Refreshing the listing after a success is the caller's job (see
//! [`Explorer`](crate::explorer::Explorer)).

use tracing::{debug, info, warn};

use crate::entry::Entry;
use crate::errors::ExplorerError;
use crate::session::Session;
use crate::storage::join_path;
use crate::upload::{UploadBatch, UploadFile, UploadProgress};

/// State of the new-folder prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderDialog {
    /// Current input; kept after a failure so the user can retry.
    pub name: String,
}

/// Pending requests for delete, folder creation and upload.
///
/// At most one instance of each is outstanding.
#[derive(Debug, Default)]
pub struct FileOperations {
    pending_delete: Option<Entry>,
    folder_dialog: Option<FolderDialog>,
    upload: UploadBatch,
}

impl FileOperations {
    pub fn new() -> Self {
        Self::default()
    }

    // ── delete ──────────────────────────────────────────────────────

    /// Stage `entry` for deletion; replaces any earlier pending delete.
    pub fn request_delete(&mut self, entry: Entry) {
        debug!("Delete requested for {}", entry.path);
        self.pending_delete = Some(entry);
    }

    pub fn pending_delete(&self) -> Option<&Entry> {
        self.pending_delete.as_ref()
    }

    /// Drop the pending delete without touching storage.
    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Delete the pending entry. The pending state is cleared whether or not
    /// the delete succeeds.
    pub async fn confirm_delete(&mut self, session: &Session) -> Result<Entry, ExplorerError> {
        let (storage, _) = session.handle()?;
        let entry = self
            .pending_delete
            .take()
            .ok_or(ExplorerError::NothingPending)?;

        match storage.delete_entry(&entry.path).await {
            Ok(()) => {
                info!("Deleted {}", entry.path);
                Ok(entry)
            }
            Err(e) => {
                warn!("Delete of {} failed: {}", entry.path, e);
                Err(ExplorerError::DeleteFailed)
            }
        }
    }

    // ── create folder ───────────────────────────────────────────────

    pub fn open_folder_dialog(&mut self) {
        self.folder_dialog.get_or_insert_with(FolderDialog::default);
    }

    pub fn folder_dialog(&self) -> Option<&FolderDialog> {
        self.folder_dialog.as_ref()
    }

    pub fn cancel_folder_dialog(&mut self) {
        self.folder_dialog = None;
    }

    /// Create `name` inside `current_path`. Returns the new folder's path.
    ///
    /// On success the prompt is closed and its input cleared; on failure the
    /// prompt stays open with the input preserved.
    pub async fn create_folder(
        &mut self,
        session: &Session,
        current_path: &str,
        name: &str,
    ) -> Result<String, ExplorerError> {
        let (storage, _) = session.handle()?;
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ExplorerError::EmptyFolderName);
        }

        let target = join_path(current_path, trimmed);
        match storage.make_directory(&target).await {
            Ok(()) => {
                info!("Created folder {}", target);
                self.folder_dialog = None;
                Ok(target)
            }
            Err(e) => {
                warn!("Create folder {} failed: {}", target, e);
                self.folder_dialog = Some(FolderDialog {
                    name: name.to_string(),
                });
                Err(ExplorerError::CreateFolderFailed)
            }
        }
    }

    // ── upload ──────────────────────────────────────────────────────

    pub fn upload_batch(&self) -> &UploadBatch {
        &self.upload
    }

    pub fn add_uploads(&mut self, files: impl IntoIterator<Item = UploadFile>) {
        self.upload.add_files(files);
    }

    pub fn remove_upload(&mut self, index: usize) -> Option<UploadFile> {
        self.upload.remove_file(index)
    }

    pub fn clear_uploads(&mut self) {
        self.upload.clear();
    }

    /// Upload the pending batch into `current_path`, one file at a time.
    ///
    /// `on_progress` is called after each file is written. The first failure
    /// aborts the rest of the batch; files already written stay written and
    /// the batch is kept for a retry. On full success the batch is cleared.
    pub async fn upload<F>(
        &mut self,
        session: &Session,
        current_path: &str,
        mut on_progress: F,
    ) -> Result<usize, ExplorerError>
    where
        F: FnMut(UploadProgress),
    {
        let (storage, _) = session.handle()?;
        if self.upload.is_empty() {
            return Err(ExplorerError::NothingPending);
        }

        let files = self.upload.files().to_vec();
        let total = files.len();
        self.upload.set_progress(UploadProgress {
            completed: 0,
            total,
        });

        for (i, file) in files.iter().enumerate() {
            let target = join_path(current_path, &file.name);
            let failed = UploadFailure {
                completed: i,
                total,
            };

            let data = match file.read().await {
                Ok(data) => data,
                Err(e) => {
                    warn!("Reading {} for upload failed: {}", file.name, e);
                    return Err(failed.into());
                }
            };

            if let Err(e) = storage.write_file(&target, &data, true).await {
                warn!("Upload of {} failed: {}", target, e);
                return Err(failed.into());
            }

            let progress = UploadProgress {
                completed: i + 1,
                total,
            };
            debug!("Uploaded {} ({}%)", target, progress.percent());
            self.upload.set_progress(progress);
            on_progress(progress);
        }

        info!("Uploaded {} files to {}", total, current_path);
        self.upload.clear();
        Ok(total)
    }
}

struct UploadFailure {
    completed: usize,
    total: usize,
}

impl From<UploadFailure> for ExplorerError {
    fn from(f: UploadFailure) -> Self {
        ExplorerError::UploadFailed {
            completed: f.completed,
            total: f.total,
        }
    }
}
