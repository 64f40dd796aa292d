//! Error types for the davshelf core crate.
//!
//! [`StorageError`] is what a storage capability reports. It is detailed and
//! only ever logged. [`ExplorerError`] is what an operation reports to the
//! user: one variant per failing operation kind, each with a fixed generic
//! message that never includes the underlying storage error.

use thiserror::Error;

/// Errors reported by a storage capability.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The requested file or directory was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Permission was denied for the requested operation.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The target already exists and overwriting was not allowed.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// The connection URL cannot be served by this connector.
    #[error("Unsupported URL: {0}")]
    InvalidUrl(String),

    /// A storage operation failed (transport error, protocol error, etc.).
    #[error("Operation failed: {0}")]
    OperationFailed(String),

    /// A low-level I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// User-facing failures of explorer operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExplorerError {
    /// An operation that needs a session was attempted without one.
    #[error("Not connected")]
    NotConnected,

    /// The root listing probe failed during connect.
    #[error("Connection failed")]
    ConnectionFailed,

    /// A directory listing could not be fetched.
    #[error("Listing failed")]
    ListingFailed,

    /// The pending delete could not be carried out.
    #[error("Delete failed")]
    DeleteFailed,

    /// The folder could not be created.
    #[error("Create folder failed")]
    CreateFolderFailed,

    /// An upload batch stopped after `completed` of `total` files.
    #[error("Upload failed after {completed} of {total} files")]
    UploadFailed { completed: usize, total: usize },

    /// A text edit could not be committed.
    #[error("Save failed")]
    SaveFailed,

    /// The folder name was empty after trimming.
    #[error("Folder name is empty")]
    EmptyFolderName,

    /// A confirm/start action was issued with nothing pending.
    #[error("Nothing pending")]
    NothingPending,
}

impl ExplorerError {
    /// The message shown to the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::NotConnected => "The storage server is not connected.",
            Self::ConnectionFailed => "Could not connect to the storage server.",
            Self::ListingFailed => "Failed to load the directory.",
            Self::DeleteFailed => "Failed to delete the item.",
            Self::CreateFolderFailed => "Failed to create the folder.",
            Self::UploadFailed { .. } => "Failed to upload the files.",
            Self::SaveFailed => "Failed to save the file.",
            Self::EmptyFolderName => "Please enter a folder name.",
            Self::NothingPending => "There is nothing to do.",
        }
    }
}
