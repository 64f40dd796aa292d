pub mod config;
pub mod editor;
pub mod entry;
pub mod errors;
pub mod explorer;
pub mod listing;
pub mod location;
pub mod operations;
pub mod persistence;
pub mod preview;
pub mod reveal;
pub mod session;
pub mod sort;
pub mod storage;
pub mod upload;
pub mod view;

pub use explorer::Explorer;
