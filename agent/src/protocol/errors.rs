//! Standard and application JSON-RPC 2.0 error codes.

use davshelf_core::errors::ExplorerError;

/// Invalid JSON was received by the server.
pub const PARSE_ERROR: i64 = -32700;

/// The JSON sent is not a valid Request object.
pub const INVALID_REQUEST: i64 = -32600;

/// The method does not exist / is not available.
pub const METHOD_NOT_FOUND: i64 = -32601;

/// Invalid method parameter(s).
pub const INVALID_PARAMS: i64 = -32602;

/// Internal JSON-RPC error.
pub const INTERNAL_ERROR: i64 = -32603;

// Application error codes (davshelf-specific).

/// The method needs a connected storage server.
pub const NOT_CONNECTED: i64 = -32001;

/// Protocol version mismatch.
pub const VERSION_NOT_SUPPORTED: i64 = -32002;

/// The root listing probe failed.
pub const CONNECTION_FAILED: i64 = -32003;

/// A directory listing could not be fetched.
pub const LISTING_FAILED: i64 = -32004;

/// The pending delete failed.
pub const DELETE_FAILED: i64 = -32005;

/// The folder could not be created.
pub const CREATE_FOLDER_FAILED: i64 = -32006;

/// The agent has not been initialized yet (must call `initialize` first).
pub const NOT_INITIALIZED: i64 = -32007;

/// An upload batch stopped part-way.
pub const UPLOAD_FAILED: i64 = -32008;

/// A text edit could not be saved.
pub const SAVE_FAILED: i64 = -32009;

/// The folder name was empty.
pub const INVALID_FOLDER_NAME: i64 = -32010;

/// There is no pending request (delete, upload, preview) to act on.
pub const NOTHING_PENDING: i64 = -32011;

/// Application code for an explorer failure.
pub fn explorer_error_code(err: &ExplorerError) -> i64 {
    match err {
        ExplorerError::NotConnected => NOT_CONNECTED,
        ExplorerError::ConnectionFailed => CONNECTION_FAILED,
        ExplorerError::ListingFailed => LISTING_FAILED,
        ExplorerError::DeleteFailed => DELETE_FAILED,
        ExplorerError::CreateFolderFailed => CREATE_FOLDER_FAILED,
        ExplorerError::UploadFailed { .. } => UPLOAD_FAILED,
        ExplorerError::SaveFailed => SAVE_FAILED,
        ExplorerError::EmptyFolderName => INVALID_FOLDER_NAME,
        ExplorerError::NothingPending => NOTHING_PENDING,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const APP_CODES: [i64; 11] = [
        NOT_CONNECTED,
        VERSION_NOT_SUPPORTED,
        CONNECTION_FAILED,
        LISTING_FAILED,
        DELETE_FAILED,
        CREATE_FOLDER_FAILED,
        NOT_INITIALIZED,
        UPLOAD_FAILED,
        SAVE_FAILED,
        INVALID_FOLDER_NAME,
        NOTHING_PENDING,
    ];

    #[test]
    fn standard_codes_in_json_rpc_range() {
        let standard = [
            PARSE_ERROR,
            INVALID_REQUEST,
            METHOD_NOT_FOUND,
            INVALID_PARAMS,
            INTERNAL_ERROR,
        ];
        for code in standard {
            assert!(
                (-32768..=-32000).contains(&code),
                "Standard code {code} should be in -32768..-32000"
            );
        }
    }

    #[test]
    fn application_codes_in_expected_range_and_distinct() {
        for code in APP_CODES {
            assert!(
                (-32099..=-32000).contains(&code),
                "Application code {code} should be in -32099..-32000"
            );
        }
        let mut sorted = APP_CODES.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), APP_CODES.len());
    }

    #[test]
    fn explorer_errors_map_to_their_codes() {
        assert_eq!(
            explorer_error_code(&ExplorerError::UploadFailed {
                completed: 1,
                total: 2
            }),
            UPLOAD_FAILED
        );
        assert_eq!(
            explorer_error_code(&ExplorerError::NotConnected),
            NOT_CONNECTED
        );
        assert_eq!(
            explorer_error_code(&ExplorerError::EmptyFolderName),
            INVALID_FOLDER_NAME
        );
    }
}
