use serde::{Deserialize, Serialize};

use davshelf_core::entry::{Entry, ListingStatus};
use davshelf_core::preview::PreviewContent;
use davshelf_core::session::SessionStatus;
use davshelf_core::sort::{SortField, SortOrder, SortSpec};
use davshelf_core::Explorer;

// ── initialize ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    pub protocol_version: String,
    pub client: String,
    pub client_version: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    pub url_schemes: Vec<String>,
    pub reveal_page_size: usize,
    pub save_debounce_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    pub agent_version: String,
    pub capabilities: Capabilities,
}

// ── health.check ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckResult {
    pub status: String,
    pub uptime_secs: u64,
    pub connected: bool,
}

// ── session.* ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConnectParams {
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusResult {
    pub status: SessionStatus,
    pub base_url: Option<String>,
    pub location: String,
}

// ── browse.* ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct BrowseOpenParams {
    pub location: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrowseNavigateParams {
    pub path: String,
}

// ── view.* ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViewSortParams {
    #[serde(default)]
    pub field: Option<SortField>,
    #[serde(default)]
    pub order: Option<SortOrder>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadView {
    pub files: Vec<String>,
    pub progress: u8,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewView {
    pub entry: Entry,
    /// `None` when the entry is no longer in the sorted sequence.
    pub index: Option<usize>,
    pub can_next: bool,
    pub can_previous: bool,
    pub content: Option<PreviewContent>,
    /// Current edit buffer for text previews.
    pub text: Option<String>,
}

/// Everything a frontend needs to render the browsing screen.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewResult {
    pub location: String,
    pub path: String,
    pub segments: Vec<String>,
    pub can_go_up: bool,
    pub status: ListingStatus,
    pub sort: SortSpec,
    pub field_enabled: bool,
    pub total: usize,
    pub entries: Vec<Entry>,
    pub pending_delete: Option<Entry>,
    pub folder_name: Option<String>,
    pub upload: UploadView,
    pub preview: Option<PreviewView>,
}

impl ViewResult {
    pub fn from_explorer(explorer: &Explorer) -> Self {
        let location = explorer.location();
        let view = explorer.view();
        let operations = explorer.operations();
        let batch = explorer.upload_batch();

        let preview = explorer.preview().current().map(|entry| PreviewView {
            entry: entry.clone(),
            index: explorer.preview_index(),
            can_next: explorer.can_preview_next(),
            can_previous: explorer.can_preview_previous(),
            content: explorer.preview_content(),
            text: explorer.editor().map(|e| e.buffer().to_string()),
        });

        Self {
            segments: location
                .path_segments()
                .into_iter()
                .map(str::to_string)
                .collect(),
            can_go_up: location.parent().is_some(),
            location: location.to_string(),
            path: explorer.current_path().to_string(),
            status: explorer.listing().status.clone(),
            sort: view.spec(),
            field_enabled: view.spec().field_enabled(),
            total: view.sorted().len(),
            entries: view.visible().to_vec(),
            pending_delete: operations.pending_delete().cloned(),
            folder_name: operations.folder_dialog().map(|d| d.name.clone()),
            upload: UploadView {
                files: batch.files().iter().map(|f| f.name.clone()).collect(),
                progress: batch.progress(),
            },
            preview,
        }
    }
}

// ── files.* ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteRequestParams {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateFolderParams {
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateFolderResult {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadAddParams {
    /// Local file paths; `~` is expanded.
    pub paths: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadAddResult {
    pub queued: usize,
    /// Paths that do not name a file.
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadRemoveParams {
    pub index: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadResult {
    pub uploaded: usize,
}

// ── preview.* ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct PreviewOpenParams {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PreviewEditParams {
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreviewMoveResult {
    pub moved: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn initialize_params_are_camel_case() {
        let p: InitializeParams = serde_json::from_value(json!({
            "protocolVersion": "0.1.0",
            "client": "web",
            "clientVersion": "1.2.3"
        }))
        .unwrap();
        assert_eq!(p.protocol_version, "0.1.0");
        assert_eq!(p.client_version, "1.2.3");
    }

    #[test]
    fn sort_params_are_optional() {
        let p: ViewSortParams = serde_json::from_value(json!({"order": "random"})).unwrap();
        assert_eq!(p.order, Some(SortOrder::Random));
        assert_eq!(p.field, None);

        let p: ViewSortParams =
            serde_json::from_value(json!({"field": "name", "order": "ascending"})).unwrap();
        assert_eq!(p.field, Some(SortField::Name));
    }

    #[test]
    fn unknown_sort_order_is_rejected() {
        let r: Result<ViewSortParams, _> = serde_json::from_value(json!({"order": "sideways"}));
        assert!(r.is_err());
    }
}
