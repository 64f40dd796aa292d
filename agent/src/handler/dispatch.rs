use std::path::Path;
use std::time::Instant;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use davshelf_core::editor::SaveEvent;
use davshelf_core::errors::ExplorerError;
use davshelf_core::location::Location;
use davshelf_core::reveal::ScrollMetrics;
use davshelf_core::upload::UploadFile;
use davshelf_core::Explorer;

use crate::io::transport::NotificationSender;
use crate::protocol::errors;
use crate::protocol::messages::{
    JsonRpcErrorResponse, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse,
};
use crate::protocol::methods::{
    BrowseNavigateParams, BrowseOpenParams, Capabilities, CreateFolderParams, CreateFolderResult,
    DeleteRequestParams, HealthCheckResult, InitializeParams, InitializeResult, PreviewEditParams,
    PreviewMoveResult, PreviewOpenParams, SessionConnectParams, SessionStatusResult,
    UploadAddParams, UploadAddResult, UploadRemoveParams, UploadResult, ViewResult,
    ViewSortParams,
};

/// The agent's protocol version.
const AGENT_PROTOCOL_VERSION: &str = "0.1.0";

/// URL schemes served by the connectors the agent installs.
pub const URL_SCHEMES: &[&str] = &["file", "mem"];

/// Dispatcher handles incoming JSON-RPC requests and routes them
/// to the explorer it owns.
pub struct Dispatcher {
    explorer: Explorer,
    notification_tx: NotificationSender,
    initialized: bool,
    start_time: Instant,
}

/// The result of dispatching a request: either a success or error response.
pub enum DispatchResult {
    Success(JsonRpcResponse),
    Error(JsonRpcErrorResponse),
}

impl DispatchResult {
    /// Serialize the result to a JSON `Value`.
    pub fn to_json(&self) -> Value {
        let value = match self {
            Self::Success(resp) => serde_json::to_value(resp),
            Self::Error(resp) => serde_json::to_value(resp),
        };
        value.unwrap_or(Value::Null)
    }
}

type Handled = Result<Value, JsonRpcErrorResponse>;

impl Dispatcher {
    pub fn new(explorer: Explorer, notification_tx: NotificationSender) -> Self {
        Self {
            explorer,
            notification_tx,
            initialized: false,
            start_time: Instant::now(),
        }
    }

    /// Reconnect to the persisted server before serving requests.
    pub async fn startup(&mut self) {
        let location = self.explorer.startup().await;
        info!("Starting at {}", location);
    }

    /// Dispatch a parsed JSON-RPC request to the appropriate handler.
    pub async fn dispatch(&mut self, request: JsonRpcRequest) -> DispatchResult {
        let id = request.id.clone();
        let method = request.method.clone();

        debug!("Dispatching method: {}", method);

        // The `initialize` method is always allowed
        if method == "initialize" {
            return into_result(id, self.handle_initialize(request.params));
        }

        // All other methods require initialization
        if !self.initialized {
            return DispatchResult::Error(JsonRpcErrorResponse::new(
                id,
                errors::NOT_INITIALIZED,
                "Agent not initialized: call 'initialize' first",
            ));
        }

        let params = request.params;
        let handled = match method.as_str() {
            "health.check" => self.handle_health_check(),
            "session.connect" => self.handle_session_connect(params).await,
            "session.disconnect" => {
                self.explorer.disconnect();
                self.session_status()
            }
            "session.status" => self.session_status(),
            "browse.open" => self.handle_browse_open(params).await,
            "browse.navigate" => self.handle_browse_navigate(params).await,
            "browse.up" => self.handle_browse_up().await,
            "browse.refresh" => self.handle_browse_refresh().await,
            "view.get" => self.view(),
            "view.sort" => self.handle_view_sort(params),
            "view.scroll" => self.handle_view_scroll(params),
            "files.deleteRequest" => self.handle_delete_request(params),
            "files.deleteConfirm" => self.handle_delete_confirm().await,
            "files.deleteCancel" => {
                self.explorer.cancel_delete();
                self.view()
            }
            "files.createFolder" => self.handle_create_folder(params).await,
            "files.uploadAdd" => self.handle_upload_add(params),
            "files.uploadRemove" => self.handle_upload_remove(params),
            "files.uploadClear" => {
                self.explorer.clear_uploads();
                self.view()
            }
            "files.upload" => self.handle_upload().await,
            "preview.open" => self.handle_preview_open(params).await,
            "preview.next" => {
                let moved = self.explorer.preview_next().await;
                self.after_preview_move(moved)
            }
            "preview.previous" => {
                let moved = self.explorer.preview_previous().await;
                self.after_preview_move(moved)
            }
            "preview.imageFailed" => {
                self.explorer.mark_image_failed();
                self.view()
            }
            "preview.edit" => self.handle_preview_edit(params),
            "preview.close" => {
                self.explorer.close_preview();
                self.view()
            }
            _ => {
                warn!("Unknown method: {}", method);
                Err(JsonRpcErrorResponse::new(
                    id.clone(),
                    errors::METHOD_NOT_FOUND,
                    format!("Method not found: {method}"),
                ))
            }
        };

        into_result(id, handled)
    }

    fn handle_initialize(&mut self, params: Value) -> Handled {
        let params: InitializeParams = parse_params("initialize", params)?;

        // Version negotiation: we only support major version 0
        let major = params
            .protocol_version
            .split('.')
            .next()
            .and_then(|s| s.parse::<u32>().ok());

        if major != Some(0) {
            return Err(JsonRpcErrorResponse::new(
                Value::Null,
                errors::VERSION_NOT_SUPPORTED,
                format!(
                    "Unsupported protocol version: {} (agent supports 0.x)",
                    params.protocol_version
                ),
            ));
        }

        info!(
            "Initialized by {} {} (protocol {})",
            params.client, params.client_version, params.protocol_version
        );
        self.initialized = true;

        let config = self.explorer.config();
        to_value(InitializeResult {
            protocol_version: AGENT_PROTOCOL_VERSION.to_string(),
            agent_version: env!("CARGO_PKG_VERSION").to_string(),
            capabilities: Capabilities {
                url_schemes: URL_SCHEMES.iter().map(|s| s.to_string()).collect(),
                reveal_page_size: config.reveal_page_size,
                save_debounce_ms: config.save_debounce_ms,
            },
        })
    }

    fn handle_health_check(&self) -> Handled {
        to_value(HealthCheckResult {
            status: "ok".to_string(),
            uptime_secs: self.start_time.elapsed().as_secs(),
            connected: self.explorer.base_url().is_some(),
        })
    }

    // ── session ─────────────────────────────────────────────────────

    async fn handle_session_connect(&mut self, params: Value) -> Handled {
        let params: SessionConnectParams = parse_params("session.connect", params)?;
        match self.explorer.connect(&params.url).await {
            // The session is up even if the first listing failed; the view
            // carries the listing error.
            Ok(()) | Err(ExplorerError::ListingFailed) => self.session_status(),
            Err(e) => Err(explorer_error(e)),
        }
    }

    fn session_status(&self) -> Handled {
        to_value(SessionStatusResult {
            status: self.explorer.status(),
            base_url: self.explorer.base_url().map(str::to_string),
            location: self.explorer.location().to_string(),
        })
    }

    // ── browse ──────────────────────────────────────────────────────

    async fn handle_browse_open(&mut self, params: Value) -> Handled {
        let params: BrowseOpenParams = parse_params("browse.open", params)?;
        let location = Location::parse(&params.location);
        self.explorer
            .open_location(location)
            .await
            .map_err(explorer_error)?;
        self.view()
    }

    async fn handle_browse_navigate(&mut self, params: Value) -> Handled {
        let params: BrowseNavigateParams = parse_params("browse.navigate", params)?;
        self.explorer
            .navigate(&params.path)
            .await
            .map_err(explorer_error)?;
        self.view()
    }

    async fn handle_browse_up(&mut self) -> Handled {
        self.explorer.go_up().await.map_err(explorer_error)?;
        self.view()
    }

    async fn handle_browse_refresh(&mut self) -> Handled {
        self.explorer.refresh().await.map_err(explorer_error)?;
        self.view()
    }

    // ── view ────────────────────────────────────────────────────────

    fn view(&self) -> Handled {
        to_value(ViewResult::from_explorer(&self.explorer))
    }

    fn handle_view_sort(&mut self, params: Value) -> Handled {
        let params: ViewSortParams = parse_params("view.sort", params)?;
        self.explorer.sort(params.field, params.order);
        self.view()
    }

    fn handle_view_scroll(&mut self, params: Value) -> Handled {
        let metrics: ScrollMetrics = parse_params("view.scroll", params)?;
        self.explorer.scroll(metrics);
        self.view()
    }

    // ── files ───────────────────────────────────────────────────────

    fn handle_delete_request(&mut self, params: Value) -> Handled {
        let params: DeleteRequestParams = parse_params("files.deleteRequest", params)?;
        self.explorer
            .request_delete(&params.path)
            .map_err(explorer_error)?;
        self.view()
    }

    async fn handle_delete_confirm(&mut self) -> Handled {
        self.explorer.confirm_delete().await.map_err(explorer_error)?;
        self.view()
    }

    async fn handle_create_folder(&mut self, params: Value) -> Handled {
        let params: CreateFolderParams = parse_params("files.createFolder", params)?;
        let path = self
            .explorer
            .create_folder(&params.name)
            .await
            .map_err(explorer_error)?;
        to_value(CreateFolderResult { path })
    }

    fn handle_upload_add(&mut self, params: Value) -> Handled {
        let params: UploadAddParams = parse_params("files.uploadAdd", params)?;
        let mut files = Vec::new();
        let mut skipped = Vec::new();
        for raw in params.paths {
            let expanded = shellexpand::tilde(&raw).to_string();
            match UploadFile::from_path(&expanded) {
                Some(file) if Path::new(&expanded).is_file() => files.push(file),
                _ => skipped.push(raw),
            }
        }
        let queued = files.len();
        self.explorer.add_uploads(files);
        to_value(UploadAddResult { queued, skipped })
    }

    fn handle_upload_remove(&mut self, params: Value) -> Handled {
        let params: UploadRemoveParams = parse_params("files.uploadRemove", params)?;
        if self.explorer.remove_upload(params.index).is_none() {
            return Err(JsonRpcErrorResponse::new(
                Value::Null,
                errors::INVALID_PARAMS,
                format!("No pending upload at index {}", params.index),
            ));
        }
        self.view()
    }

    async fn handle_upload(&mut self) -> Handled {
        let tx = self.notification_tx.clone();
        let uploaded = self
            .explorer
            .upload(move |progress| {
                let params = json!({
                    "completed": progress.completed,
                    "total": progress.total,
                    "percent": progress.percent(),
                });
                let _ = tx.send(JsonRpcNotification::new("upload.progress", params));
            })
            .await
            .map_err(explorer_error)?;
        to_value(UploadResult { uploaded })
    }

    // ── preview ─────────────────────────────────────────────────────

    async fn handle_preview_open(&mut self, params: Value) -> Handled {
        let params: PreviewOpenParams = parse_params("preview.open", params)?;
        self.explorer
            .open_preview(&params.path)
            .await
            .map_err(explorer_error)?;
        self.send_prefetch();
        self.view()
    }

    fn after_preview_move(&mut self, moved: bool) -> Handled {
        if moved {
            self.send_prefetch();
        }
        to_value(PreviewMoveResult { moved })
    }

    fn handle_preview_edit(&mut self, params: Value) -> Handled {
        let params: PreviewEditParams = parse_params("preview.edit", params)?;
        self.explorer
            .edit_text(params.text)
            .map_err(explorer_error)?;
        Ok(json!({}))
    }

    /// Apply a finished text commit, then tell the client about it.
    ///
    /// A successful save reloads the current directory first, so the
    /// `preview.saved` notification always follows fresh listing state.
    pub async fn handle_save_event(&mut self, event: SaveEvent) {
        debug!("Save event: {:?}", event);
        if let Err(e) = self.explorer.on_save_event(&event).await {
            warn!("Reload after save failed: {}", e);
        }
        let _ = self.notification_tx.send(save_notification(event));
    }

    fn send_prefetch(&mut self) {
        let requests = self.explorer.prefetch();
        if requests.is_empty() {
            return;
        }
        debug!("Prefetching {} neighbors", requests.len());
        match serde_json::to_value(&requests) {
            Ok(list) => {
                let _ = self.notification_tx.send(JsonRpcNotification::new(
                    "preview.prefetch",
                    json!({ "requests": list }),
                ));
            }
            Err(e) => warn!("Failed to encode prefetch requests: {}", e),
        }
    }
}

fn save_notification(event: SaveEvent) -> JsonRpcNotification {
    match event {
        SaveEvent::Saved { path } => {
            JsonRpcNotification::new("preview.saved", json!({ "path": path }))
        }
        SaveEvent::Failed { path, message } => JsonRpcNotification::new(
            "preview.saveFailed",
            json!({ "path": path, "message": message }),
        ),
    }
}

/// Attach the request id to a handler outcome.
fn into_result(id: Value, handled: Handled) -> DispatchResult {
    match handled {
        Ok(result) => DispatchResult::Success(JsonRpcResponse::new(id, result)),
        Err(mut err) => {
            err.id = id;
            DispatchResult::Error(err)
        }
    }
}

fn parse_params<T: DeserializeOwned>(method: &str, params: Value) -> Result<T, JsonRpcErrorResponse> {
    serde_json::from_value(params).map_err(|e| {
        JsonRpcErrorResponse::new(
            Value::Null,
            errors::INVALID_PARAMS,
            format!("Invalid {method} params: {e}"),
        )
    })
}

fn to_value<T: Serialize>(result: T) -> Handled {
    serde_json::to_value(result).map_err(|e| {
        JsonRpcErrorResponse::new(
            Value::Null,
            errors::INTERNAL_ERROR,
            format!("Failed to encode result: {e}"),
        )
    })
}

/// Map an explorer failure to its generic message and application code.
fn explorer_error(err: ExplorerError) -> JsonRpcErrorResponse {
    let response =
        JsonRpcErrorResponse::new(Value::Null, errors::explorer_error_code(&err), err.user_message());
    match err {
        ExplorerError::UploadFailed { completed, total } => {
            response.with_data(json!({ "completed": completed, "total": total }))
        }
        _ => response,
    }
}
