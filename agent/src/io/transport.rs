use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use davshelf_core::editor::SaveEvent;

use crate::handler::dispatch::Dispatcher;
use crate::protocol::errors;
use crate::protocol::messages::{JsonRpcErrorResponse, JsonRpcNotification, JsonRpcRequest};

/// Maximum message size: 1 MiB.
pub const MAX_LINE_SIZE: usize = 1_048_576;

/// Sender half for the explorer and its background tasks to emit
/// notifications.
pub type NotificationSender = UnboundedSender<JsonRpcNotification>;

/// Inbound event sources the loop multiplexes besides the request stream.
pub struct LoopChannels<'a> {
    pub notifications: &'a mut UnboundedReceiver<JsonRpcNotification>,
    pub save_events: &'a mut UnboundedReceiver<SaveEvent>,
}

/// Run the NDJSON transport loop over arbitrary async reader/writer.
///
/// Requests are handled one at a time, in arrival order, so the explorer
/// sees a single stream of intents. Finished text commits are applied
/// through the same dispatcher between requests. Notifications are
/// interleaved via `tokio::select!`. The loop exits when the reader reaches
/// EOF, the cancellation token is triggered, or an I/O error occurs.
pub async fn run_transport_loop<R, W>(
    reader: &mut R,
    writer: &mut W,
    dispatcher: &mut Dispatcher,
    channels: LoopChannels<'_>,
    shutdown: CancellationToken,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWriteExt + Unpin,
{
    // `next_line` is cancel safe: a partial line stays buffered in `lines`
    // when another branch wins the select.
    let mut lines = reader.lines();

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                debug!("Shutdown signal received, exiting transport loop");
                break;
            }

            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("Reader closed (EOF), exiting transport loop");
                    break;
                };
                if let Some(response) = handle_line(dispatcher, line.trim()).await {
                    debug!("Sending: {}", response);
                    write_json(writer, &response).await?;
                }
            }

            Some(event) = channels.save_events.recv() => {
                dispatcher.handle_save_event(event).await;
            }

            Some(notification) = channels.notifications.recv() => {
                let json = serde_json::to_value(&notification)?;
                debug!("Sending notification: {}", json);
                write_json(writer, &json).await?;
            }
        }
    }

    Ok(())
}

/// Turn one NDJSON line into its response. Blank lines get none.
async fn handle_line(dispatcher: &mut Dispatcher, line: &str) -> Option<Value> {
    if line.is_empty() {
        return None;
    }

    if line.len() > MAX_LINE_SIZE {
        warn!("Message exceeds 1 MiB limit ({} bytes)", line.len());
        return Some(error_json(
            Value::Null,
            errors::PARSE_ERROR,
            "Message exceeds 1 MiB size limit".to_string(),
        ));
    }

    debug!("Received: {}", line);

    let request: JsonRpcRequest = match serde_json::from_str(line) {
        Ok(r) => r,
        Err(e) => {
            warn!("Failed to parse JSON-RPC request: {e}");
            return Some(error_json(
                Value::Null,
                errors::PARSE_ERROR,
                format!("Parse error: {e}"),
            ));
        }
    };

    if request.jsonrpc != "2.0" {
        return Some(error_json(
            request.id,
            errors::INVALID_REQUEST,
            "Invalid JSON-RPC version (must be \"2.0\")".to_string(),
        ));
    }

    Some(dispatcher.dispatch(request).await.to_json())
}

fn error_json(id: Value, code: i64, message: String) -> Value {
    serde_json::to_value(JsonRpcErrorResponse::new(id, code, message)).unwrap_or(Value::Null)
}

/// Write a JSON value as an NDJSON line to the writer.
pub async fn write_json<W: AsyncWriteExt + Unpin>(writer: &mut W, value: &Value) -> anyhow::Result<()> {
    let mut line = serde_json::to_string(value)?;
    line.push('\n');
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}
