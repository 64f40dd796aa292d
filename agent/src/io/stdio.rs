use std::sync::Arc;

use tokio::io::BufReader;
use tokio::sync::mpsc::unbounded_channel;
use tokio_util::sync::CancellationToken;
use tracing::info;

use davshelf_core::config::ExplorerConfig;
use davshelf_core::editor::SaveEvent;
use davshelf_core::persistence::FileUrlStore;
use davshelf_core::storage::local::LocalConnector;
use davshelf_core::storage::memory::MemoryConnector;
use davshelf_core::storage::ConnectorSet;
use davshelf_core::Explorer;

use crate::handler::dispatch::Dispatcher;
use crate::io::transport::{run_transport_loop, LoopChannels};
use crate::protocol::messages::JsonRpcNotification;

/// Run the NDJSON stdio transport loop.
///
/// Reads JSON-RPC messages from stdin (one per line) and writes
/// responses and notifications to stdout. Logs go to stderr.
pub async fn run_stdio_loop(
    config: ExplorerConfig,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let (notification_tx, mut notification_rx) = unbounded_channel::<JsonRpcNotification>();
    let (save_tx, mut save_rx) = unbounded_channel::<SaveEvent>();

    let explorer = Explorer::new(
        config,
        Arc::new(build_connectors()),
        Arc::new(FileUrlStore::new()),
    )
    .with_save_events(save_tx);
    let mut dispatcher = Dispatcher::new(explorer, notification_tx);
    dispatcher.startup().await;

    let mut reader = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();

    info!("Stdio transport loop started, waiting for input");
    run_transport_loop(
        &mut reader,
        &mut stdout,
        &mut dispatcher,
        LoopChannels {
            notifications: &mut notification_rx,
            save_events: &mut save_rx,
        },
        shutdown,
    )
    .await?;
    info!("Stdin closed, shutting down");

    Ok(())
}

/// Connectors for every URL scheme the agent serves.
pub fn build_connectors() -> ConnectorSet {
    ConnectorSet::new()
        .with(LocalConnector)
        .with(MemoryConnector::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use davshelf_core::storage::StorageConnector;

    #[test]
    fn connectors_cover_advertised_schemes() {
        let connectors = build_connectors();
        assert!(connectors.supports("file:///tmp"));
        assert!(connectors.supports("mem://demo"));
        assert!(!connectors.supports("https://dav.example"));
    }
}
