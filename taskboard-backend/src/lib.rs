/// Task board backend: config loading, store init, REST + WebSocket server.
pub mod api;
pub mod config;
mod log_bridge;
pub mod notify_ws;
pub mod server;
pub mod state;

use std::sync::Arc;

use taskboard_core::storage::{BoardStore, StorageError};

use crate::config::ServerConfig;
use crate::state::AppState;

/// Open the configured store and build handler state.
pub fn build_state(config: ServerConfig) -> Result<AppState, StorageError> {
    let store = BoardStore::from_config(&config.storage, config.reorder_policy)?;
    Ok(AppState::new(Arc::new(store), config))
}

/// Run until Ctrl-C.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = log_bridge::init() {
        eprintln!("failed to initialize logger: {}", e);
    }

    let config = config::load_from_env();
    log::info!(
        target: "taskboard.server",
        "Starting with {} storage, {:?} reorder policy",
        config.storage.mode_name(),
        config.reorder_policy
    );

    let state = build_state(config)?;
    let handle = server::spawn_server(state).await?;

    tokio::signal::ctrl_c().await?;
    log::info!(target: "taskboard.server", "Shutting down");
    handle.stop().await;
    Ok(())
}
