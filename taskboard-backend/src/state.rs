/// Shared application state passed to axum handlers.
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;

use taskboard_core::events::BoardChangeEvent;
use taskboard_core::storage::BoardStore;
use tokio::sync::{broadcast, Mutex};

use crate::config::ServerConfig;
use crate::notify_ws::NotifyHub;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<BoardStore>,
    pub hub: Arc<Mutex<NotifyHub>>,
    pub event_tx: broadcast::Sender<BoardChangeEvent>,
    pub config: Arc<ServerConfig>,
    /// Port actually bound (differs from the configured one when it was 0).
    pub live_port: Arc<AtomicU16>,
}

impl AppState {
    pub fn new(store: Arc<BoardStore>, config: ServerConfig) -> Self {
        let (event_tx, _event_rx) = broadcast::channel::<BoardChangeEvent>(256);
        let live_port = Arc::new(AtomicU16::new(config.port));
        Self {
            store,
            hub: Arc::new(Mutex::new(NotifyHub::new())),
            event_tx,
            config: Arc::new(config),
            live_port,
        }
    }

    pub fn port(&self) -> u16 {
        self.live_port.load(Ordering::Relaxed)
    }

    /// Fan an event out to WebSocket rooms and SSE subscribers. Called after
    /// the store mutation has committed.
    pub async fn publish(&self, event: BoardChangeEvent) {
        let delivered = self.hub.lock().await.publish(&event);
        log::debug!(
            target: "taskboard.ws",
            "{} delivered to {} socket(s)",
            event.kind(),
            delivered
        );
        // No SSE subscribers is not an error.
        let _ = self.event_tx.send(event);
    }
}
