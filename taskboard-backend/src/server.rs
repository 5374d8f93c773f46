/// HTTP server: spawns axum on a background tokio task.
use axum::Router;
use std::sync::atomic::Ordering;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};

use crate::api::api_router;
use crate::notify_ws::notify_router;
use crate::state::AppState;

pub struct ServerHandle {
    pub port: u16,
    pub shutdown: watch::Sender<bool>,
    pub task: JoinHandle<()>,
}

impl ServerHandle {
    /// Signal graceful shutdown and wait for the server task.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    api_router()
        .merge(notify_router())
        .layer(cors)
        .with_state(state)
}

pub async fn spawn_server(state: AppState) -> Result<ServerHandle, std::io::Error> {
    let bind_addr = state.config.bind_address.clone();
    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", bind_addr, state.config.port)).await?;
    let actual_port = listener.local_addr()?.port();
    state.live_port.store(actual_port, Ordering::Relaxed);

    log::info!(
        target: "taskboard.server",
        "HTTP server listening on http://{}:{}",
        bind_addr,
        actual_port
    );

    let app = build_router(state);
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(async move {
        let shutdown = async move {
            while shutdown_rx.changed().await.is_ok() {
                if *shutdown_rx.borrow() {
                    break;
                }
            }
        };
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
        {
            log::error!(target: "taskboard.server", "HTTP server exited with error: {}", e);
        }
    });

    Ok(ServerHandle {
        port: actual_port,
        shutdown: shutdown_tx,
        task,
    })
}
