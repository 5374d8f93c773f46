use axum::{
    extract::{Query, State},
    response::{sse::Event, Json, Sse},
};
use serde::Deserialize;
use std::convert::Infallible;
use taskboard_core::events::{ChannelKey, BOARDS_CHANNEL};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::state::AppState;

#[derive(Deserialize)]
pub struct EventsQuery {
    #[serde(rename = "boardId")]
    board_id: Option<String>,
}

/// SSE endpoint: streams BoardChangeEvent as JSON to connected clients.
/// `?boardId=` narrows the stream to one channel (`boards` for the board list).
pub async fn sse_events(
    State(state): State<AppState>,
    Query(params): Query<EventsQuery>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let channel = params
        .board_id
        .filter(|id| !id.is_empty())
        .map(|id| ChannelKey::from_query(&id));
    let rx = state.event_tx.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(move |result| match result {
        Ok(event) => {
            if let Some(channel) = &channel {
                if !event.channels().contains(channel) {
                    return None;
                }
            }
            let json = serde_json::to_string(&event).unwrap_or_default();
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    // Keep-alive every 30 seconds
    let stream = stream.merge(tokio_stream::StreamExt::map(
        tokio_stream::wrappers::IntervalStream::new(tokio::time::interval(
            std::time::Duration::from_secs(30),
        )),
        |_| Ok(Event::default().comment("keep-alive")),
    ));

    Sse::new(stream)
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn status(State(state): State<AppState>) -> Json<serde_json::Value> {
    let sockets = state.hub.lock().await.room_count();
    Json(serde_json::json!({
        "status": "running",
        "port": state.port(),
        "bindAddress": state.config.bind_address,
        "storage": state.config.storage.mode_name(),
        "location": state.store.describe(),
        "reorderPolicy": state.store.policy(),
        "openChannels": sockets,
        "boardsChannel": BOARDS_CHANNEL,
    }))
}

pub async fn list_logs() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "entries": crate::log_bridge::recent_entries(),
    }))
}
