/// WebSocket change notifications.
///
/// Protocol:
///   Client connects to /ws?boardId=<id> (or boardId=boards for the board list).
///   Server pushes one JSON BoardChangeEvent per text message.
///   Client messages are ignored; the room is left when the socket closes.
use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::collections::HashMap;
use taskboard_core::events::{BoardChangeEvent, ChannelKey};
use tokio::sync::mpsc;

use crate::api::{log_api_issue, ApiError};
use crate::state::AppState;

// ── NotifyHub ───────────────────────────────────────────────────────────────

struct Room {
    peers: HashMap<u64, mpsc::UnboundedSender<String>>,
}

pub struct NotifyHub {
    rooms: HashMap<ChannelKey, Room>,
    next_peer_id: u64,
}

impl Default for NotifyHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotifyHub {
    pub fn new() -> Self {
        Self {
            rooms: HashMap::new(),
            next_peer_id: 1,
        }
    }

    /// Join a channel. Returns (peer_id, receiver).
    pub fn register(&mut self, channel: ChannelKey) -> (u64, mpsc::UnboundedReceiver<String>) {
        let peer_id = self.next_peer_id;
        self.next_peer_id += 1;
        let (tx, rx) = mpsc::unbounded_channel();
        self.rooms
            .entry(channel)
            .or_insert_with(|| Room {
                peers: HashMap::new(),
            })
            .peers
            .insert(peer_id, tx);
        (peer_id, rx)
    }

    /// Leave a channel; the room is dropped once empty.
    pub fn unregister(&mut self, channel: &ChannelKey, peer_id: u64) {
        if let Some(room) = self.rooms.get_mut(channel) {
            room.peers.remove(&peer_id);
            if room.peers.is_empty() {
                self.rooms.remove(channel);
            }
        }
    }

    /// Send `event` to every peer of every channel it belongs to. Returns the
    /// number of sockets it was queued for.
    pub fn publish(&self, event: &BoardChangeEvent) -> usize {
        let msg = match serde_json::to_string(event) {
            Ok(msg) => msg,
            Err(e) => {
                log::error!(target: "taskboard.ws", "Failed to encode {}: {}", event.kind(), e);
                return 0;
            }
        };
        let mut delivered = 0;
        for channel in event.channels() {
            if let Some(room) = self.rooms.get(&channel) {
                for tx in room.peers.values() {
                    if tx.send(msg.clone()).is_ok() {
                        delivered += 1;
                    }
                }
            }
        }
        delivered
    }

    pub fn peer_count(&self, channel: &ChannelKey) -> usize {
        self.rooms.get(channel).map_or(0, |r| r.peers.len())
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

// ── Router + Handler ────────────────────────────────────────────────────────

pub fn notify_router() -> Router<AppState> {
    Router::new().route("/ws", get(ws_handler))
}

#[derive(Deserialize)]
struct NotifyQuery {
    #[serde(rename = "boardId")]
    board_id: Option<String>,
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<NotifyQuery>,
    State(state): State<AppState>,
) -> Response {
    let Some(board_id) = params.board_id.filter(|id| !id.is_empty()) else {
        let err = ApiError::BadRequest("boardId query parameter is required".to_string());
        log_api_issue(err.status(), "taskboard.ws", err.to_string());
        return err.into_response();
    };
    let channel = ChannelKey::from_query(&board_id);
    ws.on_upgrade(move |socket| handle_notify_session(socket, channel, state))
}

async fn handle_notify_session(socket: WebSocket, channel: ChannelKey, state: AppState) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    let (peer_id, mut hub_rx) = {
        let mut hub = state.hub.lock().await;
        hub.register(channel.clone())
    };
    log::info!(target: "taskboard.ws", "Peer {} joined {}", peer_id, channel);

    // Write task: forward hub messages to the socket
    let mut write_task = tokio::spawn(async move {
        while let Some(msg) = hub_rx.recv().await {
            if ws_tx.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    // Read task: drain until the client closes
    let mut read_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = ws_rx.next().await {
            if let Message::Close(_) = msg {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut write_task => { read_task.abort(); }
        _ = &mut read_task => { write_task.abort(); }
    }

    let mut hub = state.hub.lock().await;
    hub.unregister(&channel, peer_id);
    log::info!(target: "taskboard.ws", "Peer {} left {}", peer_id, channel);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(id: &str) -> ChannelKey {
        ChannelKey::Board(id.to_string())
    }

    #[test]
    fn test_empty_rooms_are_discarded() {
        let mut hub = NotifyHub::new();
        let (a, _rx_a) = hub.register(board("b1"));
        let (b, _rx_b) = hub.register(board("b1"));
        assert_ne!(a, b);
        assert_eq!(hub.peer_count(&board("b1")), 2);

        hub.unregister(&board("b1"), a);
        assert_eq!(hub.room_count(), 1);
        hub.unregister(&board("b1"), b);
        assert_eq!(hub.room_count(), 0);

        // unknown room/peer is a no-op
        hub.unregister(&board("b1"), b);
        assert_eq!(hub.room_count(), 0);
    }

    #[test]
    fn test_publish_reaches_only_subscribed_channels() {
        let mut hub = NotifyHub::new();
        let (_, mut rx_b1) = hub.register(board("b1"));
        let (_, mut rx_b2) = hub.register(board("b2"));
        let (_, mut rx_all) = hub.register(ChannelKey::Boards);

        let delivered = hub.publish(&BoardChangeEvent::CardCreated {
            board_id: "b1".into(),
            list_id: "l".into(),
            card_id: "c".into(),
        });
        assert_eq!(delivered, 1);

        let msg = rx_b1.try_recv().unwrap();
        let event: BoardChangeEvent = serde_json::from_str(&msg).unwrap();
        assert_eq!(event.kind(), "card.created");
        assert!(msg.contains("\"type\":\"card.created\""));
        assert!(rx_b2.try_recv().is_err());
        assert!(rx_all.try_recv().is_err());
    }

    #[test]
    fn test_board_events_reach_global_channel() {
        let mut hub = NotifyHub::new();
        let (_, mut rx_all) = hub.register(ChannelKey::Boards);
        let (_, mut rx_b1) = hub.register(board("b1"));

        let delivered = hub.publish(&BoardChangeEvent::BoardDeleted {
            board_id: "b1".into(),
        });
        assert_eq!(delivered, 2);
        assert!(rx_all.try_recv().is_ok());
        assert!(rx_b1.try_recv().is_ok());
    }

    #[test]
    fn test_cross_board_move_reaches_both_boards() {
        let mut hub = NotifyHub::new();
        let (_, mut rx_from) = hub.register(board("b1"));
        let (_, mut rx_to) = hub.register(board("b2"));

        hub.publish(&BoardChangeEvent::CardMoved {
            board_id: "b2".into(),
            from_board_id: "b1".into(),
            card_id: "c".into(),
            from_list_id: "l1".into(),
            to_list_id: "l2".into(),
        });
        assert!(rx_from.try_recv().is_ok());
        assert!(rx_to.try_recv().is_ok());
    }

    #[test]
    fn test_publish_skips_closed_receivers() {
        let mut hub = NotifyHub::new();
        let (_, rx) = hub.register(board("b1"));
        drop(rx);
        let delivered = hub.publish(&BoardChangeEvent::BoardUpdated {
            board_id: "b1".into(),
        });
        assert_eq!(delivered, 0);
    }
}
