/// WebSocket subscriber for change notifications.
///
/// Messages are invalidation signals; `follow` turns each relevant one into a
/// controller refresh.
use futures_util::StreamExt;
use taskboard_core::client::{BoardApi, BoardController, BoardView, ClientError};
use taskboard_core::events::{BoardChangeEvent, ChannelKey};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

pub struct BoardSubscription {
    channel: ChannelKey,
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl BoardSubscription {
    /// Connect to `<ws_base>/ws?boardId=<channel>`.
    pub async fn connect(ws_base: &str, channel: ChannelKey) -> Result<Self, ClientError> {
        let ws_url = format!("{}/ws?boardId={}", ws_base.trim_end_matches('/'), channel);
        let (ws, _) = tokio_tungstenite::connect_async(&ws_url)
            .await
            .map_err(|e| ClientError::Transport(format!("WS connect failed: {}", e)))?;
        log::info!(target: "taskboard.client.ws", "Subscribed to {}", channel);
        Ok(Self { channel, ws })
    }

    pub fn channel(&self) -> &ChannelKey {
        &self.channel
    }

    /// Next change event, or `None` once the server closes the socket.
    /// Unparsable messages are skipped; pings are answered by tungstenite.
    pub async fn next_event(&mut self) -> Option<Result<BoardChangeEvent, ClientError>> {
        while let Some(msg) = self.ws.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => return Some(Err(ClientError::Transport(e.to_string()))),
            };
            let text = match msg {
                Message::Text(t) => t,
                Message::Close(_) => {
                    log::info!(target: "taskboard.client.ws", "WS closed for {}", self.channel);
                    return None;
                }
                _ => continue,
            };
            match serde_json::from_str::<BoardChangeEvent>(&text) {
                Ok(event) => return Some(Ok(event)),
                Err(e) => {
                    log::warn!(target: "taskboard.client.ws", "Ignoring message on {}: {}", self.channel, e);
                }
            }
        }
        None
    }

    pub async fn close(mut self) -> Result<(), ClientError> {
        self.ws
            .close(None)
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))
    }
}

/// Feed events into the controller until the socket closes or `limit` events
/// have refreshed it. Returns how many refreshes happened.
pub async fn follow<A: BoardApi, V: BoardView>(
    controller: &mut BoardController<A, V>,
    subscription: &mut BoardSubscription,
    limit: Option<usize>,
) -> Result<usize, ClientError> {
    let mut refreshed = 0;
    while limit.map_or(true, |limit| refreshed < limit) {
        let Some(event) = subscription.next_event().await else {
            break;
        };
        if controller.handle_event(&event?).await? {
            refreshed += 1;
        }
    }
    Ok(refreshed)
}
