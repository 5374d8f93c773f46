use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use taskboard_core::client::{BoardApi, ClientError};
use taskboard_core::types::{Board, BoardDetail, Card, List, MoveOutcome};

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// `BoardApi` over HTTP. Any non-2xx response is a `ClientError::Status`
/// carrying the server's `{"error"}` message; connection failures are
/// `ClientError::Transport`.
#[derive(Clone)]
pub struct HttpBoardApi {
    base: String,
    http: reqwest::Client,
}

impl HttpBoardApi {
    pub fn new(base_url: &str) -> Self {
        Self {
            base: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    /// `ws://` form of the base URL, for the push channel.
    pub fn ws_url(&self) -> String {
        if let Some(rest) = self.base.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = self.base.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            self.base.clone()
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let resp = request
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let text = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|b| b.error)
            .unwrap_or(text);
        log::debug!(target: "taskboard.client.http", "{} -> {}", status, message);
        Err(ClientError::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        self.send(request)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    pub async fn list_boards(&self) -> Result<Vec<Board>, ClientError> {
        self.json(self.http.get(self.url("/api/boards"))).await
    }

    pub async fn create_board(&self, title: &str) -> Result<Board, ClientError> {
        self.json(
            self.http
                .post(self.url("/api/boards"))
                .json(&serde_json::json!({ "title": title })),
        )
        .await
    }

    pub async fn delete_board(&self, board_id: &str) -> Result<(), ClientError> {
        self.send(self.http.delete(self.url(&format!("/api/boards/{}", board_id))))
            .await?;
        Ok(())
    }
}

impl BoardApi for HttpBoardApi {
    async fn fetch_board(&self, board_id: &str) -> Result<BoardDetail, ClientError> {
        self.json(self.http.get(self.url(&format!("/api/boards/{}", board_id))))
            .await
    }

    async fn create_list(&self, board_id: &str, title: &str) -> Result<List, ClientError> {
        self.json(
            self.http
                .post(self.url(&format!("/api/boards/{}/lists", board_id)))
                .json(&serde_json::json!({ "title": title })),
        )
        .await
    }

    async fn create_card(&self, list_id: &str, title: &str) -> Result<Card, ClientError> {
        self.json(
            self.http
                .post(self.url(&format!("/api/lists/{}/cards", list_id)))
                .json(&serde_json::json!({ "title": title })),
        )
        .await
    }

    async fn reorder_lists(
        &self,
        board_id: &str,
        ordered_ids: &[String],
    ) -> Result<Vec<List>, ClientError> {
        self.json(
            self.http
                .post(self.url(&format!("/api/boards/{}/lists/reorder", board_id)))
                .json(&serde_json::json!({ "orderedIds": ordered_ids })),
        )
        .await
    }

    async fn reorder_cards(
        &self,
        list_id: &str,
        ordered_ids: &[String],
    ) -> Result<Vec<Card>, ClientError> {
        self.json(
            self.http
                .post(self.url(&format!("/api/lists/{}/cards/reorder", list_id)))
                .json(&serde_json::json!({ "orderedIds": ordered_ids })),
        )
        .await
    }

    async fn move_card(
        &self,
        card_id: &str,
        to_list_id: &str,
        to_index: i64,
    ) -> Result<MoveOutcome, ClientError> {
        self.json(
            self.http
                .post(self.url(&format!("/api/cards/{}/move", card_id)))
                .json(&serde_json::json!({ "toListId": to_list_id, "toIndex": to_index })),
        )
        .await
    }
}
