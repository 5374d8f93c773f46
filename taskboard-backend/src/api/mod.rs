use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use taskboard_core::storage::StorageError;

mod boards;
mod cards;
mod events;
mod lists;

use crate::state::AppState;

/// Axum REST API routes.
///
///   GET  /health                                  -> liveness
///   GET  /api/boards                              -> all boards, by position
///   POST /api/boards                              -> create board
///   POST /api/boards/reorder                      -> reorder boards
///   GET  /api/boards/:boardId                     -> board with lists and cards (+ ETag)
///   PUT  /api/boards/:boardId                     -> rename board
///   DELETE /api/boards/:boardId                   -> delete board, cascading
///   GET  /api/boards/:boardId/lists               -> lists of a board
///   POST /api/boards/:boardId/lists               -> create list
///   POST /api/boards/:boardId/lists/reorder       -> reorder lists
///   PUT|DELETE /api/boards/:boardId/lists/:listId -> rename / delete list
///   PUT|DELETE /api/lists/:listId                 -> same, without the board
///   GET  /api/lists/:listId/cards                 -> cards of a list
///   POST /api/lists/:listId/cards                 -> create card
///   POST /api/lists/:listId/cards/reorder         -> reorder cards
///   PUT|DELETE /api/lists/:listId/cards/:cardId   -> rename / delete card
///   PUT|DELETE /api/cards/:cardId                 -> same, without the list
///   POST /api/cards/:cardId/move                  -> move card to list + index
///   GET  /api/events                              -> SSE stream of change events
///   GET  /api/status                              -> running info
///   GET  /api/logs                                -> recent log entries
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(events::health))
        .route(
            "/api/boards",
            get(boards::list_boards).post(boards::create_board),
        )
        .route("/api/boards/reorder", post(boards::reorder_boards))
        .route(
            "/api/boards/{board_id}",
            get(boards::get_board)
                .put(boards::rename_board)
                .delete(boards::delete_board),
        )
        .route(
            "/api/boards/{board_id}/lists",
            get(lists::list_lists).post(lists::create_list),
        )
        .route(
            "/api/boards/{board_id}/lists/reorder",
            post(lists::reorder_lists),
        )
        .route(
            "/api/boards/{board_id}/lists/{list_id}",
            axum::routing::put(lists::rename_board_list).delete(lists::delete_board_list),
        )
        .route(
            "/api/lists/{list_id}",
            axum::routing::put(lists::rename_list).delete(lists::delete_list),
        )
        .route(
            "/api/lists/{list_id}/cards",
            get(cards::list_cards).post(cards::create_card),
        )
        .route(
            "/api/lists/{list_id}/cards/reorder",
            post(cards::reorder_cards),
        )
        .route(
            "/api/lists/{list_id}/cards/{card_id}",
            axum::routing::put(cards::rename_list_card).delete(cards::delete_list_card),
        )
        .route(
            "/api/cards/{card_id}",
            axum::routing::put(cards::rename_card).delete(cards::delete_card),
        )
        .route("/api/cards/{card_id}/move", post(cards::move_card))
        .route("/api/events", get(events::sse_events))
        .route("/api/status", get(events::status))
        .route("/api/logs", get(events::list_logs))
}

// ── Shared types and helpers used across sub-modules ────────────────────

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Storage(StorageError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Storage(StorageError::VersionMismatch { .. }) => {
                StatusCode::PRECONDITION_FAILED
            }
            ApiError::Storage(e) if e.is_validation() => StatusCode::BAD_REQUEST,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// `map_err` adapter: convert a store error and log it under `target`.
fn api_err(target: &'static str) -> impl FnOnce(StorageError) -> ApiError {
    move |e| {
        let err = ApiError::from(e);
        log_api_issue(err.status(), target, err.to_string());
        err
    }
}

/// JSON body extractor whose rejections are 400 `{"error": ...}` instead of
/// axum's plain-text 415/422.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => {
                let err = ApiError::BadRequest(rejection.body_text());
                log_api_issue(err.status(), "taskboard.api.body", err.to_string());
                Err(err)
            }
        }
    }
}

/// Board version from an `If-Match: "<version>"` header, if present.
/// `If-Match: *` matches any current version.
fn expected_version(headers: &HeaderMap) -> Result<Option<u64>, ApiError> {
    let Some(value) = headers.get("if-match") else {
        return Ok(None);
    };
    if value.as_bytes().trim_ascii() == b"*" {
        return Ok(None);
    }
    let parsed = value
        .to_str()
        .ok()
        .map(|v| v.trim().trim_start_matches("W/").trim_matches('"'))
        .and_then(|v| v.parse::<u64>().ok());
    match parsed {
        Some(version) => Ok(Some(version)),
        None => {
            let err = ApiError::BadRequest("If-Match must be a quoted board version".to_string());
            log_api_issue(err.status(), "taskboard.api.if_match", err.to_string());
            Err(err)
        }
    }
}

fn insert_header_safe(headers: &mut HeaderMap, name: &'static str, value: &str) {
    match value.parse() {
        Ok(parsed) => {
            headers.insert(name, parsed);
        }
        Err(e) => {
            log::warn!("Failed to set header {}={} ({})", name, value, e);
        }
    }
}

pub(crate) fn log_api_issue(status: StatusCode, target: &'static str, message: impl AsRef<str>) {
    let message = message.as_ref();
    if status.is_server_error() {
        log::error!(target: target, "{}", message);
    } else {
        log::warn!(target: target, "{}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskboard_core::reorder::ReorderError;
    use taskboard_core::storage::EntityKind;

    #[test]
    fn test_error_status_mapping() {
        let status = |e: StorageError| ApiError::from(e).status();
        assert_eq!(
            status(StorageError::not_found(EntityKind::List, "l")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(StorageError::Validation("empty".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(StorageError::Reorder(ReorderError::UnknownId("x".into()))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(StorageError::VersionMismatch {
                board_id: "b".into(),
                expected: 1,
                current: 2
            }),
            StatusCode::PRECONDITION_FAILED
        );
        assert_eq!(
            status(StorageError::LockPoisoned),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_expected_version_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(expected_version(&headers).unwrap(), None);
        headers.insert("if-match", "\"42\"".parse().unwrap());
        assert_eq!(expected_version(&headers).unwrap(), Some(42));
        headers.insert("if-match", "W/\"7\"".parse().unwrap());
        assert_eq!(expected_version(&headers).unwrap(), Some(7));
        headers.insert("if-match", "*".parse().unwrap());
        assert_eq!(expected_version(&headers).unwrap(), None);
        headers.insert("if-match", "\"latest\"".parse().unwrap());
        assert!(expected_version(&headers).is_err());
    }
}
