use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use taskboard_core::events::BoardChangeEvent;
use taskboard_core::storage::BoardStorage;
use taskboard_core::types::{Board, BoardDetail};

use super::{api_err, insert_header_safe, ApiError, ApiJson};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct TitleBody {
    #[serde(default)]
    pub title: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderBody {
    pub ordered_ids: Vec<String>,
}

/// GET /api/boards -- synthesizes the default board on first use.
pub async fn list_boards(State(state): State<AppState>) -> Result<Json<Vec<Board>>, ApiError> {
    let target = "taskboard.api.list_boards";
    if let Some(board) = state.store.ensure_default_board().map_err(api_err(target))? {
        state
            .publish(BoardChangeEvent::BoardCreated { board_id: board.id })
            .await;
    }
    let boards = state.store.list_boards().map_err(api_err(target))?;
    Ok(Json(boards))
}

pub async fn create_board(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<TitleBody>,
) -> Result<(StatusCode, Json<Board>), ApiError> {
    let board = state
        .store
        .create_board(&body.title)
        .map_err(api_err("taskboard.api.create_board"))?;
    log::info!(target: "taskboard.api.create_board", "Created board {} ({})", board.id, board.title);
    state
        .publish(BoardChangeEvent::BoardCreated {
            board_id: board.id.clone(),
        })
        .await;
    Ok((StatusCode::CREATED, Json(board)))
}

pub async fn reorder_boards(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ReorderBody>,
) -> Result<Json<Vec<Board>>, ApiError> {
    let boards = state
        .store
        .reorder_boards(&body.ordered_ids)
        .map_err(api_err("taskboard.api.reorder_boards"))?;
    state.publish(BoardChangeEvent::BoardsReordered).await;
    Ok(Json(boards))
}

/// GET /api/boards/{board_id} -- full nested board, `ETag` is the board version.
pub async fn get_board(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let (detail, version): (BoardDetail, u64) = state
        .store
        .get_board_versioned(&board_id)
        .map_err(api_err("taskboard.api.get_board"))?;

    let etag = format!("\"{}\"", version);
    let mut resp_headers = HeaderMap::new();
    insert_header_safe(&mut resp_headers, "etag", &etag);

    // Check If-None-Match for conditional response
    if let Some(if_none_match) = headers.get("if-none-match") {
        if let Ok(value) = if_none_match.to_str() {
            if value == etag {
                return Ok((StatusCode::NOT_MODIFIED, resp_headers).into_response());
            }
        }
    }

    Ok((StatusCode::OK, resp_headers, Json(detail)).into_response())
}

pub async fn rename_board(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
    ApiJson(body): ApiJson<TitleBody>,
) -> Result<Json<Board>, ApiError> {
    let board = state
        .store
        .rename_board(&board_id, &body.title)
        .map_err(api_err("taskboard.api.rename_board"))?;
    state
        .publish(BoardChangeEvent::BoardUpdated { board_id })
        .await;
    Ok(Json(board))
}

pub async fn delete_board(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let summary = state
        .store
        .delete_board(&board_id)
        .map_err(api_err("taskboard.api.delete_board"))?;
    log::info!(
        target: "taskboard.api.delete_board",
        "Deleted board {} with {} list(s) and {} card(s)",
        board_id,
        summary.lists,
        summary.cards
    );
    state
        .publish(BoardChangeEvent::BoardDeleted { board_id })
        .await;
    Ok(StatusCode::NO_CONTENT)
}
