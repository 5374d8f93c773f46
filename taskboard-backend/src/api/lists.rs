use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use taskboard_core::events::BoardChangeEvent;
use taskboard_core::storage::{BoardStorage, EntityKind, StorageError};
use taskboard_core::types::List;

use super::boards::{ReorderBody, TitleBody};
use super::{api_err, expected_version, log_api_issue, ApiError, ApiJson};
use crate::state::AppState;

pub async fn list_lists(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
) -> Result<Json<Vec<List>>, ApiError> {
    let lists = state
        .store
        .list_lists(&board_id)
        .map_err(api_err("taskboard.api.list_lists"))?;
    Ok(Json(lists))
}

pub async fn create_list(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
    ApiJson(body): ApiJson<TitleBody>,
) -> Result<(StatusCode, Json<List>), ApiError> {
    let list = state
        .store
        .create_list(&board_id, &body.title)
        .map_err(api_err("taskboard.api.create_list"))?;
    state
        .publish(BoardChangeEvent::ListCreated {
            board_id,
            list_id: list.id.clone(),
        })
        .await;
    Ok((StatusCode::CREATED, Json(list)))
}

pub async fn reorder_lists(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
    headers: HeaderMap,
    ApiJson(body): ApiJson<ReorderBody>,
) -> Result<Json<Vec<List>>, ApiError> {
    let expected = expected_version(&headers)?;
    let lists = state
        .store
        .reorder_lists(&board_id, &body.ordered_ids, expected)
        .map_err(api_err("taskboard.api.reorder_lists"))?;
    state
        .publish(BoardChangeEvent::ListsReordered { board_id })
        .await;
    Ok(Json(lists))
}

/// Nested routes name the board; a list that lives elsewhere is not found.
fn check_board(
    state: &AppState,
    board_id: &str,
    list_id: &str,
    target: &'static str,
) -> Result<(), ApiError> {
    let lists = state.store.list_lists(board_id).map_err(api_err(target))?;
    if lists.iter().any(|l| l.id == list_id) {
        return Ok(());
    }
    let err = ApiError::from(StorageError::not_found(EntityKind::List, list_id));
    log_api_issue(
        err.status(),
        target,
        format!("List {} is not on board {}", list_id, board_id),
    );
    Err(err)
}

pub async fn rename_list(
    State(state): State<AppState>,
    Path(list_id): Path<String>,
    ApiJson(body): ApiJson<TitleBody>,
) -> Result<Json<List>, ApiError> {
    let list = state
        .store
        .rename_list(&list_id, &body.title)
        .map_err(api_err("taskboard.api.rename_list"))?;
    state
        .publish(BoardChangeEvent::ListUpdated {
            board_id: list.board_id.clone(),
            list_id,
        })
        .await;
    Ok(Json(list))
}

pub async fn rename_board_list(
    State(state): State<AppState>,
    Path((board_id, list_id)): Path<(String, String)>,
    body: ApiJson<TitleBody>,
) -> Result<Json<List>, ApiError> {
    check_board(&state, &board_id, &list_id, "taskboard.api.rename_list")?;
    rename_list(State(state), Path(list_id), body).await
}

pub async fn delete_list(
    State(state): State<AppState>,
    Path(list_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let (list, summary) = state
        .store
        .delete_list(&list_id)
        .map_err(api_err("taskboard.api.delete_list"))?;
    log::info!(
        target: "taskboard.api.delete_list",
        "Deleted list {} with {} card(s)",
        list_id,
        summary.cards
    );
    state
        .publish(BoardChangeEvent::ListDeleted {
            board_id: list.board_id,
            list_id,
        })
        .await;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_board_list(
    State(state): State<AppState>,
    Path((board_id, list_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    check_board(&state, &board_id, &list_id, "taskboard.api.delete_list")?;
    delete_list(State(state), Path(list_id)).await
}
