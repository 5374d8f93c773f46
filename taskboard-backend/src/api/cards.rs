use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use serde::Deserialize;
use taskboard_core::events::BoardChangeEvent;
use taskboard_core::storage::{BoardStorage, EntityKind, StorageError};
use taskboard_core::types::{Card, MoveOutcome};

use super::boards::{ReorderBody, TitleBody};
use super::{api_err, expected_version, log_api_issue, ApiError, ApiJson};
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveBody {
    #[serde(default)]
    pub to_list_id: String,
    pub to_index: i64,
}

pub async fn list_cards(
    State(state): State<AppState>,
    Path(list_id): Path<String>,
) -> Result<Json<Vec<Card>>, ApiError> {
    let cards = state
        .store
        .list_cards(&list_id)
        .map_err(api_err("taskboard.api.list_cards"))?;
    Ok(Json(cards))
}

pub async fn create_card(
    State(state): State<AppState>,
    Path(list_id): Path<String>,
    ApiJson(body): ApiJson<TitleBody>,
) -> Result<(StatusCode, Json<Card>), ApiError> {
    let card = state
        .store
        .create_card(&list_id, &body.title)
        .map_err(api_err("taskboard.api.create_card"))?;
    state
        .publish(BoardChangeEvent::CardCreated {
            board_id: card.board_id.clone(),
            list_id,
            card_id: card.id.clone(),
        })
        .await;
    Ok((StatusCode::CREATED, Json(card)))
}

pub async fn reorder_cards(
    State(state): State<AppState>,
    Path(list_id): Path<String>,
    headers: HeaderMap,
    ApiJson(body): ApiJson<ReorderBody>,
) -> Result<Json<Vec<Card>>, ApiError> {
    let target = "taskboard.api.reorder_cards";
    let expected = expected_version(&headers)?;
    let cards = state
        .store
        .reorder_cards(&list_id, &body.ordered_ids, expected)
        .map_err(api_err(target))?;
    let board_id = match cards.first() {
        Some(card) => card.board_id.clone(),
        None => state
            .store
            .snapshot()
            .map_err(api_err(target))?
            .list(&list_id)
            .map(|l| l.board_id.clone())
            .unwrap_or_default(),
    };
    state
        .publish(BoardChangeEvent::CardsReordered { board_id, list_id })
        .await;
    Ok(Json(cards))
}

/// POST /api/cards/{card_id}/move -- `{toListId, toIndex}`; same-list moves
/// take the same path as cross-list ones.
pub async fn move_card(
    State(state): State<AppState>,
    Path(card_id): Path<String>,
    headers: HeaderMap,
    ApiJson(body): ApiJson<MoveBody>,
) -> Result<Json<MoveOutcome>, ApiError> {
    let target = "taskboard.api.move_card";
    let expected = expected_version(&headers)?;
    let outcome = state
        .store
        .move_card(&card_id, &body.to_list_id, body.to_index, expected)
        .map_err(api_err(target))?;
    log::debug!(
        target: target,
        "Moved card {} from {} to {} at {}",
        card_id,
        outcome.from_list_id,
        outcome.to_list_id,
        outcome.index
    );
    state
        .publish(BoardChangeEvent::CardMoved {
            board_id: outcome.card.board_id.clone(),
            from_board_id: outcome.from_board_id.clone(),
            card_id,
            from_list_id: outcome.from_list_id.clone(),
            to_list_id: outcome.to_list_id.clone(),
        })
        .await;
    Ok(Json(outcome))
}

/// Nested routes name the list; a card that lives elsewhere is not found.
fn check_list(
    state: &AppState,
    list_id: &str,
    card_id: &str,
    target: &'static str,
) -> Result<(), ApiError> {
    let cards = state.store.list_cards(list_id).map_err(api_err(target))?;
    if cards.iter().any(|c| c.id == card_id) {
        return Ok(());
    }
    let err = ApiError::from(StorageError::not_found(EntityKind::Card, card_id));
    log_api_issue(
        err.status(),
        target,
        format!("Card {} is not in list {}", card_id, list_id),
    );
    Err(err)
}

pub async fn rename_card(
    State(state): State<AppState>,
    Path(card_id): Path<String>,
    ApiJson(body): ApiJson<TitleBody>,
) -> Result<Json<Card>, ApiError> {
    let card = state
        .store
        .rename_card(&card_id, &body.title)
        .map_err(api_err("taskboard.api.rename_card"))?;
    state
        .publish(BoardChangeEvent::CardUpdated {
            board_id: card.board_id.clone(),
            list_id: card.list_id.clone(),
            card_id,
        })
        .await;
    Ok(Json(card))
}

pub async fn rename_list_card(
    State(state): State<AppState>,
    Path((list_id, card_id)): Path<(String, String)>,
    body: ApiJson<TitleBody>,
) -> Result<Json<Card>, ApiError> {
    check_list(&state, &list_id, &card_id, "taskboard.api.rename_card")?;
    rename_card(State(state), Path(card_id), body).await
}

pub async fn delete_card(
    State(state): State<AppState>,
    Path(card_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let card = state
        .store
        .delete_card(&card_id)
        .map_err(api_err("taskboard.api.delete_card"))?;
    state
        .publish(BoardChangeEvent::CardDeleted {
            board_id: card.board_id,
            list_id: card.list_id,
            card_id,
        })
        .await;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_list_card(
    State(state): State<AppState>,
    Path((list_id, card_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    check_list(&state, &list_id, &card_id, "taskboard.api.delete_card")?;
    delete_card(State(state), Path(card_id)).await
}
