use std::sync::Arc;

use super::{BoardApi, ClientError};
use crate::storage::BoardStorage;
use crate::types::{BoardDetail, Card, List, MoveOutcome};

/// `BoardApi` served directly by a store in the same process (embedded
/// front ends, tests). Errors carry the same statuses the REST API uses.
pub struct InProcessApi<S: BoardStorage> {
    storage: Arc<S>,
}

impl<S: BoardStorage> InProcessApi<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }
}

impl<S: BoardStorage> Clone for InProcessApi<S> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
        }
    }
}

impl<S: BoardStorage> BoardApi for InProcessApi<S> {
    async fn fetch_board(&self, board_id: &str) -> Result<BoardDetail, ClientError> {
        self.storage
            .get_board(board_id)
            .map_err(ClientError::from_storage)
    }

    async fn create_list(&self, board_id: &str, title: &str) -> Result<List, ClientError> {
        self.storage
            .create_list(board_id, title)
            .map_err(ClientError::from_storage)
    }

    async fn create_card(&self, list_id: &str, title: &str) -> Result<Card, ClientError> {
        self.storage
            .create_card(list_id, title)
            .map_err(ClientError::from_storage)
    }

    async fn reorder_lists(
        &self,
        board_id: &str,
        ordered_ids: &[String],
    ) -> Result<Vec<List>, ClientError> {
        self.storage
            .reorder_lists(board_id, ordered_ids, None)
            .map_err(ClientError::from_storage)
    }

    async fn reorder_cards(
        &self,
        list_id: &str,
        ordered_ids: &[String],
    ) -> Result<Vec<Card>, ClientError> {
        self.storage
            .reorder_cards(list_id, ordered_ids, None)
            .map_err(ClientError::from_storage)
    }

    async fn move_card(
        &self,
        card_id: &str,
        to_list_id: &str,
        to_index: i64,
    ) -> Result<MoveOutcome, ClientError> {
        self.storage
            .move_card(card_id, to_list_id, to_index, None)
            .map_err(ClientError::from_storage)
    }
}
