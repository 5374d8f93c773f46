/// Client side of the board: the optimistic-update controller and the two
/// seams it drives (`BoardApi` for the network, `BoardView` for rendering).
pub mod controller;
pub mod in_process;
mod local;

use crate::storage::StorageError;
use crate::types::{BoardDetail, Card, List, MoveOutcome};

pub use controller::{BoardController, GestureKind, Phase};
pub use in_process::InProcessApi;

/// Prefix of IDs given to entities created optimistically, before the server
/// has assigned the real ID.
pub const PLACEHOLDER_PREFIX: &str = "temp-";

pub fn placeholder_id() -> String {
    format!("{}{}", PLACEHOLDER_PREFIX, uuid::Uuid::new_v4())
}

pub fn is_placeholder(id: &str) -> bool {
    id.starts_with(PLACEHOLDER_PREFIX)
}

/// The server operations a board front end needs.
#[allow(async_fn_in_trait)]
pub trait BoardApi {
    async fn fetch_board(&self, board_id: &str) -> Result<BoardDetail, ClientError>;

    async fn create_list(&self, board_id: &str, title: &str) -> Result<List, ClientError>;

    async fn create_card(&self, list_id: &str, title: &str) -> Result<Card, ClientError>;

    async fn reorder_lists(
        &self,
        board_id: &str,
        ordered_ids: &[String],
    ) -> Result<Vec<List>, ClientError>;

    async fn reorder_cards(
        &self,
        list_id: &str,
        ordered_ids: &[String],
    ) -> Result<Vec<Card>, ClientError>;

    async fn move_card(
        &self,
        card_id: &str,
        to_list_id: &str,
        to_index: i64,
    ) -> Result<MoveOutcome, ClientError>;
}

/// Where the controller renders. Called synchronously after every state change.
pub trait BoardView {
    fn render(&mut self, board: &BoardDetail);

    /// Surface a user-visible status line (errors after a rollback).
    fn show_status(&mut self, message: &str);
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    #[error("Request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("{0} is not part of the local board state")]
    Missing(String),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// HTTP-equivalent status for a store error, so in-process and remote
    /// APIs fail the same way.
    pub fn from_storage(error: StorageError) -> Self {
        let status = match &error {
            StorageError::NotFound { .. } => 404,
            StorageError::VersionMismatch { .. } => 412,
            e if e.is_validation() => 400,
            _ => 500,
        };
        ClientError::Status {
            status,
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::EntityKind;

    #[test]
    fn test_placeholder_ids() {
        let id = placeholder_id();
        assert!(is_placeholder(&id));
        assert!(!is_placeholder("3f2a"));
        assert_ne!(id, placeholder_id());
    }

    #[test]
    fn test_storage_error_status_mapping() {
        let e = ClientError::from_storage(StorageError::not_found(EntityKind::Card, "c"));
        assert_eq!(e.status(), Some(404));
        let e = ClientError::from_storage(StorageError::Validation("bad".into()));
        assert_eq!(e.status(), Some(400));
        let e = ClientError::from_storage(StorageError::LockPoisoned);
        assert_eq!(e.status(), Some(500));
        assert_eq!(ClientError::Transport("down".into()).status(), None);
    }
}
