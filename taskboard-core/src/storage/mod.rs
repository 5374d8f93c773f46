pub mod json_file;
pub mod memory;
pub mod store;

use crate::moves::MoveError;
use crate::reorder::ReorderError;
use crate::types::{Board, BoardData, BoardDetail, CascadeSummary, Card, List, MoveOutcome};

pub use json_file::JsonFilePersistence;
pub use memory::MemoryPersistence;
pub use store::BoardStore;

/// The store seam request handlers depend on.
///
/// Every mutation is atomic: it either applies to the whole affected scope
/// and is persisted, or leaves state untouched and returns an error.
/// `expected_version` (when given) must equal the board's current version.
pub trait BoardStorage: Send + Sync {
    fn list_boards(&self) -> Result<Vec<Board>, StorageError>;

    /// Create the default board when no board exists. Returns it if created.
    fn ensure_default_board(&self) -> Result<Option<Board>, StorageError>;

    fn get_board(&self, board_id: &str) -> Result<BoardDetail, StorageError>;

    /// Board detail together with the version it was read at.
    fn get_board_versioned(&self, board_id: &str) -> Result<(BoardDetail, u64), StorageError>;

    fn create_board(&self, title: &str) -> Result<Board, StorageError>;

    fn rename_board(&self, board_id: &str, title: &str) -> Result<Board, StorageError>;

    /// Delete a board and cascade to its lists and their cards.
    fn delete_board(&self, board_id: &str) -> Result<CascadeSummary, StorageError>;

    fn reorder_boards(&self, ordered_ids: &[String]) -> Result<Vec<Board>, StorageError>;

    fn list_lists(&self, board_id: &str) -> Result<Vec<List>, StorageError>;

    fn create_list(&self, board_id: &str, title: &str) -> Result<List, StorageError>;

    fn rename_list(&self, list_id: &str, title: &str) -> Result<List, StorageError>;

    /// Delete a list and its cards. Sibling list positions are left alone.
    fn delete_list(&self, list_id: &str) -> Result<(List, CascadeSummary), StorageError>;

    fn reorder_lists(
        &self,
        board_id: &str,
        ordered_ids: &[String],
        expected_version: Option<u64>,
    ) -> Result<Vec<List>, StorageError>;

    fn list_cards(&self, list_id: &str) -> Result<Vec<Card>, StorageError>;

    fn create_card(&self, list_id: &str, title: &str) -> Result<Card, StorageError>;

    fn rename_card(&self, card_id: &str, title: &str) -> Result<Card, StorageError>;

    fn delete_card(&self, card_id: &str) -> Result<Card, StorageError>;

    fn reorder_cards(
        &self,
        list_id: &str,
        ordered_ids: &[String],
        expected_version: Option<u64>,
    ) -> Result<Vec<Card>, StorageError>;

    /// `expected_version` is checked against the card's source board; a
    /// different target board is not version-checked.
    fn move_card(
        &self,
        card_id: &str,
        to_list_id: &str,
        to_index: i64,
        expected_version: Option<u64>,
    ) -> Result<MoveOutcome, StorageError>;

    /// Monotonic version of a board, bumped by every mutation touching it.
    fn board_version(&self, board_id: &str) -> Option<u64>;
}

/// Durable home of the flat document.
pub trait Persistence: Send + Sync {
    /// Load the document. Implementations recover from unreadable content by
    /// returning an empty document.
    fn load(&self) -> Result<BoardData, StorageError>;

    fn save(&self, data: &BoardData) -> Result<(), StorageError>;

    /// Human-readable location, for status output and logs.
    fn describe(&self) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Board,
    List,
    Card,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            EntityKind::Board => "Board",
            EntityKind::List => "List",
            EntityKind::Card => "Card",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Reorder(#[from] ReorderError),

    #[error("Board {board_id} is at version {current}, request expected {expected}")]
    VersionMismatch {
        board_id: String,
        expected: u64,
        current: u64,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

impl StorageError {
    pub fn not_found(kind: EntityKind, id: &str) -> Self {
        StorageError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Caller errors (bad input), as opposed to lookups or server faults.
    pub fn is_validation(&self) -> bool {
        matches!(self, StorageError::Validation(_) | StorageError::Reorder(_))
    }
}

impl From<MoveError> for StorageError {
    fn from(e: MoveError) -> Self {
        match e {
            MoveError::CardNotFound(id) => StorageError::NotFound {
                kind: EntityKind::Card,
                id,
            },
        }
    }
}
