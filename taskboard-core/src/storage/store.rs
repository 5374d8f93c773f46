/// The owned board store.
///
/// Holds the flat document behind one `RwLock`. A mutation takes the write
/// guard, applies itself to a draft copy, persists the draft and only then
/// swaps it in, so a failed validation or write leaves state untouched and
/// concurrent reorders/moves on one scope are serialized.
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{
    BoardStorage, EntityKind, JsonFilePersistence, MemoryPersistence, Persistence, StorageError,
};
use crate::config::StorageConfig;
use crate::moves;
use crate::position::next_position;
use crate::reorder::{reorder, ReorderPolicy};
use crate::types::*;

struct StoreState {
    data: BoardData,
    /// board_id -> version
    versions: HashMap<String, u64>,
}

/// One in-flight mutation: a draft of the document plus the boards it touched.
struct Transaction<'a> {
    data: BoardData,
    versions: &'a HashMap<String, u64>,
    touched: Vec<String>,
}

impl Transaction<'_> {
    fn touch(&mut self, board_id: &str) {
        if !self.touched.iter().any(|b| b == board_id) {
            self.touched.push(board_id.to_string());
        }
    }

    fn check_version(&self, board_id: &str, expected: Option<u64>) -> Result<(), StorageError> {
        let Some(expected) = expected else {
            return Ok(());
        };
        let current = self.versions.get(board_id).copied().unwrap_or(0);
        if current != expected {
            return Err(StorageError::VersionMismatch {
                board_id: board_id.to_string(),
                expected,
                current,
            });
        }
        Ok(())
    }
}

pub struct BoardStore {
    state: RwLock<StoreState>,
    persistence: Box<dyn Persistence>,
    policy: ReorderPolicy,
    /// Global version counter (monotonic, shared across all boards)
    next_version: AtomicU64,
}

impl BoardStore {
    /// Load the document from `persistence` and take ownership of it.
    pub fn new(
        persistence: Box<dyn Persistence>,
        policy: ReorderPolicy,
    ) -> Result<Self, StorageError> {
        let data = persistence.load()?;
        let store = Self {
            state: RwLock::new(StoreState {
                data: BoardData::default(),
                versions: HashMap::new(),
            }),
            persistence,
            policy,
            next_version: AtomicU64::new(1),
        };
        let versions: HashMap<String, u64> = data
            .boards
            .iter()
            .map(|b| (b.id.clone(), store.next_version()))
            .collect();
        {
            let mut state = store.write_state()?;
            state.data = data;
            state.versions = versions;
        }
        log::info!(
            target: "taskboard.storage",
            "Store ready ({}, {:?} reorder policy)",
            store.persistence.describe(),
            policy
        );
        Ok(store)
    }

    pub fn in_memory(policy: ReorderPolicy) -> Self {
        Self {
            state: RwLock::new(StoreState {
                data: BoardData::default(),
                versions: HashMap::new(),
            }),
            persistence: Box::new(MemoryPersistence::new()),
            policy,
            next_version: AtomicU64::new(1),
        }
    }

    pub fn from_config(config: &StorageConfig, policy: ReorderPolicy) -> Result<Self, StorageError> {
        let persistence: Box<dyn Persistence> = match config {
            StorageConfig::Memory => Box::new(MemoryPersistence::new()),
            StorageConfig::File { path } => Box::new(JsonFilePersistence::new(path)),
        };
        Self::new(persistence, policy)
    }

    pub fn policy(&self) -> ReorderPolicy {
        self.policy
    }

    pub fn describe(&self) -> String {
        self.persistence.describe()
    }

    /// Clone of the whole document.
    pub fn snapshot(&self) -> Result<BoardData, StorageError> {
        Ok(self.read_state()?.data.clone())
    }

    fn next_version(&self) -> u64 {
        self.next_version.fetch_add(1, Ordering::Relaxed)
    }

    fn read_state(&self) -> Result<RwLockReadGuard<'_, StoreState>, StorageError> {
        self.state.read().map_err(|_| StorageError::LockPoisoned)
    }

    fn write_state(&self) -> Result<RwLockWriteGuard<'_, StoreState>, StorageError> {
        self.state.write().map_err(|_| StorageError::LockPoisoned)
    }

    fn read<R>(&self, f: impl FnOnce(&BoardData) -> Result<R, StorageError>) -> Result<R, StorageError> {
        let state = self.read_state()?;
        f(&state.data)
    }

    /// Run `op` against a draft; persist and commit only if it succeeds.
    fn mutate<R>(
        &self,
        op: impl FnOnce(&mut Transaction<'_>) -> Result<R, StorageError>,
    ) -> Result<R, StorageError> {
        let mut state = self.write_state()?;
        let mut tx = Transaction {
            data: state.data.clone(),
            versions: &state.versions,
            touched: Vec::new(),
        };
        let result = op(&mut tx)?;
        let Transaction { data, touched, .. } = tx;

        self.persistence.save(&data)?;

        for board_id in touched {
            if data.board(&board_id).is_some() {
                let version = self.next_version();
                state.versions.insert(board_id, version);
            } else {
                state.versions.remove(&board_id);
            }
        }
        state.data = data;
        Ok(result)
    }
}

fn require_title(title: &str, kind: EntityKind) -> Result<String, StorageError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(StorageError::Validation(format!(
            "{} title must not be empty",
            kind
        )));
    }
    Ok(trimmed.to_string())
}

fn find_list<'a>(data: &'a BoardData, list_id: &str) -> Result<&'a List, StorageError> {
    data.list(list_id)
        .ok_or_else(|| StorageError::not_found(EntityKind::List, list_id))
}

fn find_board<'a>(data: &'a BoardData, board_id: &str) -> Result<&'a Board, StorageError> {
    data.board(board_id)
        .ok_or_else(|| StorageError::not_found(EntityKind::Board, board_id))
}

impl BoardStorage for BoardStore {
    fn list_boards(&self) -> Result<Vec<Board>, StorageError> {
        self.read(|data| {
            Ok(crate::position::sorted_by_position(&data.boards)
                .into_iter()
                .cloned()
                .collect())
        })
    }

    fn ensure_default_board(&self) -> Result<Option<Board>, StorageError> {
        if !self.read(|data| Ok(data.boards.is_empty()))? {
            return Ok(None);
        }
        self.mutate(|tx| {
            // Re-check under the write guard.
            if !tx.data.boards.is_empty() {
                return Ok(None);
            }
            let board = Board {
                id: new_id(),
                title: DEFAULT_BOARD_TITLE.to_string(),
                position: 0,
            };
            tx.data.boards.push(board.clone());
            tx.touch(&board.id);
            log::info!(target: "taskboard.storage", "Synthesized default board {}", board.id);
            Ok(Some(board))
        })
    }

    fn get_board(&self, board_id: &str) -> Result<BoardDetail, StorageError> {
        self.read(|data| {
            data.detail(board_id)
                .ok_or_else(|| StorageError::not_found(EntityKind::Board, board_id))
        })
    }

    fn get_board_versioned(&self, board_id: &str) -> Result<(BoardDetail, u64), StorageError> {
        let state = self.read_state()?;
        let detail = state
            .data
            .detail(board_id)
            .ok_or_else(|| StorageError::not_found(EntityKind::Board, board_id))?;
        let version = state.versions.get(board_id).copied().unwrap_or(0);
        Ok((detail, version))
    }

    fn create_board(&self, title: &str) -> Result<Board, StorageError> {
        let title = require_title(title, EntityKind::Board)?;
        self.mutate(|tx| {
            let board = Board {
                id: new_id(),
                title,
                position: next_position(&tx.data.boards),
            };
            tx.data.boards.push(board.clone());
            tx.touch(&board.id);
            Ok(board)
        })
    }

    fn rename_board(&self, board_id: &str, title: &str) -> Result<Board, StorageError> {
        let title = require_title(title, EntityKind::Board)?;
        self.mutate(|tx| {
            let board = tx
                .data
                .boards
                .iter_mut()
                .find(|b| b.id == board_id)
                .ok_or_else(|| StorageError::not_found(EntityKind::Board, board_id))?;
            board.title = title;
            let board = board.clone();
            tx.touch(board_id);
            Ok(board)
        })
    }

    fn delete_board(&self, board_id: &str) -> Result<CascadeSummary, StorageError> {
        self.mutate(|tx| {
            find_board(&tx.data, board_id)?;
            let data = &mut tx.data;

            let list_ids: Vec<String> = data
                .lists
                .iter()
                .filter(|l| l.board_id == board_id)
                .map(|l| l.id.clone())
                .collect();

            let cards_before = data.cards.len();
            data.cards
                .retain(|c| c.board_id != board_id && !list_ids.contains(&c.list_id));
            let lists_before = data.lists.len();
            data.lists.retain(|l| l.board_id != board_id);
            data.boards.retain(|b| b.id != board_id);

            let summary = CascadeSummary {
                boards: 1,
                lists: lists_before - data.lists.len(),
                cards: cards_before - data.cards.len(),
            };
            tx.touch(board_id);
            Ok(summary)
        })
    }

    fn reorder_boards(&self, ordered_ids: &[String]) -> Result<Vec<Board>, StorageError> {
        let policy = self.policy;
        self.mutate(|tx| {
            let mut scope: Vec<&mut Board> = tx.data.boards.iter_mut().collect();
            reorder(&mut scope, ordered_ids, policy)?;
            let ids: Vec<String> = tx.data.boards.iter().map(|b| b.id.clone()).collect();
            for id in &ids {
                tx.touch(id);
            }
            Ok(crate::position::sorted_by_position(&tx.data.boards)
                .into_iter()
                .cloned()
                .collect())
        })
    }

    fn list_lists(&self, board_id: &str) -> Result<Vec<List>, StorageError> {
        self.read(|data| {
            find_board(data, board_id)?;
            Ok(data.lists_of(board_id).into_iter().cloned().collect())
        })
    }

    fn create_list(&self, board_id: &str, title: &str) -> Result<List, StorageError> {
        let title = require_title(title, EntityKind::List)?;
        self.mutate(|tx| {
            find_board(&tx.data, board_id)?;
            let list = List {
                id: new_id(),
                board_id: board_id.to_string(),
                title,
                position: next_position(tx.data.lists.iter().filter(|l| l.board_id == board_id)),
            };
            tx.data.lists.push(list.clone());
            tx.touch(board_id);
            Ok(list)
        })
    }

    fn rename_list(&self, list_id: &str, title: &str) -> Result<List, StorageError> {
        let title = require_title(title, EntityKind::List)?;
        self.mutate(|tx| {
            let list = tx
                .data
                .lists
                .iter_mut()
                .find(|l| l.id == list_id)
                .ok_or_else(|| StorageError::not_found(EntityKind::List, list_id))?;
            list.title = title;
            let list = list.clone();
            tx.touch(&list.board_id);
            Ok(list)
        })
    }

    fn delete_list(&self, list_id: &str) -> Result<(List, CascadeSummary), StorageError> {
        self.mutate(|tx| {
            let list = find_list(&tx.data, list_id)?.clone();
            let cards_before = tx.data.cards.len();
            tx.data.cards.retain(|c| c.list_id != list_id);
            tx.data.lists.retain(|l| l.id != list_id);
            let summary = CascadeSummary {
                boards: 0,
                lists: 1,
                cards: cards_before - tx.data.cards.len(),
            };
            tx.touch(&list.board_id);
            Ok((list, summary))
        })
    }

    fn reorder_lists(
        &self,
        board_id: &str,
        ordered_ids: &[String],
        expected_version: Option<u64>,
    ) -> Result<Vec<List>, StorageError> {
        let policy = self.policy;
        self.mutate(|tx| {
            find_board(&tx.data, board_id)?;
            tx.check_version(board_id, expected_version)?;
            let mut scope: Vec<&mut List> = tx
                .data
                .lists
                .iter_mut()
                .filter(|l| l.board_id == board_id)
                .collect();
            reorder(&mut scope, ordered_ids, policy)?;
            tx.touch(board_id);
            Ok(tx.data.lists_of(board_id).into_iter().cloned().collect())
        })
    }

    fn list_cards(&self, list_id: &str) -> Result<Vec<Card>, StorageError> {
        self.read(|data| {
            find_list(data, list_id)?;
            Ok(data.cards_of(list_id).into_iter().cloned().collect())
        })
    }

    fn create_card(&self, list_id: &str, title: &str) -> Result<Card, StorageError> {
        let title = require_title(title, EntityKind::Card)?;
        self.mutate(|tx| {
            let board_id = find_list(&tx.data, list_id)?.board_id.clone();
            let card = Card {
                id: new_id(),
                list_id: list_id.to_string(),
                board_id: board_id.clone(),
                title,
                position: next_position(tx.data.cards.iter().filter(|c| c.list_id == list_id)),
            };
            tx.data.cards.push(card.clone());
            tx.touch(&board_id);
            Ok(card)
        })
    }

    fn rename_card(&self, card_id: &str, title: &str) -> Result<Card, StorageError> {
        let title = require_title(title, EntityKind::Card)?;
        self.mutate(|tx| {
            let card = tx
                .data
                .cards
                .iter_mut()
                .find(|c| c.id == card_id)
                .ok_or_else(|| StorageError::not_found(EntityKind::Card, card_id))?;
            card.title = title;
            let card = card.clone();
            tx.touch(&card.board_id);
            Ok(card)
        })
    }

    fn delete_card(&self, card_id: &str) -> Result<Card, StorageError> {
        self.mutate(|tx| {
            let index = tx
                .data
                .cards
                .iter()
                .position(|c| c.id == card_id)
                .ok_or_else(|| StorageError::not_found(EntityKind::Card, card_id))?;
            let card = tx.data.cards.remove(index);
            tx.touch(&card.board_id);
            Ok(card)
        })
    }

    fn reorder_cards(
        &self,
        list_id: &str,
        ordered_ids: &[String],
        expected_version: Option<u64>,
    ) -> Result<Vec<Card>, StorageError> {
        let policy = self.policy;
        self.mutate(|tx| {
            let board_id = find_list(&tx.data, list_id)?.board_id.clone();
            tx.check_version(&board_id, expected_version)?;
            let mut scope: Vec<&mut Card> = tx
                .data
                .cards
                .iter_mut()
                .filter(|c| c.list_id == list_id)
                .collect();
            reorder(&mut scope, ordered_ids, policy)?;
            tx.touch(&board_id);
            Ok(tx.data.cards_of(list_id).into_iter().cloned().collect())
        })
    }

    fn move_card(
        &self,
        card_id: &str,
        to_list_id: &str,
        to_index: i64,
        expected_version: Option<u64>,
    ) -> Result<MoveOutcome, StorageError> {
        if to_list_id.trim().is_empty() {
            return Err(StorageError::Validation(
                "toListId must not be empty".to_string(),
            ));
        }
        self.mutate(|tx| {
            let card_board = tx
                .data
                .card(card_id)
                .ok_or_else(|| StorageError::not_found(EntityKind::Card, card_id))?
                .board_id
                .clone();
            let target = find_list(&tx.data, to_list_id)?.clone();
            tx.check_version(&card_board, expected_version)?;

            let outcome = moves::move_card(&mut tx.data.cards, card_id, &target, to_index)?;
            tx.touch(&outcome.from_board_id);
            tx.touch(&target.board_id);
            Ok(outcome)
        })
    }

    fn board_version(&self, board_id: &str) -> Option<u64> {
        self.read_state()
            .ok()
            .and_then(|state| state.versions.get(board_id).copied())
    }
}
