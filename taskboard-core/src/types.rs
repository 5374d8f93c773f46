use serde::{Deserialize, Serialize};

use crate::position::{sorted_by_position, Positioned};

/// Title given to the board synthesized when none exists.
pub const DEFAULT_BOARD_TITLE: &str = "My Board";

/// Generate a fresh entity identifier (random, content-independent).
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub position: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct List {
    pub id: String,
    pub board_id: String,
    pub title: String,
    #[serde(default)]
    pub position: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    pub list_id: String,
    /// Denormalized back-reference; always equals the owning list's `board_id`.
    pub board_id: String,
    pub title: String,
    #[serde(default)]
    pub position: i64,
}

/// The flat persisted document. Lists and cards are keyed by back-reference,
/// not nested, so a scope is "every entity whose parent id matches".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardData {
    #[serde(default)]
    pub boards: Vec<Board>,
    #[serde(default)]
    pub lists: Vec<List>,
    #[serde(default)]
    pub cards: Vec<Card>,
}

impl BoardData {
    pub fn board(&self, board_id: &str) -> Option<&Board> {
        self.boards.iter().find(|b| b.id == board_id)
    }

    pub fn list(&self, list_id: &str) -> Option<&List> {
        self.lists.iter().find(|l| l.id == list_id)
    }

    pub fn card(&self, card_id: &str) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == card_id)
    }

    /// Lists of one board, sorted by position.
    pub fn lists_of(&self, board_id: &str) -> Vec<&List> {
        sorted_by_position(self.lists.iter().filter(|l| l.board_id == board_id))
    }

    /// Cards of one list, sorted by position.
    pub fn cards_of(&self, list_id: &str) -> Vec<&Card> {
        sorted_by_position(self.cards.iter().filter(|c| c.list_id == list_id))
    }

    /// Build the nested read model for one board.
    pub fn detail(&self, board_id: &str) -> Option<BoardDetail> {
        let board = self.board(board_id)?.clone();
        let lists = self
            .lists_of(board_id)
            .into_iter()
            .map(|list| ListDetail {
                list: list.clone(),
                cards: self.cards_of(&list.id).into_iter().cloned().collect(),
            })
            .collect();
        Some(BoardDetail { board, lists })
    }
}

/// Canonical nested view of one board: lists and cards sorted by position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardDetail {
    pub board: Board,
    pub lists: Vec<ListDetail>,
}

impl BoardDetail {
    pub fn list(&self, list_id: &str) -> Option<&ListDetail> {
        self.lists.iter().find(|l| l.list.id == list_id)
    }

    pub fn list_mut(&mut self, list_id: &str) -> Option<&mut ListDetail> {
        self.lists.iter_mut().find(|l| l.list.id == list_id)
    }

    /// Locate a card: (list index, card index).
    pub fn find_card(&self, card_id: &str) -> Option<(usize, usize)> {
        self.lists.iter().enumerate().find_map(|(li, list)| {
            list.cards
                .iter()
                .position(|c| c.id == card_id)
                .map(|ci| (li, ci))
        })
    }

    pub fn list_ids(&self) -> Vec<String> {
        self.lists.iter().map(|l| l.list.id.clone()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDetail {
    #[serde(flatten)]
    pub list: List,
    #[serde(default)]
    pub cards: Vec<Card>,
}

impl ListDetail {
    pub fn card_ids(&self) -> Vec<String> {
        self.cards.iter().map(|c| c.id.clone()).collect()
    }
}

/// Result of a cross-list move: the moved card plus the canonical ordering of
/// both affected lists (identical when source == target).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveOutcome {
    pub card: Card,
    pub from_list_id: String,
    pub to_list_id: String,
    pub from_board_id: String,
    /// Index actually used after clamping.
    pub index: usize,
    pub source_cards: Vec<Card>,
    pub target_cards: Vec<Card>,
}

/// Counts of entities removed by a cascading delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CascadeSummary {
    pub boards: usize,
    pub lists: usize,
    pub cards: usize,
}

impl Positioned for Board {
    fn id(&self) -> &str {
        &self.id
    }
    fn position(&self) -> i64 {
        self.position
    }
    fn set_position(&mut self, position: i64) {
        self.position = position;
    }
}

impl Positioned for List {
    fn id(&self) -> &str {
        &self.id
    }
    fn position(&self) -> i64 {
        self.position
    }
    fn set_position(&mut self, position: i64) {
        self.position = position;
    }
}

impl Positioned for Card {
    fn id(&self) -> &str {
        &self.id
    }
    fn position(&self) -> i64 {
        self.position
    }
    fn set_position(&mut self, position: i64) {
        self.position = position;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BoardData {
        BoardData {
            boards: vec![Board {
                id: "b1".into(),
                title: "Board".into(),
                position: 0,
            }],
            lists: vec![
                List {
                    id: "l2".into(),
                    board_id: "b1".into(),
                    title: "Doing".into(),
                    position: 1,
                },
                List {
                    id: "l1".into(),
                    board_id: "b1".into(),
                    title: "Todo".into(),
                    position: 0,
                },
            ],
            cards: vec![
                Card {
                    id: "c2".into(),
                    list_id: "l1".into(),
                    board_id: "b1".into(),
                    title: "second".into(),
                    position: 5,
                },
                Card {
                    id: "c1".into(),
                    list_id: "l1".into(),
                    board_id: "b1".into(),
                    title: "first".into(),
                    position: 2,
                },
            ],
        }
    }

    #[test]
    fn test_detail_sorts_lists_and_cards() {
        let detail = sample().detail("b1").unwrap();
        assert_eq!(detail.list_ids(), vec!["l1", "l2"]);
        assert_eq!(detail.lists[0].card_ids(), vec!["c1", "c2"]);
        assert!(detail.lists[1].cards.is_empty());
    }

    #[test]
    fn test_detail_unknown_board() {
        assert!(sample().detail("nope").is_none());
    }

    #[test]
    fn test_list_detail_json_is_flat() {
        let detail = sample().detail("b1").unwrap();
        let json = serde_json::to_value(&detail.lists[0]).unwrap();
        assert_eq!(json["id"], "l1");
        assert_eq!(json["boardId"], "b1");
        assert_eq!(json["cards"][0]["listId"], "l1");
    }

    #[test]
    fn test_find_card() {
        let detail = sample().detail("b1").unwrap();
        assert_eq!(detail.find_card("c2"), Some((0, 1)));
        assert_eq!(detail.find_card("missing"), None);
    }

    #[test]
    fn test_new_id_unique() {
        assert_ne!(new_id(), new_id());
    }
}
