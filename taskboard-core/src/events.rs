/// Change events pushed to observers after a successful mutation.
///
/// Events are invalidation signals: they carry a type tag and identifying
/// IDs only. Observers re-fetch authoritative state when one arrives.
use serde::{Deserialize, Serialize};

/// Query value that selects the global board-list channel.
pub const BOARDS_CHANNEL: &str = "boards";

/// A push channel: the global board list, or one board.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChannelKey {
    Boards,
    Board(String),
}

impl ChannelKey {
    /// Parse the `boardId` query parameter of a push connection.
    pub fn from_query(board_id: &str) -> Self {
        if board_id == BOARDS_CHANNEL {
            ChannelKey::Boards
        } else {
            ChannelKey::Board(board_id.to_string())
        }
    }
}

impl std::fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelKey::Boards => f.write_str(BOARDS_CHANNEL),
            ChannelKey::Board(id) => f.write_str(id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BoardChangeEvent {
    #[serde(rename = "board.created", rename_all = "camelCase")]
    BoardCreated { board_id: String },
    #[serde(rename = "board.updated", rename_all = "camelCase")]
    BoardUpdated { board_id: String },
    #[serde(rename = "board.deleted", rename_all = "camelCase")]
    BoardDeleted { board_id: String },
    #[serde(rename = "board.reordered")]
    BoardsReordered,

    #[serde(rename = "list.created", rename_all = "camelCase")]
    ListCreated { board_id: String, list_id: String },
    #[serde(rename = "list.updated", rename_all = "camelCase")]
    ListUpdated { board_id: String, list_id: String },
    #[serde(rename = "list.deleted", rename_all = "camelCase")]
    ListDeleted { board_id: String, list_id: String },
    #[serde(rename = "list.reordered", rename_all = "camelCase")]
    ListsReordered { board_id: String },

    #[serde(rename = "card.created", rename_all = "camelCase")]
    CardCreated {
        board_id: String,
        list_id: String,
        card_id: String,
    },
    #[serde(rename = "card.updated", rename_all = "camelCase")]
    CardUpdated {
        board_id: String,
        list_id: String,
        card_id: String,
    },
    #[serde(rename = "card.deleted", rename_all = "camelCase")]
    CardDeleted {
        board_id: String,
        list_id: String,
        card_id: String,
    },
    #[serde(rename = "card.reordered", rename_all = "camelCase")]
    CardsReordered { board_id: String, list_id: String },
    #[serde(rename = "card.moved", rename_all = "camelCase")]
    CardMoved {
        board_id: String,
        from_board_id: String,
        card_id: String,
        from_list_id: String,
        to_list_id: String,
    },
}

impl BoardChangeEvent {
    /// Wire tag, e.g. `card.moved`.
    pub fn kind(&self) -> &'static str {
        match self {
            BoardChangeEvent::BoardCreated { .. } => "board.created",
            BoardChangeEvent::BoardUpdated { .. } => "board.updated",
            BoardChangeEvent::BoardDeleted { .. } => "board.deleted",
            BoardChangeEvent::BoardsReordered => "board.reordered",
            BoardChangeEvent::ListCreated { .. } => "list.created",
            BoardChangeEvent::ListUpdated { .. } => "list.updated",
            BoardChangeEvent::ListDeleted { .. } => "list.deleted",
            BoardChangeEvent::ListsReordered { .. } => "list.reordered",
            BoardChangeEvent::CardCreated { .. } => "card.created",
            BoardChangeEvent::CardUpdated { .. } => "card.updated",
            BoardChangeEvent::CardDeleted { .. } => "card.deleted",
            BoardChangeEvent::CardsReordered { .. } => "card.reordered",
            BoardChangeEvent::CardMoved { .. } => "card.moved",
        }
    }

    /// The board this event primarily concerns (the destination for moves).
    pub fn board_id(&self) -> Option<&str> {
        match self {
            BoardChangeEvent::BoardsReordered => None,
            BoardChangeEvent::BoardCreated { board_id }
            | BoardChangeEvent::BoardUpdated { board_id }
            | BoardChangeEvent::BoardDeleted { board_id }
            | BoardChangeEvent::ListCreated { board_id, .. }
            | BoardChangeEvent::ListUpdated { board_id, .. }
            | BoardChangeEvent::ListDeleted { board_id, .. }
            | BoardChangeEvent::ListsReordered { board_id }
            | BoardChangeEvent::CardCreated { board_id, .. }
            | BoardChangeEvent::CardUpdated { board_id, .. }
            | BoardChangeEvent::CardDeleted { board_id, .. }
            | BoardChangeEvent::CardsReordered { board_id, .. }
            | BoardChangeEvent::CardMoved { board_id, .. } => Some(board_id.as_str()),
        }
    }

    /// Whether observers of `board_id` should re-fetch.
    pub fn concerns_board(&self, board_id: &str) -> bool {
        match self {
            BoardChangeEvent::CardMoved {
                board_id: to,
                from_board_id,
                ..
            } => to == board_id || from_board_id == board_id,
            other => other.board_id() == Some(board_id),
        }
    }

    /// Every channel that must receive this event.
    pub fn channels(&self) -> Vec<ChannelKey> {
        match self {
            BoardChangeEvent::BoardsReordered => vec![ChannelKey::Boards],
            BoardChangeEvent::BoardCreated { board_id }
            | BoardChangeEvent::BoardUpdated { board_id }
            | BoardChangeEvent::BoardDeleted { board_id } => {
                vec![ChannelKey::Boards, ChannelKey::Board(board_id.clone())]
            }
            BoardChangeEvent::CardMoved {
                board_id,
                from_board_id,
                ..
            } if board_id != from_board_id => vec![
                ChannelKey::Board(from_board_id.clone()),
                ChannelKey::Board(board_id.clone()),
            ],
            other => other
                .board_id()
                .map(|id| vec![ChannelKey::Board(id.to_string())])
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format_is_tagged_and_minimal() {
        let event = BoardChangeEvent::CardMoved {
            board_id: "b1".into(),
            from_board_id: "b1".into(),
            card_id: "c".into(),
            from_list_id: "l1".into(),
            to_list_id: "l2".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "card.moved");
        assert_eq!(json["boardId"], "b1");
        assert_eq!(json["toListId"], "l2");
        assert_eq!(json.as_object().unwrap().len(), 6);
        assert_eq!(event.kind(), "card.moved");
    }

    #[test]
    fn test_kind_matches_serde_tag() {
        let events = vec![
            BoardChangeEvent::BoardsReordered,
            BoardChangeEvent::ListsReordered {
                board_id: "b".into(),
            },
            BoardChangeEvent::CardDeleted {
                board_id: "b".into(),
                list_id: "l".into(),
                card_id: "c".into(),
            },
        ];
        for event in events {
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["type"], event.kind());
            let back: BoardChangeEvent = serde_json::from_value(json).unwrap();
            assert_eq!(back, event);
        }
    }

    #[test]
    fn test_board_events_reach_global_channel() {
        let event = BoardChangeEvent::BoardDeleted {
            board_id: "b1".into(),
        };
        assert_eq!(
            event.channels(),
            vec![ChannelKey::Boards, ChannelKey::Board("b1".into())]
        );
    }

    #[test]
    fn test_cross_board_move_reaches_both_boards() {
        let event = BoardChangeEvent::CardMoved {
            board_id: "b2".into(),
            from_board_id: "b1".into(),
            card_id: "c".into(),
            from_list_id: "l1".into(),
            to_list_id: "l2".into(),
        };
        assert_eq!(event.channels().len(), 2);
        assert!(event.concerns_board("b1"));
        assert!(event.concerns_board("b2"));
        assert!(!event.concerns_board("b3"));
    }

    #[test]
    fn test_list_event_single_channel() {
        let event = BoardChangeEvent::ListCreated {
            board_id: "b1".into(),
            list_id: "l1".into(),
        };
        assert_eq!(event.channels(), vec![ChannelKey::Board("b1".into())]);
    }

    #[test]
    fn test_channel_key_from_query() {
        assert_eq!(ChannelKey::from_query("boards"), ChannelKey::Boards);
        assert_eq!(
            ChannelKey::from_query("abc"),
            ChannelKey::Board("abc".into())
        );
        assert_eq!(ChannelKey::Boards.to_string(), "boards");
    }
}
