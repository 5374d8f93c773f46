/// Local (optimistic) edits and reconciliation on a `BoardDetail`.
use super::ClientError;
use crate::position::{clamp_index, next_position, Positioned};
use crate::reorder::{reorder, ReorderPolicy};
use crate::types::{BoardDetail, Card, List, ListDetail, MoveOutcome};

fn list_mut<'a>(board: &'a mut BoardDetail, list_id: &str) -> Result<&'a mut ListDetail, ClientError> {
    board
        .list_mut(list_id)
        .ok_or_else(|| ClientError::Missing(format!("List {}", list_id)))
}

fn renumber_cards(cards: &mut [Card]) {
    for (index, card) in cards.iter_mut().enumerate() {
        card.set_position(index as i64);
    }
}

pub(super) fn insert_card(
    board: &mut BoardDetail,
    list_id: &str,
    card_id: &str,
    title: &str,
) -> Result<(), ClientError> {
    let board_id = board.board.id.clone();
    let list = list_mut(board, list_id)?;
    let position = next_position(&list.cards);
    list.cards.push(Card {
        id: card_id.to_string(),
        list_id: list_id.to_string(),
        board_id,
        title: title.to_string(),
        position,
    });
    Ok(())
}

/// Swap a placeholder card for the server's card.
pub(super) fn replace_card(board: &mut BoardDetail, placeholder: &str, card: Card) {
    if let Some((li, ci)) = board.find_card(placeholder) {
        board.lists[li].cards[ci] = card;
    } else if let Some(list) = board.list_mut(&card.list_id) {
        if !list.cards.iter().any(|c| c.id == card.id) {
            list.cards.push(card);
        }
    }
}

pub(super) fn insert_list(board: &mut BoardDetail, list_id: &str, title: &str) {
    let position = next_position(board.lists.iter().map(|l| &l.list));
    board.lists.push(ListDetail {
        list: List {
            id: list_id.to_string(),
            board_id: board.board.id.clone(),
            title: title.to_string(),
            position,
        },
        cards: Vec::new(),
    });
}

pub(super) fn replace_list(board: &mut BoardDetail, placeholder: &str, list: List) {
    if let Some(local) = board.list_mut(placeholder) {
        local.list = list;
    } else if board.list(&list.id).is_none() {
        board.lists.push(ListDetail {
            list,
            cards: Vec::new(),
        });
    }
}

/// Apply an ordering locally with the lenient merge, then sort for display.
pub(super) fn reorder_lists(board: &mut BoardDetail, ordered_ids: &[String]) -> Result<(), ClientError> {
    let mut scope: Vec<&mut List> = board.lists.iter_mut().map(|l| &mut l.list).collect();
    reorder(&mut scope, ordered_ids, ReorderPolicy::Lenient)
        .map_err(|e| ClientError::Missing(e.to_string()))?;
    board.lists.sort_by_key(|l| l.list.position);
    Ok(())
}

pub(super) fn reorder_cards(
    board: &mut BoardDetail,
    list_id: &str,
    ordered_ids: &[String],
) -> Result<(), ClientError> {
    let list = list_mut(board, list_id)?;
    let mut scope: Vec<&mut Card> = list.cards.iter_mut().collect();
    reorder(&mut scope, ordered_ids, ReorderPolicy::Lenient)
        .map_err(|e| ClientError::Missing(e.to_string()))?;
    list.cards.sort_by_key(|c| c.position);
    Ok(())
}

/// Local mirror of the server move: leave the source, enter the target at a
/// clamped index, renumber both.
pub(super) fn move_card(
    board: &mut BoardDetail,
    card_id: &str,
    to_list_id: &str,
    to_index: i64,
) -> Result<(), ClientError> {
    let (from_li, ci) = board
        .find_card(card_id)
        .ok_or_else(|| ClientError::Missing(format!("Card {}", card_id)))?;
    let to_li = board
        .lists
        .iter()
        .position(|l| l.list.id == to_list_id)
        .ok_or_else(|| ClientError::Missing(format!("List {}", to_list_id)))?;

    let mut card = board.lists[from_li].cards.remove(ci);
    renumber_cards(&mut board.lists[from_li].cards);

    let target = &mut board.lists[to_li];
    card.list_id = target.list.id.clone();
    card.board_id = target.list.board_id.clone();
    let index = clamp_index(to_index, target.cards.len());
    target.cards.insert(index, card);
    renumber_cards(&mut target.cards);
    Ok(())
}

/// Adopt the server's canonical list ordering, keeping local cards.
pub(super) fn adopt_lists(board: &mut BoardDetail, lists: &[List]) {
    let mut remaining = std::mem::take(&mut board.lists);
    let mut adopted = Vec::with_capacity(remaining.len());
    for list in lists {
        let cards = remaining
            .iter()
            .position(|l| l.list.id == list.id)
            .map(|i| remaining.remove(i).cards)
            .unwrap_or_default();
        adopted.push(ListDetail {
            list: list.clone(),
            cards,
        });
    }
    adopted.extend(remaining);
    board.lists = adopted;
}

/// Adopt the server's canonical card ordering for one list. Lists that are
/// not on this board (cross-board moves) are skipped.
pub(super) fn adopt_cards(board: &mut BoardDetail, list_id: &str, cards: &[Card]) {
    if let Some(list) = board.list_mut(list_id) {
        list.cards = cards.to_vec();
    }
}

pub(super) fn adopt_move(board: &mut BoardDetail, outcome: &MoveOutcome) {
    adopt_cards(board, &outcome.from_list_id, &outcome.source_cards);
    adopt_cards(board, &outcome.to_list_id, &outcome.target_cards);
}
