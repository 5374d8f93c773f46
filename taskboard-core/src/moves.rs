/// Cross-List Move Engine.
///
/// A move takes the card out of its source list and inserts it into the
/// target list at a clamped index, then renumbers both lists. Moving within
/// one list is the same operation with source == target: the card leaves and
/// re-enters, so there is no separate code path for it.
use crate::position::{clamp_index, Positioned};
use crate::types::{Card, List, MoveOutcome};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("Card not found: {0}")]
    CardNotFound(String),
}

/// Move `card_id` into `target` at `to_index` (clamped into `[0, len]`).
///
/// `cards` is the flat card collection; only the source and target scopes are
/// touched. The card's `board_id` follows the target list.
pub fn move_card(
    cards: &mut [Card],
    card_id: &str,
    target: &List,
    to_index: i64,
) -> Result<MoveOutcome, MoveError> {
    let moved = cards
        .iter()
        .position(|c| c.id == card_id)
        .ok_or_else(|| MoveError::CardNotFound(card_id.to_string()))?;
    let from_list_id = cards[moved].list_id.clone();
    let from_board_id = cards[moved].board_id.clone();

    let source = scope_without(cards, &from_list_id, moved);
    let mut destination = scope_without(cards, &target.id, moved);

    let index = clamp_index(to_index, destination.len());
    destination.insert(index, moved);

    for (position, &i) in source.iter().enumerate() {
        cards[i].set_position(position as i64);
    }
    for (position, &i) in destination.iter().enumerate() {
        let card = &mut cards[i];
        card.set_position(position as i64);
        card.list_id = target.id.clone();
        card.board_id = target.board_id.clone();
    }

    let collect = |indices: &[usize]| -> Vec<Card> {
        indices.iter().map(|&i| cards[i].clone()).collect()
    };
    let target_cards = collect(&destination);
    let source_cards = if from_list_id == target.id {
        target_cards.clone()
    } else {
        collect(&source)
    };

    Ok(MoveOutcome {
        card: cards[moved].clone(),
        from_list_id,
        to_list_id: target.id.clone(),
        from_board_id,
        index,
        source_cards,
        target_cards,
    })
}

/// Indices of the cards in `list_id`, sorted by position, excluding `skip`.
fn scope_without(cards: &[Card], list_id: &str, skip: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = cards
        .iter()
        .enumerate()
        .filter(|(i, c)| *i != skip && c.list_id == list_id)
        .map(|(i, _)| i)
        .collect();
    indices.sort_by_key(|&i| cards[i].position);
    indices
}
