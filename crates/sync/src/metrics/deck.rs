use std::collections::HashSet;

use player_core::model::{CardId, Percentage};

use super::CompletionMetric;

/// Flashcard deck interaction state: `round(flipped / total * 100)`.
///
/// Re-flipping a card counts once.
#[derive(Debug, Clone, Default)]
pub struct DeckMetrics {
    total_cards: u32,
    flipped: HashSet<CardId>,
}

impl DeckMetrics {
    #[must_use]
    pub fn new(total_cards: u32) -> Self {
        Self {
            total_cards,
            flipped: HashSet::new(),
        }
    }

    /// Record that a card was flipped to its answer side.
    pub fn flip(&mut self, card: CardId) {
        self.flipped.insert(card);
    }

    /// An upstream edit changed the deck size; flipped cards are kept.
    pub fn set_total_cards(&mut self, total_cards: u32) {
        self.total_cards = total_cards;
    }

    #[must_use]
    pub fn flipped_count(&self) -> usize {
        self.flipped.len()
    }
}

impl CompletionMetric for DeckMetrics {
    fn completion(&self) -> Percentage {
        Percentage::from_ratio(self.flipped.len() as u64, u64::from(self.total_cards))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_of_flipped_cards() {
        let mut deck = DeckMetrics::new(4);
        assert_eq!(deck.completion().value(), 0);

        deck.flip(CardId::new(1));
        assert_eq!(deck.completion().value(), 25);

        deck.flip(CardId::new(2));
        deck.flip(CardId::new(1)); // already counted
        assert_eq!(deck.completion().value(), 50);
    }

    #[test]
    fn empty_deck_is_zero() {
        assert_eq!(DeckMetrics::new(0).completion(), Percentage::ZERO);
    }

    #[test]
    fn shrinking_deck_may_lower_the_candidate() {
        let mut deck = DeckMetrics::new(4);
        deck.flip(CardId::new(1));
        deck.flip(CardId::new(2));
        assert_eq!(deck.completion().value(), 50);

        deck.set_total_cards(8);
        assert_eq!(deck.completion().value(), 25);
    }

    #[test]
    fn more_flips_than_cards_clamps_to_complete() {
        let mut deck = DeckMetrics::new(1);
        deck.flip(CardId::new(1));
        deck.flip(CardId::new(2));
        assert!(deck.completion().is_complete());
    }
}
