//! Multi-deck shoe with a cut-card reshuffle policy.

use rand::Rng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::warn;

use crate::card::{Card, DECK_SIZE, Suit};

/// Minimum number of decks in a shoe.
pub const MIN_DECKS: u8 = 6;
/// Maximum number of decks in a shoe.
pub const MAX_DECKS: u8 = 8;

/// A multi-deck card source.
///
/// The cut position emulates the physical plastic cut card: it only decides
/// *when* a reshuffle is due, never where the cards physically separate.
/// Reshuffling happens between rounds, not mid-deal.
#[derive(Debug)]
pub struct Shoe {
    cards: Vec<Card>,
    cut_position: usize,
    size: usize,
    decks: u8,
}

impl Shoe {
    /// Creates a shuffled shoe. `decks` is clamped to 6..=8.
    #[must_use]
    pub fn new(decks: u8, rng: &mut ChaCha8Rng) -> Self {
        let decks = decks.clamp(MIN_DECKS, MAX_DECKS);
        let mut shoe = Self {
            cards: Vec::new(),
            cut_position: 0,
            size: decks as usize * DECK_SIZE,
            decks,
        };
        shoe.shuffle(rng);
        shoe
    }

    fn full_composition(decks: u8) -> Vec<Card> {
        let mut cards = Vec::with_capacity(decks as usize * DECK_SIZE);
        for _ in 0..decks {
            for suit in Suit::ALL {
                for rank in 1..=13 {
                    cards.push(Card::new(suit, rank));
                }
            }
        }
        cards
    }

    /// Regenerates the full composition, randomizes the order, and picks a
    /// new cut position from the middle band of the shoe.
    pub fn shuffle(&mut self, rng: &mut ChaCha8Rng) {
        self.cards = Self::full_composition(self.decks);
        self.cards.shuffle(rng);
        self.cut_position = Self::pick_cut_position(self.size, rng);
    }

    /// Uniform over `[half - half/4, half + half/4]`, so the cut card never
    /// lands near either end of the shoe.
    fn pick_cut_position(size: usize, rng: &mut ChaCha8Rng) -> usize {
        let half = size / 2;
        let band = half / 4;
        rng.random_range(half - band..=half + band)
    }

    /// Draws one card from the end of the shoe.
    ///
    /// An empty shoe is an invariant violation (the reshuffle check runs
    /// proactively between rounds); defensively, the shoe regenerates and
    /// reshuffles before returning a card.
    #[expect(
        clippy::missing_panics_doc,
        reason = "a freshly shuffled shoe is never empty"
    )]
    pub fn draw(&mut self, rng: &mut ChaCha8Rng) -> Card {
        if self.cards.is_empty() {
            warn!("shoe ran empty mid-round; regenerating");
            self.shuffle(rng);
        }
        self.cards
            .pop()
            .expect("a freshly shuffled shoe is never empty")
    }

    /// Whether the cut card has been reached.
    #[must_use]
    pub fn needs_reshuffle(&self) -> bool {
        self.cards.len() < self.size - self.cut_position
    }

    /// Number of undealt cards.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.cards.len()
    }

    /// Total number of cards in a full shoe.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Current cut position.
    #[must_use]
    pub const fn cut_position(&self) -> usize {
        self.cut_position
    }

    /// Replaces the undealt cards, leaving the cut position untouched.
    ///
    /// Intended for deterministic deals in tests; the last card in `cards`
    /// is drawn first.
    pub fn load(&mut self, cards: Vec<Card>) {
        self.cards = cards;
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    fn rng(seed: u64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(seed)
    }

    #[test]
    fn full_composition_after_shuffle() {
        let mut rng = rng(1);
        let shoe = Shoe::new(6, &mut rng);
        assert_eq!(shoe.remaining(), 6 * DECK_SIZE);
        assert_eq!(shoe.size(), 312);
    }

    #[test]
    fn deck_count_is_clamped() {
        let mut rng = rng(2);
        assert_eq!(Shoe::new(1, &mut rng).size(), 6 * DECK_SIZE);
        assert_eq!(Shoe::new(12, &mut rng).size(), 8 * DECK_SIZE);
    }

    #[test]
    fn cut_position_stays_in_middle_band() {
        for seed in 0..50 {
            let mut rng = rng(seed);
            let shoe = Shoe::new(8, &mut rng);
            let half = shoe.size() / 2;
            let band = half / 4;
            assert!(shoe.cut_position() >= half - band);
            assert!(shoe.cut_position() <= half + band);
        }
    }

    #[test]
    fn reshuffle_needed_once_cut_card_is_reached() {
        let mut rng = rng(4);
        let mut shoe = Shoe::new(6, &mut rng);
        let threshold = shoe.size() - shoe.cut_position();
        while shoe.remaining() >= threshold {
            shoe.draw(&mut rng);
        }
        assert!(shoe.needs_reshuffle());
    }

    #[test]
    fn empty_shoe_regenerates_defensively() {
        let mut rng = rng(5);
        let mut shoe = Shoe::new(6, &mut rng);
        shoe.load(Vec::new());
        let card = shoe.draw(&mut rng);
        assert!(card.rank >= 1 && card.rank <= 13);
        assert_eq!(shoe.remaining(), 6 * DECK_SIZE - 1);
    }

    #[test]
    fn loaded_cards_draw_from_the_end() {
        let mut rng = rng(6);
        let mut shoe = Shoe::new(6, &mut rng);
        shoe.load(vec![
            Card::new(Suit::Hearts, 2),
            Card::new(Suit::Spades, 3),
        ]);
        assert_eq!(shoe.draw(&mut rng).rank, 3);
        assert_eq!(shoe.draw(&mut rng).rank, 2);
    }
}
