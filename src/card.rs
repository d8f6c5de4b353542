//! Card types and blackjack card values.

use core::fmt;

use serde::Serialize;

/// Card suit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Suit {
    /// Spades.
    Spades,
    /// Hearts.
    Hearts,
    /// Clubs.
    Clubs,
    /// Diamonds.
    Diamonds,
}

impl Suit {
    /// All four suits, in shoe-composition order.
    pub const ALL: [Self; 4] = [Self::Spades, Self::Hearts, Self::Clubs, Self::Diamonds];

    const fn glyph(self) -> char {
        match self {
            Self::Spades => '♠',
            Self::Hearts => '♥',
            Self::Clubs => '♣',
            Self::Diamonds => '♦',
        }
    }
}

/// A playing card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Card {
    /// The suit of the card.
    pub suit: Suit,
    /// The rank of the card (1 = Ace, 11 = Jack, 12 = Queen, 13 = King).
    pub rank: u8,
}

impl Card {
    /// Creates a new card.
    ///
    /// Note: This function does not validate the rank. Values outside 1..=13
    /// are accepted but may yield non-standard results when scoring a hand.
    #[must_use]
    pub const fn new(suit: Suit, rank: u8) -> Self {
        Self { suit, rank }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.suit.glyph())?;
        match self.rank {
            1 => write!(f, "A"),
            11 => write!(f, "J"),
            12 => write!(f, "Q"),
            13 => write!(f, "K"),
            rank => write!(f, "{rank}"),
        }
    }
}

/// Number of cards per deck.
pub const DECK_SIZE: usize = 52;

/// Blackjack value of a rank. Aces count as 11 until a hand downgrades them.
pub(crate) const fn card_value(rank: u8) -> u8 {
    match rank {
        1 => 11,
        2..=10 => rank,
        11..=13 => 10,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_cards_are_worth_ten() {
        assert_eq!(card_value(11), 10);
        assert_eq!(card_value(12), 10);
        assert_eq!(card_value(13), 10);
        assert_eq!(card_value(10), 10);
        assert_eq!(card_value(2), 2);
        assert_eq!(card_value(1), 11);
    }

    #[test]
    fn display_uses_suit_glyph_and_face_letter() {
        assert_eq!(Card::new(Suit::Hearts, 1).to_string(), "♥A");
        assert_eq!(Card::new(Suit::Spades, 13).to_string(), "♠K");
        assert_eq!(Card::new(Suit::Diamonds, 7).to_string(), "♦7");
    }
}
