//! The closed set of player actions.

use serde::{Deserialize, Serialize};

/// A player action, validated against the current legal set before it
/// reaches the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Draw one more card.
    Hit,
    /// Keep the current hand and end the turn for this hand.
    Stand,
    /// Double the wager, draw exactly one card, then stand.
    DoubleDown,
    /// Split a pair into two hands.
    Split,
    /// Side wager against a dealer blackjack.
    Insurance,
}

impl Action {
    /// Numeric wire code used by the transport layer (bet = 1, exit = 0).
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Hit => 2,
            Self::Stand => 3,
            Self::DoubleDown => 4,
            Self::Split => 5,
            Self::Insurance => 6,
        }
    }

    /// Parses a wire code back into an action.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            2 => Some(Self::Hit),
            3 => Some(Self::Stand),
            4 => Some(Self::DoubleDown),
            5 => Some(Self::Split),
            6 => Some(Self::Insurance),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for action in [
            Action::Hit,
            Action::Stand,
            Action::DoubleDown,
            Action::Split,
            Action::Insurance,
        ] {
            assert_eq!(Action::from_code(action.code()), Some(action));
        }
        assert_eq!(Action::from_code(0), None);
        assert_eq!(Action::from_code(7), None);
    }
}
