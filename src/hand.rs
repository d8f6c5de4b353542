//! Hands: the scoring unit for seats and the dealer.
//!
//! Hands live in an arena owned by the seat registry and refer to each other
//! by [`HandId`], never by reference; a split hand records the id of the
//! seat's primary hand as its `origin` so settlement can route payouts even
//! after intermediate hands are pruned.

use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::trace;

use crate::action::Action;
use crate::card::{Card, card_value};
use crate::shoe::Shoe;

/// Split-count cap for ordinary pairs (three additional hands per seat).
pub const MAX_SPLITS: u8 = 3;
/// Split-count cap for a pair of aces.
pub const MAX_ACE_SPLITS: u8 = 1;

/// Stable identifier for a hand within the table's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct HandId(pub(crate) u32);

impl HandId {
    /// Reserved id of the dealer's hand.
    pub const DEALER: Self = Self(u32::MAX);
}

/// Per-round lifecycle of a hand.
///
/// One-directional, except that `MyTurn` loops on itself while the seat is
/// still hitting. `SkippedRound` branches off `AwaitingBet` when the seat
/// declines to wager and bypasses the rest of the round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum HandPhase {
    /// Waiting for the seat's wager.
    AwaitingBet,
    /// Wagered; waiting for the turn to come around.
    AwaitingTurn,
    /// This hand is acting right now.
    MyTurn,
    /// Finished acting for the round.
    HasActed,
    /// Declined to wager; out of this round.
    SkippedRound,
    /// Settlement has been delivered for this hand.
    ResultNotified,
}

/// Sum of ranks with aces initially worth 11, downgraded one at a time to 1
/// while the total exceeds 21. Always derived from the card list alone.
fn evaluate_cards(cards: &[Card]) -> u8 {
    let mut score: u8 = 0;
    let mut aces: u8 = 0;

    for card in cards {
        if card.rank == 1 {
            aces += 1;
        }
        score = score.saturating_add(card_value(card.rank));
    }

    while score > 21 && aces > 0 {
        score -= 10;
        aces -= 1;
    }

    score
}

/// A card-holding entity: a seat's primary hand, a split hand, or the
/// dealer.
#[derive(Debug, Clone)]
pub struct Hand {
    id: HandId,
    owner: String,
    seat: Option<u8>,
    cards: Vec<Card>,
    score: u8,
    phase: HandPhase,
    balance: i64,
    wager: i64,
    initial_wager: i64,
    insurance_taken: bool,
    insurance_stake: i64,
    doubled: bool,
    origin: Option<HandId>,
}

impl Hand {
    /// Creates a seat's primary hand.
    #[must_use]
    pub fn new(id: HandId, owner: impl Into<String>, seat: u8, balance: i64) -> Self {
        Self {
            id,
            owner: owner.into(),
            seat: Some(seat),
            cards: Vec::new(),
            score: 0,
            phase: HandPhase::AwaitingBet,
            balance,
            wager: 0,
            initial_wager: 0,
            insurance_taken: false,
            insurance_stake: 0,
            doubled: false,
            origin: None,
        }
    }

    /// Creates the dealer's hand. The dealer has no seat and its balance is
    /// the house float.
    #[must_use]
    pub fn dealer() -> Self {
        let mut hand = Self::new(HandId::DEALER, "dealer", 0, 0);
        hand.seat = None;
        hand
    }

    /// Stable id of this hand.
    #[must_use]
    pub const fn id(&self) -> HandId {
        self.id
    }

    /// Owning identity.
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Seat number; `None` for the dealer.
    #[must_use]
    pub const fn seat(&self) -> Option<u8> {
        self.seat
    }

    /// Cards in the hand, in deal order.
    #[must_use]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Current score, recomputed on every card change.
    #[must_use]
    pub const fn score(&self) -> u8 {
        self.score
    }

    /// Current lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> HandPhase {
        self.phase
    }

    /// Chip balance. Split hands hold no balance of their own; their results
    /// route to the origin hand.
    #[must_use]
    pub const fn balance(&self) -> i64 {
        self.balance
    }

    /// Active wager for this hand.
    #[must_use]
    pub const fn wager(&self) -> i64 {
        self.wager
    }

    /// Wager as originally placed, before any double-down.
    #[must_use]
    pub const fn initial_wager(&self) -> i64 {
        self.initial_wager
    }

    /// Whether insurance has been taken on this hand.
    #[must_use]
    pub const fn insurance_taken(&self) -> bool {
        self.insurance_taken
    }

    /// The insurance side-wager amount.
    #[must_use]
    pub const fn insurance_stake(&self) -> i64 {
        self.insurance_stake
    }

    /// Whether this hand has doubled down.
    #[must_use]
    pub const fn doubled(&self) -> bool {
        self.doubled
    }

    /// Id of the primary hand this hand was split from, if any.
    #[must_use]
    pub const fn origin(&self) -> Option<HandId> {
        self.origin
    }

    /// Whether this hand was created by a split.
    #[must_use]
    pub const fn is_split_hand(&self) -> bool {
        self.origin.is_some()
    }

    /// Moves the hand to a new lifecycle phase.
    pub(crate) fn transition(&mut self, phase: HandPhase) {
        trace!(owner = %self.owner, from = ?self.phase, to = ?phase, "hand transition");
        self.phase = phase;
    }

    /// Adjusts the balance upward (settlement credit or refund).
    pub(crate) fn credit(&mut self, amount: i64) {
        self.balance += amount;
    }

    /// Adjusts the balance downward (wager or insurance charge).
    pub(crate) fn debit(&mut self, amount: i64) {
        self.balance -= amount;
    }

    /// Draws one card from the shoe and recomputes the score.
    pub fn draw(&mut self, shoe: &mut Shoe, rng: &mut ChaCha8Rng) -> Card {
        let card = shoe.draw(rng);
        self.cards.push(card);
        self.recompute_score();
        card
    }

    /// Recomputes the score from the card list. Idempotent.
    pub fn recompute_score(&mut self) {
        self.score = evaluate_cards(&self.cards);
    }

    /// Records the seat's wager. A zero wager marks the seat as skipping
    /// this round. Balance movement is handled by the orchestrator.
    pub(crate) fn place_initial_bet(&mut self, amount: i64) {
        self.wager = amount;
        self.initial_wager = amount;
        if amount == 0 {
            self.transition(HandPhase::SkippedRound);
        } else {
            self.transition(HandPhase::AwaitingTurn);
        }
    }

    /// Whether the seat declined to wager this round.
    #[must_use]
    pub fn is_skipping(&self) -> bool {
        self.phase == HandPhase::SkippedRound
    }

    /// Score of 21 with exactly the first two cards.
    #[must_use]
    pub fn is_blackjack(&self) -> bool {
        self.cards.len() == 2 && self.score == 21
    }

    /// Score above 21.
    #[must_use]
    pub const fn is_busted(&self) -> bool {
        self.score > 21
    }

    /// The subset of actions legal for this hand right now.
    ///
    /// A hand holding blackjack or one that has already doubled may only
    /// stand. Doubling requires an untouched two-card hand. Splitting
    /// requires a two-card pair of equal rank under the seat's split cap
    /// (three additional splits; one for aces). Insurance requires an ace
    /// up-card while the dealer still holds exactly two cards, and is only
    /// offered to a seat's primary hand, once: split hands carry no
    /// balance of their own, so the side wager always belongs to the
    /// primary.
    #[must_use]
    pub fn legal_actions(
        &self,
        dealer_upcard: Option<Card>,
        dealer_card_count: usize,
        seat_split_count: u8,
    ) -> Vec<Action> {
        if self.is_blackjack() || self.doubled {
            return vec![Action::Stand];
        }

        let mut actions = vec![Action::Hit, Action::Stand];

        if self.cards.len() == 2 {
            actions.push(Action::DoubleDown);
        }

        if self.split_allowed(seat_split_count) {
            actions.push(Action::Split);
        }

        let upcard_is_ace = dealer_upcard.is_some_and(|card| card.rank == 1);
        if upcard_is_ace && dealer_card_count == 2 && !self.insurance_taken && !self.is_split_hand()
        {
            actions.push(Action::Insurance);
        }

        actions
    }

    fn split_allowed(&self, seat_split_count: u8) -> bool {
        if self.cards.len() != 2 || self.cards[0].rank != self.cards[1].rank {
            return false;
        }
        let cap = if self.cards[0].rank == 1 {
            MAX_ACE_SPLITS
        } else {
            MAX_SPLITS
        };
        seat_split_count < cap
    }

    /// Ends the turn for this hand.
    pub(crate) fn stand(&mut self) {
        self.transition(HandPhase::HasActed);
    }

    /// Doubles the active wager, draws exactly one card, and forces the hand
    /// into `HasActed`. Returns the additional amount wagered; the
    /// orchestrator mirrors it between the seat and the dealer.
    pub(crate) fn double_down(&mut self, shoe: &mut Shoe, rng: &mut ChaCha8Rng) -> i64 {
        let charge = self.initial_wager;
        self.wager += charge;
        self.doubled = true;
        self.draw(shoe, rng);
        self.transition(HandPhase::HasActed);
        charge
    }

    /// Marks insurance as taken and returns the stake (half the original
    /// wager, rounded down). Balance movement is handled by the
    /// orchestrator.
    pub(crate) fn take_insurance(&mut self) -> i64 {
        let stake = self.initial_wager / 2;
        self.insurance_taken = true;
        self.insurance_stake = stake;
        stake
    }

    /// Splits a two-card pair: moves the second card into a new hand
    /// carrying the same wager, draws one replacement card into each, and
    /// records this hand's primary as the new hand's origin.
    ///
    /// Returns `None` if the hand does not hold exactly two cards.
    pub(crate) fn split_off(
        &mut self,
        new_id: HandId,
        shoe: &mut Shoe,
        rng: &mut ChaCha8Rng,
    ) -> Option<Self> {
        if self.cards.len() != 2 {
            return None;
        }
        let moved = self.cards.pop()?;

        let mut split = Self {
            id: new_id,
            owner: self.owner.clone(),
            seat: self.seat,
            cards: vec![moved],
            score: 0,
            phase: HandPhase::AwaitingTurn,
            balance: 0,
            wager: self.wager,
            initial_wager: self.wager,
            insurance_taken: false,
            insurance_stake: 0,
            doubled: false,
            origin: Some(self.origin.unwrap_or(self.id)),
        };

        self.recompute_score();
        self.draw(shoe, rng);
        split.draw(shoe, rng);
        Some(split)
    }

    /// Clears cards, wagers, and flags for the next round. Balance, seat,
    /// and identity persist across rounds.
    pub fn reset(&mut self) {
        self.cards.clear();
        self.score = 0;
        self.wager = 0;
        self.initial_wager = 0;
        self.insurance_taken = false;
        self.insurance_stake = 0;
        self.doubled = false;
        self.transition(HandPhase::AwaitingBet);
    }

    /// Renders the hand as `owner's hand: ♥A, ♠K`.
    #[must_use]
    pub fn display(&self) -> String {
        let cards: Vec<String> = self.cards.iter().map(ToString::to_string).collect();
        format!("{}'s hand: {}", self.owner, cards.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use crate::card::Suit;

    use super::*;

    fn card(rank: u8) -> Card {
        Card::new(Suit::Spades, rank)
    }

    fn hand_with(ranks: &[u8]) -> Hand {
        let mut hand = Hand::new(HandId(1), "alice", 0, 1000);
        for &rank in ranks {
            hand.cards.push(card(rank));
        }
        hand.recompute_score();
        hand
    }

    #[test]
    fn score_evaluation() {
        assert_eq!(hand_with(&[1]).score(), 11);
        assert_eq!(hand_with(&[2]).score(), 2);
        assert_eq!(hand_with(&[1, 13, 13]).score(), 21);
        assert_eq!(hand_with(&[1, 10, 10]).score(), 21);
        assert_eq!(hand_with(&[1, 9, 13, 13]).score(), 30);
        assert_eq!(hand_with(&[10, 10, 10, 10]).score(), 40);
        assert_eq!(hand_with(&[1, 1, 2]).score(), 14);
        assert_eq!(hand_with(&[1, 1, 13, 13]).score(), 22);
    }

    #[test]
    fn score_recomputation_is_idempotent() {
        let mut hand = hand_with(&[1, 5]);
        hand.recompute_score();
        hand.recompute_score();
        assert_eq!(hand.score(), 16);
    }

    #[test]
    fn blackjack_requires_exactly_two_cards() {
        assert!(hand_with(&[1, 13]).is_blackjack());
        assert!(!hand_with(&[7, 7, 7]).is_blackjack());
        assert!(!hand_with(&[10, 9]).is_blackjack());
    }

    #[test]
    fn bust_detection() {
        assert!(hand_with(&[10, 10, 2]).is_busted());
        assert!(!hand_with(&[1, 1]).is_busted());
    }

    #[test]
    fn zero_bet_skips_the_round() {
        let mut hand = hand_with(&[]);
        hand.place_initial_bet(0);
        assert_eq!(hand.phase(), HandPhase::SkippedRound);
        assert!(hand.is_skipping());

        let mut hand = hand_with(&[]);
        hand.place_initial_bet(100);
        assert_eq!(hand.phase(), HandPhase::AwaitingTurn);
        assert_eq!(hand.wager(), 100);
        assert_eq!(hand.initial_wager(), 100);
    }

    #[test]
    fn blackjack_hand_may_only_stand() {
        let hand = hand_with(&[1, 13]);
        assert_eq!(hand.legal_actions(None, 2, 0), vec![Action::Stand]);
    }

    #[test]
    fn doubled_hand_may_only_stand() {
        let mut hand = hand_with(&[5, 4, 9]);
        hand.doubled = true;
        assert_eq!(hand.legal_actions(None, 2, 0), vec![Action::Stand]);
    }

    #[test]
    fn double_down_only_on_untouched_two_cards() {
        let two = hand_with(&[5, 4]);
        assert!(two.legal_actions(None, 2, 0).contains(&Action::DoubleDown));

        let three = hand_with(&[5, 4, 2]);
        assert!(
            !three
                .legal_actions(None, 2, 0)
                .contains(&Action::DoubleDown)
        );
    }

    #[test]
    fn split_requires_equal_rank_under_cap() {
        let pair = hand_with(&[2, 2]);
        assert!(pair.legal_actions(None, 2, 0).contains(&Action::Split));
        assert!(!pair.legal_actions(None, 2, 3).contains(&Action::Split));

        let aces = hand_with(&[1, 1]);
        assert!(aces.legal_actions(None, 2, 0).contains(&Action::Split));
        assert!(!aces.legal_actions(None, 2, 1).contains(&Action::Split));

        let mixed = hand_with(&[1, 2]);
        assert!(!mixed.legal_actions(None, 2, 0).contains(&Action::Split));

        // Ten-value cards of different rank are not a pair.
        let ten_value = hand_with(&[13, 12]);
        assert!(!ten_value.legal_actions(None, 2, 0).contains(&Action::Split));
    }

    #[test]
    fn insurance_requires_ace_upcard_and_two_dealer_cards() {
        let hand = hand_with(&[9, 5]);
        let ace = Some(card(1));
        let ten = Some(card(10));

        assert!(hand.legal_actions(ace, 2, 0).contains(&Action::Insurance));
        assert!(!hand.legal_actions(ten, 2, 0).contains(&Action::Insurance));
        assert!(!hand.legal_actions(ace, 3, 0).contains(&Action::Insurance));

        let mut insured = hand_with(&[9, 5]);
        insured.take_insurance();
        assert!(
            !insured
                .legal_actions(ace, 2, 0)
                .contains(&Action::Insurance)
        );
    }

    #[test]
    fn take_insurance_stakes_half_the_wager() {
        let mut hand = hand_with(&[10, 9]);
        hand.place_initial_bet(100);
        let stake = hand.take_insurance();
        assert_eq!(stake, 50);
        assert!(hand.insurance_taken());
        assert_eq!(hand.insurance_stake(), 50);
    }

    #[test]
    fn double_down_draws_one_card_and_ends_the_turn() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut shoe = Shoe::new(6, &mut rng);
        shoe.load(vec![card(5)]);

        let mut hand = hand_with(&[6, 5]);
        hand.place_initial_bet(50);
        let charge = hand.double_down(&mut shoe, &mut rng);

        assert_eq!(charge, 50);
        assert_eq!(hand.wager(), 100);
        assert_eq!(hand.cards().len(), 3);
        assert_eq!(hand.phase(), HandPhase::HasActed);
        assert!(hand.doubled());
    }

    #[test]
    fn split_moves_one_card_and_mirrors_the_wager() {
        let mut rng = ChaCha8Rng::seed_from_u64(10);
        let mut shoe = Shoe::new(6, &mut rng);
        shoe.load(vec![card(4), card(3)]);

        let mut hand = hand_with(&[8, 8]);
        hand.place_initial_bet(25);
        hand.transition(HandPhase::MyTurn);

        let split = hand.split_off(HandId(7), &mut shoe, &mut rng).unwrap();

        assert_eq!(hand.cards().len(), 2);
        assert_eq!(split.cards().len(), 2);
        assert_eq!(hand.cards()[0].rank, 8);
        assert_eq!(split.cards()[0].rank, 8);
        assert_eq!(split.wager(), 25);
        assert_eq!(split.initial_wager(), 25);
        assert_eq!(split.origin(), Some(HandId(1)));
        assert_eq!(split.phase(), HandPhase::AwaitingTurn);
        assert_eq!(hand.phase(), HandPhase::MyTurn);
    }

    #[test]
    fn split_of_a_split_points_back_at_the_primary() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut shoe = Shoe::new(6, &mut rng);
        shoe.load(vec![card(9), card(2), card(2), card(6)]);

        let mut hand = hand_with(&[2, 2]);
        hand.place_initial_bet(10);
        let mut first = hand.split_off(HandId(7), &mut shoe, &mut rng).unwrap();

        // Rig the first split hand back into a pair, then split it again.
        first.cards = vec![card(2), card(2)];
        first.recompute_score();
        let second = first.split_off(HandId(8), &mut shoe, &mut rng).unwrap();
        assert_eq!(second.origin(), Some(HandId(1)));
    }

    #[test]
    fn split_rejected_without_exactly_two_cards() {
        let mut rng = ChaCha8Rng::seed_from_u64(12);
        let mut shoe = Shoe::new(6, &mut rng);

        let mut hand = hand_with(&[8, 8, 8]);
        assert!(hand.split_off(HandId(7), &mut shoe, &mut rng).is_none());
    }

    #[test]
    fn reset_clears_the_round_but_keeps_the_balance() {
        let mut hand = hand_with(&[10, 9]);
        hand.place_initial_bet(100);
        hand.take_insurance();
        hand.debit(150);
        hand.reset();

        assert!(hand.cards().is_empty());
        assert_eq!(hand.score(), 0);
        assert_eq!(hand.wager(), 0);
        assert!(!hand.insurance_taken());
        assert_eq!(hand.phase(), HandPhase::AwaitingBet);
        assert_eq!(hand.balance(), 850);
    }

    #[test]
    fn display_renders_cards() {
        let hand = hand_with(&[1, 13]);
        assert_eq!(hand.display(), "alice's hand: ♠A, ♠K");
    }
}
