//! Betting and the initial deal.

use tracing::{debug, info};

use crate::bus::Topic;
use crate::error::TableError;
use crate::hand::{Hand, HandPhase};
use crate::machine::RoundPhase;

use super::Table;

impl Table {
    /// Records a wager for the seat's primary hand.
    ///
    /// The wager must be one of the table's denominations; `0` skips the
    /// round. The seat's balance is charged up front and mirrored into the
    /// dealer's float, so losing costs nothing more at settlement.
    ///
    /// Placing the last outstanding wager closes the betting phase: every
    /// seat skipping ends the round immediately, otherwise the deal begins.
    pub fn place_bet(&self, seat: u8, amount: i64) -> Result<(), TableError> {
        if self.current_phase() != RoundPhase::Betting {
            return Err(TableError::WrongPhase);
        }
        if !self.options.available_bets.contains(&amount) {
            return Err(TableError::InvalidBet);
        }

        let milestone = {
            let mut hands = self.registry.hands.lock();
            let hand = hands
                .iter_mut()
                .find(|hand| hand.seat() == Some(seat) && !hand.is_split_hand())
                .ok_or(TableError::UnknownSeat)?;
            if hand.phase() != HandPhase::AwaitingBet {
                return Err(TableError::WrongPhase);
            }

            hand.place_initial_bet(amount);
            hand.debit(amount);
            info!(seat, amount, balance = hand.balance(), "bet placed");

            if amount > 0 {
                self.dealer.lock().credit(amount);
            }

            Self::betting_milestone(&hands)
        };

        if let Some(topic) = milestone {
            self.bus.publish(topic);
        }
        Ok(())
    }

    /// The milestone that closes the betting phase, if the hands warrant
    /// one. Checked after every wager and after a seat leaves mid-betting,
    /// so a departing undecided seat cannot wedge the round.
    pub(crate) fn betting_milestone(hands: &[Hand]) -> Option<Topic> {
        if hands.is_empty() {
            None
        } else if hands.iter().all(Hand::is_skipping) {
            Some(Topic::AllSeatsSkipped)
        } else if hands.iter().all(|hand| hand.phase() != HandPhase::AwaitingBet) {
            Some(Topic::BettingComplete)
        } else {
            None
        }
    }

    /// Deals two passes of one card each: every wagered hand in turn order,
    /// then the dealer. Seats that skipped (or joined mid-round) receive
    /// nothing.
    ///
    /// If the cut card has been passed afterwards, the reshuffle is noted
    /// and deferred to the between-round cleanup.
    pub(crate) fn deal_initial_cards(&self) {
        let mut hands = self.registry.hands.lock();
        let mut shoe = self.shoe.lock();
        let mut rng = self.rng.lock();
        let mut dealer = self.dealer.lock();

        for _ in 0..2 {
            for hand in hands
                .iter_mut()
                .filter(|hand| hand.phase() == HandPhase::AwaitingTurn)
            {
                let card = hand.draw(&mut shoe, &mut rng);
                debug!(owner = hand.owner(), %card, "dealt");
            }
            dealer.draw(&mut shoe, &mut rng);
        }
        info!(upcard = %dealer.cards()[0], "initial deal complete");

        if shoe.needs_reshuffle() {
            info!("cut card passed, reshuffling after this round");
            self.pending_reshuffle
                .store(true, std::sync::atomic::Ordering::SeqCst);
        }
    }
}
