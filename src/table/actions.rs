//! Seat actions during the player-turn phase.

use tracing::{debug, info};

use crate::action::Action;
use crate::bus::Topic;
use crate::error::TableError;
use crate::hand::{Hand, HandPhase};
use crate::machine::RoundPhase;

use super::Table;

impl Table {
    /// The actions the seat's acting hand may take right now.
    ///
    /// Empty when no hand of the seat holds the turn.
    pub fn legal_actions_for(&self, seat: u8) -> Result<Vec<Action>, TableError> {
        self.registry
            .identity_of(seat)
            .ok_or(TableError::UnknownSeat)?;

        let (upcard, dealer_count) = {
            let dealer = self.dealer.lock();
            (dealer.cards().first().copied(), dealer.cards().len())
        };
        let split_count = self.registry.seat_split_count(seat);

        Ok(self
            .registry
            .hands
            .lock()
            .iter()
            .find(|hand| hand.seat() == Some(seat) && hand.phase() == HandPhase::MyTurn)
            .map(|hand| hand.legal_actions(upcard, dealer_count, split_count))
            .unwrap_or_default())
    }

    /// Applies an action to the seat's acting hand.
    ///
    /// The action is validated against [`Self::legal_actions_for`] before
    /// any state changes; an illegal action leaves the table untouched.
    /// Every accepted action ends with a turn-advancement milestone, even a
    /// hit that keeps the same hand acting.
    pub fn submit_action(&self, seat: u8, action: Action) -> Result<(), TableError> {
        if self.current_phase() != RoundPhase::PlayerTurn {
            return Err(TableError::WrongPhase);
        }
        let legal = self.legal_actions_for(seat)?;
        if !legal.contains(&action) {
            debug!(seat, ?action, ?legal, "illegal action rejected");
            return Err(TableError::IllegalAction);
        }

        self.apply_action(seat, action)?;
        self.bus.publish(Topic::PlayerActed);
        Ok(())
    }

    fn apply_action(&self, seat: u8, action: Action) -> Result<(), TableError> {
        let mut split_insert = None;
        {
            let mut hands = self.registry.hands.lock();
            let index = hands
                .iter()
                .position(|hand| hand.seat() == Some(seat) && hand.phase() == HandPhase::MyTurn)
                .ok_or(TableError::IllegalAction)?;

            match action {
                Action::Hit => {
                    let mut shoe = self.shoe.lock();
                    let mut rng = self.rng.lock();
                    let card = hands[index].draw(&mut shoe, &mut rng);
                    info!(seat, %card, score = hands[index].score(), "hit");
                    if hands[index].is_busted() {
                        info!(seat, score = hands[index].score(), "busted");
                        hands[index].stand();
                    }
                }
                Action::Stand => {
                    info!(seat, score = hands[index].score(), "stand");
                    hands[index].stand();
                }
                Action::DoubleDown => {
                    let charge = {
                        let mut shoe = self.shoe.lock();
                        let mut rng = self.rng.lock();
                        hands[index].double_down(&mut shoe, &mut rng)
                    };
                    if hands[index].is_busted() {
                        info!(seat, score = hands[index].score(), "busted on double");
                    }
                    let primary = Self::primary_index(&hands, seat)?;
                    hands[primary].debit(charge);
                    self.dealer.lock().credit(charge);
                    info!(seat, charge, "doubled down");
                }
                Action::Split => {
                    let new_id = self.registry.alloc_id();
                    let origin = hands[index].id();
                    let split = {
                        let mut shoe = self.shoe.lock();
                        let mut rng = self.rng.lock();
                        hands[index]
                            .split_off(new_id, &mut shoe, &mut rng)
                            .ok_or(TableError::IllegalAction)?
                    };
                    let wager = split.wager();
                    let primary = Self::primary_index(&hands, seat)?;
                    hands[primary].debit(wager);
                    self.dealer.lock().credit(wager);
                    info!(seat, wager, "split");
                    split_insert = Some((origin, split));
                }
                Action::Insurance => {
                    let stake = hands[index].take_insurance();
                    hands[index].debit(stake);
                    self.dealer.lock().credit(stake);
                    info!(seat, stake, "insurance taken");
                }
            }
        }

        // Inserted outside the arena lock; single-writer, so the origin
        // cannot move in between.
        if let Some((origin, split)) = split_insert {
            self.registry.insert_split_hand(origin, split);
        }
        Ok(())
    }

    fn primary_index(hands: &[Hand], seat: u8) -> Result<usize, TableError> {
        hands
            .iter()
            .position(|hand| hand.seat() == Some(seat) && !hand.is_split_hand())
            .ok_or(TableError::UnknownSeat)
    }
}
