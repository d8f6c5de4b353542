//! Dealer play, settlement, and between-round cleanup.

use std::sync::atomic::Ordering;

use tracing::{debug, info};

use crate::hand::HandPhase;

use super::Table;

impl Table {
    /// Plays out the dealer's hand: hit while the score is below 17, stand
    /// on every 17 and above.
    pub(crate) fn dealer_play(&self) {
        let mut shoe = self.shoe.lock();
        let mut rng = self.rng.lock();
        let mut dealer = self.dealer.lock();

        dealer.recompute_score();
        while dealer.score() < 17 {
            let card = dealer.draw(&mut shoe, &mut rng);
            debug!(%card, score = dealer.score(), "dealer hit");
        }
        info!(
            score = dealer.score(),
            busted = dealer.is_busted(),
            "dealer done"
        );
    }

    /// Settles every hand that finished acting this round against the
    /// dealer's final hand.
    ///
    /// Payouts route to the seat's primary hand and mirror into the
    /// dealer's float. A busted hand collects nothing, its wager was taken
    /// at bet time. Insurance pays three times the stake when the dealer
    /// shows blackjack. A winning hand gets twice its wager back, plus a
    /// bonus of half the original wager when the paid hand holds blackjack. A
    /// tie pushes the wager back unless the dealer holds blackjack. Split
    /// hands are pruned afterwards; primaries keep the proceeds.
    pub(crate) fn settle(&self) {
        let round = self.round_counter();
        {
            let mut hands = self.registry.hands.lock();
            let mut dealer = self.dealer.lock();
            let dealer_score = dealer.score();
            let dealer_busted = dealer.is_busted();
            let dealer_blackjack = dealer.is_blackjack();

            for index in 0..hands.len() {
                if hands[index].phase() != HandPhase::HasActed {
                    continue;
                }
                let score = hands[index].score();
                let wager = hands[index].wager();
                let initial = hands[index].initial_wager();
                let insured = hands[index].insurance_taken();
                let stake = hands[index].insurance_stake();
                let target = hands[index]
                    .origin()
                    .and_then(|origin| hands.iter().position(|hand| hand.id() == origin))
                    .unwrap_or(index);

                if hands[index].is_busted() {
                    debug!(round, owner = hands[index].owner(), "busted, no payout");
                } else if dealer_blackjack && insured {
                    let payout = stake * 3;
                    hands[target].credit(payout);
                    dealer.debit(payout);
                    info!(round, owner = hands[index].owner(), payout, "insurance paid");
                } else if dealer_busted || (score > dealer_score && !dealer_blackjack) {
                    let mut payout = wager * 2;
                    if hands[target].is_blackjack() {
                        payout += initial / 2;
                    }
                    hands[target].credit(payout);
                    dealer.debit(payout);
                    info!(round, owner = hands[index].owner(), payout, "hand won");
                } else if score == dealer_score && !dealer_blackjack {
                    hands[target].credit(wager);
                    dealer.debit(wager);
                    info!(round, owner = hands[index].owner(), wager, "push");
                } else {
                    debug!(round, owner = hands[index].owner(), "hand lost");
                }

                hands[index].transition(HandPhase::ResultNotified);
            }
            info!(round, float = dealer.balance(), "settlement complete");
        }

        self.registry.remove_split_hands();
    }

    /// Resets hands and the dealer for the next round, performing any
    /// deferred reshuffle, and advances the round counter.
    pub(crate) fn cleanup(&self) {
        self.registry.reset_all_hands();
        self.dealer.lock().reset();

        let deferred = self.pending_reshuffle.swap(false, Ordering::SeqCst);
        {
            let mut shoe = self.shoe.lock();
            if deferred || shoe.needs_reshuffle() {
                let mut rng = self.rng.lock();
                shoe.shuffle(&mut rng);
                info!(remaining = shoe.remaining(), "shoe reshuffled");
            }
        }

        self.bump_round_counter();
        info!(round = self.round_counter(), "round closed");
    }
}
