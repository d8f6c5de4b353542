//! The round orchestrator and its public facade.
//!
//! A [`Table`] owns the shoe, the dealer's hand, the seat registry, and the
//! wiring between the event bus, the phase machine, and the turn
//! coordinator. All game state is mutated through `&self` methods behind
//! internal locks; seat tasks only read state and wait on signals.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tokio::sync::watch;
use tracing::info;

use crate::bus::{EventBus, Topic};
use crate::card::Card;
use crate::error::TableError;
use crate::hand::{Hand, HandPhase};
use crate::machine::{RoundPhase, RoundStateMachine};
use crate::options::TableOptions;
use crate::registry::SeatRegistry;
use crate::shoe::Shoe;
use crate::sync::Mutex;

mod actions;
mod bet;
mod coordinator;
mod dealer;

use coordinator::TurnCoordinator;

/// A multi-seat blackjack table.
///
/// The table runs one round at a time: betting, dealing, seat turns
/// (including split hands), dealer play, settlement, and cleanup. Seat
/// balances and the round counter persist across rounds.
pub struct Table {
    pub(crate) shoe: Mutex<Shoe>,
    pub(crate) dealer: Mutex<Hand>,
    pub(crate) registry: SeatRegistry,
    pub(crate) options: TableOptions,
    pub(crate) bus: Arc<EventBus>,
    machine: Arc<RoundStateMachine>,
    phase_rx: watch::Receiver<RoundPhase>,
    pub(crate) rng: Mutex<ChaCha8Rng>,
    round_counter: AtomicU64,
    pub(crate) pending_reshuffle: AtomicBool,
}

impl Table {
    /// Creates a table with the given options and shoe seed.
    ///
    /// The state machine registers on the bus before the turn coordinator,
    /// so the phase ledger is already updated when the coordinator reacts
    /// to the same milestone.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use bjtable::{Table, TableOptions};
    ///
    /// let table = Table::new(TableOptions::default(), 42);
    /// let _ = table;
    /// ```
    #[must_use]
    pub fn new(options: TableOptions, seed: u64) -> Arc<Self> {
        let bus = Arc::new(EventBus::new());
        let (machine, phase_rx) = RoundStateMachine::new();
        machine.register(&bus);

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let shoe = Shoe::new(options.decks, &mut rng);
        let registry = SeatRegistry::new(options.num_seats, Arc::clone(&bus));

        let table = Arc::new(Self {
            shoe: Mutex::new(shoe),
            dealer: Mutex::new(Hand::dealer()),
            registry,
            options,
            bus,
            machine,
            phase_rx,
            rng: Mutex::new(rng),
            round_counter: AtomicU64::new(0),
            pending_reshuffle: AtomicBool::new(false),
        });

        TurnCoordinator::register(&table);
        table
    }

    /// Seats an identity, assigning the lowest free seat. Filling the last
    /// seat starts the betting phase.
    pub fn add_seat(&self, identity: &str) -> Result<u8, TableError> {
        self.registry.add_seat(identity, self.options.buy_in)
    }

    /// Removes an identity from the table.
    ///
    /// A seat leaving while holding the turn resolves its hand with an
    /// implicit stand first, so turn advancement never stalls. A seat
    /// leaving mid-betting re-runs the completion checks over the
    /// remaining hands; the last undecided seat walking away must not
    /// wedge the round.
    pub fn remove_seat(&self, identity: &str) -> Result<(), TableError> {
        let held_turn = {
            let mut hands = self.registry.hands.lock();
            let mut held = false;
            for hand in hands.iter_mut() {
                if hand.owner() == identity && hand.phase() == HandPhase::MyTurn {
                    info!(identity, "leaving mid-turn, standing implicitly");
                    hand.stand();
                    held = true;
                }
            }
            held
        };

        self.registry.remove_seat(identity)?;

        if held_turn {
            self.bus.publish(Topic::PlayerActed);
        } else if self.current_phase() == RoundPhase::Betting {
            let milestone = {
                let hands = self.registry.hands.lock();
                Self::betting_milestone(&hands)
            };
            if let Some(topic) = milestone {
                self.bus.publish(topic);
            }
        }
        Ok(())
    }

    /// The phase the round is currently in.
    #[must_use]
    pub fn current_phase(&self) -> RoundPhase {
        self.machine.phase()
    }

    /// Blocks until the round reaches `phase`.
    ///
    /// Returns immediately if the table is already in `phase`.
    pub async fn wait_for_phase(&self, phase: RoundPhase) {
        let mut rx = self.phase_rx.clone();
        // The machine (and thus the sender) lives as long as the table.
        let _ = rx.wait_for(|current| *current == phase).await;
    }

    /// Blocks until the seat's turn-ready signal is set.
    pub async fn wait_for_seat_turn(&self, seat: u8) -> Result<(), TableError> {
        let mut rx = self
            .registry
            .gate_receiver(seat)
            .ok_or(TableError::UnknownSeat)?;
        rx.wait_for(|ready| *ready)
            .await
            .map(|_| ())
            .map_err(|_| TableError::UnknownSeat)
    }

    /// Structured view of the table: the dealer's hand first (hole card
    /// masked unless `reveal_dealer_hole`), then each seat's hands in turn
    /// order.
    #[must_use]
    pub fn table_snapshot(&self, reveal_dealer_hole: bool) -> TableSnapshot {
        let dealer = {
            let dealer = self.dealer.lock();
            let cards: Vec<Option<Card>> = dealer
                .cards()
                .iter()
                .enumerate()
                .map(|(index, &card)| {
                    if index == 1 && !reveal_dealer_hole {
                        None
                    } else {
                        Some(card)
                    }
                })
                .collect();
            HandView {
                seat: None,
                owner: dealer.owner().to_owned(),
                score: if reveal_dealer_hole || dealer.cards().len() < 2 {
                    Some(dealer.score())
                } else {
                    None
                },
                phase: dealer.phase(),
                wager: dealer.wager(),
                balance: dealer.balance(),
                cards,
            }
        };

        let hands = self
            .registry
            .hands
            .lock()
            .iter()
            .map(|hand| HandView {
                seat: hand.seat(),
                owner: hand.owner().to_owned(),
                cards: hand.cards().iter().map(|&card| Some(card)).collect(),
                score: Some(hand.score()),
                phase: hand.phase(),
                wager: hand.wager(),
                balance: hand.balance(),
            })
            .collect();

        TableSnapshot {
            round: self.round_counter(),
            phase: self.current_phase(),
            dealer,
            hands,
        }
    }

    /// Rounds completed since the table opened.
    #[must_use]
    pub fn round_counter(&self) -> u64 {
        self.round_counter.load(Ordering::SeqCst)
    }

    pub(crate) fn bump_round_counter(&self) {
        self.round_counter.fetch_add(1, Ordering::SeqCst);
    }

    /// Number of seats at the table.
    #[must_use]
    pub const fn num_seats(&self) -> u8 {
        self.registry.num_seats()
    }

    /// Number of seats still free.
    #[must_use]
    pub fn seats_remaining(&self) -> u8 {
        self.registry.seats_remaining()
    }

    /// The seat an identity occupies, if any.
    #[must_use]
    pub fn seat_of(&self, identity: &str) -> Option<u8> {
        self.registry.seat_of(identity)
    }

    /// Wager denominations this table accepts.
    #[must_use]
    pub fn available_bets(&self) -> &[i64] {
        &self.options.available_bets
    }

    /// Balance of the seat's primary hand.
    pub fn balance_of(&self, seat: u8) -> Result<i64, TableError> {
        self.registry
            .hands
            .lock()
            .iter()
            .find(|hand| hand.seat() == Some(seat) && !hand.is_split_hand())
            .map(Hand::balance)
            .ok_or(TableError::UnknownSeat)
    }

    /// The dealer's balance (the house float).
    #[must_use]
    pub fn dealer_balance(&self) -> i64 {
        self.dealer.lock().balance()
    }

    /// Number of undealt cards left in the shoe.
    #[must_use]
    pub fn shoe_remaining(&self) -> usize {
        self.shoe.lock().remaining()
    }

    /// The table's event bus, for transport-side observers.
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.bus
    }

    /// Replaces the undealt cards of the shoe so the next draws are
    /// deterministic: `draws[0]` is drawn first.
    ///
    /// Intended for tests and demos.
    pub fn load_shoe(&self, draws: &[Card]) {
        let mut cards: Vec<Card> = draws.to_vec();
        cards.reverse();
        self.shoe.lock().load(cards);
    }
}

impl core::fmt::Debug for Table {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Table")
            .field("phase", &self.current_phase())
            .field("round", &self.round_counter())
            .field("registry", &self.registry)
            .finish()
    }
}

/// One hand as rendered to clients.
#[derive(Debug, Clone, Serialize)]
pub struct HandView {
    /// Seat number; `None` for the dealer.
    pub seat: Option<u8>,
    /// Owning identity.
    pub owner: String,
    /// Cards in deal order; `None` marks a face-down card.
    pub cards: Vec<Option<Card>>,
    /// Score, withheld while the dealer's hole card is hidden.
    pub score: Option<u8>,
    /// Lifecycle phase of the hand.
    pub phase: HandPhase,
    /// Active wager.
    pub wager: i64,
    /// Chip balance (0 for split hands).
    pub balance: i64,
}

/// Structured view of the whole table.
#[derive(Debug, Clone, Serialize)]
pub struct TableSnapshot {
    /// Rounds completed so far.
    pub round: u64,
    /// Current round phase.
    pub phase: RoundPhase,
    /// The dealer's hand.
    pub dealer: HandView,
    /// Seat hands in turn order.
    pub hands: Vec<HandView>,
}
