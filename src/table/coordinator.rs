//! Turn coordinator: drives the round forward in reaction to bus
//! milestones.
//!
//! Each handler runs synchronously inside the publishing call, so a single
//! `place_bet` on the last undecided seat carries the round all the way to
//! the first granted turn before returning. Handlers hold a `Weak` table
//! reference; the bus never keeps the table alive.

use std::sync::{Arc, Weak};

use tracing::{debug, info};

use crate::bus::Topic;
use crate::hand::{Hand, HandId};
use crate::sync::Mutex;

use super::Table;

/// Tracks which hand currently holds the turn and advances it.
pub(super) struct TurnCoordinator {
    table: Weak<Table>,
    current: Mutex<Option<HandId>>,
}

impl TurnCoordinator {
    /// Subscribes the coordinator to every milestone it reacts to. Must run
    /// after the state machine registers, so the phase is already updated
    /// when handlers fire.
    pub(super) fn register(table: &Arc<Table>) {
        let coordinator = Arc::new(Self {
            table: Arc::downgrade(table),
            current: Mutex::new(None),
        });
        let bus = &table.bus;

        coordinator.on(bus, Topic::BettingComplete, |_, t| {
            t.deal_initial_cards();
            t.bus.publish(Topic::CardsDealt);
        });
        coordinator.on(bus, Topic::CardsDealt, |c, t| c.grant_next_turn(t));
        coordinator.on(bus, Topic::PlayerActed, |c, t| {
            c.release_current(t);
            c.grant_next_turn(t);
        });
        coordinator.on(bus, Topic::AllSeatsActed, |_, t| {
            // Every seat may watch the dealer play out.
            t.registry.set_all_gates();
            t.dealer_play();
            t.bus.publish(Topic::DealerDone);
        });
        coordinator.on(bus, Topic::DealerDone, |_, t| {
            t.settle();
            t.bus.publish(Topic::WinnersDetermined);
        });
        coordinator.on(bus, Topic::WinnersDetermined, |_, t| {
            t.bus.publish(Topic::ResultsPublished);
        });
        coordinator.on(bus, Topic::ResultsPublished, |_, t| {
            t.registry.clear_all_gates();
            t.cleanup();
            t.bus.publish(Topic::CleanupDone);
        });
        coordinator.on(bus, Topic::AllSeatsSkipped, |_, t| {
            info!("every seat skipped, closing the round");
            t.cleanup();
            t.bus.publish(Topic::CleanupDone);
        });
    }

    fn on(
        self: &Arc<Self>,
        bus: &crate::bus::EventBus,
        topic: Topic,
        handler: fn(&Self, &Table),
    ) {
        let coordinator = Arc::clone(self);
        bus.subscribe(topic, move || {
            if let Some(table) = coordinator.table.upgrade() {
                handler(&coordinator, &table);
            }
        });
    }

    /// Clears the gate of whichever hand last held the turn. The hand may
    /// be gone already (seat left mid-turn); only the gate matters here.
    fn release_current(&self, table: &Table) {
        let previous = self.current.lock().take();
        if let Some(id) = previous {
            if let Some(seat) = Self::seat_of_hand(table, id) {
                table.registry.clear_gate(seat);
            }
        }
    }

    /// Promotes the next waiting hand and opens its seat's gate, or ends
    /// the player-turn phase when nobody is left.
    fn grant_next_turn(&self, table: &Table) {
        match table.registry.next_to_act() {
            Some(id) => {
                *self.current.lock() = Some(id);
                if let Some(seat) = Self::seat_of_hand(table, id) {
                    debug!(seat, "turn open");
                    table.registry.set_gate(seat);
                }
            }
            None => {
                *self.current.lock() = None;
                table.bus.publish(Topic::AllSeatsActed);
            }
        }
    }

    fn seat_of_hand(table: &Table, id: HandId) -> Option<u8> {
        table
            .registry
            .hands
            .lock()
            .iter()
            .find(|hand| hand.id() == id)
            .and_then(Hand::seat)
    }
}
