//! Seat registry: turn order, seat/identity mapping, per-seat signals.
//!
//! The registry owns the ordered arena of active hands. Split hands are
//! inserted immediately after the hand they came from, so a seat finishes
//! all of its hands before the next seat acts. Each seat also owns one
//! turn-ready gate; the raw signal primitive never leaves the registry.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::bus::{EventBus, Topic};
use crate::error::TableError;
use crate::hand::{Hand, HandId, HandPhase};
use crate::sync::Mutex;

/// A set/clear/wait signal backed by a watch channel.
///
/// Seat tasks wait on a receiver clone outside of any registry lock.
#[derive(Debug)]
pub(crate) struct TurnGate {
    tx: watch::Sender<bool>,
}

impl TurnGate {
    fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    fn set(&self) {
        self.tx.send_replace(true);
    }

    fn clear(&self) {
        self.tx.send_replace(false);
    }

    fn watch(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

/// Ordered list of active hands plus the seat bookkeeping around them.
pub struct SeatRegistry {
    pub(crate) hands: Mutex<Vec<Hand>>,
    seats: Mutex<BTreeMap<u8, String>>,
    free_seats: Mutex<Vec<u8>>,
    gates: Mutex<HashMap<u8, TurnGate>>,
    num_seats: u8,
    next_id: AtomicU32,
    bus: Arc<EventBus>,
}

impl SeatRegistry {
    pub(crate) fn new(num_seats: u8, bus: Arc<EventBus>) -> Self {
        Self {
            hands: Mutex::new(Vec::new()),
            seats: Mutex::new(BTreeMap::new()),
            free_seats: Mutex::new((0..num_seats).collect()),
            gates: Mutex::new(HashMap::new()),
            num_seats,
            next_id: AtomicU32::new(0),
            bus,
        }
    }

    pub(crate) fn alloc_id(&self) -> HandId {
        HandId(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Seats an identity at the lowest free seat and allocates its turn
    /// gate. Publishes [`Topic::ReadyToBet`] when this fills the table.
    pub(crate) fn add_seat(&self, identity: &str, buy_in: i64) -> Result<u8, TableError> {
        let mut seats = self.seats.lock();
        if seats.values().any(|owner| owner == identity) {
            return Err(TableError::DuplicateSeat);
        }

        let mut free = self.free_seats.lock();
        if free.is_empty() {
            info!(identity, "cannot join, table is full");
            return Err(TableError::TableFull);
        }
        let seat = free.remove(0);
        let table_filled = free.is_empty();
        drop(free);

        seats.insert(seat, identity.to_owned());
        drop(seats);

        self.gates.lock().insert(seat, TurnGate::new());
        self.hands
            .lock()
            .push(Hand::new(self.alloc_id(), identity, seat, buy_in));

        info!(identity, seat, "seated");

        if table_filled {
            info!("table is full, game will start soon");
            self.bus.publish(Topic::ReadyToBet);
        }
        Ok(seat)
    }

    /// Removes an identity: drops all of its hands (primary and splits),
    /// frees the seat, and discards the turn gate.
    pub(crate) fn remove_seat(&self, identity: &str) -> Result<u8, TableError> {
        let mut seats = self.seats.lock();
        let seat = seats
            .iter()
            .find(|(_, owner)| owner.as_str() == identity)
            .map(|(&seat, _)| seat)
            .ok_or(TableError::UnknownSeat)?;
        seats.remove(&seat);
        drop(seats);

        self.hands.lock().retain(|hand| hand.owner() != identity);
        self.gates.lock().remove(&seat);

        let mut free = self.free_seats.lock();
        free.push(seat);
        free.sort_unstable();
        drop(free);

        info!(identity, seat, "left the table");
        Ok(seat)
    }

    /// Scans the hand list in turn order for the first hand that is waiting
    /// for (or already holding) the turn, promotes it to `MyTurn`, and
    /// returns its id. `None` means every seat has acted.
    pub(crate) fn next_to_act(&self) -> Option<HandId> {
        let mut hands = self.hands.lock();

        // At most one hand may hold the turn at any instant.
        let holding: Vec<usize> = hands
            .iter()
            .enumerate()
            .filter(|(_, hand)| hand.phase() == HandPhase::MyTurn)
            .map(|(index, _)| index)
            .collect();
        debug_assert!(holding.len() <= 1, "two hands hold the turn");
        if holding.len() > 1 {
            error!("multiple hands in MyTurn; forcing all but the first to stand");
            for &index in &holding[1..] {
                hands[index].stand();
            }
        }

        for hand in hands.iter_mut() {
            match hand.phase() {
                HandPhase::MyTurn => return Some(hand.id()),
                HandPhase::AwaitingTurn => {
                    hand.transition(HandPhase::MyTurn);
                    debug!(owner = hand.owner(), "turn granted");
                    return Some(hand.id());
                }
                _ => {}
            }
        }
        None
    }

    /// Inserts a split hand directly after its origin, preserving turn
    /// fairness. A missing origin is logged and the insert dropped.
    pub(crate) fn insert_split_hand(&self, origin: HandId, hand: Hand) {
        let mut hands = self.hands.lock();
        match hands.iter().position(|candidate| candidate.id() == origin) {
            Some(index) => hands.insert(index + 1, hand),
            None => warn!(?origin, "origin hand is not tracked, dropping split"),
        }
    }

    /// Drops every hand created by a split, leaving only primary hands.
    pub(crate) fn remove_split_hands(&self) {
        self.hands.lock().retain(|hand| !hand.is_split_hand());
    }

    /// Resets every hand for the next round.
    pub(crate) fn reset_all_hands(&self) {
        for hand in self.hands.lock().iter_mut() {
            hand.reset();
        }
    }

    pub(crate) fn set_gate(&self, seat: u8) {
        if let Some(gate) = self.gates.lock().get(&seat) {
            gate.set();
        }
    }

    pub(crate) fn clear_gate(&self, seat: u8) {
        if let Some(gate) = self.gates.lock().get(&seat) {
            gate.clear();
        }
    }

    /// Releases every seat at once, e.g. so all seat tasks can observe the
    /// dealer phase without blocking on their own gate.
    pub(crate) fn set_all_gates(&self) {
        for gate in self.gates.lock().values() {
            gate.set();
        }
    }

    pub(crate) fn clear_all_gates(&self) {
        for gate in self.gates.lock().values() {
            gate.clear();
        }
    }

    /// A waitable receiver for the seat's gate, usable outside any lock.
    pub(crate) fn gate_receiver(&self, seat: u8) -> Option<watch::Receiver<bool>> {
        self.gates.lock().get(&seat).map(TurnGate::watch)
    }

    pub(crate) fn seat_of(&self, identity: &str) -> Option<u8> {
        self.seats
            .lock()
            .iter()
            .find(|(_, owner)| owner.as_str() == identity)
            .map(|(&seat, _)| seat)
    }

    pub(crate) fn identity_of(&self, seat: u8) -> Option<String> {
        self.seats.lock().get(&seat).cloned()
    }

    /// Number of split hands the seat currently owns.
    pub(crate) fn seat_split_count(&self, seat: u8) -> u8 {
        self.hands
            .lock()
            .iter()
            .filter(|hand| hand.seat() == Some(seat) && hand.is_split_hand())
            .count() as u8
    }

    pub(crate) fn seats_remaining(&self) -> u8 {
        self.free_seats.lock().len() as u8
    }

    pub(crate) const fn num_seats(&self) -> u8 {
        self.num_seats
    }
}

impl core::fmt::Debug for SeatRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SeatRegistry")
            .field("num_seats", &self.num_seats)
            .field("seated", &self.seats.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(num_seats: u8) -> SeatRegistry {
        SeatRegistry::new(num_seats, Arc::new(EventBus::new()))
    }

    #[test]
    fn seats_fill_lowest_first() {
        let reg = registry(3);
        assert_eq!(reg.add_seat("alice", 1000), Ok(0));
        assert_eq!(reg.add_seat("bob", 1000), Ok(1));
        assert_eq!(reg.seats_remaining(), 1);
        assert_eq!(reg.seat_of("bob"), Some(1));
        assert_eq!(reg.identity_of(0).as_deref(), Some("alice"));
    }

    #[test]
    fn duplicate_identity_is_rejected() {
        let reg = registry(3);
        reg.add_seat("alice", 1000).unwrap();
        assert_eq!(reg.add_seat("alice", 1000), Err(TableError::DuplicateSeat));
    }

    #[test]
    fn full_table_rejects_and_publishes_ready_to_bet() {
        let bus = Arc::new(EventBus::new());
        let fired = Arc::new(Mutex::new(false));
        {
            let fired = fired.clone();
            bus.subscribe(Topic::ReadyToBet, move || *fired.lock() = true);
        }

        let reg = SeatRegistry::new(2, bus);
        reg.add_seat("alice", 1000).unwrap();
        assert!(!*fired.lock());
        reg.add_seat("bob", 1000).unwrap();
        assert!(*fired.lock());
        assert_eq!(reg.add_seat("carol", 1000), Err(TableError::TableFull));
    }

    #[test]
    fn removed_seat_becomes_available_again() {
        let reg = registry(2);
        reg.add_seat("alice", 1000).unwrap();
        reg.add_seat("bob", 1000).unwrap();
        reg.remove_seat("alice").unwrap();

        assert_eq!(reg.seats_remaining(), 1);
        assert_eq!(reg.add_seat("carol", 1000), Ok(0));
        assert_eq!(reg.remove_seat("nobody"), Err(TableError::UnknownSeat));
    }

    #[test]
    fn next_to_act_walks_list_order() {
        let reg = registry(2);
        reg.add_seat("alice", 1000).unwrap();
        reg.add_seat("bob", 1000).unwrap();
        for hand in reg.hands.lock().iter_mut() {
            hand.place_initial_bet(10);
        }

        let first = reg.next_to_act().unwrap();
        // The same hand keeps the turn until it finishes acting.
        assert_eq!(reg.next_to_act(), Some(first));

        {
            let mut hands = reg.hands.lock();
            let hand = hands.iter_mut().find(|h| h.id() == first).unwrap();
            hand.stand();
        }

        let second = reg.next_to_act().unwrap();
        assert_ne!(second, first);

        {
            let mut hands = reg.hands.lock();
            let hand = hands.iter_mut().find(|h| h.id() == second).unwrap();
            hand.stand();
        }
        assert_eq!(reg.next_to_act(), None);
    }

    #[test]
    fn split_hand_inserts_after_origin() {
        let reg = registry(2);
        reg.add_seat("alice", 1000).unwrap();
        reg.add_seat("bob", 1000).unwrap();

        let origin = reg.hands.lock()[0].id();
        let split = Hand::new(reg.alloc_id(), "alice", 0, 0);
        let split_id = split.id();
        reg.insert_split_hand(origin, split);

        let hands = reg.hands.lock();
        assert_eq!(hands.len(), 3);
        assert_eq!(hands[0].id(), origin);
        assert_eq!(hands[1].id(), split_id);
        assert_eq!(hands[2].owner(), "bob");
    }

    #[test]
    fn split_insert_with_unknown_origin_is_dropped() {
        let reg = registry(2);
        reg.add_seat("alice", 1000).unwrap();

        let split = Hand::new(reg.alloc_id(), "alice", 0, 0);
        reg.insert_split_hand(HandId(999), split);
        assert_eq!(reg.hands.lock().len(), 1);
    }

    #[test]
    fn remove_split_hands_keeps_primaries() {
        let reg = registry(2);
        reg.add_seat("alice", 1000).unwrap();

        let origin = reg.hands.lock()[0].id();
        let mut primary_clone = reg.hands.lock()[0].clone();
        let mut rng = <rand_chacha::ChaCha8Rng as rand::SeedableRng>::seed_from_u64(1);
        let mut shoe = crate::shoe::Shoe::new(6, &mut rng);
        primary_clone.reset();
        // Build a real split hand via split_off to carry an origin id.
        primary_clone.place_initial_bet(10);
        for _ in 0..2 {
            primary_clone.draw(&mut shoe, &mut rng);
        }
        if let Some(split) = primary_clone.split_off(reg.alloc_id(), &mut shoe, &mut rng) {
            reg.insert_split_hand(origin, split);
        }

        reg.remove_split_hands();
        let hands = reg.hands.lock();
        assert!(hands.iter().all(|hand| !hand.is_split_hand()));
    }

    #[test]
    fn gates_set_and_clear() {
        let reg = registry(2);
        reg.add_seat("alice", 1000).unwrap();
        reg.add_seat("bob", 1000).unwrap();

        let rx = reg.gate_receiver(0).unwrap();
        assert!(!*rx.borrow());

        reg.set_gate(0);
        assert!(*rx.borrow());
        reg.clear_gate(0);
        assert!(!*rx.borrow());

        reg.set_all_gates();
        assert!(*reg.gate_receiver(1).unwrap().borrow());
        reg.clear_all_gates();
        assert!(!*reg.gate_receiver(1).unwrap().borrow());

        assert!(reg.gate_receiver(5).is_none());
    }
}
