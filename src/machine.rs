//! Round phase automaton.
//!
//! The machine is a named-state ledger: it tracks *which phase* the round is
//! in and performs no game logic. It reacts to bus milestones and exposes
//! the current phase through a watch channel so transport tasks can block on
//! phase changes without polling.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::bus::{EventBus, Topic};
use crate::error::TransitionError;

/// Phase of the current round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RoundPhase {
    /// Waiting for seats to fill.
    Waiting,
    /// Accepting wagers.
    Betting,
    /// Initial cards going out.
    Dealing,
    /// Seats act in turn order.
    PlayerTurn,
    /// Dealer plays out its hand.
    DealerTurn,
    /// Payouts being computed and delivered.
    Settlement,
    /// Round finished; table resets for the next betting phase.
    RoundEnd,
}

/// Explicit phase automaton driven by bus milestones.
///
/// Transitions are one-way except the `RoundEnd -> Betting` cycle and the
/// `PlayerTurn` self-loop while seats are still acting. The
/// `Betting -> RoundEnd` shortcut covers the all-seats-skipped round.
#[derive(Debug)]
pub struct RoundStateMachine {
    phase: watch::Sender<RoundPhase>,
}

/// Triggers the machine reacts to, paired with their transitions.
const TRANSITIONS: &[(Topic, RoundPhase, RoundPhase)] = &[
    (Topic::ReadyToBet, RoundPhase::Waiting, RoundPhase::Betting),
    (Topic::BettingComplete, RoundPhase::Betting, RoundPhase::Dealing),
    (Topic::CardsDealt, RoundPhase::Dealing, RoundPhase::PlayerTurn),
    (Topic::PlayerActed, RoundPhase::PlayerTurn, RoundPhase::PlayerTurn),
    (Topic::AllSeatsActed, RoundPhase::PlayerTurn, RoundPhase::DealerTurn),
    (Topic::DealerDone, RoundPhase::DealerTurn, RoundPhase::Settlement),
    (Topic::ResultsPublished, RoundPhase::Settlement, RoundPhase::RoundEnd),
    (Topic::CleanupDone, RoundPhase::RoundEnd, RoundPhase::Betting),
    (Topic::AllSeatsSkipped, RoundPhase::Betting, RoundPhase::RoundEnd),
];

impl RoundStateMachine {
    /// Creates a machine in [`RoundPhase::Waiting`] and a receiver for
    /// observing phase changes.
    #[must_use]
    pub fn new() -> (Arc<Self>, watch::Receiver<RoundPhase>) {
        let (tx, rx) = watch::channel(RoundPhase::Waiting);
        (Arc::new(Self { phase: tx }), rx)
    }

    /// Subscribes the machine to every trigger topic on `bus`.
    ///
    /// Register the machine before other subscribers so the phase is already
    /// updated when they react to the same milestone.
    pub fn register(self: &Arc<Self>, bus: &EventBus) {
        for &(topic, _, _) in TRANSITIONS {
            let machine = Arc::clone(self);
            bus.subscribe(topic, move || {
                if let Err(error) = machine.apply(topic) {
                    warn!(%error, "ignoring trigger");
                }
            });
        }
    }

    /// Applies a named trigger, returning the new phase.
    pub fn apply(&self, trigger: Topic) -> Result<RoundPhase, TransitionError> {
        let from = *self.phase.borrow();
        let to = TRANSITIONS
            .iter()
            .find(|&&(topic, source, _)| topic == trigger && source == from)
            .map(|&(_, _, target)| target)
            .ok_or(TransitionError { from, trigger })?;
        self.phase.send_replace(to);
        debug!(?from, ?to, ?trigger, "phase transition");
        Ok(to)
    }

    /// The phase the machine is currently in.
    #[must_use]
    pub fn phase(&self) -> RoundPhase {
        *self.phase.borrow()
    }
}
