//! Error types for table operations.
//!
//! Every variant is recoverable: errors are reported to the calling seat,
//! never allowed to abort the round.

use thiserror::Error;

use crate::bus::Topic;
use crate::machine::RoundPhase;

/// Errors surfaced by the table to its transport collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TableError {
    /// The seat number or identity is not known at this table.
    #[error("seat is unknown at this table")]
    UnknownSeat,
    /// The submitted action is not in the hand's current legal set.
    #[error("action is not legal for the current hand")]
    IllegalAction,
    /// No free seats remain.
    #[error("table is full")]
    TableFull,
    /// The identity already occupies a seat.
    #[error("identity is already seated")]
    DuplicateSeat,
    /// The wager amount is not one of the table's denominations.
    #[error("bet amount is not offered at this table")]
    InvalidBet,
    /// The operation is not valid in the current round phase.
    #[error("operation is not valid in the current phase")]
    WrongPhase,
    /// The shoe has too few cards to deal. Defensive: the reshuffle check
    /// between rounds should make this unreachable.
    #[error("not enough cards left in the shoe")]
    InsufficientShoe,
}

/// A trigger that has no transition from the current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no transition for {trigger:?} from {from:?}")]
pub struct TransitionError {
    /// Phase the machine was in when the trigger fired.
    pub from: RoundPhase,
    /// The offending trigger.
    pub trigger: Topic,
}
