//! A multi-seat blackjack round engine.
//!
//! [`Table`] orchestrates complete rounds for several independently driven
//! seats: betting, a two-pass deal from a multi-deck shoe, per-seat turns
//! with hit/stand/double/split/insurance, dealer play, settlement, and
//! cleanup. The round advances through a synchronous event bus and an
//! explicit phase machine; seat tasks block on watch-backed signals instead
//! of polling.
//!
//! The engine performs no I/O of its own. Transports (sockets, bots, tests)
//! call the `&self` table methods from any thread and await
//! [`Table::wait_for_seat_turn`] or [`Table::wait_for_phase`] in between.
//!
//! ```no_run
//! use bjtable::{Action, RoundPhase, Table, TableOptions};
//!
//! # async fn run() -> Result<(), bjtable::TableError> {
//! let table = Table::new(TableOptions::default().with_num_seats(1), 42);
//! let seat = table.add_seat("alice")?;
//!
//! table.wait_for_phase(RoundPhase::Betting).await;
//! table.place_bet(seat, 100)?;
//!
//! table.wait_for_seat_turn(seat).await?;
//! table.submit_action(seat, Action::Stand)?;
//!
//! // The last action settles the round before returning.
//! println!("balance: {}", table.balance_of(seat)?);
//! # Ok(())
//! # }
//! ```

pub mod action;
pub mod bus;
pub mod card;
pub mod error;
pub mod hand;
pub mod machine;
pub mod options;
pub mod registry;
pub mod shoe;
mod sync;
pub mod table;

pub use action::Action;
pub use bus::{EventBus, Topic};
pub use card::{Card, Suit};
pub use error::{TableError, TransitionError};
pub use hand::{Hand, HandId, HandPhase};
pub use machine::{RoundPhase, RoundStateMachine};
pub use options::TableOptions;
pub use shoe::Shoe;
pub use table::{HandView, Table, TableSnapshot};
