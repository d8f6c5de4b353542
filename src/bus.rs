//! Synchronous named-topic publish/subscribe.
//!
//! The bus decouples the orchestrator (which knows nothing of the state
//! machine) from the state machine and turn coordinator, which react to the
//! same round milestones. Fan-out is synchronous on the publisher's own
//! call stack: all handlers for a topic complete before `publish` returns.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::sync::Mutex;

/// Round milestones published on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// The table filled; betting may begin.
    ReadyToBet,
    /// Every seated player declined to wager this round.
    AllSeatsSkipped,
    /// Every seat has placed a wager.
    BettingComplete,
    /// Initial cards are on the table.
    CardsDealt,
    /// The current hand took an action.
    PlayerActed,
    /// No hand remains to act.
    AllSeatsActed,
    /// The dealer finished drawing.
    DealerDone,
    /// Payouts have been computed.
    WinnersDetermined,
    /// Results were delivered to every seat.
    ResultsPublished,
    /// The round has been reset for the next betting phase.
    CleanupDone,
}

type Handler = Arc<dyn Fn() + Send + Sync>;

/// Synchronous event bus keyed by [`Topic`].
#[derive(Default)]
pub struct EventBus {
    handlers: Mutex<HashMap<Topic, Vec<Handler>>>,
}

impl EventBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for `topic`. Handlers run in subscription order.
    pub fn subscribe(&self, topic: Topic, handler: impl Fn() + Send + Sync + 'static) {
        self.handlers
            .lock()
            .entry(topic)
            .or_default()
            .push(Arc::new(handler));
    }

    /// Invokes every handler for `topic` on the caller's stack.
    ///
    /// The handler list is snapshotted before the first call, so handlers
    /// may publish further topics (the round pipeline is a chain of
    /// re-publishes) without deadlocking the registry.
    pub fn publish(&self, topic: Topic) {
        debug!(?topic, "publish");
        let handlers: Vec<Handler> = self
            .handlers
            .lock()
            .get(&topic)
            .cloned()
            .unwrap_or_default();
        for handler in handlers {
            handler();
        }
    }
}

impl core::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventBus")
            .field("topics", &self.handlers.lock().len())
            .finish()
    }
}
