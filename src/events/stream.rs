//! # Internal broadcast stream of events.
//!
//! [`EventStream`] is a thin wrapper around [`tokio::sync::broadcast`] carrying
//! [`EventRef`]s to every dispatcher created by [`EventBus::bind`](crate::EventBus::bind).
//!
//! ## Architecture
//! ```text
//! Emitters (many):                     Dispatchers (one per bind):
//!   StreamPublisher ──┐
//!   EventBus::emit  ──┼────► EventStream ───► dispatcher(key = OrderPlaced)
//!   ...             ──┘  (broadcast chan)  └─► dispatcher(key = None)
//! ```
//!
//! ## Rules
//! - **Non-blocking emit**: `emit()` never waits; it calls `broadcast::Sender::send`.
//! - **Bounded capacity**: one ring buffer stores recent events for all receivers.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//! - **No persistence**: events are lost if there are no receivers at send time.

use tokio::sync::broadcast;

use super::EventRef;

/// Broadcast channel of events.
///
/// ### Properties
/// - **Non-blocking**: `emit()` returns immediately.
/// - **Fire-and-forget**: no delivery or durability guarantees.
/// - **Cloneable**: cheap to clone (internally holds an `Arc`-backed sender).
#[derive(Clone, Debug)]
pub struct EventStream {
    tx: broadcast::Sender<EventRef>,
}

impl EventStream {
    /// Creates a new stream with the given channel capacity.
    ///
    /// The minimum capacity is 1 (clamped).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<EventRef>(capacity);
        Self { tx }
    }

    /// Emits an event to all active receivers.
    ///
    /// Returns how many receivers the event was queued for; `0` means it was dropped.
    pub fn emit(&self, event: EventRef) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    /// Creates a new receiver that observes events emitted **after** this call.
    pub fn subscribe(&self) -> broadcast::Receiver<EventRef> {
        self.tx.subscribe()
    }

    /// Number of live receivers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
