//! # Event marker trait.
//!
//! Any `'static + Send + Sync` type becomes routable by implementing [`Event`]:
//!
//! ```rust
//! use eventdrive::{Event, EventKey, EventRef};
//!
//! struct OrderPlaced {
//!     order_id: u64,
//! }
//!
//! impl Event for OrderPlaced {}
//!
//! let ev: EventRef = OrderPlaced { order_id: 7 }.into_ref();
//! assert_eq!(ev.key(), EventKey::of::<OrderPlaced>());
//! assert_eq!(ev.downcast_ref::<OrderPlaced>().map(|e| e.order_id), Some(7));
//! ```
//!
//! The payload is opaque to the bus; only the concrete type matters for routing.

use std::any::Any;
use std::sync::Arc;

use super::EventKey;

/// Shared, type-erased event handed to handlers and publishers.
///
/// One allocation is shared by every handler of a single dispatch.
pub type EventRef = Arc<dyn Event>;

/// Object-safe access to `dyn Any` for event trait objects.
#[doc(hidden)]
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// An event routed by its concrete type.
///
/// Implementations are usually empty (`impl Event for MyEvent {}`); the provided methods
/// cover naming and conversion into an [`EventRef`].
pub trait Event: AsAny + Send + Sync {
    /// Human-readable type name used in logs and error messages.
    ///
    /// Never used for routing.
    fn event_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Wraps the event into a shared [`EventRef`].
    fn into_ref(self) -> EventRef
    where
        Self: Sized,
    {
        Arc::new(self)
    }
}

impl dyn Event {
    /// Returns the routing key of the concrete event type.
    #[inline]
    pub fn key(&self) -> EventKey {
        EventKey::of_event(self)
    }

    /// Returns `true` if the concrete type is `E`.
    #[inline]
    pub fn is<E: Event>(&self) -> bool {
        self.as_any().is::<E>()
    }

    /// Downcasts to the concrete event type.
    #[inline]
    pub fn downcast_ref<E: Event>(&self) -> Option<&E> {
        self.as_any().downcast_ref::<E>()
    }
}

impl std::fmt::Debug for dyn Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Event").field(&self.event_name()).finish()
    }
}
