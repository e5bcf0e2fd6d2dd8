//! # Handler registry: event identity → handlers.
//!
//! Maps each [`EventKey`] to the handlers registered for it:
//! - **singletons**: shared instances, reused by every call;
//! - **scoped types**: descriptors resolved through the [`Container`] on every call.
//!
//! ## Architecture
//! ```text
//! bootstrap (&mut)                          runtime (Arc, read-only)
//!   add_handler(key, h) ─────┐
//!   add_scoped_handler_type ─┼──► entries ──► resolve(event, ctx)
//!   add_signature(sig) ──────┘                  ├─► singletons[..]
//!                                               └─► Container::resolve(ty, ctx) for each scoped type
//! ```
//!
//! ## Rules
//! - Resolution order is `[singletons..., scoped...]`, each group in registration order.
//! - Re-adding the same instance (pointer identity) or the same handler type is a no-op.
//! - Entries are never removed.
//! - Signatures are appended unconditionally and never used for routing.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use futures::future::try_join_all;

use crate::error::ResolutionError;
use crate::events::{Event, EventKey};
use crate::handlers::{
    same_instance, ConstructorContainer, Container, Context, HandlerRef, HandlerSignature,
    ScopedHandlerType,
};

#[derive(Default)]
struct Entry {
    singletons: Vec<HandlerRef>,
    scoped: Vec<ScopedHandlerType>,
}

/// Registry of event handlers.
///
/// Built with `&mut self` during bootstrap, then shared behind an `Arc` by the bus and
/// its dispatchers.
pub struct HandlerRegistry {
    entries: HashMap<EventKey, Entry>,
    signatures: Vec<HandlerSignature>,
    container: Arc<dyn Container>,
}

impl HandlerRegistry {
    /// Creates an empty registry using [`ConstructorContainer`] for scoped handlers.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            signatures: Vec::new(),
            container: Arc::new(ConstructorContainer),
        }
    }

    /// Replaces the container used to build scoped handlers.
    #[must_use]
    pub fn with_container(mut self, container: Arc<dyn Container>) -> Self {
        self.container = container;
        self
    }

    /// Registers a handler instance for `key`.
    ///
    /// Inserting an instance already present for `key` does nothing.
    pub fn add_handler(&mut self, key: EventKey, handler: HandlerRef) {
        let entry = self.entries.entry(key).or_default();
        if entry.singletons.iter().any(|h| same_instance(h, &handler)) {
            tracing::trace!(event = %key, handler = handler.name(), "handler already registered");
            return;
        }
        tracing::debug!(event = %key, handler = handler.name(), "handler registered");
        entry.singletons.push(handler);
    }

    /// Registers a handler instance for the event type `E`.
    pub fn add_handler_for<E: Event>(&mut self, handler: HandlerRef) {
        self.add_handler(EventKey::of::<E>(), handler);
    }

    /// Registers a scoped handler type for `key`.
    ///
    /// Inserting a type already present for `key` does nothing.
    pub fn add_scoped_handler_type(&mut self, key: EventKey, handler_type: ScopedHandlerType) {
        let entry = self.entries.entry(key).or_default();
        if entry.scoped.contains(&handler_type) {
            tracing::trace!(event = %key, handler = handler_type.name(), "scoped handler already registered");
            return;
        }
        tracing::debug!(event = %key, handler = handler_type.name(), "scoped handler registered");
        entry.scoped.push(handler_type);
    }

    /// Registers a scoped handler type for the event type `E`.
    pub fn add_scoped_handler_type_for<E: Event>(&mut self, handler_type: ScopedHandlerType) {
        self.add_scoped_handler_type(EventKey::of::<E>(), handler_type);
    }

    /// Appends a signature to the registration log.
    pub fn add_signature(&mut self, signature: HandlerSignature) {
        self.signatures.push(signature);
    }

    /// Registration log, in registration order.
    pub fn signatures(&self) -> &[HandlerSignature] {
        &self.signatures
    }

    /// Routing key of an event value.
    #[inline]
    pub fn event_key_of(&self, event: &dyn Event) -> EventKey {
        EventKey::of_event(event)
    }

    /// Number of handlers (singletons and scoped types) registered for `key`.
    pub fn handler_count(&self, key: &EventKey) -> usize {
        self.entries
            .get(key)
            .map_or(0, |e| e.singletons.len() + e.scoped.len())
    }

    /// Keys that have at least one registration.
    pub fn keys(&self) -> impl Iterator<Item = EventKey> + '_ {
        self.entries.keys().copied()
    }

    /// Returns `true` if nothing was registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolves the handlers for `event`.
    ///
    /// Scoped handlers are built by the container with `context`; they may be built
    /// concurrently but keep registration order. The first container failure is
    /// returned unmodified.
    pub async fn resolve(
        &self,
        event: &dyn Event,
        context: Option<&Context>,
    ) -> Result<Vec<HandlerRef>, ResolutionError> {
        let key = EventKey::of_event(event);
        let Some(entry) = self.entries.get(&key) else {
            tracing::debug!(event = %key, "no handlers registered");
            return Ok(Vec::new());
        };

        if entry.scoped.is_empty() {
            return Ok(entry.singletons.clone());
        }

        let container = &self.container;
        let scoped = try_join_all(
            entry
                .scoped
                .iter()
                .map(|ty| container.resolve(ty, context)),
        )
        .await?;

        let mut handlers = Vec::with_capacity(entry.singletons.len() + scoped.len());
        handlers.extend(entry.singletons.iter().cloned());
        handlers.extend(scoped);
        tracing::debug!(event = %key, handlers = handlers.len(), "handlers resolved");
        Ok(handlers)
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("events", &self.entries.len())
            .field("signatures", &self.signatures.len())
            .finish_non_exhaustive()
    }
}
