//! # Stream dispatcher behind `EventBus::bind`.
//!
//! Each `bind` spawns one dispatcher task reading the bus's broadcast stream:
//!
//! ```text
//! EventStream ──► rx.recv() ──► key filter ──► registry.resolve(ev, None)
//!                                                   └─► h1.handle(ev).await
//!                                                       h2.handle(ev).await ...
//! ```
//!
//! ## Rules
//! - Events are processed one at a time; handlers run in resolution order.
//! - There is no caller: resolution and handler failures are logged and dispatch continues.
//! - A lagging receiver logs how many events were skipped and keeps going.
//! - Cancellation is checked between events; an in-flight handler is never interrupted.

use std::sync::Arc;

use tokio::sync::broadcast::{error::RecvError, Receiver};
use tokio_util::sync::CancellationToken;

use crate::events::{EventKey, EventRef};

use super::registry::HandlerRegistry;

pub(crate) struct Dispatcher {
    registry: Arc<HandlerRegistry>,
    key: Option<EventKey>,
}

impl Dispatcher {
    pub(crate) fn new(registry: Arc<HandlerRegistry>, key: Option<EventKey>) -> Self {
        Self { registry, key }
    }

    /// Runs until `token` is cancelled or the stream closes.
    pub(crate) async fn run(self, mut rx: Receiver<EventRef>, token: CancellationToken) {
        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                msg = rx.recv() => match msg {
                    Ok(event) => self.dispatch(event).await,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(filter = ?self.key, skipped, "dispatcher lagged, events skipped");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
        tracing::debug!(filter = ?self.key, "dispatcher stopped");
    }

    async fn dispatch(&self, event: EventRef) {
        let key = event.key();
        if self.key.is_some_and(|k| k != key) {
            return;
        }

        let handlers = match self.registry.resolve(&*event, None).await {
            Ok(handlers) => handlers,
            Err(err) => {
                tracing::warn!(event = %key, error = %err, label = err.as_label(), "handler resolution failed");
                return;
            }
        };

        for handler in handlers {
            if let Err(err) = handler.handle(Arc::clone(&event)).await {
                tracing::warn!(
                    event = %key,
                    handler = handler.name(),
                    error = %err,
                    label = err.as_label(),
                    "handler failed"
                );
            }
        }
    }
}
