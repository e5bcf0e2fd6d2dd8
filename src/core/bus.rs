//! # Event bus: publishing, strict consumption and stream dispatch.
//!
//! [`EventBus`] ties a frozen [`HandlerRegistry`] to an optional bound [`Publisher`]
//! and an internal [`EventStream`].
//!
//! ## Architecture
//! ```text
//! producer ──► publish / publish_all ──► bound Publisher ──(StreamPublisher)──► EventStream
//!                                                                                  │
//! bind(key) ──► Dispatcher task ◄──────────────────────────────────────────────────┘
//!                   └─► registry.resolve(ev, None) ─► handlers (in order)
//!
//! caller ──► consume_by_strictly_single_handler / consume_by_multiple_handlers
//!                   └─► registry.resolve(ev, ctx) ─► handlers, awaited directly
//! ```
//!
//! ## Rules
//! - Publishing with no bound publisher fails with [`BusError::PublisherNotConfigured`].
//! - Publishing never touches the stream; forwarding is up to the publisher.
//! - Strict consumption bypasses the stream and reports every failure to the caller.
//! - `set_publisher` overwrites the binding; the last write wins.
//! - `shutdown` cancels every dispatcher created by `bind` and waits for them.

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::{BusConfig, MultiHandlerFailure};
use crate::error::BusError;
use crate::events::{Event, EventKey, EventRef, EventStream};
use crate::handlers::Context;
use crate::publishers::Publisher;

use super::builder::EventBusBuilder;
use super::dispatcher::Dispatcher;
use super::registry::HandlerRegistry;

/// Per-call options for strict consumption.
#[derive(Clone, Debug, Default)]
pub struct CallOptions {
    /// Context forwarded verbatim to the container for scoped handlers.
    pub context: Option<Context>,
}

impl CallOptions {
    /// Options without context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the call context.
    #[must_use]
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = Some(context);
        self
    }
}

/// Handle to a dispatcher created by [`EventBus::bind`].
///
/// Dropping the handle does not stop dispatch; call [`Subscription::cancel`] or
/// [`EventBus::shutdown`].
#[derive(Clone, Debug)]
pub struct Subscription {
    key: Option<EventKey>,
    token: CancellationToken,
}

impl Subscription {
    /// Stops the dispatcher after the event it is currently handling, if any.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns `true` once the subscription was cancelled (directly or by shutdown).
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Event filter of the dispatcher (`None` = every event).
    pub fn key(&self) -> Option<EventKey> {
        self.key
    }
}

/// In-process event bus.
pub struct EventBus {
    cfg: BusConfig,
    registry: Arc<HandlerRegistry>,
    stream: EventStream,
    publisher: RwLock<Option<Arc<dyn Publisher>>>,
    subscriptions: Mutex<Vec<JoinHandle<()>>>,
    runtime_token: CancellationToken,
}

impl EventBus {
    /// Creates an unbound bus over a frozen registry.
    pub fn new(cfg: BusConfig, registry: Arc<HandlerRegistry>) -> Self {
        let stream = EventStream::new(cfg.stream_capacity_clamped());
        Self::with_stream(cfg, registry, stream)
    }

    pub(crate) fn with_stream(
        cfg: BusConfig,
        registry: Arc<HandlerRegistry>,
        stream: EventStream,
    ) -> Self {
        Self {
            cfg,
            registry,
            stream,
            publisher: RwLock::new(None),
            subscriptions: Mutex::new(Vec::new()),
            runtime_token: CancellationToken::new(),
        }
    }

    /// Starts bootstrap wiring.
    pub fn builder(cfg: BusConfig) -> EventBusBuilder {
        EventBusBuilder::new(cfg)
    }

    /// Bus configuration.
    pub fn config(&self) -> &BusConfig {
        &self.cfg
    }

    /// Frozen handler registry.
    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    /// Internal broadcast stream; clone it to build forwarding publishers.
    pub fn stream(&self) -> &EventStream {
        &self.stream
    }

    // ---------------------------
    // Publishing
    // ---------------------------

    /// Forwards `event` to the bound publisher and waits for it.
    pub async fn publish(&self, event: EventRef) -> Result<(), BusError> {
        let publisher = self.publisher()?;
        publisher.publish(event).await?;
        Ok(())
    }

    /// Forwards a batch to the bound publisher's bulk operation.
    ///
    /// Events forwarded before a failure are not rolled back.
    pub async fn publish_all(&self, events: Vec<EventRef>) -> Result<(), BusError> {
        let publisher = self.publisher()?;
        publisher.publish_all(events).await?;
        Ok(())
    }

    /// Bound publisher, or [`BusError::PublisherNotConfigured`].
    pub fn publisher(&self) -> Result<Arc<dyn Publisher>, BusError> {
        self.publisher
            .read()
            .clone()
            .ok_or(BusError::PublisherNotConfigured)
    }

    /// Binds `publisher`, replacing any previous one.
    pub fn set_publisher(&self, publisher: Arc<dyn Publisher>) {
        let name = publisher.name().to_string();
        let previous = self.publisher.write().replace(publisher);
        match previous {
            Some(prev) => {
                tracing::info!(publisher = %name, replaced = prev.name(), "publisher rebound")
            }
            None => tracing::info!(publisher = %name, "publisher bound"),
        }
    }

    /// Returns `true` if a publisher is bound.
    pub fn is_publisher_bound(&self) -> bool {
        self.publisher.read().is_some()
    }

    /// Puts `event` directly on the internal stream.
    ///
    /// Returns how many dispatchers received it.
    pub fn emit(&self, event: EventRef) -> usize {
        self.stream.emit(event)
    }

    // ---------------------------
    // Stream dispatch
    // ---------------------------

    /// Spawns a dispatcher handling stream events whose key equals `key`
    /// (`None` = every event).
    ///
    /// The dispatcher sees events emitted after this call returns. Must be called
    /// within a Tokio runtime.
    pub fn bind(&self, key: Option<EventKey>) -> Subscription {
        let token = self.runtime_token.child_token();
        let rx = self.stream.subscribe();
        let dispatcher = Dispatcher::new(Arc::clone(&self.registry), key);
        let join = tokio::spawn(dispatcher.run(rx, token.clone()));

        {
            let mut subs = self.subscriptions.lock();
            subs.retain(|h| !h.is_finished());
            subs.push(join);
        }

        tracing::debug!(filter = ?key, "dispatcher bound");
        Subscription { key, token }
    }

    /// Shorthand for `bind(Some(EventKey::of::<E>()))`.
    pub fn bind_for<E: Event>(&self) -> Subscription {
        self.bind(Some(EventKey::of::<E>()))
    }

    /// Cancels every dispatcher and waits for them to stop.
    pub async fn shutdown(&self) {
        self.runtime_token.cancel();

        let handles: Vec<JoinHandle<()>> = self.subscriptions.lock().drain(..).collect();
        let count = handles.len();
        for join in handles {
            if let Err(err) = join.await {
                tracing::warn!(error = %err, "dispatcher task ended abnormally");
            }
        }
        tracing::info!(dispatchers = count, "event bus shut down");
    }

    // ---------------------------
    // Strict consumption
    // ---------------------------

    /// Hands `event` to exactly one handler.
    ///
    /// Fails with [`BusError::NoHandlerFound`] or [`BusError::MultipleHandlersFound`]
    /// before invoking anything; otherwise returns the handler's result.
    pub async fn consume_by_strictly_single_handler(
        &self,
        event: EventRef,
        options: CallOptions,
    ) -> Result<(), BusError> {
        let key = event.key();
        let handlers = self
            .registry
            .resolve(&*event, options.context.as_ref())
            .await?;

        match handlers.as_slice() {
            [] => Err(BusError::NoHandlerFound { event: key }),
            [handler] => {
                tracing::debug!(event = %key, handler = handler.name(), "consuming by single handler");
                handler.handle(event).await?;
                Ok(())
            }
            many => Err(BusError::MultipleHandlersFound {
                event: key,
                count: many.len(),
            }),
        }
    }

    /// Hands `event` to every resolved handler, in resolution order.
    ///
    /// Fails with [`BusError::NoHandlerFound`] when nothing is registered. Handler
    /// failures follow [`BusConfig::multi_handler_failure`].
    pub async fn consume_by_multiple_handlers(
        &self,
        event: EventRef,
        options: CallOptions,
    ) -> Result<(), BusError> {
        let key = event.key();
        let handlers = self
            .registry
            .resolve(&*event, options.context.as_ref())
            .await?;

        if handlers.is_empty() {
            return Err(BusError::NoHandlerFound { event: key });
        }
        tracing::debug!(event = %key, handlers = handlers.len(), "consuming by multiple handlers");

        match self.cfg.multi_handler_failure {
            MultiHandlerFailure::FailFast => {
                for handler in &handlers {
                    handler.handle(Arc::clone(&event)).await?;
                }
                Ok(())
            }
            MultiHandlerFailure::RunAll => {
                let mut failures = Vec::new();
                for handler in &handlers {
                    if let Err(err) = handler.handle(Arc::clone(&event)).await {
                        tracing::warn!(event = %key, handler = handler.name(), error = %err, "handler failed");
                        failures.push(err);
                    }
                }
                if failures.is_empty() {
                    Ok(())
                } else {
                    Err(BusError::HandlersFailed {
                        event: key,
                        failures,
                    })
                }
            }
        }
    }
}

impl Drop for EventBus {
    fn drop(&mut self) {
        self.runtime_token.cancel();
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("cfg", &self.cfg)
            .field("registry", &self.registry)
            .field("publisher_bound", &self.is_publisher_bound())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::error::{HandlerError, ResolutionError};
    use crate::handlers::{HandlerFn, ScopedHandlerType};
    use crate::test_support::{
        OrderPlaced, PaymentReceived, Recorder, RecordingContainer, RecordingPublisher, Request,
        ScopedAudit, Unbuildable,
    };

    fn bus_with(registry: HandlerRegistry) -> EventBus {
        EventBus::new(BusConfig::default(), Arc::new(registry))
    }

    fn run_all() -> BusConfig {
        BusConfig::default().with_multi_handler_failure(MultiHandlerFailure::RunAll)
    }

    fn order(id: u64) -> EventRef {
        OrderPlaced { id }.into_ref()
    }

    #[tokio::test]
    async fn test_publish_without_publisher_fails() {
        let bus = bus_with(HandlerRegistry::new());

        let err = bus.publish(order(1)).await.expect_err("unbound");
        assert!(matches!(err, BusError::PublisherNotConfigured));

        let err = bus.publish_all(vec![order(1)]).await.expect_err("unbound");
        assert!(matches!(err, BusError::PublisherNotConfigured));
        assert!(!bus.is_publisher_bound());
    }

    #[tokio::test]
    async fn test_set_publisher_last_write_wins() {
        let bus = bus_with(HandlerRegistry::new());
        let first = RecordingPublisher::new("first");
        let second = RecordingPublisher::new("second");

        bus.set_publisher(first.clone());
        bus.set_publisher(second.clone());
        bus.publish(order(1)).await.expect("publish");

        assert!(first.published().is_empty());
        assert_eq!(second.published(), vec![EventKey::of::<OrderPlaced>()]);
        assert_eq!(bus.publisher().expect("bound").name(), "second");
    }

    #[tokio::test]
    async fn test_publish_forwards_the_exact_value() {
        let bus = bus_with(HandlerRegistry::new());
        let publisher = RecordingPublisher::new("external");
        bus.set_publisher(publisher.clone());

        let event = order(7);
        bus.publish(Arc::clone(&event)).await.expect("publish");

        let forwarded = publisher.last().expect("forwarded");
        assert!(Arc::ptr_eq(&forwarded, &event));
        assert_eq!(forwarded.downcast_ref::<OrderPlaced>().map(|o| o.id), Some(7));
    }

    #[tokio::test]
    async fn test_publish_all_uses_bulk_operation() {
        let bus = bus_with(HandlerRegistry::new());
        let publisher = RecordingPublisher::new("bulk");
        bus.set_publisher(publisher.clone());

        bus.publish_all(vec![order(1), PaymentReceived { amount: 3 }.into_ref()])
            .await
            .expect("publish_all");

        assert_eq!(publisher.bulk_calls(), 1);
        assert_eq!(
            publisher.published(),
            vec![EventKey::of::<OrderPlaced>(), EventKey::of::<PaymentReceived>()]
        );
    }

    #[tokio::test]
    async fn test_publish_does_not_touch_stream() {
        let bus = bus_with(HandlerRegistry::new());
        bus.set_publisher(RecordingPublisher::new("external"));
        let mut rx = bus.stream().subscribe();

        bus.publish(order(1)).await.expect("publish");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_single_handler_requires_a_handler() {
        let bus = bus_with(HandlerRegistry::new());
        let err = bus
            .consume_by_strictly_single_handler(order(1), CallOptions::new())
            .await
            .expect_err("no handler");
        match err {
            BusError::NoHandlerFound { event } => assert_eq!(event, EventKey::of::<OrderPlaced>()),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_single_handler_rejects_two_without_invoking() {
        let rec = Recorder::new();
        let mut reg = HandlerRegistry::new();
        reg.add_handler_for::<OrderPlaced>(rec.handler("a"));
        reg.add_handler_for::<OrderPlaced>(rec.handler("b"));
        let bus = bus_with(reg);

        let err = bus
            .consume_by_strictly_single_handler(order(1), CallOptions::new())
            .await
            .expect_err("two handlers");
        assert!(matches!(err, BusError::MultipleHandlersFound { count: 2, .. }));
        assert!(rec.calls().is_empty());
    }

    #[tokio::test]
    async fn test_single_handler_runs_and_returns_its_error_verbatim() {
        let rec = Recorder::new();
        let mut reg = HandlerRegistry::new();
        reg.add_handler_for::<OrderPlaced>(rec.handler("ok"));
        reg.add_handler_for::<PaymentReceived>(rec.failing("boom", "card declined"));
        let bus = bus_with(reg);

        bus.consume_by_strictly_single_handler(order(1), CallOptions::new())
            .await
            .expect("handled");

        let err = bus
            .consume_by_strictly_single_handler(
                PaymentReceived { amount: 9 }.into_ref(),
                CallOptions::new(),
            )
            .await
            .expect_err("handler fails");
        match err {
            BusError::Handler(HandlerError::Fail { error }) => assert_eq!(error, "card declined"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(rec.calls(), vec!["ok", "boom"]);
    }

    #[tokio::test]
    async fn test_single_handler_receives_the_payload_once() {
        let amounts = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&amounts);
        let handler = HandlerFn::arc("payment", move |event: EventRef| {
            let seen = Arc::clone(&seen);
            async move {
                let payment = event
                    .downcast_ref::<PaymentReceived>()
                    .ok_or_else(|| HandlerError::unexpected::<PaymentReceived>(&*event))?;
                seen.lock().push(payment.amount);
                Ok::<_, HandlerError>(())
            }
        });
        let mut reg = HandlerRegistry::new();
        reg.add_handler_for::<PaymentReceived>(handler);
        let bus = bus_with(reg);

        bus.consume_by_strictly_single_handler(
            PaymentReceived { amount: 100 }.into_ref(),
            CallOptions::new(),
        )
        .await
        .expect("handled");

        assert_eq!(*amounts.lock(), vec![100]);
    }

    #[tokio::test]
    async fn test_single_handler_counts_scoped_handlers() {
        let rec = Recorder::new();
        let mut reg = HandlerRegistry::new();
        reg.add_handler_for::<OrderPlaced>(rec.handler("a"));
        reg.add_scoped_handler_type_for::<OrderPlaced>(ScopedHandlerType::of::<ScopedAudit>());
        let bus = bus_with(reg);

        let err = bus
            .consume_by_strictly_single_handler(order(1), CallOptions::new())
            .await
            .expect_err("singleton + scoped");
        assert!(matches!(err, BusError::MultipleHandlersFound { count: 2, .. }));
    }

    #[tokio::test]
    async fn test_context_reaches_scoped_handler() {
        let rec = Recorder::new();
        let mut reg = HandlerRegistry::new();
        reg.add_scoped_handler_type_for::<OrderPlaced>(ScopedHandlerType::of::<ScopedAudit>());
        let bus = bus_with(reg);

        let ctx = Context::new(Request {
            tenant: "acme",
            recorder: rec.clone(),
        });
        bus.consume_by_strictly_single_handler(order(1), CallOptions::new().with_context(ctx))
            .await
            .expect("handled");

        assert_eq!(rec.calls(), vec!["audit:acme"]);
    }

    #[tokio::test]
    async fn test_resolution_failure_surfaces_underlying_cause() {
        let mut reg = HandlerRegistry::new();
        reg.add_scoped_handler_type_for::<OrderPlaced>(ScopedHandlerType::of::<Unbuildable>());
        let bus = bus_with(reg);

        let err = bus
            .consume_by_multiple_handlers(order(1), CallOptions::new())
            .await
            .expect_err("container fails");
        assert!(matches!(
            err,
            BusError::Resolution(ResolutionError::MissingDependency { .. })
        ));
        assert!(err.to_string().contains("Database"));
    }

    #[tokio::test]
    async fn test_multiple_handlers_require_a_handler() {
        let bus = bus_with(HandlerRegistry::new());
        let err = bus
            .consume_by_multiple_handlers(order(1), CallOptions::new())
            .await
            .expect_err("no handler");
        assert!(matches!(err, BusError::NoHandlerFound { .. }));
    }

    #[tokio::test]
    async fn test_multiple_handlers_run_in_order() {
        let rec = Recorder::new();
        let mut reg = HandlerRegistry::new();
        for name in ["a", "b", "c"] {
            reg.add_handler_for::<OrderPlaced>(rec.handler(name));
        }
        let bus = bus_with(reg);

        bus.consume_by_multiple_handlers(order(1), CallOptions::new())
            .await
            .expect("handled");
        assert_eq!(rec.calls(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_multiple_handlers_share_one_event_value() {
        let seen: Arc<Mutex<Vec<EventRef>>> = Arc::new(Mutex::new(Vec::new()));
        let mut reg = HandlerRegistry::new();
        for name in ["a", "b"] {
            let seen = Arc::clone(&seen);
            reg.add_handler_for::<OrderPlaced>(HandlerFn::arc(name, move |event: EventRef| {
                let seen = Arc::clone(&seen);
                async move {
                    seen.lock().push(event);
                    Ok::<_, HandlerError>(())
                }
            }));
        }
        let bus = bus_with(reg);

        let event = order(3);
        bus.consume_by_multiple_handlers(Arc::clone(&event), CallOptions::new())
            .await
            .expect("handled");

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|e| Arc::ptr_eq(e, &event)));
    }

    #[tokio::test]
    async fn test_fail_fast_skips_remaining_handlers() {
        let rec = Recorder::new();
        let mut reg = HandlerRegistry::new();
        reg.add_handler_for::<OrderPlaced>(rec.handler("a"));
        reg.add_handler_for::<OrderPlaced>(rec.failing("b", "out of stock"));
        reg.add_handler_for::<OrderPlaced>(rec.handler("c"));
        let bus = bus_with(reg);

        let err = bus
            .consume_by_multiple_handlers(order(1), CallOptions::new())
            .await
            .expect_err("b fails");
        assert!(matches!(err, BusError::Handler(HandlerError::Fail { .. })));
        assert_eq!(rec.calls(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_run_all_invokes_every_handler_and_collects_failures() {
        let rec = Recorder::new();
        let mut reg = HandlerRegistry::new();
        reg.add_handler_for::<OrderPlaced>(rec.failing("a", "first"));
        reg.add_handler_for::<OrderPlaced>(rec.handler("b"));
        reg.add_handler_for::<OrderPlaced>(rec.failing("c", "second"));
        let bus = EventBus::new(run_all(), Arc::new(reg));
        assert_eq!(bus.config().multi_handler_failure, MultiHandlerFailure::RunAll);

        let err = bus
            .consume_by_multiple_handlers(order(1), CallOptions::new())
            .await
            .expect_err("a and c fail");
        assert_eq!(rec.calls(), vec!["a", "b", "c"]);
        match err {
            BusError::HandlersFailed { event, failures } => {
                assert_eq!(event, EventKey::of::<OrderPlaced>());
                let messages: Vec<String> = failures.iter().map(|f| f.to_string()).collect();
                assert_eq!(
                    messages,
                    vec!["handler failed: first", "handler failed: second"]
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_run_all_succeeds_when_nothing_fails() {
        let rec = Recorder::new();
        let mut reg = HandlerRegistry::new();
        reg.add_handler_for::<OrderPlaced>(rec.handler("a"));
        let bus = EventBus::new(run_all(), Arc::new(reg));

        bus.consume_by_multiple_handlers(order(1), CallOptions::new())
            .await
            .expect("handled");
    }

    #[tokio::test]
    async fn test_bind_filters_by_key() {
        let rec = Recorder::new();
        let mut reg = HandlerRegistry::new();
        reg.add_handler_for::<OrderPlaced>(rec.handler("orders"));
        reg.add_handler_for::<PaymentReceived>(rec.handler("payments"));
        let bus = bus_with(reg);

        let sub = bus.bind_for::<OrderPlaced>();
        assert_eq!(sub.key(), Some(EventKey::of::<OrderPlaced>()));

        bus.emit(PaymentReceived { amount: 1 }.into_ref());
        bus.emit(order(1));
        rec.wait_for(1).await;

        assert_eq!(rec.calls(), vec!["orders"]);
        bus.shutdown().await;
    }

    #[tokio::test]
    async fn test_unfiltered_bind_dispatches_every_event_in_order() {
        let rec = Recorder::new();
        let mut reg = HandlerRegistry::new();
        reg.add_handler_for::<OrderPlaced>(rec.handler("o1"));
        reg.add_handler_for::<OrderPlaced>(rec.handler("o2"));
        reg.add_handler_for::<PaymentReceived>(rec.handler("p"));
        let bus = bus_with(reg);

        bus.bind(None);
        bus.emit(order(1));
        bus.emit(PaymentReceived { amount: 1 }.into_ref());
        rec.wait_for(3).await;

        assert_eq!(rec.calls(), vec!["o1", "o2", "p"]);
        bus.shutdown().await;
    }

    #[tokio::test]
    async fn test_dispatch_continues_after_handler_failure() {
        let rec = Recorder::new();
        let mut reg = HandlerRegistry::new();
        reg.add_handler_for::<OrderPlaced>(rec.failing("bad", "nope"));
        reg.add_handler_for::<OrderPlaced>(rec.handler("good"));
        let bus = bus_with(reg);

        bus.bind(None);
        bus.emit(order(1));
        bus.emit(order(2));
        rec.wait_for(4).await;

        assert_eq!(rec.calls(), vec!["bad", "good", "bad", "good"]);
        bus.shutdown().await;
    }

    #[tokio::test]
    async fn test_dispatch_skips_event_whose_resolution_fails() {
        let rec = Recorder::new();
        let mut reg = HandlerRegistry::new().with_container(Arc::new(RecordingContainer {
            recorder: rec.clone(),
        }));
        reg.add_handler_for::<PaymentReceived>(rec.handler("p"));
        reg.add_scoped_handler_type_for::<PaymentReceived>(ScopedHandlerType::of::<Unbuildable>());
        reg.add_handler_for::<OrderPlaced>(rec.handler("o"));
        reg.add_scoped_handler_type_for::<OrderPlaced>(ScopedHandlerType::of::<ScopedAudit>());
        let bus = bus_with(reg);

        bus.bind(None);
        bus.emit(PaymentReceived { amount: 1 }.into_ref());
        bus.emit(order(1));
        rec.wait_for(2).await;

        // The payment is dropped whole, singleton included; the audit handler is built
        // without a context.
        assert_eq!(rec.calls(), vec!["audit:anonymous", "o"]);
        bus.shutdown().await;
    }

    #[tokio::test]
    async fn test_cancelled_subscription_stops_dispatch() {
        let rec = Recorder::new();
        let mut reg = HandlerRegistry::new();
        reg.add_handler_for::<OrderPlaced>(rec.handler("a"));
        let bus = bus_with(reg);

        let sub = bus.bind(None);
        sub.cancel();
        assert!(sub.is_cancelled());

        bus.emit(order(1));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(rec.calls().is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_stops_every_dispatcher() {
        let bus = bus_with(HandlerRegistry::new());
        let a = bus.bind(None);
        let b = bus.bind_for::<OrderPlaced>();
        assert_eq!(bus.stream().receiver_count(), 2);

        bus.shutdown().await;

        assert!(a.is_cancelled() && b.is_cancelled());
        assert_eq!(bus.stream().receiver_count(), 0);
    }

    #[tokio::test]
    async fn test_lagging_dispatcher_skips_oldest_and_continues() {
        let rec = Recorder::new();
        let mut reg = HandlerRegistry::new();
        reg.add_handler_for::<OrderPlaced>(rec.handler("a"));
        let cfg = BusConfig {
            stream_capacity: 1,
            ..BusConfig::default()
        };
        let bus = EventBus::new(cfg, Arc::new(reg));

        bus.bind(None);
        // current-thread runtime: the dispatcher cannot run before the next await
        for id in 0..3 {
            bus.emit(order(id));
        }
        rec.wait_for(1).await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(rec.calls(), vec!["a"]);
        bus.shutdown().await;
    }
}
