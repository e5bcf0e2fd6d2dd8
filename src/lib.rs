//! # eventdrive
//!
//! **eventdrive** is an in-process event dispatch core for async Rust.
//!
//! Application code publishes typed events; registered handlers consume them either
//! through fire-and-forget stream dispatch or through two strict protocols that report
//! every failure to the caller (exactly one handler, at least one handler).
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   HandlerDeclaration  HandlerDeclaration      Publisher candidates
//!   (singleton)         (scoped type)           (at most one, or explicit)
//!          │                  │                          │
//!          ▼                  ▼                          ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  EventBusBuilder (bootstrap)                                      │
//! │  - Registrar: declarations → HandlerRegistry (+ signatures)       │
//! │  - publisher selection (override / single candidate / conflict)   │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  EventBus                                                         │
//! │  - Arc<HandlerRegistry> (frozen, read concurrently)               │
//! │  - publisher slot (unbound / bound, last write wins)              │
//! │  - EventStream (broadcast, capacity: BusConfig::stream_capacity)  │
//! └──────┬──────────────────────────┬─────────────────────────┬───────┘
//!        │ publish / publish_all    │ consume_by_*            │ bind(key)
//!        ▼                          ▼                         ▼
//!   bound Publisher        registry.resolve(ev, ctx)     Dispatcher task
//!   (StreamPublisher ──►   └─► handlers awaited,         └─► resolve(ev, None)
//!    EventStream)              errors to the caller          errors logged
//! ```
//!
//! ### Resolution
//! ```text
//! resolve(event, context)
//!   ├─► key = EventKey::of_event(event)            (TypeId, never a name)
//!   ├─► singletons[key]                            (insertion order, pointer-deduped)
//!   └─► for each scoped type registered for key:
//!         Container::resolve(type, context)        (fresh instance per call)
//!   = [singletons..., scoped...]
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                                   |
//! |-------------------|--------------------------------------------------------------|------------------------------------------------------|
//! | **Events**        | Typed events routed by concrete type.                        | [`Event`], [`EventRef`], [`EventKey`]                |
//! | **Handlers**      | Shared or per-call handlers, closures or types.              | [`Handler`], [`HandlerFn`], [`ScopedHandler`]        |
//! | **Registry**      | Event identity → handlers, signature log.                    | [`HandlerRegistry`], [`HandlerSignature`]            |
//! | **Bus**           | Publishing, strict consumption, stream dispatch.             | [`EventBus`], [`CallOptions`], [`Subscription`]      |
//! | **Publishers**    | Delegation target for `publish`.                             | [`Publisher`], [`StreamPublisher`]                   |
//! | **Wiring**        | Bootstrap from declarations.                                 | [`EventBusBuilder`], [`HandlerDeclaration`]          |
//! | **Errors**        | Typed errors for calls, handlers and wiring.                 | [`BusError`], [`HandlerError`], [`WiringError`]      |
//! | **Configuration** | Stream capacity and multi-handler failure mode.              | [`BusConfig`], [`MultiHandlerFailure`]               |
//!
//! ## Example
//! ```rust
//! use eventdrive::{
//!     BusConfig, CallOptions, Event, EventBus, EventRef, HandlerDeclaration, HandlerError,
//!     HandlerFn,
//! };
//!
//! struct OrderPlaced {
//!     order_id: u64,
//! }
//! impl Event for OrderPlaced {}
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let reserve = HandlerFn::arc("reserve-stock", |event: EventRef| async move {
//!         let order = event
//!             .downcast_ref::<OrderPlaced>()
//!             .ok_or_else(|| HandlerError::fail("not an order"))?;
//!         println!("reserving stock for order {}", order.order_id);
//!         Ok::<_, HandlerError>(())
//!     });
//!
//!     let bus = EventBus::builder(BusConfig::default())
//!         .with_handler(HandlerDeclaration::singleton(reserve).on::<OrderPlaced>())
//!         .with_stream_publisher()
//!         .build()?;
//!
//!     // Strict: exactly one handler must take it.
//!     bus.consume_by_strictly_single_handler(OrderPlaced { order_id: 7 }.into_ref(), CallOptions::new())
//!         .await?;
//!
//!     // Fire-and-forget: dispatched by a bound subscription.
//!     let sub = bus.bind_for::<OrderPlaced>();
//!     bus.publish(OrderPlaced { order_id: 8 }.into_ref()).await?;
//!
//!     sub.cancel();
//!     bus.shutdown().await;
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod error;
mod events;
mod handlers;
mod publishers;

#[cfg(test)]
mod test_support;

// ---- Public re-exports ----

pub use config::{BusConfig, MultiHandlerFailure};
pub use core::{
    CallOptions, EventBus, EventBusBuilder, HandlerDeclaration, HandlerRegistry, HandlerScope,
    Registrar, Subscription,
};
pub use error::{BoxError, BusError, HandlerError, PublishError, ResolutionError, WiringError};
#[doc(hidden)]
pub use events::AsAny;
pub use events::{Event, EventKey, EventRef, EventStream};
pub use handlers::{
    ConstructorContainer, Container, Context, EventOption, Handler, HandlerFn, HandlerRef,
    HandlerSignature, ScopedHandler, ScopedHandlerType,
};
pub use publishers::{Publisher, StreamPublisher};
