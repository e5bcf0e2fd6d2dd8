//! # Example: order_flow
//!
//! Strict consumption of order commands and events.
//!
//! Demonstrates how to:
//! - Declare singleton handlers with [`HandlerDeclaration`].
//! - Dispatch a command to exactly one handler with
//!   [`EventBus::consume_by_strictly_single_handler`].
//! - Fan an event out to every handler with [`EventBus::consume_by_multiple_handlers`].
//! - Observe the `NoHandlerFound` / `MultipleHandlersFound` failures.
//!
//! ## Flow
//! ```text
//! PlaceOrder ──► consume_by_strictly_single_handler
//!     └─► place-order handler
//!
//! OrderPlaced ──► consume_by_multiple_handlers
//!     ├─► reserve-stock
//!     └─► send-confirmation
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=eventdrive=debug cargo run --example order_flow
//! ```

use std::sync::Arc;

use eventdrive::{
    BusConfig, BusError, CallOptions, Event, EventBus, EventRef, HandlerDeclaration, HandlerError,
    HandlerFn,
};
use tracing_subscriber::EnvFilter;

struct PlaceOrder {
    order_id: u64,
    items: u32,
}
impl Event for PlaceOrder {}

struct OrderPlaced {
    order_id: u64,
}
impl Event for OrderPlaced {}

struct RefundIssued;
impl Event for RefundIssued {}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // 1. Handlers (closures capture what they need)
    let place_order = HandlerFn::arc("place-order", |event: EventRef| async move {
        let cmd = event
            .downcast_ref::<PlaceOrder>()
            .ok_or_else(|| HandlerError::unexpected::<PlaceOrder>(&*event))?;
        if cmd.items == 0 {
            return Err(HandlerError::fail("order has no items"));
        }
        println!("[place-order] order {} accepted", cmd.order_id);
        Ok::<_, HandlerError>(())
    });

    let reserve = HandlerFn::arc("reserve-stock", |event: EventRef| async move {
        if let Some(ev) = event.downcast_ref::<OrderPlaced>() {
            println!("[reserve-stock] reserving for order {}", ev.order_id);
        }
        Ok::<_, HandlerError>(())
    });

    let confirm = HandlerFn::arc("send-confirmation", |event: EventRef| async move {
        if let Some(ev) = event.downcast_ref::<OrderPlaced>() {
            println!("[send-confirmation] mail sent for order {}", ev.order_id);
        }
        Ok::<_, HandlerError>(())
    });

    // 2. Wire the bus (no publisher needed for strict consumption)
    let bus: Arc<EventBus> = EventBus::builder(BusConfig::default())
        .with_handlers([
            HandlerDeclaration::singleton(place_order).on::<PlaceOrder>(),
            HandlerDeclaration::singleton(reserve).on::<OrderPlaced>(),
            HandlerDeclaration::singleton(confirm).on::<OrderPlaced>(),
        ])
        .build()?;

    // 3. Command: exactly one handler
    bus.consume_by_strictly_single_handler(
        PlaceOrder { order_id: 42, items: 3 }.into_ref(),
        CallOptions::new(),
    )
    .await?;

    // 4. Handler failure reaches the caller unchanged
    if let Err(err) = bus
        .consume_by_strictly_single_handler(
            PlaceOrder { order_id: 43, items: 0 }.into_ref(),
            CallOptions::new(),
        )
        .await
    {
        println!("[main] rejected: {err} ({})", err.as_label());
    }

    // 5. Event: every handler, in registration order
    bus.consume_by_multiple_handlers(OrderPlaced { order_id: 42 }.into_ref(), CallOptions::new())
        .await?;

    // 6. Two handlers where one is required
    match bus
        .consume_by_strictly_single_handler(
            OrderPlaced { order_id: 42 }.into_ref(),
            CallOptions::new(),
        )
        .await
    {
        Err(BusError::MultipleHandlersFound { count, .. }) => {
            println!("[main] OrderPlaced has {count} handlers, strict call refused")
        }
        other => println!("[main] unexpected: {other:?}"),
    }

    // 7. Nobody listens
    if let Err(err) = bus
        .consume_by_multiple_handlers(RefundIssued.into_ref(), CallOptions::new())
        .await
    {
        println!("[main] {err}");
    }

    Ok(())
}
