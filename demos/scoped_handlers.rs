//! # Example: scoped_handlers
//!
//! Per-call handlers built from a request context.
//!
//! Demonstrates how to:
//! - Implement [`ScopedHandler`] so a fresh instance is built for every call.
//! - Pass request data through [`CallOptions::with_context`].
//! - Plug a custom [`Container`] that owns shared dependencies.
//! - Export the registration log as JSON from [`HandlerRegistry::signatures`].
//!
//! ## Flow
//! ```text
//! consume_by_strictly_single_handler(ev, ctx)
//!     └─► HandlerRegistry::resolve(ev, ctx)
//!           └─► TenantContainer::resolve(InvoiceHandler, ctx) ─► fresh InvoiceHandler
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=eventdrive=debug cargo run --example scoped_handlers
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use eventdrive::{
    BusConfig, CallOptions, Container, Context, Event, EventBus, EventOption, EventRef, Handler,
    HandlerDeclaration, HandlerError, HandlerRef, ResolutionError, ScopedHandler,
    ScopedHandlerType,
};
use serde_json::json;
use tracing_subscriber::EnvFilter;

struct InvoiceRequested {
    amount_cents: u64,
}
impl Event for InvoiceRequested {}

/// Request data carried by the call context.
struct RequestScope {
    tenant: String,
}

/// Handler bound to one tenant for the lifetime of a single call.
struct InvoiceHandler {
    tenant: String,
    numbers: Arc<AtomicU64>,
}

#[async_trait]
impl Handler for InvoiceHandler {
    async fn handle(&self, event: EventRef) -> Result<(), HandlerError> {
        let req = event
            .downcast_ref::<InvoiceRequested>()
            .ok_or_else(|| HandlerError::fail("expected InvoiceRequested"))?;
        let number = self.numbers.fetch_add(1, Ordering::SeqCst);
        println!(
            "[invoice] tenant={} invoice=#{number} amount={}.{:02}",
            self.tenant,
            req.amount_cents / 100,
            req.amount_cents % 100
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "invoice"
    }
}

impl ScopedHandler for InvoiceHandler {
    fn from_context(_context: Option<&Context>) -> Result<Self, ResolutionError> {
        Err(ResolutionError::Unregistered {
            handler: "InvoiceHandler".into(),
        })
    }
}

/// Container holding the invoice counter shared by every tenant.
struct TenantContainer {
    numbers: Arc<AtomicU64>,
}

#[async_trait]
impl Container for TenantContainer {
    async fn resolve(
        &self,
        handler_type: &ScopedHandlerType,
        context: Option<&Context>,
    ) -> Result<HandlerRef, ResolutionError> {
        if *handler_type != ScopedHandlerType::of::<InvoiceHandler>() {
            return Err(ResolutionError::Unregistered {
                handler: handler_type.name().to_string(),
            });
        }
        let scope = context
            .and_then(|c| c.downcast_ref::<RequestScope>())
            .ok_or_else(|| ResolutionError::MissingDependency {
                handler: handler_type.name().to_string(),
                dependency: "RequestScope".into(),
            })?;
        Ok(Arc::new(InvoiceHandler {
            tenant: scope.tenant.clone(),
            numbers: Arc::clone(&self.numbers),
        }))
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let container = Arc::new(TenantContainer {
        numbers: Arc::new(AtomicU64::new(1000)),
    });

    let bus = EventBus::builder(BusConfig::default())
        .with_container(container)
        .with_handler(
            HandlerDeclaration::scoped::<InvoiceHandler>().on_option(
                EventOption::of::<InvoiceRequested>()
                    .with_routing_metadata(json!({ "queue": "billing" })),
            ),
        )
        .build()?;

    for tenant in ["acme", "globex"] {
        let ctx = Context::new(RequestScope {
            tenant: tenant.to_string(),
        });
        bus.consume_by_strictly_single_handler(
            InvoiceRequested { amount_cents: 12_950 }.into_ref(),
            CallOptions::new().with_context(ctx),
        )
        .await?;
    }

    // Without a context the container cannot build the handler.
    if let Err(err) = bus
        .consume_by_strictly_single_handler(
            InvoiceRequested { amount_cents: 1 }.into_ref(),
            CallOptions::new(),
        )
        .await
    {
        println!("[main] {err} ({})", err.as_label());
    }

    let exported = serde_json::to_string_pretty(bus.registry().signatures())?;
    println!("[main] signatures:\n{exported}");
    Ok(())
}
