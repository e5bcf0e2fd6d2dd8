//! # Event handler trait.
//!
//! Provides [`Handler`], the extension point for consuming events.
//!
//! A handler receives a shared [`EventRef`] and downcasts it to the event types it was
//! registered for. The same handler may be registered for several event types.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use eventdrive::{Event, EventRef, Handler, HandlerError};
//!
//! struct PaymentReceived {
//!     amount: u64,
//! }
//! impl Event for PaymentReceived {}
//!
//! struct Ledger;
//!
//! #[async_trait]
//! impl Handler for Ledger {
//!     async fn handle(&self, event: EventRef) -> Result<(), HandlerError> {
//!         let payment = event
//!             .downcast_ref::<PaymentReceived>()
//!             .ok_or_else(|| HandlerError::fail("not a payment"))?;
//!         let _ = payment.amount; // book it
//!         Ok(())
//!     }
//!
//!     fn name(&self) -> &str { "ledger" }
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::HandlerError;
use crate::events::EventRef;

/// Event handler.
///
/// ### Implementation requirements
/// - Use async I/O; avoid blocking the executor.
/// - Return errors instead of panicking; strict-consumption callers receive them verbatim.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Handles a single event.
    ///
    /// Called directly by strict-consumption calls, or from a `bind` dispatcher task.
    async fn handle(&self, event: EventRef) -> Result<(), HandlerError>;

    /// Returns the handler name used in logs.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose; override it when possible.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Shared handler instance.
pub type HandlerRef = Arc<dyn Handler>;

/// Reference identity of two handler instances (data pointer only).
#[inline]
pub(crate) fn same_instance(a: &HandlerRef, b: &HandlerRef) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}
