//! Handlers: the consuming side of the bus.
//!
//! ## Contents
//! - [`Handler`], [`HandlerRef`] the handler trait and its shared handle
//! - [`HandlerFn`] closure-backed handler
//! - [`ScopedHandler`], [`ScopedHandlerType`], [`Context`] per-call handlers
//! - [`Container`], [`ConstructorContainer`] scoped handler construction
//! - [`EventOption`], [`HandlerSignature`] declaration and export records

mod handler;
mod handler_fn;
mod scoped;
mod signature;

pub(crate) use handler::same_instance;
pub use handler::{Handler, HandlerRef};
pub use handler_fn::HandlerFn;
pub use scoped::{ConstructorContainer, Container, Context, ScopedHandler, ScopedHandlerType};
pub use signature::{EventOption, HandlerSignature};
