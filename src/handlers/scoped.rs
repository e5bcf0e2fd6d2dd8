//! # Scoped handlers and the container that builds them.
//!
//! A scoped handler is registered as a *type* ([`ScopedHandlerType`]) rather than an
//! instance. Every resolution asks the [`Container`] for a fresh instance, passing the
//! caller's [`Context`]; the instance lives only for that call.
//!
//! ## Resolution flow
//! ```text
//! consume_*(event, CallOptions { context })
//!     └─► HandlerRegistry::resolve(event, context)
//!             ├─► singletons (shared instances)
//!             └─► for each ScopedHandlerType:
//!                     Container::resolve(handler_type, context) ──► fresh HandlerRef
//! ```
//!
//! [`ConstructorContainer`] is the default container: it calls
//! [`ScopedHandler::from_context`] through the constructor captured by
//! [`ScopedHandlerType::of`]. Applications with real dependency wiring provide their
//! own [`Container`].

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ResolutionError;
use crate::handlers::{Handler, HandlerRef};

/// Opaque per-call context forwarded verbatim to scoped handler resolution.
///
/// Cheap to clone; the core never looks inside.
#[derive(Clone)]
pub struct Context(Arc<dyn Any + Send + Sync>);

impl Context {
    /// Wraps a value as a context.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Wraps an already shared value.
    pub fn from_arc(value: Arc<dyn Any + Send + Sync>) -> Self {
        Self(value)
    }

    /// Downcasts the context value.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        (*self.0).downcast_ref::<T>()
    }

    /// Returns `true` if both contexts share the same value.
    pub fn ptr_eq(&self, other: &Context) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Context(..)")
    }
}

/// A handler type that can be constructed per call from an optional context.
pub trait ScopedHandler: Handler + Sized {
    /// Builds a fresh instance for one resolution call.
    fn from_context(context: Option<&Context>) -> Result<Self, ResolutionError>;
}

type Constructor = fn(Option<&Context>) -> Result<HandlerRef, ResolutionError>;

fn construct<H: ScopedHandler>(context: Option<&Context>) -> Result<HandlerRef, ResolutionError> {
    let handler = H::from_context(context)?;
    Ok(Arc::new(handler))
}

/// Descriptor of a scoped handler type.
///
/// Two descriptors are equal when they describe the same Rust type.
#[derive(Clone, Copy)]
pub struct ScopedHandlerType {
    id: TypeId,
    name: &'static str,
    construct: Constructor,
}

impl ScopedHandlerType {
    /// Descriptor of the handler type `H`.
    pub fn of<H: ScopedHandler>() -> Self {
        Self {
            id: TypeId::of::<H>(),
            name: std::any::type_name::<H>(),
            construct: construct::<H>,
        }
    }

    /// Type id of the handler type.
    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Full type name of the handler type.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Runs the captured constructor.
    pub fn construct(&self, context: Option<&Context>) -> Result<HandlerRef, ResolutionError> {
        (self.construct)(context)
    }
}

impl PartialEq for ScopedHandlerType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ScopedHandlerType {}

impl fmt::Debug for ScopedHandlerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ScopedHandlerType").field(&self.name).finish()
    }
}

/// Builds scoped handler instances on demand.
///
/// Errors are propagated unmodified to the strict-consumption caller.
#[async_trait]
pub trait Container: Send + Sync + 'static {
    /// Returns a fresh instance of `handler_type` bound to `context`.
    async fn resolve(
        &self,
        handler_type: &ScopedHandlerType,
        context: Option<&Context>,
    ) -> Result<HandlerRef, ResolutionError>;
}

/// Default container: constructs handlers through [`ScopedHandler::from_context`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ConstructorContainer;

#[async_trait]
impl Container for ConstructorContainer {
    async fn resolve(
        &self,
        handler_type: &ScopedHandlerType,
        context: Option<&Context>,
    ) -> Result<HandlerRef, ResolutionError> {
        handler_type.construct(context)
    }
}
