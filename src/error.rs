//! Error types used by the event bus, its handlers and the bootstrap wiring.
//!
//! - [`BusError`]: failures surfaced by [`EventBus`](crate::EventBus) calls.
//! - [`HandlerError`]: failures raised by individual handler invocations.
//! - [`PublishError`]: failures raised by a bound [`Publisher`](crate::Publisher).
//! - [`ResolutionError`]: failures raised by a [`Container`](crate::Container)
//!   while building a scoped handler.
//! - [`WiringError`]: bootstrap-time conflicts detected before a bus exists.
//!
//! Every enum provides `as_label()`, a short stable snake_case label for logs.

use thiserror::Error;

use crate::events::{Event, EventKey};

/// Boxed error source used by the `Other` variants.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// # Errors produced by event bus calls.
///
/// Nothing here is retried or recovered internally: each error is fatal to the call
/// that triggered it.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum BusError {
    /// A strict-consumption call resolved zero handlers.
    #[error("no handler found for event {event}")]
    NoHandlerFound {
        /// Routing key of the consumed event.
        event: EventKey,
    },

    /// A strictly-single-handler call resolved two or more handlers.
    #[error("multiple handlers found for event {event} (found {count}, expected exactly 1)")]
    MultipleHandlersFound {
        /// Routing key of the consumed event.
        event: EventKey,
        /// Number of resolved handlers.
        count: usize,
    },

    /// A publish call was made before any publisher was bound.
    #[error("event publisher is not configured")]
    PublisherNotConfigured,

    /// The container failed to build a scoped handler (underlying cause kept as-is).
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// The bound publisher rejected or failed to forward an event.
    #[error(transparent)]
    Publish(#[from] PublishError),

    /// A handler invocation failed (the handler's own error, unmodified).
    #[error(transparent)]
    Handler(#[from] HandlerError),

    /// One or more handlers failed while every handler was still invoked.
    ///
    /// Only produced under [`MultiHandlerFailure::RunAll`](crate::MultiHandlerFailure::RunAll).
    #[error("{} handler(s) failed for event {event}", failures.len())]
    HandlersFailed {
        /// Routing key of the consumed event.
        event: EventKey,
        /// Every failure, in resolution order.
        failures: Vec<HandlerError>,
    },
}

impl BusError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use eventdrive::BusError;
    ///
    /// assert_eq!(BusError::PublisherNotConfigured.as_label(), "publisher_not_configured");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            BusError::NoHandlerFound { .. } => "no_handler_found",
            BusError::MultipleHandlersFound { .. } => "multiple_handlers_found",
            BusError::PublisherNotConfigured => "publisher_not_configured",
            BusError::Resolution(_) => "resolution_failed",
            BusError::Publish(_) => "publish_failed",
            BusError::Handler(_) => "handler_failed",
            BusError::HandlersFailed { .. } => "handlers_failed",
        }
    }
}

/// # Errors produced by handler invocations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum HandlerError {
    /// Handling failed with a message.
    #[error("handler failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The handler received an event type it does not know how to handle.
    #[error("unexpected event {actual} (handler accepts {expected})")]
    UnexpectedEvent {
        /// Type the handler expected.
        expected: &'static str,
        /// Type it actually received.
        actual: &'static str,
    },

    /// Any other error raised by handler code.
    #[error(transparent)]
    Other(#[from] BoxError),
}

impl HandlerError {
    /// Shorthand for [`HandlerError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        HandlerError::Fail {
            error: error.into(),
        }
    }

    /// Shorthand for [`HandlerError::UnexpectedEvent`] when a handler expecting `E`
    /// receives `actual`.
    pub fn unexpected<E: Event>(actual: &dyn Event) -> Self {
        HandlerError::UnexpectedEvent {
            expected: std::any::type_name::<E>(),
            actual: actual.event_name(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            HandlerError::Fail { .. } => "handler_fail",
            HandlerError::UnexpectedEvent { .. } => "handler_unexpected_event",
            HandlerError::Other(_) => "handler_other",
        }
    }
}

/// # Errors produced by publishers.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum PublishError {
    /// The publisher refused the event.
    #[error("event rejected: {reason}")]
    Rejected {
        /// Why the event was refused.
        reason: String,
    },

    /// Any other transport error.
    #[error(transparent)]
    Other(#[from] BoxError),
}

impl PublishError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            PublishError::Rejected { .. } => "publish_rejected",
            PublishError::Other(_) => "publish_other",
        }
    }
}

/// # Errors produced while resolving scoped handlers.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ResolutionError {
    /// A dependency required to construct the handler is unavailable.
    #[error("cannot resolve {handler}: missing dependency {dependency}")]
    MissingDependency {
        /// Handler type being resolved.
        handler: String,
        /// Name of the missing dependency.
        dependency: String,
    },

    /// The container does not know how to build this handler type.
    #[error("handler type {handler} is not registered in the container")]
    Unregistered {
        /// Handler type being resolved.
        handler: String,
    },

    /// Construction failed for another reason.
    #[error("failed to resolve {handler}: {source}")]
    Failed {
        /// Handler type being resolved.
        handler: String,
        /// Underlying cause.
        #[source]
        source: BoxError,
    },
}

impl ResolutionError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ResolutionError::MissingDependency { .. } => "resolution_missing_dependency",
            ResolutionError::Unregistered { .. } => "resolution_unregistered",
            ResolutionError::Failed { .. } => "resolution_failed",
        }
    }
}

/// # Errors produced by bootstrap wiring.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum WiringError {
    /// More than one publisher candidate was declared and no explicit publisher was chosen.
    #[error(
        "multiple publishers declared: {}; only one publisher may be declared unless an explicit publisher is set",
        publishers.join(", ")
    )]
    MultiplePublishersDeclared {
        /// Names of every conflicting candidate, in declaration order.
        publishers: Vec<String>,
    },
}

impl WiringError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            WiringError::MultiplePublishersDeclared { .. } => "multiple_publishers_declared",
        }
    }
}
