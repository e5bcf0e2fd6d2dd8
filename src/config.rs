//! # Event bus configuration.
//!
//! Provides [`BusConfig`], the centralized settings for an [`EventBus`](crate::EventBus).
//!
//! Config is used in two ways:
//! 1. **Direct construction**: `EventBus::new(config, registry)`
//! 2. **Bootstrap**: `EventBus::builder(config)...build()`
//!
//! ## Sentinel values
//! - `stream_capacity = 0` → clamped to 1 by the stream

/// How [`EventBus::consume_by_multiple_handlers`](crate::EventBus::consume_by_multiple_handlers)
/// reacts when a handler fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MultiHandlerFailure {
    /// Stop at the first failing handler; handlers after it are not invoked.
    /// The failure is returned unmodified as [`BusError::Handler`](crate::BusError::Handler).
    #[default]
    FailFast,

    /// Invoke every handler regardless of failures, then return
    /// [`BusError::HandlersFailed`](crate::BusError::HandlersFailed) carrying all of them.
    RunAll,
}

/// Configuration for the event bus.
///
/// ## Field semantics
/// - `stream_capacity`: broadcast ring buffer size (min 1; clamped)
/// - `multi_handler_failure`: failure mode for multi-handler consumption
#[derive(Clone, Debug)]
pub struct BusConfig {
    /// Capacity of the internal broadcast stream.
    ///
    /// Dispatchers created by `bind` that fall more than `stream_capacity` events behind
    /// skip the oldest ones and log how many were lost.
    pub stream_capacity: usize,

    /// Failure mode for `consume_by_multiple_handlers`.
    pub multi_handler_failure: MultiHandlerFailure,
}

impl BusConfig {
    /// Returns the stream capacity clamped to a minimum of 1.
    #[inline]
    pub fn stream_capacity_clamped(&self) -> usize {
        self.stream_capacity.max(1)
    }

    /// Returns a copy with the given failure mode.
    #[must_use]
    pub fn with_multi_handler_failure(mut self, mode: MultiHandlerFailure) -> Self {
        self.multi_handler_failure = mode;
        self
    }
}

impl Default for BusConfig {
    /// Default configuration:
    ///
    /// - `stream_capacity = 1024`
    /// - `multi_handler_failure = FailFast`
    fn default() -> Self {
        Self {
            stream_capacity: 1024,
            multi_handler_failure: MultiHandlerFailure::default(),
        }
    }
}
