use std::sync::Arc;

use crate::config::BusConfig;
use crate::error::WiringError;
use crate::events::EventStream;
use crate::handlers::Container;
use crate::publishers::{Publisher, StreamPublisher};

use super::bus::EventBus;
use super::registrar::{HandlerDeclaration, Registrar};
use super::registry::HandlerRegistry;

/// Builder for wiring an [`EventBus`] at bootstrap.
///
/// Collects handler declarations and publisher candidates, then registers everything
/// into a fresh [`HandlerRegistry`], freezes it and binds the publisher.
pub struct EventBusBuilder {
    cfg: BusConfig,
    stream: EventStream,
    container: Option<Arc<dyn Container>>,
    declarations: Vec<HandlerDeclaration>,
    publisher_candidates: Vec<Arc<dyn Publisher>>,
    publisher_override: Option<Arc<dyn Publisher>>,
}

impl EventBusBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: BusConfig) -> Self {
        let stream = EventStream::new(cfg.stream_capacity_clamped());
        Self {
            cfg,
            stream,
            container: None,
            declarations: Vec::new(),
            publisher_candidates: Vec::new(),
            publisher_override: None,
        }
    }

    /// Stream the built bus will own.
    ///
    /// Available before `build()` so forwarding publishers can be created up front.
    pub fn stream(&self) -> &EventStream {
        &self.stream
    }

    /// Sets the container used to build scoped handlers.
    ///
    /// Defaults to [`ConstructorContainer`](crate::ConstructorContainer).
    pub fn with_container(mut self, container: Arc<dyn Container>) -> Self {
        self.container = Some(container);
        self
    }

    /// Adds one handler declaration.
    pub fn with_handler(mut self, declaration: HandlerDeclaration) -> Self {
        self.declarations.push(declaration);
        self
    }

    /// Adds several handler declarations.
    pub fn with_handlers(mut self, declarations: impl IntoIterator<Item = HandlerDeclaration>) -> Self {
        self.declarations.extend(declarations);
        self
    }

    /// Declares a publisher candidate.
    ///
    /// At most one candidate may be declared unless an explicit publisher is set with
    /// [`with_publisher`](Self::with_publisher).
    pub fn with_publisher_candidate(mut self, publisher: Arc<dyn Publisher>) -> Self {
        self.publisher_candidates.push(publisher);
        self
    }

    /// Sets the publisher explicitly, bypassing candidate selection.
    pub fn with_publisher(mut self, publisher: Arc<dyn Publisher>) -> Self {
        self.publisher_override = Some(publisher);
        self
    }

    /// Sets a [`StreamPublisher`] over the bus's own stream as the explicit publisher,
    /// so published events reach `bind` dispatchers.
    pub fn with_stream_publisher(self) -> Self {
        let publisher = Arc::new(StreamPublisher::new(self.stream.clone()));
        self.with_publisher(publisher)
    }

    /// Builds the bus.
    ///
    /// Publisher selection:
    /// - an explicit publisher wins;
    /// - otherwise two or more candidates fail with [`WiringError::MultiplePublishersDeclared`];
    /// - a single candidate is bound;
    /// - no candidate leaves the bus unbound.
    pub fn build(self) -> Result<Arc<EventBus>, WiringError> {
        let publisher = match (self.publisher_override, self.publisher_candidates.len()) {
            (Some(explicit), _) => Some(explicit),
            (None, 0) => None,
            (None, 1) => self.publisher_candidates.into_iter().next(),
            (None, _) => {
                let publishers = self
                    .publisher_candidates
                    .iter()
                    .map(|p| p.name().to_string())
                    .collect();
                return Err(WiringError::MultiplePublishersDeclared { publishers });
            }
        };

        let mut registry = HandlerRegistry::new();
        if let Some(container) = self.container {
            registry = registry.with_container(container);
        }
        let applied = Registrar::register(&mut registry, self.declarations);

        let bus = Arc::new(EventBus::with_stream(
            self.cfg,
            Arc::new(registry),
            self.stream,
        ));
        if let Some(publisher) = publisher {
            bus.set_publisher(publisher);
        }

        tracing::debug!(
            declarations = applied,
            publisher_bound = bus.is_publisher_bound(),
            "event bus built"
        );
        Ok(bus)
    }
}
