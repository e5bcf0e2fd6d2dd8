//! # Stream-forwarding publisher.
//!
//! [`StreamPublisher`] puts published events on an [`EventStream`], so dispatchers
//! created by [`EventBus::bind`](crate::EventBus::bind) see them. Wire it with
//! [`EventBusBuilder::with_stream_publisher`](crate::EventBusBuilder::with_stream_publisher).

use async_trait::async_trait;

use crate::error::PublishError;
use crate::events::{EventRef, EventStream};
use crate::publishers::Publisher;

/// Publisher that forwards onto a bus's internal broadcast stream.
///
/// Never fails: an event with no live dispatcher is dropped, like any other emit.
#[derive(Clone, Debug)]
pub struct StreamPublisher {
    stream: EventStream,
}

impl StreamPublisher {
    /// Creates a publisher emitting on `stream`.
    pub fn new(stream: EventStream) -> Self {
        Self { stream }
    }
}

#[async_trait]
impl Publisher for StreamPublisher {
    async fn publish(&self, event: EventRef) -> Result<(), PublishError> {
        let receivers = self.stream.emit(event);
        tracing::trace!(receivers, "event forwarded to stream");
        Ok(())
    }

    async fn publish_all(&self, events: Vec<EventRef>) -> Result<(), PublishError> {
        for event in events {
            self.stream.emit(event);
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "stream"
    }
}
