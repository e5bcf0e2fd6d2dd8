//! # Publisher trait.
//!
//! A bus holds at most one bound [`Publisher`]. `EventBus::publish` and
//! `EventBus::publish_all` delegate to it and return once it has finished.
//!
//! ```text
//! producer ──► EventBus::publish(e) ──► Publisher::publish(e)
//!                                          ├─► external transport
//!                                          └─► EventStream (StreamPublisher)
//! ```
//!
//! The bus never emits on its own stream when publishing; forwarding there is a
//! publisher's decision.

use async_trait::async_trait;

use crate::error::PublishError;
use crate::events::EventRef;

/// Delegation target for published events.
#[async_trait]
pub trait Publisher: Send + Sync + 'static {
    /// Forwards a single event.
    async fn publish(&self, event: EventRef) -> Result<(), PublishError>;

    /// Forwards a batch of events.
    ///
    /// The default publishes one by one and stops at the first failure; events already
    /// forwarded stay forwarded. Override when the transport has a bulk operation.
    async fn publish_all(&self, events: Vec<EventRef>) -> Result<(), PublishError> {
        for event in events {
            self.publish(event).await?;
        }
        Ok(())
    }

    /// Returns the publisher name used in logs and wiring errors.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
