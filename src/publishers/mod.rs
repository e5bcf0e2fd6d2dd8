//! Publishers: where `EventBus::publish` sends events.
//!
//! ## Contents
//! - [`Publisher`] the delegation target bound to a bus
//! - [`StreamPublisher`] forwards onto the bus's internal broadcast stream

mod publisher;
mod stream;

pub use publisher::Publisher;
pub use stream::StreamPublisher;
