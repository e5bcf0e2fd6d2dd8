//! Events: routing identity and the broadcast stream.
//!
//! ## Contents
//! - [`Event`], [`EventRef`] the marker trait and its shared handle
//! - [`EventKey`] stable per-type routing identity
//! - [`EventStream`] thin wrapper over `tokio::sync::broadcast`

mod event;
mod key;
mod stream;

#[doc(hidden)]
pub use event::AsAny;
pub use event::{Event, EventRef};
pub use key::EventKey;
pub use stream::EventStream;
