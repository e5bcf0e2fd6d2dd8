//! Dispatch core: registry, bus and bootstrap wiring.
//!
//! Internal modules:
//! - [`registry`]: event identity → singleton handlers and scoped handler types;
//! - [`bus`]: publishing, strict consumption, `bind` subscriptions;
//! - [`dispatcher`]: per-`bind` task reading the broadcast stream;
//! - [`registrar`]: applies handler declarations to a registry;
//! - [`builder`]: wires declarations, container and publisher into a bus.

mod builder;
mod bus;
mod dispatcher;
mod registrar;
mod registry;

pub use builder::EventBusBuilder;
pub use bus::{CallOptions, EventBus, Subscription};
pub use registrar::{HandlerDeclaration, HandlerScope, Registrar};
pub use registry::HandlerRegistry;
