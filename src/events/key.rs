//! # Routing identity of event types.
//!
//! [`EventKey`] identifies an event type by its [`TypeId`]. The type name is carried
//! along for logs, error messages and signature export, but equality and hashing look
//! at the `TypeId` only:
//! - two distinct types never share a key, even when their names are identical;
//! - a type alias resolves to the same key as the aliased type;
//! - renaming a type changes its label, not the way events route.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Serialize, Serializer};

use super::Event;

/// Stable, collision-free identity of an event type.
#[derive(Clone, Copy)]
pub struct EventKey {
    id: TypeId,
    name: &'static str,
}

impl EventKey {
    /// Key of the event type `E`.
    #[inline]
    pub fn of<E: Event>() -> Self {
        Self {
            id: TypeId::of::<E>(),
            name: std::any::type_name::<E>(),
        }
    }

    /// Key of the concrete type behind an event value.
    #[inline]
    pub fn of_event(event: &dyn Event) -> Self {
        Self {
            id: Any::type_id(event.as_any()),
            name: event.event_name(),
        }
    }

    /// Full type name (label only).
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without its module path.
    pub fn short_name(&self) -> &'static str {
        let base = self.name.split('<').next().unwrap_or(self.name);
        match base.rfind("::") {
            Some(idx) => &self.name[idx + 2..],
            None => self.name,
        }
    }

    /// Underlying type id.
    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }
}

impl PartialEq for EventKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EventKey {}

impl Hash for EventKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EventKey").field(&self.name).finish()
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl Serialize for EventKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name)
    }
}
