//! # Handler signatures and event options.
//!
//! An [`EventOption`] names one event type a handler is declared for, optionally
//! carrying routing metadata. Registering a handler records one [`HandlerSignature`]
//! per option. Signatures are introspection only: routing never looks at them.

use serde::Serialize;
use serde_json::Value;

use crate::events::{Event, EventKey};

/// One event type a handler is declared for.
#[derive(Clone, Debug, PartialEq)]
pub struct EventOption {
    /// Routing key of the event type.
    pub event: EventKey,
    /// Opaque metadata exported with the signature.
    pub routing_metadata: Option<Value>,
}

impl EventOption {
    /// Option for the event type `E` without metadata.
    pub fn of<E: Event>() -> Self {
        Self {
            event: EventKey::of::<E>(),
            routing_metadata: None,
        }
    }

    /// Attaches routing metadata.
    #[must_use]
    pub fn with_routing_metadata(mut self, metadata: Value) -> Self {
        self.routing_metadata = Some(metadata);
        self
    }
}

/// Record of one (handler × event option) registration.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HandlerSignature {
    /// Event type the handler was registered for.
    pub event: EventKey,
    /// Metadata taken from the event option.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing_metadata: Option<Value>,
}

impl From<EventOption> for HandlerSignature {
    fn from(option: EventOption) -> Self {
        Self {
            event: option.event,
            routing_metadata: option.routing_metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct InvoiceIssued;
    impl Event for InvoiceIssued {}

    #[test]
    fn test_signature_exports_event_name_and_metadata() {
        let sig: HandlerSignature = EventOption::of::<InvoiceIssued>()
            .with_routing_metadata(json!({ "topic": "billing" }))
            .into();

        let out = serde_json::to_value(&sig).expect("serialize");
        assert!(out["event"]
            .as_str()
            .is_some_and(|s| s.ends_with("InvoiceIssued")));
        assert_eq!(out["routing_metadata"], json!({ "topic": "billing" }));
    }

    #[test]
    fn test_signature_without_metadata_omits_field() {
        let sig: HandlerSignature = EventOption::of::<InvoiceIssued>().into();
        let out = serde_json::to_value(&sig).expect("serialize");
        assert!(out.get("routing_metadata").is_none());
    }
}
