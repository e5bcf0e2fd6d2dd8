//! # Registration of handler declarations.
//!
//! A [`HandlerDeclaration`] states which event types a handler consumes and whether it
//! is a shared instance or a scoped type. [`Registrar::register`] turns declarations into
//! registry entries:
//!
//! ```text
//! for decl in declarations:
//!     for option in decl.options:
//!         registry.add_signature(option)
//!         registry.add_handler(option.event, instance)            // singleton
//!         registry.add_scoped_handler_type(option.event, type)    // scoped
//! ```

use crate::events::Event;
use crate::handlers::{EventOption, HandlerRef, HandlerSignature, ScopedHandler, ScopedHandlerType};

use super::registry::HandlerRegistry;

/// How a declared handler is instantiated.
#[derive(Clone)]
pub enum HandlerScope {
    /// One shared instance for every call.
    Singleton(HandlerRef),
    /// A fresh instance per resolution, built by the container.
    Scoped(ScopedHandlerType),
}

impl std::fmt::Debug for HandlerScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandlerScope::Singleton(h) => f.debug_tuple("Singleton").field(&h.name()).finish(),
            HandlerScope::Scoped(ty) => f.debug_tuple("Scoped").field(&ty.name()).finish(),
        }
    }
}

/// A handler together with the event types it consumes.
///
/// ```rust
/// use eventdrive::{Event, EventOption, HandlerDeclaration, HandlerError, HandlerFn, EventRef};
///
/// struct OrderPlaced;
/// impl Event for OrderPlaced {}
/// struct OrderCancelled;
/// impl Event for OrderCancelled {}
///
/// let audit = HandlerFn::arc("audit", |_e: EventRef| async { Ok::<_, HandlerError>(()) });
/// let decl = HandlerDeclaration::singleton(audit)
///     .on::<OrderPlaced>()
///     .on_option(EventOption::of::<OrderCancelled>()
///         .with_routing_metadata(serde_json::json!({ "queue": "orders" })));
///
/// assert_eq!(decl.options().len(), 2);
/// assert_eq!(decl.name(), "audit");
/// ```
#[derive(Clone, Debug)]
pub struct HandlerDeclaration {
    scope: HandlerScope,
    options: Vec<EventOption>,
}

impl HandlerDeclaration {
    /// Declares a shared handler instance.
    pub fn singleton(handler: HandlerRef) -> Self {
        Self {
            scope: HandlerScope::Singleton(handler),
            options: Vec::new(),
        }
    }

    /// Declares a scoped handler type.
    pub fn scoped<H: ScopedHandler>() -> Self {
        Self {
            scope: HandlerScope::Scoped(ScopedHandlerType::of::<H>()),
            options: Vec::new(),
        }
    }

    /// Adds the event type `E` without metadata.
    #[must_use]
    pub fn on<E: Event>(self) -> Self {
        self.on_option(EventOption::of::<E>())
    }

    /// Adds an event option.
    #[must_use]
    pub fn on_option(mut self, option: EventOption) -> Self {
        self.options.push(option);
        self
    }

    /// Declared event options, in declaration order.
    pub fn options(&self) -> &[EventOption] {
        &self.options
    }

    /// Handler scope.
    pub fn scope(&self) -> &HandlerScope {
        &self.scope
    }

    /// Handler name used in logs.
    pub fn name(&self) -> &str {
        match &self.scope {
            HandlerScope::Singleton(h) => h.name(),
            HandlerScope::Scoped(ty) => ty.name(),
        }
    }
}

/// Applies handler declarations to a registry.
#[derive(Debug, Default, Clone, Copy)]
pub struct Registrar;

impl Registrar {
    /// Registers every declaration; returns how many were applied.
    ///
    /// Declarations without event options are skipped.
    pub fn register<I>(registry: &mut HandlerRegistry, declarations: I) -> usize
    where
        I: IntoIterator<Item = HandlerDeclaration>,
    {
        let mut applied = 0;
        for decl in declarations {
            if Self::register_one(registry, &decl) {
                applied += 1;
            }
        }
        tracing::debug!(applied, "handler declarations registered");
        applied
    }

    /// Registers a single declaration; returns `false` if it declares no events.
    pub fn register_one(registry: &mut HandlerRegistry, declaration: &HandlerDeclaration) -> bool {
        if declaration.options().is_empty() {
            tracing::warn!(handler = declaration.name(), "handler declares no events, skipped");
            return false;
        }

        for option in declaration.options() {
            let key = option.event;
            registry.add_signature(HandlerSignature::from(option.clone()));
            match declaration.scope() {
                HandlerScope::Singleton(h) => registry.add_handler(key, h.clone()),
                HandlerScope::Scoped(ty) => registry.add_scoped_handler_type(key, *ty),
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKey;
    use crate::test_support::{OrderPlaced, PaymentReceived, Recorder, ScopedAudit};
    use serde_json::json;

    #[test]
    fn test_register_records_one_signature_per_option() {
        let rec = Recorder::new();
        let mut reg = HandlerRegistry::new();

        let applied = Registrar::register(
            &mut reg,
            vec![
                HandlerDeclaration::singleton(rec.handler("ledger"))
                    .on::<OrderPlaced>()
                    .on_option(
                        EventOption::of::<PaymentReceived>()
                            .with_routing_metadata(json!({ "topic": "payments" })),
                    ),
                HandlerDeclaration::scoped::<ScopedAudit>().on::<OrderPlaced>(),
            ],
        );

        assert_eq!(applied, 2);
        let sigs = reg.signatures();
        assert_eq!(sigs.len(), 3);
        assert_eq!(sigs[0].event, EventKey::of::<OrderPlaced>());
        assert_eq!(sigs[1].event, EventKey::of::<PaymentReceived>());
        assert_eq!(sigs[1].routing_metadata, Some(json!({ "topic": "payments" })));
        assert_eq!(sigs[2].event, EventKey::of::<OrderPlaced>());

        assert_eq!(reg.handler_count(&EventKey::of::<OrderPlaced>()), 2);
        assert_eq!(reg.handler_count(&EventKey::of::<PaymentReceived>()), 1);
    }

    #[test]
    fn test_declaration_scope_matches_constructor() {
        let rec = Recorder::new();
        let singleton = HandlerDeclaration::singleton(rec.handler("ledger")).on::<OrderPlaced>();
        let scoped = HandlerDeclaration::scoped::<ScopedAudit>().on::<OrderPlaced>();

        assert!(matches!(singleton.scope(), HandlerScope::Singleton(h) if h.name() == "ledger"));
        assert!(matches!(
            scoped.scope(),
            HandlerScope::Scoped(ty) if *ty == ScopedHandlerType::of::<ScopedAudit>()
        ));
        assert!(scoped.name().ends_with("ScopedAudit"));
    }

    #[test]
    fn test_declaration_without_events_is_skipped() {
        let rec = Recorder::new();
        let mut reg = HandlerRegistry::new();

        let applied =
            Registrar::register(&mut reg, [HandlerDeclaration::singleton(rec.handler("idle"))]);

        assert_eq!(applied, 0);
        assert!(reg.is_empty());
        assert!(reg.signatures().is_empty());
    }

    #[test]
    fn test_same_declaration_twice_keeps_one_handler_but_two_signatures() {
        let rec = Recorder::new();
        let decl = HandlerDeclaration::singleton(rec.handler("a")).on::<OrderPlaced>();
        let mut reg = HandlerRegistry::new();

        Registrar::register(&mut reg, [decl.clone(), decl]);

        assert_eq!(reg.handler_count(&EventKey::of::<OrderPlaced>()), 1);
        assert_eq!(reg.signatures().len(), 2);
    }
}
