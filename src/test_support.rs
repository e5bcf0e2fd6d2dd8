//! Fixtures shared by the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{HandlerError, PublishError, ResolutionError};
use crate::events::{Event, EventKey, EventRef};
use crate::handlers::{
    Container, Context, Handler, HandlerFn, HandlerRef, ScopedHandler, ScopedHandlerType,
};
use crate::publishers::Publisher;

pub struct OrderPlaced {
    pub id: u64,
}
impl Event for OrderPlaced {}

pub struct PaymentReceived {
    pub amount: u64,
}
impl Event for PaymentReceived {}

/// Context carrying only a tenant label.
pub struct Tenant(pub &'static str);

/// Context carrying a tenant label and a recorder for scoped handlers.
pub struct Request {
    pub tenant: &'static str,
    pub recorder: Recorder,
}

pub fn names(handlers: &[HandlerRef]) -> Vec<String> {
    handlers.iter().map(|h| h.name().to_string()).collect()
}

/// Shared call log.
#[derive(Clone, Default)]
pub struct Recorder {
    calls: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: impl Into<String>) {
        self.calls.lock().push(entry.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Handler that records its name and succeeds.
    pub fn handler(&self, name: &'static str) -> HandlerRef {
        let rec = self.clone();
        HandlerFn::arc(name, move |_event: EventRef| {
            let rec = rec.clone();
            async move {
                rec.record(name);
                Ok::<_, HandlerError>(())
            }
        })
    }

    /// Handler that records its name and fails with `message`.
    pub fn failing(&self, name: &'static str, message: &'static str) -> HandlerRef {
        let rec = self.clone();
        HandlerFn::arc(name, move |_event: EventRef| {
            let rec = rec.clone();
            async move {
                rec.record(name);
                Err::<(), _>(HandlerError::fail(message))
            }
        })
    }

    /// Waits until at least `n` calls were recorded.
    pub async fn wait_for(&self, n: usize) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while self.calls.lock().len() < n {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("timed out waiting for handler calls");
    }
}

/// Scoped handler labelled by the tenant found in the call context.
pub struct ScopedAudit {
    label: String,
    recorder: Option<Recorder>,
}

#[async_trait]
impl Handler for ScopedAudit {
    async fn handle(&self, _event: EventRef) -> Result<(), HandlerError> {
        if let Some(rec) = &self.recorder {
            rec.record(self.label.clone());
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.label
    }
}

impl ScopedHandler for ScopedAudit {
    fn from_context(context: Option<&Context>) -> Result<Self, ResolutionError> {
        if let Some(req) = context.and_then(|c| c.downcast_ref::<Request>()) {
            return Ok(Self {
                label: format!("audit:{}", req.tenant),
                recorder: Some(req.recorder.clone()),
            });
        }
        let tenant = context
            .and_then(|c| c.downcast_ref::<Tenant>())
            .map_or("anonymous", |t| t.0);
        Ok(Self {
            label: format!("audit:{tenant}"),
            recorder: None,
        })
    }
}

/// Scoped handler whose construction always fails.
pub struct Unbuildable;

#[async_trait]
impl Handler for Unbuildable {
    async fn handle(&self, _event: EventRef) -> Result<(), HandlerError> {
        Ok(())
    }
}

impl ScopedHandler for Unbuildable {
    fn from_context(_context: Option<&Context>) -> Result<Self, ResolutionError> {
        Err(ResolutionError::MissingDependency {
            handler: "Unbuildable".into(),
            dependency: "Database".into(),
        })
    }
}

/// Container recording the name of every scoped handler it builds.
pub struct RecordingContainer {
    pub recorder: Recorder,
}

#[async_trait]
impl Container for RecordingContainer {
    async fn resolve(
        &self,
        handler_type: &ScopedHandlerType,
        context: Option<&Context>,
    ) -> Result<HandlerRef, ResolutionError> {
        let handler = handler_type.construct(context)?;
        self.recorder.record(handler.name());
        Ok(handler)
    }
}

/// Publisher recording every event key it receives.
pub struct RecordingPublisher {
    name: &'static str,
    published: Mutex<Vec<EventRef>>,
    bulk_calls: AtomicUsize,
}

impl RecordingPublisher {
    pub fn new(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            published: Mutex::new(Vec::new()),
            bulk_calls: AtomicUsize::new(0),
        })
    }

    pub fn published(&self) -> Vec<EventKey> {
        self.published.lock().iter().map(|e| e.key()).collect()
    }

    pub fn last(&self) -> Option<EventRef> {
        self.published.lock().last().cloned()
    }

    pub fn bulk_calls(&self) -> usize {
        self.bulk_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(&self, event: EventRef) -> Result<(), PublishError> {
        self.published.lock().push(event);
        Ok(())
    }

    async fn publish_all(&self, events: Vec<EventRef>) -> Result<(), PublishError> {
        self.bulk_calls.fetch_add(1, Ordering::SeqCst);
        self.published.lock().extend(events);
        Ok(())
    }

    fn name(&self) -> &str {
        self.name
    }
}
