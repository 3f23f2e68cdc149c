//! In-process event bus and the database error event
//!
//! Events are broadcast to every live subscriber as `Arc<dyn Event>`;
//! subscribers match on [`Event::name`] and downcast to the concrete payload.
//! Publishing never blocks and never waits for subscribers.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use tokio::sync::broadcast;

/// Default capacity of an event bus channel
pub const DEFAULT_CAPACITY: usize = 256;

/// A named event that can travel on the [`EventBus`]
pub trait Event: Any + fmt::Debug + Send + Sync {
    /// Topic name of the event
    fn name(&self) -> &str;

    fn as_any(&self) -> &dyn Any;
}

/// Failed publication: nobody was subscribed
#[derive(Debug, Clone)]
pub struct PublishError {
    pub event: String,
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "No subscriber received event '{}'", self.event)
    }
}

impl std::error::Error for PublishError {}

static GLOBAL_BUS: Lazy<EventBus> = Lazy::new(EventBus::new);

/// Broadcast bus for events
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<Arc<dyn Event>>,
}

impl EventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a new event bus keeping at most `capacity` undelivered events
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Process-wide bus
    pub fn global() -> EventBus {
        GLOBAL_BUS.clone()
    }

    /// Publish an event to all current subscribers
    ///
    /// Returns the number of subscribers the event was delivered to.
    pub fn publish(&self, event: Arc<dyn Event>) -> Result<usize, PublishError> {
        let name = event.name().to_string();
        self.tx
            .send(event)
            .map_err(|_| PublishError { event: name })
    }

    /// Subscribe to events published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<dyn Event>> {
        self.tx.subscribe()
    }

    /// Get number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.tx.receiver_count())
            .finish()
    }
}

/// Event published whenever the driver reports a client-level failure
#[derive(Debug, Clone)]
pub struct ErrorEvent {
    payload: mongodb::error::Error,
}

impl ErrorEvent {
    pub const NAME: &'static str = "MONGODB_DATABASE_ERROR_EVENT";

    pub fn new(error: mongodb::error::Error) -> Self {
        Self { payload: error }
    }

    /// The client error that triggered the event
    pub fn payload(&self) -> &mongodb::error::Error {
        &self.payload
    }

    /// Publish the error event, discarding any publication failure
    pub fn publish(events: &EventBus, error: mongodb::error::Error) {
        if let Err(e) = events.publish(Arc::new(Self::new(error))) {
            tracing::trace!(error = %e, "Error event dropped");
        }
    }

    /// Views a bus event as an `ErrorEvent`, if it is one
    pub fn from_event(event: &dyn Event) -> Option<&ErrorEvent> {
        if event.name() != Self::NAME {
            return None;
        }
        event.as_any().downcast_ref::<ErrorEvent>()
    }
}

impl Event for ErrorEvent {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
