//! Stage dispatch.
//!
//! Each call to [`Publisher::publish`] is one publish cycle: resolve the
//! listeners for the event's type, call each in turn, and summarize. Dispatch
//! is synchronous and sequential; the caller blocks until every listener for
//! the stage has run or a failure has escalated. Nothing is retried.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use eventflow_id::EventId;
use tracing::{debug, error, info, warn};

use crate::config::PublisherConfig;
use crate::error::{EventError, HandlerError};
use crate::event::AnyEvent;
use crate::handler::{ExceptionHandler, RethrowHandler};
use crate::listener::DynListener;
use crate::registry::ListenerRegistry;
use crate::stage::EventStage;
use crate::tracker::{CycleSummary, EventSummary, EventTracker};

/// Dispatches events to their listeners.
pub trait Publisher: Send + Sync {
    /// Publishes the event's current stage using the default exception handler.
    fn publish(&self, event: &dyn AnyEvent) -> Result<CycleSummary, EventError>;

    /// Publishes the event's current stage using `handler` for listener failures.
    fn publish_with(
        &self,
        event: &dyn AnyEvent,
        handler: &dyn ExceptionHandler,
    ) -> Result<CycleSummary, EventError>;
}

/// Listener set and bookkeeping for one event between its first publish and `End`.
struct InFlight {
    listeners: Arc<[Arc<dyn DynListener>]>,
    first_published: Instant,
    stages: Vec<EventStage>,
    invocations: usize,
}

/// Registry-backed [`Publisher`].
///
/// The listener set for an event is resolved on its first publish and reused
/// for its remaining stages. The cached set is dropped when the event reaches
/// `End`, or immediately when an exception handler escalates.
pub struct EventPublisher {
    registry: Arc<ListenerRegistry>,
    handler: Arc<dyn ExceptionHandler>,
    tracker: EventTracker,
    in_flight: Mutex<HashMap<EventId, InFlight>>,
}

impl EventPublisher {
    pub fn new(registry: Arc<ListenerRegistry>) -> Self {
        Self::with_config(registry, &PublisherConfig::default())
    }

    pub fn with_config(registry: Arc<ListenerRegistry>, config: &PublisherConfig) -> Self {
        Self {
            registry,
            handler: Arc::new(RethrowHandler),
            tracker: EventTracker::new(config),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Replaces the default exception handler.
    pub fn with_exception_handler(mut self, handler: Arc<dyn ExceptionHandler>) -> Self {
        self.handler = handler;
        self
    }

    pub fn registry(&self) -> &Arc<ListenerRegistry> {
        &self.registry
    }

    pub fn tracker(&self) -> &EventTracker {
        &self.tracker
    }

    /// Returns true while a listener set is cached for `event_id`.
    pub fn is_tracking(&self, event_id: EventId) -> bool {
        self.lock_in_flight().contains_key(&event_id)
    }

    /// Number of events with a cached listener set.
    pub fn in_flight(&self) -> usize {
        self.lock_in_flight().len()
    }

    fn lock_in_flight(&self) -> MutexGuard<'_, HashMap<EventId, InFlight>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the event's listener set, resolving it on first use.
    ///
    /// The lock is released before any listener runs, so listeners may
    /// publish nested events through this publisher.
    fn resolve(&self, event: &dyn AnyEvent) -> Arc<[Arc<dyn DynListener>]> {
        let mut in_flight = self.lock_in_flight();
        let entry = in_flight.entry(event.id()).or_insert_with(|| InFlight {
            listeners: self.registry.listeners_for(event.event_type()).into(),
            first_published: Instant::now(),
            stages: Vec::new(),
            invocations: 0,
        });
        entry.stages.push(event.stage());
        Arc::clone(&entry.listeners)
    }

    fn record_invocations(&self, event_id: EventId, count: usize) {
        if let Some(entry) = self.lock_in_flight().get_mut(&event_id) {
            entry.invocations += count;
        }
    }

    fn forget(&self, event_id: EventId) -> Option<InFlight> {
        self.lock_in_flight().remove(&event_id)
    }

    /// Calls one listener; `Err` means the failure escalated.
    fn dispatch(
        &self,
        event: &dyn AnyEvent,
        listener: &dyn DynListener,
        handler: &dyn ExceptionHandler,
    ) -> Result<bool, EventError> {
        debug!(
            listener = listener.name(),
            event = event.name(),
            event_id = %event.id(),
            "Invoking listener"
        );

        let err = match listener.listen(event) {
            Ok(()) => {
                debug!(
                    listener = listener.name(),
                    event = event.name(),
                    event_id = %event.id(),
                    "Listener processed event"
                );
                return Ok(true);
            }
            Err(err) => err,
        };

        warn!(
            listener = listener.name(),
            event = event.name(),
            event_id = %event.id(),
            stage = %event.stage(),
            handler = handler.name(),
            error = %err,
            "Listener failed, calling exception handler"
        );

        match handler.handle(event, listener, &err) {
            Ok(()) => Ok(false),
            Err(escalation) => {
                match &escalation {
                    HandlerError::Rethrow => debug!(
                        handler = handler.name(),
                        listener = listener.name(),
                        event_id = %event.id(),
                        "Exception handler rethrew listener failure"
                    ),
                    HandlerError::Failed(cause) => error!(
                        handler = handler.name(),
                        listener = listener.name(),
                        event = event.name(),
                        event_id = %event.id(),
                        error = %cause,
                        "Exception handler failed while handling listener failure"
                    ),
                }
                self.forget(event.id());
                Err(err)
            }
        }
    }

    fn on_event_completed(&self, event: &dyn AnyEvent) {
        let Some(done) = self.forget(event.id()) else {
            return;
        };
        self.tracker.record_completion(EventSummary {
            event_id: event.id(),
            event_name: event.name().to_string(),
            stages: done.stages,
            listener_invocations: done.invocations,
            total: done.first_published.elapsed(),
        });
    }
}

impl Publisher for EventPublisher {
    fn publish(&self, event: &dyn AnyEvent) -> Result<CycleSummary, EventError> {
        let handler = Arc::clone(&self.handler);
        self.publish_with(event, handler.as_ref())
    }

    fn publish_with(
        &self,
        event: &dyn AnyEvent,
        handler: &dyn ExceptionHandler,
    ) -> Result<CycleSummary, EventError> {
        info!(
            event = event.name(),
            event_id = %event.id(),
            stage = %event.stage(),
            "Publishing event"
        );

        let listeners = self.resolve(event);
        debug!(
            event = event.name(),
            event_id = %event.id(),
            listener_count = listeners.len(),
            "Found listeners"
        );

        let mut context = self.tracker.start(event);
        for listener in listeners.iter() {
            if self.dispatch(event, listener.as_ref(), handler)? {
                context.record(listener.name());
            }
        }

        self.record_invocations(event.id(), context.processed().len());
        let summary = self.tracker.complete(context);

        debug!(
            event = event.name(),
            event_id = %event.id(),
            "Event processing completed"
        );
        if event.stage().is_terminal() {
            self.on_event_completed(event);
        }

        Ok(summary)
    }
}

impl std::fmt::Debug for EventPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventPublisher")
            .field("registry", &self.registry)
            .field("handler", &self.handler.name())
            .field("in_flight", &self.in_flight())
            .finish_non_exhaustive()
    }
}
