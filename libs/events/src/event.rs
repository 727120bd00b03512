//! Lifecycle-tracked events.

use std::any::{Any, TypeId};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use eventflow_id::EventId;

use crate::error::EventError;
use crate::handler::ExceptionHandler;
use crate::publisher::Publisher;
use crate::stack::{NestedEventStack, StackEntry, StackRelease};
use crate::stage::EventStage;

/// Domain data carried by an [`Event`].
///
/// The payload's concrete type is the event type listeners bind to.
pub trait EventPayload: 'static {
    /// Display name used in logs and summaries.
    fn event_name() -> &'static str {
        short_type_name::<Self>()
    }
}

/// Key identifying a concrete event type.
///
/// Matching is exact: there is no notion of super- or sub-types.
#[derive(Debug, Clone, Copy)]
pub struct EventType {
    id: TypeId,
    name: &'static str,
}

impl EventType {
    pub fn of<P: EventPayload>() -> Self {
        Self {
            id: TypeId::of::<P>(),
            name: P::event_name(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for EventType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EventType {}

impl Hash for EventType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

/// Type-erased view of an event, as seen by the publisher and exception handlers.
pub trait AnyEvent {
    fn id(&self) -> EventId;
    fn name(&self) -> &'static str;
    fn stage(&self) -> EventStage;
    fn created_at(&self) -> DateTime<Utc>;
    fn event_type(&self) -> EventType;
    fn as_any(&self) -> &dyn Any;
}

/// An occurrence driven through the lifecycle stages.
///
/// Each lifecycle operation sets the stage and then publishes the event to
/// every listener bound to its payload type. Operations are accepted in any
/// order; the stage is always the one set by the last call.
pub struct Event<P: EventPayload> {
    id: EventId,
    created_at: DateTime<Utc>,
    stage: EventStage,
    payload: P,
    publisher: Arc<dyn Publisher>,
    stack: NestedEventStack,
    handler: Option<Arc<dyn ExceptionHandler>>,
}

impl<P: EventPayload> Event<P> {
    pub fn new(payload: P, publisher: Arc<dyn Publisher>, stack: NestedEventStack) -> Self {
        Self {
            id: EventId::new(),
            created_at: Utc::now(),
            stage: EventStage::Start,
            payload,
            publisher,
            stack,
            handler: None,
        }
    }

    /// Creates an event registered with the calling thread's stack.
    pub fn on_current_thread(payload: P, publisher: Arc<dyn Publisher>) -> Self {
        Self::new(payload, publisher, NestedEventStack::current())
    }

    /// Uses `handler` instead of the publisher's default for this event's publishes.
    pub fn with_exception_handler(mut self, handler: Arc<dyn ExceptionHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn id(&self) -> EventId {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn stage(&self) -> EventStage {
        self.stage
    }

    pub fn name(&self) -> &'static str {
        P::event_name()
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn publisher(&self) -> &Arc<dyn Publisher> {
        &self.publisher
    }

    pub fn stack(&self) -> &NestedEventStack {
        &self.stack
    }

    /// Creates another event sharing this event's publisher and stack.
    ///
    /// Intended for listeners raising nested events while handling this one.
    pub fn spawn<Q: EventPayload>(&self, payload: Q) -> Event<Q> {
        Event::new(payload, Arc::clone(&self.publisher), self.stack.clone())
    }

    /// Pushes the event onto its stack, then publishes `Start`.
    ///
    /// Listeners observing `Start` already see the event on the stack.
    pub fn start(&mut self) -> Result<(), EventError> {
        self.stage = EventStage::Start;
        self.stack.push(StackEntry {
            id: self.id,
            name: self.name(),
        });
        self.publish()
    }

    pub fn pre_persist(&mut self) -> Result<(), EventError> {
        self.transition(EventStage::PrePersistence)
    }

    pub fn post_persist(&mut self) -> Result<(), EventError> {
        self.transition(EventStage::PostPersistence)
    }

    pub fn success(&mut self) -> Result<(), EventError> {
        self.transition(EventStage::Success)
    }

    pub fn fail(&mut self) -> Result<(), EventError> {
        self.transition(EventStage::Failed)
    }

    /// Publishes `End`, then removes this event and everything pushed above it
    /// from the stack, whether or not the publish succeeded.
    pub fn end(&mut self) -> Result<(), EventError> {
        self.stage = EventStage::End;
        let _release = StackRelease::new(self.stack.clone(), self.id);
        self.publish()
    }

    fn transition(&mut self, stage: EventStage) -> Result<(), EventError> {
        self.stage = stage;
        self.publish()
    }

    fn publish(&self) -> Result<(), EventError> {
        match &self.handler {
            Some(handler) => self.publisher.publish_with(self, handler.as_ref())?,
            None => self.publisher.publish(self)?,
        };
        Ok(())
    }
}

impl<P: EventPayload> AnyEvent for Event<P> {
    fn id(&self) -> EventId {
        self.id
    }

    fn name(&self) -> &'static str {
        P::event_name()
    }

    fn stage(&self) -> EventStage {
        self.stage
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn event_type(&self) -> EventType {
        EventType::of::<P>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<P: EventPayload + std::fmt::Debug> std::fmt::Debug for Event<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Event")
            .field("id", &self.id)
            .field("name", &P::event_name())
            .field("stage", &self.stage)
            .field("created_at", &self.created_at)
            .field("payload", &self.payload)
            .finish_non_exhaustive()
    }
}

impl<P: EventPayload> std::fmt::Display for Event<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(P::event_name())
    }
}

/// Last path segment of a type name, e.g. `OrderPlaced` for `shop::OrderPlaced`.
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::ExceptionHandler;
    use crate::tracker::CycleSummary;
    use std::sync::Mutex;
    use std::time::Duration;

    struct OrderPlaced;
    impl EventPayload for OrderPlaced {}

    struct Renamed;
    impl EventPayload for Renamed {
        fn event_name() -> &'static str {
            "order.renamed"
        }
    }

    /// Records the stages it was asked to publish and the stack depth at the time.
    #[derive(Default)]
    struct RecordingPublisher {
        seen: Mutex<Vec<(EventStage, usize)>>,
    }

    impl RecordingPublisher {
        fn summary(event: &dyn AnyEvent) -> CycleSummary {
            CycleSummary {
                event_id: event.id(),
                event_name: event.name().to_string(),
                stage: event.stage(),
                started_at: Utc::now(),
                duration: Duration::ZERO,
                listeners: Vec::new(),
            }
        }
    }

    impl Publisher for RecordingPublisher {
        fn publish(&self, event: &dyn AnyEvent) -> Result<CycleSummary, EventError> {
            let event_ref = event
                .as_any()
                .downcast_ref::<Event<OrderPlaced>>()
                .expect("test publisher only sees OrderPlaced");
            self.seen
                .lock()
                .unwrap()
                .push((event.stage(), event_ref.stack().depth()));
            Ok(Self::summary(event))
        }

        fn publish_with(
            &self,
            event: &dyn AnyEvent,
            _handler: &dyn ExceptionHandler,
        ) -> Result<CycleSummary, EventError> {
            self.publish(event)
        }
    }

    #[test]
    fn test_short_type_names() {
        assert_eq!(short_type_name::<OrderPlaced>(), "OrderPlaced");
        assert_eq!(short_type_name::<Vec<String>>(), "Vec");
        assert_eq!(EventType::of::<Renamed>().name(), "order.renamed");
    }

    #[test]
    fn test_event_types_compare_by_type() {
        assert_eq!(EventType::of::<OrderPlaced>(), EventType::of::<OrderPlaced>());
        assert_ne!(EventType::of::<OrderPlaced>(), EventType::of::<Renamed>());
    }

    #[test]
    fn test_new_event_starts_at_start() {
        let publisher = Arc::new(RecordingPublisher::default());
        let event = Event::new(OrderPlaced, publisher, NestedEventStack::new());
        assert_eq!(event.stage(), EventStage::Start);
        assert_eq!(event.name(), "OrderPlaced");
        assert_eq!(event.to_string(), "OrderPlaced");
    }

    #[test]
    fn test_lifecycle_publishes_each_stage() {
        let publisher = Arc::new(RecordingPublisher::default());
        let stack = NestedEventStack::new();
        let mut event = Event::new(OrderPlaced, publisher.clone(), stack.clone());

        event.start().unwrap();
        event.pre_persist().unwrap();
        event.post_persist().unwrap();
        event.success().unwrap();
        event.end().unwrap();

        let seen = publisher.seen.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![
                (EventStage::Start, 1),
                (EventStage::PrePersistence, 1),
                (EventStage::PostPersistence, 1),
                (EventStage::Success, 1),
                // still on the stack while End is published
                (EventStage::End, 1),
            ]
        );
        assert!(stack.is_empty());
    }

    #[test]
    fn test_out_of_order_calls_are_accepted() {
        let publisher = Arc::new(RecordingPublisher::default());
        let mut event = Event::new(OrderPlaced, publisher, NestedEventStack::new());

        event.success().unwrap();
        event.pre_persist().unwrap();
        assert_eq!(event.stage(), EventStage::PrePersistence);
        event.end().unwrap();
        event.fail().unwrap();
        assert_eq!(event.stage(), EventStage::Failed);
    }

    #[test]
    fn test_spawn_shares_publisher_and_stack() {
        let publisher = Arc::new(RecordingPublisher::default());
        let stack = NestedEventStack::new();
        let parent = Event::new(OrderPlaced, publisher, stack.clone());
        let child = parent.spawn(Renamed);

        assert!(child.stack().same_stack(&stack));
        assert!(Arc::ptr_eq(child.publisher(), parent.publisher()));
        assert_ne!(child.id(), parent.id());
    }
}
