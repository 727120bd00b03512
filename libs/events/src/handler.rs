//! Strategies for listener failures.
//!
//! The publisher hands every failed listener call to an [`ExceptionHandler`].
//! Returning `Ok(())` absorbs the failure and dispatch moves on to the next
//! listener. Returning an error escalates: the publisher stops dispatching,
//! drops the event's cached listener set and propagates the original listener
//! error to the producer.

use tracing::warn;

use crate::error::{EventError, HandlerError};
use crate::event::AnyEvent;
use crate::listener::DynListener;

pub trait ExceptionHandler: Send + Sync {
    fn name(&self) -> &str;

    fn handle(
        &self,
        event: &dyn AnyEvent,
        listener: &dyn DynListener,
        error: &EventError,
    ) -> Result<(), HandlerError>;
}

/// Logs the failure and rethrows it unchanged. This is the default.
#[derive(Debug, Clone, Copy, Default)]
pub struct RethrowHandler;

impl ExceptionHandler for RethrowHandler {
    fn name(&self) -> &str {
        "RethrowHandler"
    }

    fn handle(
        &self,
        event: &dyn AnyEvent,
        listener: &dyn DynListener,
        error: &EventError,
    ) -> Result<(), HandlerError> {
        warn!(
            event = event.name(),
            event_id = %event.id(),
            listener = listener.name(),
            error = %error,
            "Error processing event"
        );
        Err(HandlerError::Rethrow)
    }
}

/// Logs the failure and lets dispatch continue with the remaining listeners.
#[derive(Debug, Clone, Copy, Default)]
pub struct SuppressHandler;

impl ExceptionHandler for SuppressHandler {
    fn name(&self) -> &str {
        "SuppressHandler"
    }

    fn handle(
        &self,
        event: &dyn AnyEvent,
        listener: &dyn DynListener,
        error: &EventError,
    ) -> Result<(), HandlerError> {
        warn!(
            event = event.name(),
            event_id = %event.id(),
            stage = %event.stage(),
            listener = listener.name(),
            error = %error,
            "Suppressed listener failure"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Event, EventPayload};
    use crate::listener::{EventListener, ListenerBinding};
    use crate::publisher::EventPublisher;
    use crate::registry::ListenerRegistry;
    use crate::stack::NestedEventStack;
    use crate::stage::EventStage;
    use std::sync::Arc;

    struct Ping;
    impl EventPayload for Ping {}

    struct Pong;
    impl EventListener for Pong {
        type Event = Ping;
    }

    fn failure() -> EventError {
        EventError::Listener {
            listener: "Pong".into(),
            event: "Ping".into(),
            stage: EventStage::Start,
            source: anyhow::anyhow!("boom"),
        }
    }

    fn fixture() -> (Event<Ping>, ListenerBinding) {
        let publisher = Arc::new(EventPublisher::new(Arc::new(ListenerRegistry::new())));
        (
            Event::new(Ping, publisher, NestedEventStack::new()),
            ListenerBinding::of(Pong),
        )
    }

    #[test]
    fn test_rethrow_handler_escalates() {
        let (event, binding) = fixture();
        let result = RethrowHandler.handle(&event, binding.listener().as_ref(), &failure());
        assert!(matches!(result, Err(HandlerError::Rethrow)));
    }

    #[test]
    fn test_suppress_handler_absorbs() {
        let (event, binding) = fixture();
        SuppressHandler
            .handle(&event, binding.listener().as_ref(), &failure())
            .unwrap();
    }
}
