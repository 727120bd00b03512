//! Scoped event lifecycles.
//!
//! [`ManagedEvent`] ties an event's `start` and `end` to a program scope: the
//! event is started on entry and ended exactly once when the scope is left,
//! whether by [`ManagedEvent::finish`], an early return, `?`, or a panic. The
//! nested event stack therefore never keeps an entry for a scope that is gone.

use std::ops::{Deref, DerefMut};

use tracing::warn;

use crate::error::EventError;
use crate::event::{Event, EventPayload};

/// Guard that ends its event when dropped.
///
/// Dropping the guard publishes only `End`, never an outcome. When the scope
/// is left by a panic, `End` listeners run during unwinding; a listener that
/// panics there aborts the process.
pub struct ManagedEvent<'a, P: EventPayload> {
    event: &'a mut Event<P>,
    ended: bool,
}

impl<'a, P: EventPayload> ManagedEvent<'a, P> {
    /// Starts `event` and returns the guard.
    ///
    /// If `start` fails, the event is failed and ended on a best-effort basis
    /// and the original `start` error is returned.
    pub fn enter(event: &'a mut Event<P>) -> Result<Self, EventError> {
        if let Err(err) = event.start() {
            warn!(
                event = event.name(),
                event_id = %event.id(),
                error = %err,
                "Event failed to start, failing and ending it"
            );
            if let Err(fail_err) = event.fail() {
                warn!(event_id = %event.id(), error = %fail_err, "Failed to publish failure");
            }
            if let Err(end_err) = event.end() {
                warn!(event_id = %event.id(), error = %end_err, "Failed to end event");
            }
            return Err(err);
        }

        Ok(Self {
            event,
            ended: false,
        })
    }

    /// Ends the event and reports the outcome of the `End` publish.
    pub fn finish(mut self) -> Result<(), EventError> {
        self.ended = true;
        self.event.end()
    }
}

impl<P: EventPayload> Deref for ManagedEvent<'_, P> {
    type Target = Event<P>;

    fn deref(&self) -> &Self::Target {
        self.event
    }
}

impl<P: EventPayload> DerefMut for ManagedEvent<'_, P> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.event
    }
}

impl<P: EventPayload> Drop for ManagedEvent<'_, P> {
    fn drop(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;

        if let Err(e) = self.event.end() {
            warn!(
                event = self.event.name(),
                event_id = %self.event.id(),
                error = %e,
                "Failed to end event on scope exit"
            );
        }
    }
}

/// Runs `body` inside a managed scope for `event`.
///
/// On `Ok` the event is ended and an `End` failure is returned. On `Err` the
/// event is failed unless the body already published `Success` or `Failed`,
/// then ended, and the body's error is returned.
pub fn with_managed<P, T, E, F>(event: &mut Event<P>, body: F) -> Result<T, E>
where
    P: EventPayload,
    E: From<EventError>,
    F: FnOnce(&mut Event<P>) -> Result<T, E>,
{
    let mut scope = ManagedEvent::enter(event)?;
    match body(&mut *scope) {
        Ok(value) => {
            scope.finish()?;
            Ok(value)
        }
        Err(err) => {
            if !scope.stage().is_outcome() {
                if let Err(fail_err) = scope.fail() {
                    warn!(event_id = %scope.id(), error = %fail_err, "Failed to publish failure");
                }
            }
            if let Err(end_err) = scope.finish() {
                warn!(error = %end_err, "Failed to end event");
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::{EventListener, HookResult};
    use crate::publisher::EventPublisher;
    use crate::registry::ListenerRegistry;
    use crate::stack::NestedEventStack;
    use crate::stage::EventStage;
    use std::sync::{Arc, Mutex};

    struct Checkout {
        fail_start: bool,
    }
    impl EventPayload for Checkout {}

    #[derive(Clone, Default)]
    struct Journal(Arc<Mutex<Vec<EventStage>>>);

    impl Journal {
        fn stages(&self) -> Vec<EventStage> {
            self.0.lock().unwrap().clone()
        }

        fn push(&self, stage: EventStage) {
            self.0.lock().unwrap().push(stage);
        }
    }

    struct CheckoutJournal(Journal);

    impl EventListener for CheckoutJournal {
        type Event = Checkout;

        fn on_start(&self, event: &Event<Checkout>) -> HookResult {
            self.0.push(event.stage());
            if event.payload().fail_start {
                anyhow::bail!("cart locked");
            }
            Ok(())
        }

        fn on_success(&self, event: &Event<Checkout>) -> HookResult {
            self.0.push(event.stage());
            Ok(())
        }

        fn on_failure(&self, event: &Event<Checkout>) -> HookResult {
            self.0.push(event.stage());
            Ok(())
        }

        fn on_end(&self, event: &Event<Checkout>) -> HookResult {
            self.0.push(event.stage());
            Ok(())
        }
    }

    fn checkout(fail_start: bool) -> (Event<Checkout>, NestedEventStack, Journal) {
        let registry = Arc::new(ListenerRegistry::new());
        let journal = Journal::default();
        registry.register_listener(CheckoutJournal(journal.clone()));
        let publisher = Arc::new(EventPublisher::new(registry));
        let stack = NestedEventStack::new();
        let event = Event::new(Checkout { fail_start }, publisher, stack.clone());
        (event, stack, journal)
    }

    #[test]
    fn test_scope_ends_event_on_drop() {
        let (mut event, stack, journal) = checkout(false);
        {
            let mut scope = ManagedEvent::enter(&mut event).unwrap();
            assert_eq!(stack.depth(), 1);
            scope.success().unwrap();
        }

        assert!(stack.is_empty());
        assert_eq!(event.stage(), EventStage::End);
        assert_eq!(
            journal.stages(),
            vec![EventStage::Start, EventStage::Success, EventStage::End]
        );
    }

    #[test]
    fn test_finish_ends_exactly_once() {
        let (mut event, stack, journal) = checkout(false);
        let scope = ManagedEvent::enter(&mut event).unwrap();
        scope.finish().unwrap();

        assert!(stack.is_empty());
        assert_eq!(journal.stages(), vec![EventStage::Start, EventStage::End]);
    }

    #[test]
    fn test_failed_start_fails_and_ends() {
        let (mut event, stack, journal) = checkout(true);
        let err = ManagedEvent::enter(&mut event).err().unwrap();

        assert!(err.is_listener_failure());
        assert!(stack.is_empty());
        assert_eq!(
            journal.stages(),
            vec![EventStage::Start, EventStage::Failed, EventStage::End]
        );
    }

    #[test]
    fn test_with_managed_fails_on_body_error() {
        let (mut event, stack, journal) = checkout(false);
        let result: Result<(), anyhow::Error> =
            with_managed(&mut event, |_| Err(anyhow::anyhow!("payment declined")));

        assert_eq!(result.unwrap_err().to_string(), "payment declined");
        assert!(stack.is_empty());
        assert_eq!(
            journal.stages(),
            vec![EventStage::Start, EventStage::Failed, EventStage::End]
        );
    }

    #[test]
    fn test_with_managed_returns_body_value() {
        let (mut event, stack, journal) = checkout(false);
        let total = with_managed(&mut event, |ev| -> Result<u32, EventError> {
            ev.success()?;
            Ok(42)
        })
        .unwrap();

        assert_eq!(total, 42);
        assert!(stack.is_empty());
        assert_eq!(
            journal.stages(),
            vec![EventStage::Start, EventStage::Success, EventStage::End]
        );
    }

    #[test]
    fn test_with_managed_keeps_published_success() {
        let (mut event, stack, journal) = checkout(false);
        let result: Result<(), anyhow::Error> = with_managed(&mut event, |ev| -> Result<(), anyhow::Error> {
            ev.success()?;
            Err(anyhow::anyhow!("receipt printer jammed"))
        });

        assert!(result.is_err());
        assert!(stack.is_empty());
        assert_eq!(
            journal.stages(),
            vec![EventStage::Start, EventStage::Success, EventStage::End]
        );
    }

    #[test]
    fn test_with_managed_does_not_fail_twice() {
        let (mut event, stack, journal) = checkout(false);
        let result: Result<(), anyhow::Error> = with_managed(&mut event, |ev| -> Result<(), anyhow::Error> {
            ev.fail()?;
            Err(anyhow::anyhow!("card declined"))
        });

        assert_eq!(result.unwrap_err().to_string(), "card declined");
        assert!(stack.is_empty());
        assert_eq!(
            journal.stages(),
            vec![EventStage::Start, EventStage::Failed, EventStage::End]
        );
    }

    #[test]
    fn test_panic_in_scope_only_ends() {
        let (mut event, stack, journal) = checkout(false);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _scope = ManagedEvent::enter(&mut event).unwrap();
            panic!("inventory service crashed");
        }));

        assert!(result.is_err());
        assert!(stack.is_empty());
        assert_eq!(journal.stages(), vec![EventStage::Start, EventStage::End]);
    }
}
