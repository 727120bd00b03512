//! Listeners and listener bindings.
//!
//! A listener is bound to exactly one event type through its associated
//! [`EventListener::Event`] type and overrides only the stage hooks it cares
//! about. The registry stores listeners type-erased as [`DynListener`]; the
//! erased `listen` downcasts the event and rejects anything of another type.

use std::any::TypeId;
use std::sync::Arc;

use crate::error::{ConfigError, EventError};
use crate::event::{short_type_name, AnyEvent, Event, EventPayload, EventType};
use crate::stage::EventStage;

/// Result of a listener hook. Listener bodies are opaque to the engine.
pub type HookResult = anyhow::Result<()>;

/// Receives per-stage callbacks for one event type.
///
/// Listeners are shared across units of control, so they must be `Send + Sync`
/// and hold no per-event state outside synchronized fields.
pub trait EventListener: Send + Sync + 'static {
    /// The payload type this listener is bound to.
    type Event: EventPayload;

    /// Display name used in logs and summaries.
    fn name(&self) -> &str {
        short_type_name::<Self>()
    }

    /// The event has started and sits on its stack.
    fn on_start(&self, _event: &Event<Self::Event>) -> HookResult {
        Ok(())
    }

    /// The event's data is about to be persisted.
    fn before_persistence(&self, _event: &Event<Self::Event>) -> HookResult {
        Ok(())
    }

    /// The event's data has just been persisted.
    fn after_persistence(&self, _event: &Event<Self::Event>) -> HookResult {
        Ok(())
    }

    fn on_success(&self, _event: &Event<Self::Event>) -> HookResult {
        Ok(())
    }

    fn on_failure(&self, _event: &Event<Self::Event>) -> HookResult {
        Ok(())
    }

    /// The event has ended. It is removed from its stack once all `End` hooks ran.
    fn on_end(&self, _event: &Event<Self::Event>) -> HookResult {
        Ok(())
    }
}

/// Type-erased listener as stored by the registry.
pub trait DynListener: Send + Sync {
    fn name(&self) -> &str;

    /// The event type this listener is bound to.
    fn event_type(&self) -> EventType;

    /// Dispatches `event` to the hook matching its current stage.
    ///
    /// Fails with [`EventError::TypeMismatch`] if the event is not of the
    /// bound type, and with [`EventError::Listener`] if the hook fails.
    fn listen(&self, event: &dyn AnyEvent) -> Result<(), EventError>;
}

/// Adapter erasing a typed listener.
struct Bound<L>(L);

impl<L: EventListener> DynListener for Bound<L> {
    fn name(&self) -> &str {
        self.0.name()
    }

    fn event_type(&self) -> EventType {
        EventType::of::<L::Event>()
    }

    fn listen(&self, event: &dyn AnyEvent) -> Result<(), EventError> {
        let Some(typed) = event.as_any().downcast_ref::<Event<L::Event>>() else {
            return Err(EventError::TypeMismatch {
                listener: self.name().to_string(),
                expected: <L::Event as EventPayload>::event_name(),
                actual: event.name(),
            });
        };

        let stage = typed.stage();
        let result = match stage {
            EventStage::Start => self.0.on_start(typed),
            EventStage::PrePersistence => self.0.before_persistence(typed),
            EventStage::PostPersistence => self.0.after_persistence(typed),
            EventStage::Success => self.0.on_success(typed),
            EventStage::Failed => self.0.on_failure(typed),
            EventStage::End => self.0.on_end(typed),
        };

        result.map_err(|source| EventError::Listener {
            listener: self.name().to_string(),
            event: typed.name().to_string(),
            stage,
            source,
        })
    }
}

/// A listener together with the event type key it is registered under.
///
/// Two bindings are the same binding when they wrap the same concrete
/// listener type; the registry keeps only the first.
#[derive(Clone)]
pub struct ListenerBinding {
    key: TypeId,
    event_type: EventType,
    listener: Arc<dyn DynListener>,
}

impl ListenerBinding {
    /// Binds a listener under the event type it declares.
    pub fn of<L: EventListener>(listener: L) -> Self {
        Self {
            key: TypeId::of::<L>(),
            event_type: EventType::of::<L::Event>(),
            listener: Arc::new(Bound(listener)),
        }
    }

    /// Starts a binding whose event type key is chosen explicitly.
    pub fn builder() -> ListenerBindingBuilder {
        ListenerBindingBuilder::new()
    }

    pub fn key(&self) -> TypeId {
        self.key
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    pub fn listener(&self) -> &Arc<dyn DynListener> {
        &self.listener
    }

    pub fn name(&self) -> &str {
        self.listener.name()
    }
}

impl std::fmt::Debug for ListenerBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerBinding")
            .field("listener", &self.name())
            .field("event_type", &self.event_type)
            .finish()
    }
}

/// Builder for bindings with a registrant-chosen event type key.
#[derive(Default)]
pub struct ListenerBindingBuilder {
    event_type: Option<EventType>,
    listener: Option<ListenerBinding>,
}

impl ListenerBindingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn event_type(mut self, event_type: EventType) -> Self {
        self.event_type = Some(event_type);
        self
    }

    /// Shorthand for `event_type(EventType::of::<P>())`.
    pub fn event<P: EventPayload>(self) -> Self {
        self.event_type(EventType::of::<P>())
    }

    pub fn listener<L: EventListener>(mut self, listener: L) -> Self {
        self.listener = Some(ListenerBinding::of(listener));
        self
    }

    /// Builds the binding.
    ///
    /// Fails if either half is missing or the listener is bound to a
    /// different event type than the chosen key.
    pub fn build(self) -> Result<ListenerBinding, ConfigError> {
        let Some(binding) = self.listener else {
            return Err(ConfigError::MissingListener {
                event_type: self.event_type.map_or("<unset>", |t| t.name()),
            });
        };

        let Some(requested) = self.event_type else {
            return Err(ConfigError::MissingEventType {
                listener: binding.name().to_string(),
            });
        };

        if requested != binding.event_type {
            return Err(ConfigError::BindingMismatch {
                listener: binding.name().to_string(),
                declared: binding.event_type.name(),
                requested: requested.name(),
            });
        }

        Ok(binding)
    }
}
