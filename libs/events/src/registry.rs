//! Listener registry: event type to listener bindings.
//!
//! Registration is additive and idempotent: registering the same binding
//! (same concrete listener type) twice keeps only the first instance, so each
//! publish cycle dispatches to it once. Listener instances are created once by
//! the registrant and shared; lookups hand out `Arc` clones.
//!
//! Register listeners before the first event of their type is published.
//! The publisher caches the resolved listener set for the lifetime of each
//! event, so an event already in flight does not see later registrations.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info};

use crate::event::EventType;
use crate::listener::{DynListener, EventListener, ListenerBinding};

#[derive(Default)]
pub struct ListenerRegistry {
    bindings: RwLock<HashMap<EventType, Vec<ListenerBinding>>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a binding under its event type.
    ///
    /// Returns `false` if an equal binding was already registered.
    pub fn register(&self, binding: ListenerBinding) -> bool {
        let event_type = binding.event_type();
        let mut bindings = self
            .bindings
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let entry = bindings.entry(event_type).or_default();

        if entry.iter().any(|b| b.key() == binding.key()) {
            debug!(
                listener = binding.name(),
                event = event_type.name(),
                "Listener already registered"
            );
            return false;
        }

        info!(
            listener = binding.name(),
            event = event_type.name(),
            "Registered listener"
        );
        entry.push(binding);
        true
    }

    /// Binds `listener` under the event type it declares.
    pub fn register_listener<L: EventListener>(&self, listener: L) -> bool {
        self.register(ListenerBinding::of(listener))
    }

    /// Listeners bound to exactly `event_type`, possibly none.
    ///
    /// Listeners come back in registration order, which callers must not
    /// rely on.
    pub fn listeners_for(&self, event_type: EventType) -> Vec<Arc<dyn DynListener>> {
        self.bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&event_type)
            .map(|bindings| bindings.iter().map(|b| Arc::clone(b.listener())).collect())
            .unwrap_or_default()
    }

    pub fn listener_count(&self, event_type: EventType) -> usize {
        self.bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&event_type)
            .map_or(0, Vec::len)
    }

    /// Returns true if a listener of type `L` is registered.
    pub fn is_registered<L: EventListener>(&self) -> bool {
        let key = std::any::TypeId::of::<L>();
        self.bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&EventType::of::<L::Event>())
            .is_some_and(|bindings| bindings.iter().any(|b| b.key() == key))
    }

    /// Event types with at least one listener.
    pub fn event_types(&self) -> Vec<EventType> {
        self.bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, bindings)| !bindings.is_empty())
            .map(|(event_type, _)| *event_type)
            .collect()
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bindings = self.bindings.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_map()
            .entries(bindings.iter().map(|(k, v)| (k.name(), v)))
            .finish()
    }
}
