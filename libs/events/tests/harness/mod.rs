//! Shared fixtures for the integration tests: sample payloads, a call log and
//! listeners that write into it.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use eventflow_events::{
    Event, EventListener, EventPayload, EventPublisher, EventStage, HookResult, ListenerRegistry,
    NestedEventStack, PublisherConfig,
};

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct OrderPlaced {
    pub order_id: u64,
}
impl EventPayload for OrderPlaced {}

#[derive(Debug, Clone)]
pub struct StockReserved {
    pub sku: String,
}
impl EventPayload for StockReserved {}

// ---------------------------------------------------------------------------
// Call log
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub listener: &'static str,
    pub event: &'static str,
    pub stage: EventStage,
}

#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    pub fn record(&self, listener: &'static str, event: &'static str, stage: EventStage) {
        self.0.lock().unwrap().push(Call {
            listener,
            event,
            stage,
        });
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    pub fn stages_for(&self, listener: &str) -> Vec<EventStage> {
        self.calls()
            .into_iter()
            .filter(|c| c.listener == listener)
            .map(|c| c.stage)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }
}

// ---------------------------------------------------------------------------
// Listeners
// ---------------------------------------------------------------------------

/// Overrides `on_start`, `on_success` and `on_end`.
pub struct OrderAudit(pub CallLog);

impl EventListener for OrderAudit {
    type Event = OrderPlaced;

    fn on_start(&self, event: &Event<OrderPlaced>) -> HookResult {
        self.0.record("OrderAudit", event.name(), event.stage());
        Ok(())
    }

    fn on_success(&self, event: &Event<OrderPlaced>) -> HookResult {
        self.0.record("OrderAudit", event.name(), event.stage());
        Ok(())
    }

    fn on_end(&self, event: &Event<OrderPlaced>) -> HookResult {
        self.0.record("OrderAudit", event.name(), event.stage());
        Ok(())
    }
}

/// Overrides only `on_end`.
pub struct OrderCleanup(pub CallLog);

impl EventListener for OrderCleanup {
    type Event = OrderPlaced;

    fn on_end(&self, event: &Event<OrderPlaced>) -> HookResult {
        self.0.record("OrderCleanup", event.name(), event.stage());
        Ok(())
    }
}

/// Records every stage of `StockReserved`.
pub struct StockWatcher(pub CallLog);

impl StockWatcher {
    fn note(&self, event: &Event<StockReserved>) -> HookResult {
        self.0.record("StockWatcher", event.name(), event.stage());
        Ok(())
    }
}

impl EventListener for StockWatcher {
    type Event = StockReserved;

    fn on_start(&self, event: &Event<StockReserved>) -> HookResult {
        self.note(event)
    }

    fn before_persistence(&self, event: &Event<StockReserved>) -> HookResult {
        self.note(event)
    }

    fn after_persistence(&self, event: &Event<StockReserved>) -> HookResult {
        self.note(event)
    }

    fn on_success(&self, event: &Event<StockReserved>) -> HookResult {
        self.note(event)
    }

    fn on_failure(&self, event: &Event<StockReserved>) -> HookResult {
        self.note(event)
    }

    fn on_end(&self, event: &Event<StockReserved>) -> HookResult {
        self.note(event)
    }
}

/// Fails at one stage of `OrderPlaced`, recording the attempt.
pub struct FailingAt {
    pub name: &'static str,
    pub stage: EventStage,
    pub log: CallLog,
}

impl FailingAt {
    fn check(&self, event: &Event<OrderPlaced>) -> HookResult {
        if event.stage() == self.stage {
            self.log.record(self.name, event.name(), event.stage());
            anyhow::bail!("{} refused {}", self.name, event.stage());
        }
        Ok(())
    }
}

impl EventListener for FailingAt {
    type Event = OrderPlaced;

    fn name(&self) -> &str {
        self.name
    }

    fn on_start(&self, event: &Event<OrderPlaced>) -> HookResult {
        self.check(event)
    }

    fn on_success(&self, event: &Event<OrderPlaced>) -> HookResult {
        self.check(event)
    }

    fn on_end(&self, event: &Event<OrderPlaced>) -> HookResult {
        self.check(event)
    }
}

/// A second failing listener type, so two can be registered side by side.
pub struct AlsoFailingAt(pub FailingAt);

impl EventListener for AlsoFailingAt {
    type Event = OrderPlaced;

    fn name(&self) -> &str {
        self.0.name
    }

    fn on_start(&self, event: &Event<OrderPlaced>) -> HookResult {
        self.0.check(event)
    }

    fn on_success(&self, event: &Event<OrderPlaced>) -> HookResult {
        self.0.check(event)
    }

    fn on_end(&self, event: &Event<OrderPlaced>) -> HookResult {
        self.0.check(event)
    }
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

pub struct Fixture {
    pub registry: Arc<ListenerRegistry>,
    pub publisher: Arc<EventPublisher>,
    pub stack: NestedEventStack,
    pub log: CallLog,
}

impl Fixture {
    pub fn new() -> Self {
        let registry = Arc::new(ListenerRegistry::new());
        let config = PublisherConfig {
            summary_history: 64,
            log_cycles: false,
        };
        let publisher = Arc::new(EventPublisher::with_config(Arc::clone(&registry), &config));
        Self {
            registry,
            publisher,
            stack: NestedEventStack::new(),
            log: CallLog::default(),
        }
    }

    pub fn order(&self, order_id: u64) -> Event<OrderPlaced> {
        Event::new(
            OrderPlaced { order_id },
            self.publisher.clone(),
            self.stack.clone(),
        )
    }

    pub fn stock(&self, sku: &str) -> Event<StockReserved> {
        Event::new(
            StockReserved {
                sku: sku.to_string(),
            },
            self.publisher.clone(),
            self.stack.clone(),
        )
    }
}
