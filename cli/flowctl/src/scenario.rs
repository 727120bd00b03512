//! Canned lifecycle scenarios.
//!
//! Each scenario builds a fresh registry and publisher, drives one top-level
//! event through a managed lifecycle on the current thread's stack, and
//! reports what the tracker saw.

use std::sync::Arc;

use anyhow::bail;
use clap::ValueEnum;
use eventflow_events::{
    with_managed, CycleSummary, Event, EventError, EventId, EventListener, EventPayload,
    EventPublisher, EventSummary, ExceptionHandler, HookResult, ListenerRegistry,
    NestedEventStack, Publisher, PublisherConfig, RethrowHandler, SuppressHandler,
};
use eventflow_id::RunId;
use serde::Serialize;
use tracing::{debug, info, info_span};

/// Orders above this total are rejected at `Start`.
const FRAUD_LIMIT_CENTS: u64 = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    /// Order placed and persisted; every listener succeeds.
    Checkout,
    /// Payment declined while persisting; the event is failed and ended.
    Declined,
    /// Order reserves stock through a nested event during persistence.
    Nested,
    /// Fraud screen rejects the order at start.
    Rejected,
}

impl Scenario {
    pub const ALL: [Scenario; 4] = [
        Scenario::Checkout,
        Scenario::Declined,
        Scenario::Nested,
        Scenario::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scenario::Checkout => "checkout",
            Scenario::Declined => "declined",
            Scenario::Nested => "nested",
            Scenario::Rejected => "rejected",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Scenario::Checkout => "Order placed and persisted; every listener succeeds",
            Scenario::Declined => "Payment declined before persistence; event failed and ended",
            Scenario::Nested => "Order reserves stock through a nested event lifecycle",
            Scenario::Rejected => "Fraud screen rejects the order at start",
        }
    }
}

impl std::fmt::Display for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exception handler selected on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum HandlerKind {
    /// Log and escalate the listener failure.
    #[default]
    Rethrow,
    /// Log and continue with the next listener.
    Suppress,
}

impl HandlerKind {
    fn build(self) -> Arc<dyn ExceptionHandler> {
        match self {
            HandlerKind::Rethrow => Arc::new(RethrowHandler),
            HandlerKind::Suppress => Arc::new(SuppressHandler),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Succeeded,
    Failed,
}

/// What a scenario run produced.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub scenario: Scenario,
    pub run_id: RunId,
    pub outcome: Outcome,
    pub error: Option<String>,
    /// Whether the failure, if any, was raised by a listener.
    #[serde(skip)]
    pub listener_failure: bool,
    pub root_event_id: EventId,
    pub cycles: Vec<CycleSummary>,
    pub completed: Vec<EventSummary>,
    /// Stack depth after the run; anything but 0 is a leak.
    pub stack_depth: usize,
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct OrderPlaced {
    pub order_id: u64,
    pub total_cents: u64,
}
impl EventPayload for OrderPlaced {}

#[derive(Debug, Clone)]
pub struct PaymentCaptured {
    pub order_id: u64,
    pub amount_cents: u64,
    pub declined: bool,
}
impl EventPayload for PaymentCaptured {}

#[derive(Debug, Clone)]
pub struct StockReserved {
    pub order_id: u64,
    pub sku: &'static str,
    pub quantity: u32,
}
impl EventPayload for StockReserved {}

// ---------------------------------------------------------------------------
// Listeners
// ---------------------------------------------------------------------------

struct OrderAudit;

impl EventListener for OrderAudit {
    type Event = OrderPlaced;

    fn on_start(&self, event: &Event<OrderPlaced>) -> HookResult {
        info!(order_id = event.payload().order_id, "Order received");
        Ok(())
    }

    fn on_success(&self, event: &Event<OrderPlaced>) -> HookResult {
        info!(order_id = event.payload().order_id, "Order confirmed");
        Ok(())
    }

    fn on_failure(&self, event: &Event<OrderPlaced>) -> HookResult {
        info!(order_id = event.payload().order_id, "Order abandoned");
        Ok(())
    }

    fn on_end(&self, event: &Event<OrderPlaced>) -> HookResult {
        debug!(event_id = %event.id(), "Order audit closed");
        Ok(())
    }
}

struct FraudScreen {
    limit_cents: u64,
}

impl EventListener for FraudScreen {
    type Event = OrderPlaced;

    fn on_start(&self, event: &Event<OrderPlaced>) -> HookResult {
        let order = event.payload();
        if order.total_cents > self.limit_cents {
            bail!(
                "order {} total {} exceeds fraud limit {}",
                order.order_id,
                order.total_cents,
                self.limit_cents
            );
        }
        Ok(())
    }
}

/// Raises a `StockReserved` lifecycle while the order is being persisted.
struct ReserveStock;

impl EventListener for ReserveStock {
    type Event = OrderPlaced;

    fn before_persistence(&self, event: &Event<OrderPlaced>) -> HookResult {
        let mut reservation = event.spawn(StockReserved {
            order_id: event.payload().order_id,
            sku: "SKU-CHAIR-01",
            quantity: 2,
        });
        with_managed(&mut reservation, |ev| -> Result<(), EventError> {
            ev.pre_persist()?;
            ev.post_persist()?;
            ev.success()
        })?;
        Ok(())
    }
}

struct StockLedger;

impl EventListener for StockLedger {
    type Event = StockReserved;

    fn on_start(&self, event: &Event<StockReserved>) -> HookResult {
        if event.payload().quantity == 0 {
            bail!("cannot reserve zero units of {}", event.payload().sku);
        }
        Ok(())
    }

    fn after_persistence(&self, event: &Event<StockReserved>) -> HookResult {
        let stock = event.payload();
        info!(
            order_id = stock.order_id,
            sku = stock.sku,
            quantity = stock.quantity,
            depth = event.stack().depth(),
            "Stock reserved"
        );
        Ok(())
    }
}

struct PaymentGateway;

impl EventListener for PaymentGateway {
    type Event = PaymentCaptured;

    fn before_persistence(&self, event: &Event<PaymentCaptured>) -> HookResult {
        let payment = event.payload();
        if payment.declined {
            bail!("card declined for order {}", payment.order_id);
        }
        Ok(())
    }
}

struct Receipts;

impl EventListener for Receipts {
    type Event = PaymentCaptured;

    fn on_success(&self, event: &Event<PaymentCaptured>) -> HookResult {
        let payment = event.payload();
        info!(
            order_id = payment.order_id,
            amount_cents = payment.amount_cents,
            "Receipt issued"
        );
        Ok(())
    }

    fn on_end(&self, event: &Event<PaymentCaptured>) -> HookResult {
        debug!(event_id = %event.id(), stage = %event.stage(), "Receipt run closed");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Running
// ---------------------------------------------------------------------------

/// Registers the listeners a scenario needs.
pub fn registry_for(scenario: Scenario) -> ListenerRegistry {
    let registry = ListenerRegistry::new();
    match scenario {
        Scenario::Checkout | Scenario::Rejected => {
            registry.register_listener(OrderAudit);
            registry.register_listener(FraudScreen {
                limit_cents: FRAUD_LIMIT_CENTS,
            });
        }
        Scenario::Nested => {
            registry.register_listener(OrderAudit);
            registry.register_listener(ReserveStock);
            registry.register_listener(StockLedger);
        }
        Scenario::Declined => {
            registry.register_listener(PaymentGateway);
            registry.register_listener(Receipts);
        }
    }
    registry
}

/// Runs `scenario` to completion and reports the result.
pub fn run(scenario: Scenario, handler: HandlerKind, config: &PublisherConfig) -> ScenarioReport {
    let run_id = RunId::new();
    let _span = info_span!("scenario", run_id = %run_id, scenario = %scenario).entered();

    let registry = Arc::new(registry_for(scenario));
    let publisher = Arc::new(
        EventPublisher::with_config(Arc::clone(&registry), config)
            .with_exception_handler(handler.build()),
    );

    info!(
        handler = ?handler,
        summary_history = config.summary_history,
        "Running scenario"
    );

    let dyn_publisher: Arc<dyn Publisher> = publisher.clone();
    let (root_event_id, result) = match scenario {
        Scenario::Checkout | Scenario::Nested => drive(
            OrderPlaced {
                order_id: 1001,
                total_cents: 4_250,
            },
            dyn_publisher,
        ),
        Scenario::Rejected => drive(
            OrderPlaced {
                order_id: 1002,
                total_cents: 250_000,
            },
            dyn_publisher,
        ),
        Scenario::Declined => drive(
            PaymentCaptured {
                order_id: 1003,
                amount_cents: 4_250,
                declined: true,
            },
            dyn_publisher,
        ),
    };

    let (outcome, error, listener_failure) = match result {
        Ok(()) => (Outcome::Succeeded, None, false),
        Err(err) => {
            let listener_failure = err.is_listener_failure();
            let message = format!("{:#}", anyhow::Error::new(err));
            (Outcome::Failed, Some(message), listener_failure)
        }
    };

    ScenarioReport {
        scenario,
        run_id,
        outcome,
        error,
        listener_failure,
        root_event_id,
        cycles: publisher.tracker().recent(),
        completed: publisher.tracker().completed(),
        stack_depth: NestedEventStack::current().depth(),
    }
}

/// Takes one event through start, persistence and success under a managed scope.
fn drive<P: EventPayload>(
    payload: P,
    publisher: Arc<dyn Publisher>,
) -> (EventId, Result<(), EventError>) {
    let mut event = Event::on_current_thread(payload, publisher);
    let result = with_managed(&mut event, |ev| -> Result<(), EventError> {
        ev.pre_persist()?;
        ev.post_persist()?;
        ev.success()
    });
    (event.id(), result)
}
