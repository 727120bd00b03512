//! # eventflow-events
//!
//! In-process, typed event-lifecycle dispatch.
//!
//! A producer creates an [`Event`] around a domain payload and drives it
//! through the lifecycle stages. At every stage the event is broadcast to each
//! listener bound to the payload's concrete type.
//!
//! ## Lifecycle
//!
//! ```text
//! start ──► pre_persist ──► post_persist ──► success ──► end
//!   │          (optional)      (optional)  └► fail ──┘
//!   └─ pushes the event on its nested stack        └─ publishes End, then
//!                                                     pops the event and
//!                                                     everything above it
//! ```
//!
//! Stage order is not enforced. Each operation sets the stage and publishes.
//!
//! ## Components
//!
//! - [`EventListener`]: hooks for one payload type, all defaulting to no-ops
//! - [`ListenerRegistry`]: event type to listener bindings (exact-type lookup)
//! - [`EventPublisher`]: resolves, dispatches, escalates, summarizes
//! - [`ExceptionHandler`]: strategy for listener failures
//! - [`NestedEventStack`]: in-flight events of one unit of control
//! - [`ManagedEvent`]: guarantees `end` when a scope is left
//!
//! ## Example
//!
//! ```ignore
//! struct OrderPlaced { order_id: u64 }
//! impl EventPayload for OrderPlaced {}
//!
//! struct ReceiptMailer;
//! impl EventListener for ReceiptMailer {
//!     type Event = OrderPlaced;
//!
//!     fn on_success(&self, event: &Event<OrderPlaced>) -> HookResult {
//!         send_receipt(event.payload().order_id)
//!     }
//! }
//!
//! let registry = Arc::new(ListenerRegistry::new());
//! registry.register_listener(ReceiptMailer);
//! let publisher = Arc::new(EventPublisher::new(registry));
//!
//! let mut event = Event::on_current_thread(OrderPlaced { order_id: 7 }, publisher);
//! with_managed(&mut event, |ev| ev.success())?;
//! ```

mod config;
mod error;
mod event;
mod handler;
mod listener;
mod publisher;
mod registry;
mod scope;
mod stack;
mod stage;
mod tracker;

pub use config::PublisherConfig;
pub use error::{ConfigError, EventError, HandlerError, StageError};
pub use event::{AnyEvent, Event, EventPayload, EventType};
pub use handler::{ExceptionHandler, RethrowHandler, SuppressHandler};
pub use listener::{DynListener, EventListener, HookResult, ListenerBinding, ListenerBindingBuilder};
pub use publisher::{EventPublisher, Publisher};
pub use registry::ListenerRegistry;
pub use scope::{with_managed, ManagedEvent};
pub use stack::{NestedEventStack, StackEntry, StackRelease};
pub use stage::EventStage;
pub use tracker::{CycleSummary, EventContext, EventSummary, EventTracker};

pub use eventflow_id::EventId;
