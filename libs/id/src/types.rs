//! Typed ID definitions.

use crate::define_id;

define_id!(
    /// Identity of a single lifecycle-tracked event.
    EventId,
    "evt"
);

define_id!(
    /// Identity of one driver run (a batch of events published by `flowctl`).
    RunId,
    "run"
);
