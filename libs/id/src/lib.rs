//! # eventflow-id
//!
//! Typed identifiers for eventflow.
//!
//! Every ID renders as `{prefix}_{ulid}`, e.g. `evt_01HV4Z2WQXKJNM8GPQY6VBKC3D`
//! for an event or `run_01HV4Z3MXNKPQR9HSTZ7WCLD4E` for a driver run. The
//! prefix keeps an event ID from being parsed as a run ID; the ULID makes IDs
//! unique across processes and sortable by creation time, which keeps log
//! output for nested events readable.

mod error;
mod macros;
mod prefixed;
mod types;

pub use error::IdError;
pub use prefixed::PrefixedId;
pub use types::*;

pub use ulid::Ulid;

#[doc(hidden)]
pub use serde as __serde;
