//! Error types for event dispatch.

use thiserror::Error;

use crate::stage::EventStage;

/// A listener binding could not be established at setup time.
///
/// These are fatal configuration mistakes; they surface from
/// [`ListenerBindingBuilder::build`](crate::ListenerBindingBuilder::build)
/// and are never produced while events are being published.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No event type was supplied for the binding.
    #[error("unable to determine event type for listener: {listener}")]
    MissingEventType { listener: String },

    /// No listener was supplied for the binding.
    #[error("listener binding for event type {event_type} has no listener")]
    MissingListener { event_type: &'static str },

    /// The key chosen by the registrant differs from the type the listener handles.
    #[error("listener {listener} handles {declared} but was bound to {requested}")]
    BindingMismatch {
        listener: String,
        declared: &'static str,
        requested: &'static str,
    },
}

/// Errors raised while dispatching an event to its listeners.
#[derive(Debug, Error)]
pub enum EventError {
    /// A listener was handed an event of a type it is not bound to.
    #[error("unexpected event type for listener {listener}: expected {expected}, got {actual}")]
    TypeMismatch {
        listener: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// A listener hook failed.
    #[error("listener {listener} failed handling {event} at stage {stage}")]
    Listener {
        listener: String,
        event: String,
        stage: EventStage,
        #[source]
        source: anyhow::Error,
    },
}

impl EventError {
    /// Returns true if the error originated inside a listener hook.
    pub fn is_listener_failure(&self) -> bool {
        matches!(self, EventError::Listener { .. })
    }

    /// Name of the listener involved.
    pub fn listener_name(&self) -> &str {
        match self {
            EventError::TypeMismatch { listener, .. } | EventError::Listener { listener, .. } => {
                listener
            }
        }
    }
}

/// Outcome of an [`ExceptionHandler`](crate::ExceptionHandler) that did not absorb a failure.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The handler chose to propagate the listener failure unchanged.
    #[error("listener failure rethrown")]
    Rethrow,

    /// The handler itself failed.
    #[error("exception handler failed: {0}")]
    Failed(#[from] anyhow::Error),
}

/// A stage value outside the closed set of lifecycle stages.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StageError {
    #[error("unexpected event stage: {0}")]
    Unknown(String),
}
