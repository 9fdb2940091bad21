//! Error types produced by event dispatch.
//!
//! - [`DispatchError`] errors surfaced by [`EventBus::dispatch`](crate::EventBus::dispatch).
//! - [`HandlerPanic`] one isolated handler failure, carried inside the error.
//!
//! Handler panics only become errors under [`FailurePolicy::Isolate`](crate::FailurePolicy::Isolate);
//! under the default policy they unwind out of `dispatch` untouched.

use thiserror::Error;

use crate::events::Phase;
use crate::ids::SubscriptionId;

/// A handler panic caught during an isolated dispatch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HandlerPanic {
    /// Phase the handler was registered for.
    pub phase: Phase,
    /// Identity of the panicking handler.
    pub subscription: SubscriptionId,
    /// Panic payload rendered as text (`"unknown panic"` for non-string payloads).
    pub message: String,
}

/// # Errors produced by event dispatch.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum DispatchError {
    /// One or more handlers panicked; the dispatch still ran every phase.
    #[error("{} handler(s) panicked while dispatching {event}", .failures.len())]
    HandlersPanicked {
        /// Name of the dispatched event type.
        event: &'static str,
        /// Every caught panic, in invocation order.
        failures: Vec<HandlerPanic>,
    },
}

impl DispatchError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use phasebus::DispatchError;
    ///
    /// let err = DispatchError::HandlersPanicked { event: "tick", failures: vec![] };
    /// assert_eq!(err.as_label(), "dispatch_handlers_panicked");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            DispatchError::HandlersPanicked { .. } => "dispatch_handlers_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            DispatchError::HandlersPanicked { event, failures } => {
                let details: Vec<String> = failures
                    .iter()
                    .map(|f| format!("{}/{}: {}", f.phase, f.subscription, f.message))
                    .collect();
                format!("event={event}; panics=[{}]", details.join(", "))
            }
        }
    }

    /// Returns the caught handler panics.
    pub fn failures(&self) -> &[HandlerPanic] {
        match self {
            DispatchError::HandlersPanicked { failures, .. } => failures,
        }
    }
}

/// Renders a panic payload the way `std` prints it for `&str` and `String` payloads.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
