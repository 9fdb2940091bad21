//! # Handler failure policies.
//!
//! [`FailurePolicy`] decides what a panicking handler does to the rest of a dispatch.
//!
//! ```text
//! FailurePolicy::Propagate  → panic unwinds out of dispatch()
//!                             remaining handlers and phases are skipped
//! FailurePolicy::Isolate    → panic caught and logged, dispatch continues
//!                             dispatch() returns Err(HandlersPanicked)
//! ```
//!
//! A panic raised by the event's internal action is never caught.
//!
//! **Warning**: `Isolate` uses `AssertUnwindSafe`. A handler that panics while
//! holding a `Mutex` it shares with other handlers can leave that state poisoned
//! or half-updated.

/// Policy controlling how handler panics affect a dispatch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Let the panic unwind to the caller of `dispatch` (default).
    #[default]
    Propagate,
    /// Catch each handler panic, keep dispatching, report all panics at the end.
    Isolate,
}

impl FailurePolicy {
    /// Returns `true` if handler panics are caught.
    #[inline]
    pub fn is_isolating(&self) -> bool {
        matches!(self, FailurePolicy::Isolate)
    }
}
