//! # Event contract for bus dispatch.
//!
//! An [`Event`] is any `'static` type that knows how to perform its own effect
//! (the *internal action*). The bus runs that action between two handler phases:
//!
//! ```text
//! dispatch(&mut ev)
//!   ├─► Phase::Before  ── PreHandler<E>(&mut ev)   (registration order)
//!   ├─► ev.execute(bus)                            (exactly once)
//!   └─► Phase::After   ── PostHandler<E>(&ev)      (registration order)
//! ```
//!
//! Pre-handlers may rewrite the event before it takes effect; post-handlers only
//! observe the outcome. Handler shapes are plain closure signatures, so a handler
//! written for the wrong event type or phase is rejected by the compiler.
//!
//! ## Example
//! ```rust
//! use phasebus::{Event, EventBus};
//!
//! struct Damage {
//!     amount: u32,
//!     applied: Option<u32>,
//! }
//!
//! impl Event for Damage {
//!     fn execute(&mut self, _bus: &EventBus) {
//!         self.applied = Some(self.amount);
//!     }
//! }
//!
//! let bus = EventBus::new();
//! let _halve = bus.subscribe_before(|d: &mut Damage| d.amount /= 2);
//!
//! let mut ev = Damage { amount: 10, applied: None };
//! bus.dispatch(&mut ev).unwrap();
//! assert_eq!(ev.applied, Some(5));
//! ```

use std::fmt;

use crate::core::EventBus;

/// Callback shape for the [`Phase::Before`] phase: mutable access to the event.
pub type PreHandler<E> = dyn Fn(&mut E) + Send + Sync + 'static;

/// Callback shape for the [`Phase::After`] phase: read-only access to the event.
pub type PostHandler<E> = dyn Fn(&E) + Send + Sync + 'static;

/// A dispatchable event type.
///
/// ### Implementation requirements
/// - `execute` is the event's own effect; it runs once per dispatch.
/// - `execute` may dispatch further events on `bus` (nested dispatch is supported).
/// - Keep `execute` panic-free: panics from the internal action always propagate,
///   regardless of [`FailurePolicy`](crate::FailurePolicy).
pub trait Event: 'static {
    /// Performs the event's internal action, invoked by the bus that dispatches it.
    fn execute(&mut self, bus: &EventBus);

    /// Returns the event name used in logs and dispatch errors.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose.
    fn name() -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Dispatch phase a handler is registered for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Runs before the internal action with `&mut E`.
    Before,
    /// Runs after the internal action with `&E`.
    After,
}

impl Phase {
    /// Returns a short stable label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            Phase::Before => "before",
            Phase::After => "after",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ping;

    impl Event for Ping {
        fn execute(&mut self, _bus: &EventBus) {}
    }

    struct Named;

    impl Event for Named {
        fn execute(&mut self, _bus: &EventBus) {}

        fn name() -> &'static str {
            "named"
        }
    }

    #[test]
    fn test_default_name_is_type_name() {
        assert!(Ping::name().ends_with("Ping"), "got {}", Ping::name());
        assert_eq!(Named::name(), "named");
    }

    #[test]
    fn test_phase_labels() {
        assert_eq!(Phase::Before.to_string(), "before");
        assert_eq!(Phase::After.as_label(), "after");
    }
}
