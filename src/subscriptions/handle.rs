//! # Subscription handles.
//!
//! A [`SubscriptionHandle`] is the single owner of one registered handler.
//! Releasing it (explicitly or by dropping it) removes that handler, and only
//! that handler, from the registry list of its bus.
//!
//! ## Rules
//! - Not `Clone`: one handle per handler.
//! - `release()` is idempotent; the second call is a no-op returning `false`.
//! - The handle keeps only a weak back-reference to its registry. If the
//!   registry provider is gone, release is a no-op.
//! - Removal is by [`SubscriptionId`], never by comparing callbacks.
//!
//! ## Example
//! ```rust
//! use phasebus::{Event, EventBus};
//!
//! struct Tick;
//! impl Event for Tick {
//!     fn execute(&mut self, _bus: &EventBus) {}
//! }
//!
//! let bus = EventBus::new();
//! let mut handle = bus.subscribe_after(|_: &Tick| println!("tick"));
//! assert!(handle.is_active());
//!
//! assert!(handle.release());
//! assert!(!handle.release());
//! assert_eq!(bus.handler_count::<Tick>().total(), 0);
//! ```

use std::fmt;
use std::sync::Weak;

use tracing::debug;

use crate::events::Phase;
use crate::ids::{BusId, SubscriptionId};
use crate::registry::Unsubscribe;

/// Owned token for one registered handler.
#[must_use = "dropping the handle unsubscribes the handler immediately"]
pub struct SubscriptionHandle {
    registry: Weak<dyn Unsubscribe>,
    bus: BusId,
    phase: Phase,
    id: SubscriptionId,
    released: bool,
}

impl SubscriptionHandle {
    pub(crate) fn new(
        registry: Weak<dyn Unsubscribe>,
        bus: BusId,
        phase: Phase,
        id: SubscriptionId,
    ) -> Self {
        Self {
            registry,
            bus,
            phase,
            id,
            released: false,
        }
    }

    /// Returns the handler identity.
    #[inline]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Returns the bus the handler is registered under.
    #[inline]
    pub fn bus(&self) -> BusId {
        self.bus
    }

    /// Returns the phase the handler runs in.
    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns true if the handler is still registered.
    ///
    /// Becomes `false` after [`release`](Self::release), after the bus was purged,
    /// or once the registry provider is gone.
    pub fn is_active(&self) -> bool {
        !self.released
            && self
                .registry
                .upgrade()
                .is_some_and(|r| r.is_registered(self.bus, self.phase, self.id))
    }

    /// Removes the handler from its registry.
    ///
    /// Returns `true` if this call removed it. Later calls return `false`.
    /// Safe to call from inside a dispatch, including from the handler itself.
    ///
    /// ### After it returns
    /// - Dispatches started later never invoke the handler.
    /// - On the calling thread, including a dispatch this call is nested in,
    ///   the handler is not invoked again.
    /// - A dispatch running on another thread checks the activity flag just
    ///   before each handler, so an invocation that already passed that check
    ///   may still start or finish. This call does not wait for it.
    pub fn release(&mut self) -> bool {
        if self.released {
            return false;
        }
        self.released = true;

        let Some(registry) = self.registry.upgrade() else {
            return false;
        };
        let removed = registry.unsubscribe(self.bus, self.phase, self.id);
        debug!(
            bus = %self.bus,
            event = registry.event_name(),
            phase = %self.phase,
            subscription = %self.id,
            removed,
            "handler released"
        );
        removed
    }

    /// Gives up the handle without unregistering the handler.
    ///
    /// The handler then stays registered until its bus is purged
    /// (see [`TeardownPolicy`](crate::TeardownPolicy)) or the registry provider is dropped.
    pub fn detach(mut self) {
        self.released = true;
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("bus", &self.bus)
            .field("phase", &self.phase)
            .field("id", &self.id)
            .field("released", &self.released)
            .finish()
    }
}
