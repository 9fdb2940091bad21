//! # Per-event-type handler registry.
//!
//! [`TypeRegistry<E>`] stores, for every bus identity, the ordered pre- and
//! post-handler lists of one event type, and runs the three-phase dispatch.
//!
//! ## Architecture
//! ```text
//! TypeRegistry<E>
//!   └─► RwLock<HashMap<BusId, BusHandlers<E>>>
//!            ├─ bus#1 → before: [h1, h2]   after: [h3]
//!            └─ bus#2 → before: []         after: [h4]
//!
//! dispatch(bus#1, ev):
//!   read lock → clone both Arc<Vec> (snapshot) → unlock
//!   for h in before (if active) → h(&mut ev)
//!   ev.execute(bus)
//!   for h in after  (if active) → h(&ev)
//! ```
//!
//! ## Rules
//! - Lists keep registration order; removal never reorders the rest.
//! - No lock is held while user code runs, so handlers may subscribe, release,
//!   or dispatch again (same bus, same type) without deadlocking.
//! - Handlers subscribed during a dispatch are not part of that dispatch.
//! - Handlers released during a dispatch are skipped for the rest of it.
//! - Across threads, the activity check and the call are not atomic: an entry
//!   released after a concurrent dispatch checked it may still run once there.
//! - A bus entry is dropped from the map once both of its lists are empty.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::{debug, error, trace};

use super::entry::{HandlerEntry, HandlerList, remove_entry};
use crate::core::EventBus;
use crate::error::{DispatchError, HandlerPanic, panic_message};
use crate::events::{Event, Phase, PostHandler, PreHandler};
use crate::ids::{BusId, SubscriptionId};
use crate::policies::FailurePolicy;
use crate::subscriptions::SubscriptionHandle;

/// Number of handlers registered under one bus for one event type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HandlerCount {
    /// Handlers in [`Phase::Before`].
    pub before: usize,
    /// Handlers in [`Phase::After`].
    pub after: usize,
}

impl HandlerCount {
    /// Returns `before + after`.
    #[inline]
    pub fn total(&self) -> usize {
        self.before + self.after
    }

    /// Returns true if no handler is registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Type-erased removal interface held (weakly) by subscription handles and
/// (strongly) by the registry provider.
pub(crate) trait Unsubscribe: Send + Sync {
    /// Removes one entry; `false` if it was already gone.
    fn unsubscribe(&self, bus: BusId, phase: Phase, id: SubscriptionId) -> bool;

    /// Returns true if the entry is still registered.
    fn is_registered(&self, bus: BusId, phase: Phase, id: SubscriptionId) -> bool;

    /// Removes every entry of `bus`; returns how many were removed.
    fn purge(&self, bus: BusId) -> usize;

    /// Returns how many entries `bus` currently has.
    fn registered(&self, bus: BusId) -> usize;

    /// Name of the event type, for logs.
    fn event_name(&self) -> &'static str;
}

struct BusHandlers<E: Event> {
    before: HandlerList<PreHandler<E>>,
    after: HandlerList<PostHandler<E>>,
}

impl<E: Event> Default for BusHandlers<E> {
    fn default() -> Self {
        Self {
            before: Arc::new(Vec::new()),
            after: Arc::new(Vec::new()),
        }
    }
}

impl<E: Event> BusHandlers<E> {
    fn is_empty(&self) -> bool {
        self.before.is_empty() && self.after.is_empty()
    }

    fn count(&self) -> HandlerCount {
        HandlerCount {
            before: self.before.len(),
            after: self.after.len(),
        }
    }
}

/// Handler storage and dispatcher for event type `E`.
///
/// Obtained from [`Registries::registry`](crate::Registries::registry); one
/// instance exists per event type per provider. Most code goes through
/// [`EventBus`] instead of calling this directly.
pub struct TypeRegistry<E: Event> {
    buses: RwLock<HashMap<BusId, BusHandlers<E>>>,
}

impl<E: Event> TypeRegistry<E> {
    pub(crate) fn new() -> Self {
        Self {
            buses: RwLock::new(HashMap::new()),
        }
    }

    /// Appends a pre-handler for `bus`.
    ///
    /// Releasing the returned handle removes exactly this handler.
    pub fn subscribe_before<F>(self: &Arc<Self>, bus: BusId, cb: F) -> SubscriptionHandle
    where
        F: Fn(&mut E) + Send + Sync + 'static,
    {
        let id = SubscriptionId::next();
        let entry = HandlerEntry::new(id, Box::new(cb) as Box<PreHandler<E>>);
        {
            let mut buses = self.buses.write();
            let handlers = buses.entry(bus).or_default();
            Arc::make_mut(&mut handlers.before).push(entry);
        }
        self.subscribed(bus, Phase::Before, id)
    }

    /// Appends a post-handler for `bus`.
    ///
    /// Releasing the returned handle removes exactly this handler.
    pub fn subscribe_after<F>(self: &Arc<Self>, bus: BusId, cb: F) -> SubscriptionHandle
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = SubscriptionId::next();
        let entry = HandlerEntry::new(id, Box::new(cb) as Box<PostHandler<E>>);
        {
            let mut buses = self.buses.write();
            let handlers = buses.entry(bus).or_default();
            Arc::make_mut(&mut handlers.after).push(entry);
        }
        self.subscribed(bus, Phase::After, id)
    }

    fn subscribed(self: &Arc<Self>, bus: BusId, phase: Phase, id: SubscriptionId) -> SubscriptionHandle {
        debug!(%bus, event = E::name(), %phase, subscription = %id, "handler subscribed");
        let weak: Weak<Self> = Arc::downgrade(self);
        SubscriptionHandle::new(weak, bus, phase, id)
    }

    /// Runs the three phases for `event` on `bus`.
    ///
    /// ### Order
    /// 1. every active pre-handler of `bus`, in registration order
    /// 2. `event.execute(bus)`
    /// 3. every active post-handler of `bus`, in registration order
    ///
    /// ### Failures
    /// Depends on `bus.config().failure`:
    /// - [`FailurePolicy::Propagate`]: a handler panic unwinds out of this call.
    /// - [`FailurePolicy::Isolate`]: panics are caught, every phase still runs,
    ///   and the result is [`DispatchError::HandlersPanicked`].
    pub fn dispatch(&self, bus: &EventBus, event: &mut E) -> Result<(), DispatchError> {
        let bus_id = bus.id();
        let policy = bus.config().failure;
        let (before, after) = self.snapshot(bus_id);
        let mut failures = Vec::new();

        trace!(
            bus = %bus_id,
            event = E::name(),
            before = before.len(),
            after = after.len(),
            "dispatch started"
        );

        for entry in before.iter().filter(|e| e.is_active()) {
            let cb = entry.callback();
            invoke(policy, bus_id, Phase::Before, entry.id(), &mut failures, || {
                cb(&mut *event)
            });
        }

        event.execute(bus);

        let event: &E = event;
        for entry in after.iter().filter(|e| e.is_active()) {
            let cb = entry.callback();
            invoke(policy, bus_id, Phase::After, entry.id(), &mut failures, || cb(event));
        }

        trace!(bus = %bus_id, event = E::name(), failed = failures.len(), "dispatch finished");

        if failures.is_empty() {
            Ok(())
        } else {
            Err(DispatchError::HandlersPanicked {
                event: E::name(),
                failures,
            })
        }
    }

    /// Returns how many handlers `bus` has for this event type.
    pub fn handler_count(&self, bus: BusId) -> HandlerCount {
        self.buses
            .read()
            .get(&bus)
            .map(BusHandlers::count)
            .unwrap_or_default()
    }

    /// Returns how many buses currently have at least one handler.
    pub fn bus_count(&self) -> usize {
        self.buses.read().len()
    }

    fn snapshot(&self, bus: BusId) -> (HandlerList<PreHandler<E>>, HandlerList<PostHandler<E>>) {
        let buses = self.buses.read();
        match buses.get(&bus) {
            Some(h) => (Arc::clone(&h.before), Arc::clone(&h.after)),
            None => (Arc::default(), Arc::default()),
        }
    }
}

impl<E: Event> Unsubscribe for TypeRegistry<E> {
    fn unsubscribe(&self, bus: BusId, phase: Phase, id: SubscriptionId) -> bool {
        // Removed entries are dropped after the lock is released.
        let (before, after) = {
            let mut buses = self.buses.write();
            let Some(handlers) = buses.get_mut(&bus) else {
                return false;
            };
            let removed = match phase {
                Phase::Before => (remove_entry(&mut handlers.before, id), None),
                Phase::After => (None, remove_entry(&mut handlers.after, id)),
            };
            if handlers.is_empty() {
                buses.remove(&bus);
            }
            removed
        };
        before.is_some() || after.is_some()
    }

    fn is_registered(&self, bus: BusId, phase: Phase, id: SubscriptionId) -> bool {
        let buses = self.buses.read();
        let Some(handlers) = buses.get(&bus) else {
            return false;
        };
        match phase {
            Phase::Before => handlers.before.iter().any(|e| e.id() == id),
            Phase::After => handlers.after.iter().any(|e| e.id() == id),
        }
    }

    fn purge(&self, bus: BusId) -> usize {
        let Some(handlers) = self.buses.write().remove(&bus) else {
            return 0;
        };
        handlers.before.iter().for_each(|e| e.deactivate());
        handlers.after.iter().for_each(|e| e.deactivate());
        handlers.count().total()
    }

    fn registered(&self, bus: BusId) -> usize {
        self.handler_count(bus).total()
    }

    fn event_name(&self) -> &'static str {
        E::name()
    }
}

fn invoke(
    policy: FailurePolicy,
    bus: BusId,
    phase: Phase,
    subscription: SubscriptionId,
    failures: &mut Vec<HandlerPanic>,
    call: impl FnOnce(),
) {
    if !policy.is_isolating() {
        call();
        return;
    }
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(call)) {
        let message = panic_message(&*payload);
        error!(%bus, %phase, %subscription, panic = %message, "handler panicked; dispatch continues");
        failures.push(HandlerPanic {
            phase,
            subscription,
            message,
        });
    }
}
