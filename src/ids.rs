//! Process-unique identities for buses and handler entries.
//!
//! Both identities come from global monotonic counters and are never reused within
//! a process, so a bus created after another one is dropped can never pick up
//! handlers that were left behind under the old identity.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

static BUS_SEQ: AtomicU64 = AtomicU64::new(1);
static SUBSCRIPTION_SEQ: AtomicU64 = AtomicU64::new(1);

/// Identity of an [`EventBus`](crate::EventBus).
///
/// Handlers are scoped by this value inside every type registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BusId(u64);

impl BusId {
    pub(crate) fn next() -> Self {
        Self(BUS_SEQ.fetch_add(1, AtomicOrdering::Relaxed))
    }

    /// Returns the raw counter value.
    #[inline]
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for BusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bus#{}", self.0)
    }
}

/// Identity of one registered handler.
///
/// Callbacks are not comparable, so removal and failure reports go through this id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub(crate) fn next() -> Self {
        Self(SUBSCRIPTION_SEQ.fetch_add(1, AtomicOrdering::Relaxed))
    }

    /// Returns the raw counter value.
    #[inline]
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}
