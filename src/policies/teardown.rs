//! # Bus teardown policies.
//!
//! [`TeardownPolicy`] decides what happens to handlers still registered under a
//! bus identity when the [`EventBus`](crate::EventBus) is dropped.
//!
//! ```text
//! TeardownPolicy::Purge   → every entry for the bus is removed from every
//!                           type registry; outstanding handles release as no-ops
//! TeardownPolicy::Retain  → entries stay until their handles are released;
//!                           leftovers are logged as orphaned
//! ```
//!
//! Bus identities are never reused, so retained entries can never be invoked
//! by a different bus. They only cost memory.

/// Policy controlling handler cleanup when a bus is dropped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TeardownPolicy {
    /// Remove every handler registered under the bus (default).
    #[default]
    Purge,
    /// Leave handlers in place; only their handles can remove them.
    Retain,
}
