//! # Bus configuration.
//!
//! Provides [`BusConfig`], the per-bus settings consulted on every dispatch and
//! when the bus is dropped.
//!
//! Config is used in two ways:
//! 1. **Bus creation**: `EventBus::with_config(config)` or `EventBus::builder().with_config(config)`
//! 2. **Dispatch**: `TypeRegistry::dispatch` reads `failure` from the dispatching bus
//!
//! Clones of a bus (new identities) inherit its configuration.

use crate::policies::{FailurePolicy, TeardownPolicy};

/// Configuration of one [`EventBus`](crate::EventBus).
///
/// ## Field semantics
/// - `failure`: what a panicking handler does to the dispatch
/// - `teardown`: what happens to remaining handlers when the bus is dropped
/// - `label`: optional domain name shown in logs (e.g. `"animation"`)
///
/// ## Notes
/// All fields are public; there are no sentinel values.
#[derive(Clone, Debug, Default)]
pub struct BusConfig {
    /// Handler panic policy.
    ///
    /// - `Propagate` = the panic unwinds out of `dispatch` (default)
    /// - `Isolate` = panics are caught and returned as `DispatchError::HandlersPanicked`
    pub failure: FailurePolicy,

    /// Drop-time cleanup policy.
    ///
    /// - `Purge` = remove every handler registered under the bus (default)
    /// - `Retain` = keep them until their handles are released; leftovers are logged
    pub teardown: TeardownPolicy,

    /// Human-readable bus name for logs. `None` by default.
    pub label: Option<String>,
}

impl BusConfig {
    /// Returns the label or `"-"` when unset.
    #[inline]
    pub fn label_or_default(&self) -> &str {
        self.label.as_deref().unwrap_or("-")
    }
}
