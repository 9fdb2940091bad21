//! Dispatch and teardown policies.
//!
//! This module groups the knobs that control **what a failing handler does**
//! to a dispatch and **what happens to handlers** when their bus goes away.
//!
//! ## Contents
//! - [`FailurePolicy`]  propagate handler panics or isolate them
//! - [`TeardownPolicy`] purge or retain handlers when a bus is dropped
//!
//! ## Quick wiring
//! ```text
//! BusConfig { failure: FailurePolicy, teardown: TeardownPolicy }
//!      └─► EventBus uses:
//!           - failure in every dispatch() through its TypeRegistry
//!           - teardown in Drop
//! ```
//!
//! ## Defaults
//! - `FailurePolicy::Propagate` (a panicking handler aborts the dispatch).
//! - `TeardownPolicy::Purge` (dropping a bus drops its handlers).

mod failure;
mod teardown;

pub use failure::FailurePolicy;
pub use teardown::TeardownPolicy;
