//! Ownership-scoped subscriptions.
//!
//! Every `subscribe_*` call returns a [`SubscriptionHandle`]; the handler lives
//! exactly as long as the handle (unless the handle is detached).

mod handle;

pub use handle::SubscriptionHandle;
