//! Handler storage: the provider, per-type registries, and entries.
//!
//! - [`Registries`] type-indexed provider (global or isolated)
//! - [`TypeRegistry`] ordered pre/post lists per bus and three-phase dispatch
//! - `entry` copy-on-write lists of shared handler entries

mod entry;
mod provider;
mod type_registry;

pub use provider::Registries;
pub(crate) use type_registry::Unsubscribe;
pub use type_registry::{HandlerCount, TypeRegistry};
