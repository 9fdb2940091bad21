//! Bus facade and its configuration.
//!
//! The only handler-facing type from this module is [`EventBus`]: an identity
//! token plus configuration that forwards subscribe/dispatch calls to the
//! [`TypeRegistry`](crate::TypeRegistry) of the event type.
//!
//! Internal modules:
//! - [`bus`]: identity, forwarding, clone and teardown semantics;
//! - [`builder`]: optional configuration and provider injection;
//! - [`config`]: per-bus policies.

mod builder;
mod bus;
mod config;

pub use builder::EventBusBuilder;
pub use bus::EventBus;
pub use config::BusConfig;
