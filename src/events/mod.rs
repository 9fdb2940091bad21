//! Event contract: the trait every dispatchable type implements and the
//! handler shapes that can be attached to it.
//!
//! ## Contents
//! - [`Event`] internal action + display name
//! - [`PreHandler`], [`PostHandler`] closure shapes for each phase
//! - [`Phase`] which side of the internal action a handler runs on

mod event;

pub use event::{Event, Phase, PostHandler, PreHandler};
