//! # phasebus
//!
//! **phasebus** is a typed, in-process event bus for Rust.
//!
//! Independent subscribers attach *before* and *after* handlers to a specific
//! event type on a specific bus. Dispatching an event runs a fixed three-phase
//! sequence: pre-handlers, the event's own internal action, post-handlers.
//! Buses are isolated from each other, and every subscription is an owned
//! handle that unregisters its handler when released or dropped.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  EventBus A  │   │  EventBus B  │   │  EventBus C  │
//!     │  (bus#1)     │   │  (bus#2)     │   │  (bus#3)     │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Registries (global provider, or an isolated one per test)        │
//! │  TypeId ──► TypeRegistry<E> (created on first use)                │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │TypeRegistry  │   │TypeRegistry  │   │TypeRegistry  │
//!     │  <Damage>    │   │  <Tick>      │   │  <Move>      │
//!     └┬─────────────┘   └┬─────────────┘   └┬─────────────┘
//!      │ bus#1 → before [h1, h2], after [h3]
//!      │ bus#2 → before [h4],     after []
//!      ▼
//!   SubscriptionHandle (one per handler, weak back-reference, removes by id)
//! ```
//!
//! ### Dispatch
//! ```text
//! bus.dispatch(&mut ev)
//!   ├─► snapshot before/after lists for (E, bus)      (lock released)
//!   ├─► for h in before: if active → h(&mut ev)       (registration order)
//!   ├─► ev.execute(&bus)                              (internal action, once)
//!   └─► for h in after:  if active → h(&ev)           (registration order)
//!
//! Handler panic:
//!   FailurePolicy::Propagate → unwinds out of dispatch (default)
//!   FailurePolicy::Isolate   → caught, logged, Err(HandlersPanicked) at the end
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                       |
//! |-------------------|---------------------------------------------------------------|------------------------------------------|
//! | **Events**        | Implement the internal action of an event type.               | [`Event`], [`PreHandler`], [`PostHandler`] |
//! | **Buses**         | Scope subscriptions and dispatches to one logical domain.     | [`EventBus`], [`EventBusBuilder`]        |
//! | **Subscriptions** | Owned handles; release or drop to unsubscribe.                | [`SubscriptionHandle`]                   |
//! | **Registries**    | Type-indexed handler storage, global or isolated.             | [`Registries`], [`TypeRegistry`]         |
//! | **Policies**      | Handler panic handling and bus teardown behavior.             | [`FailurePolicy`], [`TeardownPolicy`]    |
//! | **Errors**        | Typed dispatch errors.                                        | [`DispatchError`], [`HandlerPanic`]      |
//! | **Configuration** | Per-bus settings.                                             | [`BusConfig`]                            |
//!
//! ## Logging
//! The crate emits [`tracing`] events (`debug` for subscribe/release/teardown,
//! `trace` per dispatch, `warn` for orphaned handlers, `error` for isolated
//! panics). It never installs a subscriber.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use phasebus::{Event, EventBus};
//!
//! struct FrameAdvance {
//!     frame: u32,
//!     frames: u32,
//! }
//!
//! impl Event for FrameAdvance {
//!     fn execute(&mut self, _bus: &EventBus) {
//!         self.frame = (self.frame + 1) % self.frames;
//!     }
//! }
//!
//! let bus = EventBus::new();
//! let wraps = Arc::new(AtomicU32::new(0));
//!
//! // Before: freeze the last frame instead of wrapping.
//! let _hold = bus.subscribe_before(|ev: &mut FrameAdvance| {
//!     if ev.frame + 1 == ev.frames {
//!         ev.frame -= 1;
//!     }
//! });
//!
//! // After: observe the result.
//! let counter = Arc::clone(&wraps);
//! let _watch = bus.subscribe_after(move |ev: &FrameAdvance| {
//!     if ev.frame == 0 {
//!         counter.fetch_add(1, Ordering::Relaxed);
//!     }
//! });
//!
//! let mut ev = FrameAdvance { frame: 3, frames: 4 };
//! bus.dispatch(&mut ev).unwrap();
//! assert_eq!(ev.frame, 3);
//! assert_eq!(wraps.load(Ordering::Relaxed), 0);
//! ```
mod core;
mod error;
mod events;
mod ids;
mod policies;
mod registry;
mod subscriptions;

// ---- Public re-exports ----

pub use self::core::{BusConfig, EventBus, EventBusBuilder};
pub use error::{DispatchError, HandlerPanic};
pub use events::{Event, Phase, PostHandler, PreHandler};
pub use ids::{BusId, SubscriptionId};
pub use policies::{FailurePolicy, TeardownPolicy};
pub use registry::{HandlerCount, Registries, TypeRegistry};
pub use subscriptions::SubscriptionHandle;
