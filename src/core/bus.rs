//! # Event bus: identity token and dispatch facade.
//!
//! [`EventBus`] owns no handler storage. It is the key that scopes subscriptions
//! and dispatches inside every [`TypeRegistry`](crate::TypeRegistry), plus the
//! configuration those registries consult.
//!
//! ## Architecture
//! ```text
//! bus.subscribe_before::<E>(cb) ──► Registries::registry::<E>() ──► TypeRegistry<E>::subscribe_before(bus.id, cb)
//! bus.subscribe_after::<E>(cb)  ──► Registries::registry::<E>() ──► TypeRegistry<E>::subscribe_after(bus.id, cb)
//! bus.dispatch(&mut ev)         ──► Registries::registry::<E>() ──► TypeRegistry<E>::dispatch(bus, ev)
//! ```
//!
//! ## Rules
//! - **Identity**: every bus gets a fresh [`BusId`]; `clone()` creates a new,
//!   empty identity bound to the same provider and configuration.
//! - **Isolation**: handlers registered on one bus never run for another bus.
//! - **Teardown**: on drop, [`TeardownPolicy`] decides whether handlers still
//!   registered under the bus are purged or left for their handles.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use super::builder::EventBusBuilder;
use super::config::BusConfig;
use crate::error::DispatchError;
use crate::events::Event;
use crate::ids::BusId;
use crate::policies::TeardownPolicy;
use crate::registry::{HandlerCount, Registries};
use crate::subscriptions::SubscriptionHandle;

/// Per-domain event bus.
///
/// ### Properties
/// - **Cheap**: an id, a config and an `Arc` to the registry provider.
/// - **Never equal**: there is no `PartialEq`; compare [`EventBus::id`] values instead.
/// - **Thread-safe**: `Send + Sync`; subscribe and dispatch from any thread.
pub struct EventBus {
    id: BusId,
    config: BusConfig,
    registries: Arc<Registries>,
}

impl EventBus {
    /// Creates a bus on the global registry provider with default configuration.
    pub fn new() -> Self {
        Self::with_config(BusConfig::default())
    }

    /// Creates a bus on the global registry provider with the given configuration.
    pub fn with_config(config: BusConfig) -> Self {
        EventBusBuilder::new(config).build()
    }

    /// Returns a builder for custom configuration or provider injection.
    pub fn builder() -> EventBusBuilder {
        EventBusBuilder::new(BusConfig::default())
    }

    pub(crate) fn from_parts(config: BusConfig, registries: Arc<Registries>) -> Self {
        let id = BusId::next();
        debug!(bus = %id, label = config.label_or_default(), "event bus created");
        Self {
            id,
            config,
            registries,
        }
    }

    /// Returns the bus identity.
    #[inline]
    pub fn id(&self) -> BusId {
        self.id
    }

    /// Returns the bus configuration.
    #[inline]
    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    /// Returns the registry provider this bus is bound to.
    #[inline]
    pub fn registries(&self) -> &Arc<Registries> {
        &self.registries
    }

    /// Registers a handler that runs before the internal action of `E`.
    ///
    /// The handler gets `&mut E` and may change the event before it takes effect.
    pub fn subscribe_before<E, F>(&self, cb: F) -> SubscriptionHandle
    where
        E: Event,
        F: Fn(&mut E) + Send + Sync + 'static,
    {
        self.registries.registry::<E>().subscribe_before(self.id, cb)
    }

    /// Registers a handler that runs after the internal action of `E`.
    ///
    /// The handler gets `&E` and observes the outcome.
    pub fn subscribe_after<E, F>(&self, cb: F) -> SubscriptionHandle
    where
        E: Event,
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.registries.registry::<E>().subscribe_after(self.id, cb)
    }

    /// Dispatches `event` through pre-handlers, its internal action and post-handlers.
    ///
    /// See [`TypeRegistry::dispatch`](crate::TypeRegistry::dispatch) for ordering
    /// and failure semantics.
    pub fn dispatch<E: Event>(&self, event: &mut E) -> Result<(), DispatchError> {
        self.registries.registry::<E>().dispatch(self, event)
    }

    /// Returns how many handlers this bus has for `E`.
    ///
    /// Read-only: an event type nobody subscribed to or dispatched yet reports zero
    /// without creating a registry for it.
    pub fn handler_count<E: Event>(&self) -> HandlerCount {
        self.registries
            .lookup::<E>()
            .map(|r| r.handler_count(self.id))
            .unwrap_or_default()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for EventBus {
    /// Creates a **new identity** with the same provider and configuration.
    ///
    /// Handlers of `self` are not copied.
    fn clone(&self) -> Self {
        Self::from_parts(self.config.clone(), Arc::clone(&self.registries))
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("id", &self.id)
            .field("config", &self.config)
            .finish()
    }
}

impl Drop for EventBus {
    fn drop(&mut self) {
        let label = self.config.label_or_default();
        match self.config.teardown {
            TeardownPolicy::Purge => {
                let removed = self.registries.purge(self.id);
                debug!(bus = %self.id, label, removed, "event bus dropped");
            }
            TeardownPolicy::Retain => {
                let orphaned = self.registries.handler_total(self.id);
                if orphaned > 0 {
                    warn!(bus = %self.id, label, orphaned, "event bus dropped with registered handlers");
                } else {
                    debug!(bus = %self.id, label, "event bus dropped");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FailurePolicy, Phase};
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Mutex, mpsc};

    type Log = Arc<Mutex<Vec<String>>>;

    fn log() -> Log {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn entries(log: &Log) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    /// Event whose internal action sets `count = 1`.
    struct Counter {
        count: u32,
    }

    impl Event for Counter {
        fn execute(&mut self, _bus: &EventBus) {
            self.count = 1;
        }
    }

    /// Event whose internal action writes into a shared log.
    struct Logged {
        log: Log,
    }

    impl Event for Logged {
        fn execute(&mut self, _bus: &EventBus) {
            self.log.lock().unwrap().push("internal".into());
        }
    }

    fn isolated() -> EventBus {
        EventBus::builder().with_registries(Registries::new()).build()
    }

    fn record_before(bus: &EventBus, log: &Log, name: &'static str) -> SubscriptionHandle {
        let log = Arc::clone(log);
        bus.subscribe_before(move |_: &mut Logged| log.lock().unwrap().push(name.into()))
    }

    fn record_after(bus: &EventBus, log: &Log, name: &'static str) -> SubscriptionHandle {
        let log = Arc::clone(log);
        bus.subscribe_after(move |_: &Logged| log.lock().unwrap().push(name.into()))
    }

    #[test]
    fn test_zero_subscribers_runs_internal_action_only() {
        let bus = isolated();
        let log = log();

        bus.dispatch(&mut Logged { log: Arc::clone(&log) }).unwrap();
        assert_eq!(entries(&log), vec!["internal"]);
    }

    #[test]
    fn test_scenario_pre_and_post_observe_action() {
        let bus = isolated();
        let seen_before = Arc::new(Mutex::new(None));
        let seen_after = Arc::new(Mutex::new(None));

        let s = Arc::clone(&seen_before);
        let _incr = bus.subscribe_before(move |e: &mut Counter| {
            *s.lock().unwrap() = Some(e.count);
        });
        let s = Arc::clone(&seen_after);
        let _decr = bus.subscribe_after(move |e: &Counter| {
            *s.lock().unwrap() = Some(e.count);
        });

        let mut ev = Counter { count: 0 };
        bus.dispatch(&mut ev).unwrap();

        assert_eq!(*seen_before.lock().unwrap(), Some(0));
        assert_eq!(ev.count, 1);
        assert_eq!(*seen_after.lock().unwrap(), Some(1));
    }

    #[test]
    fn test_scenario_bus_isolation() {
        let b1 = isolated();
        let b2 = EventBus::builder()
            .with_registries(Arc::clone(b1.registries()))
            .build();
        let l1 = Arc::new(AtomicUsize::new(0));
        let l2 = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&l1);
        let _h1 = b1.subscribe_before(move |_: &mut Counter| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        let c = Arc::clone(&l2);
        let _h2 = b2.subscribe_before(move |_: &mut Counter| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        b1.dispatch(&mut Counter { count: 0 }).unwrap();
        assert_eq!(l1.load(Ordering::SeqCst), 1);
        assert_eq!(l2.load(Ordering::SeqCst), 0, "b2 listener must not run for b1");
    }

    #[test]
    fn test_scenario_strict_sequence() {
        let bus = isolated();
        let log = log();

        // Two listeners, each with one pre and one post handler.
        let _s1 = record_before(&bus, &log, "pre1");
        let _s2 = record_after(&bus, &log, "post1");
        let _s3 = record_before(&bus, &log, "pre2");
        let _s4 = record_after(&bus, &log, "post2");

        bus.dispatch(&mut Logged { log: Arc::clone(&log) }).unwrap();
        assert_eq!(entries(&log), vec!["pre1", "pre2", "internal", "post1", "post2"]);
    }

    #[test]
    fn test_registration_order_and_surgical_release() {
        let bus = isolated();
        let log = log();

        let _h1 = record_before(&bus, &log, "h1");
        let mut h2 = record_before(&bus, &log, "h2");
        let _h3 = record_before(&bus, &log, "h3");

        bus.dispatch(&mut Logged { log: Arc::clone(&log) }).unwrap();
        assert_eq!(entries(&log), vec!["h1", "h2", "h3", "internal"]);

        assert!(h2.release());
        assert!(!h2.release());
        log.lock().unwrap().clear();

        bus.dispatch(&mut Logged { log: Arc::clone(&log) }).unwrap();
        assert_eq!(entries(&log), vec!["h1", "h3", "internal"]);
    }

    #[test]
    fn test_clone_is_distinct_identity() {
        let bus = isolated();
        let _h = bus.subscribe_before(|_: &mut Counter| {});

        let copy = bus.clone();
        assert_ne!(copy.id(), bus.id());
        assert!(Arc::ptr_eq(copy.registries(), bus.registries()));
        assert!(copy.handler_count::<Counter>().is_empty());
        assert_eq!(bus.handler_count::<Counter>().before, 1);
    }

    #[test]
    fn test_drop_purges_by_default() {
        let regs = Registries::new();
        let bus = EventBus::builder().with_registries(Arc::clone(&regs)).build();
        let id = bus.id();
        let mut handle = bus.subscribe_after(|_: &Counter| {});

        drop(bus);
        assert_eq!(regs.handler_total(id), 0);
        assert!(!handle.is_active());
        assert!(!handle.release(), "purged handle releases as no-op");
    }

    #[test]
    fn test_drop_with_retain_keeps_handlers_until_release() {
        let regs = Registries::new();
        let bus = EventBus::builder()
            .with_registries(Arc::clone(&regs))
            .with_teardown_policy(TeardownPolicy::Retain)
            .with_label("retained")
            .build();
        let id = bus.id();
        let mut handle = bus.subscribe_before(|_: &mut Counter| {});

        drop(bus);
        assert_eq!(regs.handler_total(id), 1);
        assert!(handle.release());
        assert_eq!(regs.handler_total(id), 0);
    }

    #[test]
    fn test_reentrant_subscribe_and_release_during_dispatch() {
        let bus = Arc::new(isolated());
        let log = log();
        let added: Arc<Mutex<Vec<SubscriptionHandle>>> = Arc::new(Mutex::new(Vec::new()));
        let victim: Arc<Mutex<Option<SubscriptionHandle>>> = Arc::new(Mutex::new(None));

        let _first = {
            let (bus_ref, log, added, victim) = (
                Arc::clone(&bus),
                Arc::clone(&log),
                Arc::clone(&added),
                Arc::clone(&victim),
            );
            bus.subscribe_before(move |_: &mut Logged| {
                log.lock().unwrap().push("first".into());
                let late = Arc::clone(&log);
                added.lock().unwrap().push(bus_ref.subscribe_before(move |_: &mut Logged| {
                    late.lock().unwrap().push("late".into())
                }));
                if let Some(mut h) = victim.lock().unwrap().take() {
                    h.release();
                }
            })
        };
        *victim.lock().unwrap() = Some(record_before(&bus, &log, "victim"));
        let _last = record_after(&bus, &log, "last");

        bus.dispatch(&mut Logged { log: Arc::clone(&log) }).unwrap();
        assert_eq!(
            entries(&log),
            vec!["first", "internal", "last"],
            "released entry skipped, new entry deferred, unrelated entries kept"
        );

        log.lock().unwrap().clear();
        bus.dispatch(&mut Logged { log: Arc::clone(&log) }).unwrap();
        assert_eq!(entries(&log), vec!["first", "late", "internal", "last"]);
        added.lock().unwrap().clear();
    }

    #[test]
    fn test_nested_dispatch_from_internal_action() {
        struct Outer;
        struct Inner;

        impl Event for Outer {
            fn execute(&mut self, bus: &EventBus) {
                bus.dispatch(&mut Inner).unwrap();
            }
        }
        impl Event for Inner {
            fn execute(&mut self, _bus: &EventBus) {}
        }

        let bus = isolated();
        let inner_seen = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&inner_seen);
        let _h = bus.subscribe_after(move |_: &Inner| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        let _outer = bus.subscribe_before(|_: &mut Outer| {});

        bus.dispatch(&mut Outer).unwrap();
        assert_eq!(inner_seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_propagate_policy_unwinds_and_aborts_dispatch() {
        let bus = isolated();
        let log = log();

        let _a = record_before(&bus, &log, "a");
        let _boom = bus.subscribe_before(|_: &mut Logged| panic!("boom"));
        let _b = record_before(&bus, &log, "b");
        let _c = record_after(&bus, &log, "c");

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let _ = bus.dispatch(&mut Logged { log: Arc::clone(&log) });
        }));
        assert!(result.is_err(), "panic must reach the caller");
        assert_eq!(entries(&log), vec!["a"]);

        // Registry stays usable after the unwind.
        assert_eq!(bus.handler_count::<Logged>().total(), 4);
    }

    #[test]
    fn test_isolate_policy_collects_panics_and_runs_all_phases() {
        let bus = EventBus::builder()
            .with_registries(Registries::new())
            .with_failure_policy(FailurePolicy::Isolate)
            .build();
        let log = log();

        let _a = record_before(&bus, &log, "a");
        let boom = bus.subscribe_before(|_: &mut Logged| panic!("boom"));
        let _b = record_before(&bus, &log, "b");
        let bang = bus.subscribe_after(|_: &Logged| panic!("{}", String::from("bang")));
        let _c = record_after(&bus, &log, "c");

        let err = bus
            .dispatch(&mut Logged { log: Arc::clone(&log) })
            .expect_err("panics reported as error");
        assert_eq!(entries(&log), vec!["a", "b", "internal", "c"]);
        assert_eq!(err.as_label(), "dispatch_handlers_panicked");

        let failures = err.failures();
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].phase, Phase::Before);
        assert_eq!(failures[0].subscription, boom.id());
        assert_eq!(failures[0].message, "boom");
        assert_eq!(failures[1].phase, Phase::After);
        assert_eq!(failures[1].subscription, bang.id());
        assert_eq!(failures[1].message, "bang");
    }

    #[test]
    fn test_isolate_policy_still_propagates_action_panic() {
        struct Exploding;

        impl Event for Exploding {
            fn execute(&mut self, _bus: &EventBus) {
                panic!("action failed");
            }
        }

        let bus = EventBus::builder()
            .with_registries(Registries::new())
            .with_failure_policy(FailurePolicy::Isolate)
            .build();
        let before_ran = Arc::new(AtomicBool::new(false));
        let after_hits = Arc::new(AtomicUsize::new(0));

        let b = Arc::clone(&before_ran);
        let _pre = bus.subscribe_before(move |_: &mut Exploding| b.store(true, Ordering::SeqCst));
        let a = Arc::clone(&after_hits);
        let _post = bus.subscribe_after(move |_: &Exploding| {
            a.fetch_add(1, Ordering::SeqCst);
        });

        let result = panic::catch_unwind(AssertUnwindSafe(|| bus.dispatch(&mut Exploding)));
        assert!(result.is_err(), "internal action panic must reach the caller");
        assert!(before_ran.load(Ordering::SeqCst));
        assert_eq!(after_hits.load(Ordering::SeqCst), 0, "post-handlers must not run");
    }

    #[test]
    fn test_release_from_other_thread_skips_unchecked_entries() {
        let bus = isolated();
        let log = log();
        let (entered_tx, entered_rx) = mpsc::channel::<()>();
        let (resume_tx, resume_rx) = mpsc::channel::<()>();
        let resume_rx = Mutex::new(resume_rx);

        // Parks the first dispatch until the main thread lets it go; later
        // dispatches pass straight through once `resume_tx` is dropped.
        let gate_log = Arc::clone(&log);
        let _gate = bus.subscribe_before(move |_: &mut Logged| {
            gate_log.lock().unwrap().push("gate".into());
            let _ = entered_tx.send(());
            let _ = resume_rx.lock().unwrap().recv();
        });
        let mut late_before = record_before(&bus, &log, "late_before");
        let mut late_after = record_after(&bus, &log, "late_after");

        std::thread::scope(|scope| {
            let worker = scope.spawn(|| bus.dispatch(&mut Logged { log: Arc::clone(&log) }));
            entered_rx.recv().unwrap();

            assert!(late_before.release());
            assert!(late_after.release());
            resume_tx.send(()).unwrap();

            worker.join().unwrap().unwrap();
        });
        assert_eq!(
            entries(&log),
            vec!["gate", "internal"],
            "entries released before their activity check must be skipped"
        );

        drop(resume_tx);
        log.lock().unwrap().clear();
        bus.dispatch(&mut Logged { log: Arc::clone(&log) }).unwrap();
        assert_eq!(entries(&log), vec!["gate", "internal"]);
    }

    #[test]
    fn test_release_on_other_bus_during_dispatch() {
        let regs = Registries::new();
        let b1 = EventBus::builder().with_registries(Arc::clone(&regs)).build();
        let b2 = EventBus::builder().with_registries(Arc::clone(&regs)).build();
        let (entered_tx, entered_rx) = mpsc::channel::<()>();
        let (resume_tx, resume_rx) = mpsc::channel::<()>();
        let resume_rx = Mutex::new(resume_rx);
        let tail_hits = Arc::new(AtomicUsize::new(0));

        let _slow = b1.subscribe_before(move |_: &mut Counter| {
            let _ = entered_tx.send(());
            let _ = resume_rx.lock().unwrap().recv();
        });
        let t = Arc::clone(&tail_hits);
        let _tail = b1.subscribe_after(move |_: &Counter| {
            t.fetch_add(1, Ordering::SeqCst);
        });
        let mut other = b2.subscribe_after(|_: &Counter| panic!("b2 handler must not run"));

        std::thread::scope(|scope| {
            let worker = scope.spawn(|| b1.dispatch(&mut Counter { count: 0 }));
            entered_rx.recv().unwrap();

            assert!(other.release());
            assert!(b2.handler_count::<Counter>().is_empty());
            resume_tx.send(()).unwrap();

            worker.join().unwrap().unwrap();
        });

        assert_eq!(tail_hits.load(Ordering::SeqCst), 1);
        assert_eq!(b1.handler_count::<Counter>(), HandlerCount { before: 1, after: 1 });
    }

    #[test]
    fn test_handler_count_does_not_create_registry() {
        let regs = Registries::new();
        let bus = EventBus::builder().with_registries(Arc::clone(&regs)).build();

        assert!(bus.handler_count::<Counter>().is_empty());
        assert_eq!(regs.type_count(), 0, "read-only query must not materialize a registry");

        let _h = bus.subscribe_after(|_: &Counter| {});
        assert_eq!(regs.type_count(), 1);
        assert_eq!(bus.handler_count::<Counter>(), HandlerCount { before: 0, after: 1 });
    }

    #[test]
    fn test_concurrent_subscribe_release_dispatch() {
        let bus = Arc::new(isolated());
        let hits = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&hits);
        let _keep = bus.subscribe_before(move |_: &mut Counter| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        std::thread::scope(|scope| {
            for _ in 0..4 {
                let bus = Arc::clone(&bus);
                scope.spawn(move || {
                    for _ in 0..200 {
                        let mut h = bus.subscribe_after(|_: &Counter| {});
                        bus.dispatch(&mut Counter { count: 0 }).unwrap();
                        assert!(h.release());
                    }
                });
            }
        });

        assert_eq!(hits.load(Ordering::SeqCst), 800);
        assert_eq!(bus.handler_count::<Counter>(), HandlerCount { before: 1, after: 0 });
    }

    #[test]
    fn test_global_buses_are_isolated() {
        let b1 = EventBus::new();
        let b2 = EventBus::default();
        let hits = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&hits);
        let _h = b1.subscribe_after(move |_: &Counter| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        b2.dispatch(&mut Counter { count: 0 }).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        b1.dispatch(&mut Counter { count: 0 }).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
