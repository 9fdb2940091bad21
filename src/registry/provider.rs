//! # Registry provider: the type-indexed map of [`TypeRegistry`] instances.
//!
//! [`Registries`] is the single access path from an [`EventBus`](crate::EventBus)
//! to handler storage. It creates one [`TypeRegistry<E>`] per event type on first
//! use and keeps it for its own lifetime.
//!
//! ## Architecture
//! ```text
//! Registries
//!   └─► RwLock<HashMap<TypeId, Slot>>
//!            ├─ TypeId(Damage)   → Arc<TypeRegistry<Damage>>
//!            └─ TypeId(Tick)     → Arc<TypeRegistry<Tick>>
//! ```
//!
//! ## Rules
//! - `Registries::global()` is created lazily on first access and lives until
//!   process exit. Buses built with [`EventBus::new`](crate::EventBus::new) use it.
//! - `Registries::new()` builds an isolated provider; buses bound to it never see
//!   handlers of the global one. Dropping it turns outstanding handles into no-ops.
//! - Lookups take a read lock; construction is double-checked under the write lock.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use tracing::debug;

use super::type_registry::{TypeRegistry, Unsubscribe};
use crate::events::Event;
use crate::ids::BusId;

static GLOBAL: OnceLock<Arc<Registries>> = OnceLock::new();

/// Two views of the same registry: typed (for lookup) and erased (for teardown).
struct Slot {
    typed: Arc<dyn Any + Send + Sync>,
    erased: Arc<dyn Unsubscribe>,
}

impl Slot {
    fn new<E: Event>(registry: &Arc<TypeRegistry<E>>) -> Self {
        Self {
            typed: Arc::clone(registry) as Arc<dyn Any + Send + Sync>,
            erased: Arc::clone(registry) as Arc<dyn Unsubscribe>,
        }
    }

    fn downcast<E: Event>(&self) -> Option<Arc<TypeRegistry<E>>> {
        Arc::clone(&self.typed).downcast::<TypeRegistry<E>>().ok()
    }
}

/// Provider of per-event-type registries.
pub struct Registries {
    types: RwLock<HashMap<TypeId, Slot>>,
}

impl Registries {
    /// Creates an isolated provider.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            types: RwLock::new(HashMap::new()),
        })
    }

    /// Returns the process-wide provider.
    pub fn global() -> Arc<Self> {
        Arc::clone(GLOBAL.get_or_init(Self::new))
    }

    /// Returns the registry for `E`, creating it on first use.
    pub fn registry<E: Event>(&self) -> Arc<TypeRegistry<E>> {
        let key = TypeId::of::<E>();

        if let Some(found) = self.types.read().get(&key).and_then(Slot::downcast::<E>) {
            return found;
        }

        let mut types = self.types.write();
        if let Some(found) = types.get(&key).and_then(Slot::downcast::<E>) {
            return found;
        }
        let registry = Arc::new(TypeRegistry::<E>::new());
        types.insert(key, Slot::new(&registry));
        debug!(event = E::name(), "type registry created");
        registry
    }

    /// Returns the registry for `E` if one was already created.
    ///
    /// Unlike [`registry`](Self::registry), this never allocates a new one.
    pub fn lookup<E: Event>(&self) -> Option<Arc<TypeRegistry<E>>> {
        self.types
            .read()
            .get(&TypeId::of::<E>())
            .and_then(Slot::downcast::<E>)
    }

    /// Removes every handler registered under `bus`, across all event types.
    ///
    /// Returns the number of removed handlers.
    pub fn purge(&self, bus: BusId) -> usize {
        self.erased()
            .iter()
            .map(|r| {
                let removed = r.purge(bus);
                if removed > 0 {
                    debug!(%bus, event = r.event_name(), removed, "handlers purged");
                }
                removed
            })
            .sum()
    }

    /// Returns the number of handlers registered under `bus`, across all event types.
    pub fn handler_total(&self, bus: BusId) -> usize {
        self.erased().iter().map(|r| r.registered(bus)).sum()
    }

    /// Returns how many event types have a registry so far.
    pub fn type_count(&self) -> usize {
        self.types.read().len()
    }

    // Cloned out so no provider lock is held while registry locks are taken.
    fn erased(&self) -> Vec<Arc<dyn Unsubscribe>> {
        self.types
            .read()
            .values()
            .map(|slot| Arc::clone(&slot.erased))
            .collect()
    }
}

impl fmt::Debug for Registries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registries")
            .field("types", &self.type_count())
            .finish()
    }
}
