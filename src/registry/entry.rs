//! Handler entries and the copy-on-write lists that hold them.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

use crate::ids::SubscriptionId;

/// One registered callback.
///
/// Shared between the registry list and any dispatch snapshot that captured it.
/// `active` flips to `false` exactly once, when the entry is removed; dispatch
/// checks it before every invocation.
pub(crate) struct HandlerEntry<F: ?Sized> {
    id: SubscriptionId,
    active: AtomicBool,
    callback: Box<F>,
}

impl<F: ?Sized> HandlerEntry<F> {
    pub(crate) fn new(id: SubscriptionId, callback: Box<F>) -> Arc<Self> {
        Arc::new(Self {
            id,
            active: AtomicBool::new(true),
            callback,
        })
    }

    #[inline]
    pub(crate) fn id(&self) -> SubscriptionId {
        self.id
    }

    #[inline]
    pub(crate) fn is_active(&self) -> bool {
        self.active.load(AtomicOrdering::Acquire)
    }

    #[inline]
    pub(crate) fn deactivate(&self) {
        self.active.store(false, AtomicOrdering::Release);
    }

    #[inline]
    pub(crate) fn callback(&self) -> &F {
        &self.callback
    }
}

/// Ordered handler list. Writers go through `Arc::make_mut`, so snapshots taken
/// by in-flight dispatches never observe a mutation.
pub(crate) type HandlerList<F> = Arc<Vec<Arc<HandlerEntry<F>>>>;

/// Removes the entry with `id`, preserving the order of the others.
///
/// The removed entry is deactivated and returned so the caller can drop it
/// outside of any lock (callbacks may own subscription handles).
pub(crate) fn remove_entry<F: ?Sized>(
    list: &mut HandlerList<F>,
    id: SubscriptionId,
) -> Option<Arc<HandlerEntry<F>>> {
    let pos = list.iter().position(|e| e.id() == id)?;
    let entry = Arc::make_mut(list).remove(pos);
    entry.deactivate();
    Some(entry)
}
