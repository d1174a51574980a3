//! The actor registry: every actor of a system, indexed by its [ActorId](../actor/struct.ActorId.html).
//!
//! Each record lives in its own `Arc`, so growing the slot vector never moves a record a worker is using.
//! Lookups take the lock shared; only appending takes it exclusively.

use crate::actor::{ActorCell, ActorId, Role};
use crate::errors::LockOrDie;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

/// Slots reserved when a registry is created.
const INITIAL_SLOTS: usize = 64;

#[derive(Debug)]
pub(crate) struct Registry {
    slots: RwLock<Vec<Arc<ActorCell>>>,
    /// Ids handed out so far; not reset by [clear](#method.clear).
    issued: AtomicUsize,
    limit: usize,
    mailbox_capacity: usize,
}

impl Registry {
    pub(crate) fn new(limit: usize, mailbox_capacity: usize) -> Registry {
        Registry {
            slots: RwLock::new(Vec::with_capacity(limit.min(INITIAL_SLOTS))),
            issued: AtomicUsize::new(0),
            limit,
            mailbox_capacity,
        }
    }

    /// Append a new actor playing `role` and return its id.
    ///
    /// Returns ```None``` once the actor limit is reached.
    pub(crate) fn create_actor(&self, role: Role) -> Option<ActorId> {
        let mut slots = self.slots.write().or_die("registry lock");
        let count = slots.len();
        if count >= self.limit {
            return None;
        }
        if count == slots.capacity() {
            // double, but never past the limit
            let grow_by = count.max(1).min(self.limit - count);
            slots.reserve_exact(grow_by);
        }
        let id = ActorId(count);
        slots.push(Arc::new(ActorCell::new(id, role, self.mailbox_capacity)));
        self.issued.store(slots.len(), Ordering::Release);
        Some(id)
    }

    /// Get the record of actor `id`, if it exists.
    pub(crate) fn lookup(&self, id: ActorId) -> Option<Arc<ActorCell>> {
        let slots = self.slots.read().or_die("registry lock");
        slots.get(id.index()).cloned()
    }

    /// Returns ```true``` if `id` was ever issued by this registry, even if it was reclaimed since.
    pub(crate) fn knows(&self, id: ActorId) -> bool {
        id.index() < self.issued.load(Ordering::Acquire)
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.read().or_die("registry lock").len()
    }

    /// Call `f` on every record, holding the lock shared.
    pub(crate) fn for_each<F: FnMut(&ActorCell)>(&self, mut f: F) {
        let slots = self.slots.read().or_die("registry lock");
        for cell in slots.iter() {
            f(cell);
        }
    }

    /// Reclaim every record (teardown only).
    pub(crate) fn clear(&self) {
        let cells: Vec<Arc<ActorCell>> = {
            let mut slots = self.slots.write().or_die("registry lock");
            slots.drain(..).collect()
        };
        // states may own arbitrary user data, drop it outside the lock
        for cell in cells {
            cell.reclaim();
        }
    }
}
