//! Observer plumbing shared by the stores.
//!
//! An owned collection of observer handles with deterministic add/remove and
//! synchronous, in-registration-order dispatch. Removal is by handle
//! identity; dispatch runs against a snapshot, so unregistering during an
//! in-flight dispatch affects the next dispatch, never the current one.

use std::sync::Arc;

use parking_lot::RwLock;

pub trait Observer<E>: Send + Sync {
    fn notify(&self, event: &E);
}

pub struct Observers<E> {
    handles: RwLock<Vec<Arc<dyn Observer<E>>>>,
}

impl<E> Observers<E> {
    pub fn new() -> Self {
        Self {
            handles: RwLock::new(Vec::new()),
        }
    }

    pub fn add(&self, observer: Arc<dyn Observer<E>>) {
        self.handles.write().push(observer);
    }

    /// Remove a previously added handle. Comparison is by identity, not by
    /// value; passing a clone of the registered `Arc` matches.
    pub fn remove(&self, observer: &Arc<dyn Observer<E>>) {
        self.handles
            .write()
            .retain(|handle| !same_handle(handle, observer));
    }

    pub fn notify_all(&self, event: &E) {
        let snapshot: Vec<Arc<dyn Observer<E>>> = self.handles.read().clone();
        for handle in snapshot {
            handle.notify(event);
        }
    }

    pub fn len(&self) -> usize {
        self.handles.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.read().is_empty()
    }
}

impl<E> Default for Observers<E> {
    fn default() -> Self {
        Self::new()
    }
}

fn same_handle<E>(a: &Arc<dyn Observer<E>>, b: &Arc<dyn Observer<E>>) -> bool {
    // Compare the data pointers only; the vtable half of the fat pointer is
    // not stable across codegen units.
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

#[cfg(test)]
#[path = "tests/observer_tests.rs"]
mod tests;
