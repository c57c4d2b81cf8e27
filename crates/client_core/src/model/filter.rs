//! The single active filter selection.

use std::sync::Arc;

use parking_lot::RwLock;

use shared::domain::{FilterKind, UpdateKind};

use crate::observer::{Observer, Observers};

#[derive(Debug, Clone)]
pub struct FilterEvent {
    pub kind: UpdateKind,
    pub filter: FilterKind,
}

pub struct FilterStore {
    current: RwLock<FilterKind>,
    observers: Observers<FilterEvent>,
}

impl FilterStore {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(FilterKind::default()),
            observers: Observers::new(),
        }
    }

    pub fn current(&self) -> FilterKind {
        *self.current.read()
    }

    /// Replace the active filter and notify. Setting the filter that is
    /// already active is a no-op: nothing is emitted.
    pub fn set_filter(&self, update: UpdateKind, filter: FilterKind) {
        {
            let mut current = self.current.write();
            if *current == filter {
                return;
            }
            *current = filter;
        }
        self.observers.notify_all(&FilterEvent {
            kind: update,
            filter,
        });
    }

    pub fn add_observer(&self, observer: Arc<dyn Observer<FilterEvent>>) {
        self.observers.add(observer);
    }

    pub fn remove_observer(&self, observer: &Arc<dyn Observer<FilterEvent>>) {
        self.observers.remove(observer);
    }
}

impl Default for FilterStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "tests/filter_tests.rs"]
mod tests;
