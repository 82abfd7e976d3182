//! Outgoing request tracking
//!
//! A response names only the `id` of the request it answers, yet its `result`
//! can only be typed once the request's method is known. [`PendingRequests`]
//! hands out ids for outgoing requests, remembers each one's method, and
//! serves as the codec's [`ResponseCorrelator`]. An entry is dropped when its
//! response arrives.

use parking_lot::Mutex;
use polyrow_core::{Id, ResponseCorrelator};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

#[derive(Debug, Default)]
pub struct PendingRequests {
    counter: AtomicI64,
    pending: Mutex<HashMap<Id, String>>,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh numeric id, never handed out before by this tracker
    pub fn next_id(&self) -> Id {
        Id::Number(self.counter.fetch_add(1, Ordering::Relaxed))
    }

    /// Record that a request with `id` for `method` is outstanding
    pub fn register(&self, id: Id, method: impl Into<String>) {
        self.pending.lock().insert(id, method.into());
    }

    /// Allocate an id and register it in one step
    pub fn track(&self, method: impl Into<String>) -> Id {
        let id = self.next_id();
        self.register(id.clone(), method);
        id
    }

    /// Remove the entry for `id`, returning its method
    pub fn complete(&self, id: &Id) -> Option<String> {
        self.pending.lock().remove(id)
    }

    /// Drop every outstanding entry, returning how many there were
    pub fn clear(&self) -> usize {
        let mut pending = self.pending.lock();
        let count = pending.len();
        pending.clear();
        count
    }

    pub fn is_pending(&self, id: &Id) -> bool {
        self.pending.lock().contains_key(id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }
}

impl ResponseCorrelator for PendingRequests {
    fn method_for(&self, id: &Id) -> Option<String> {
        self.pending.lock().get(id).cloned()
    }
}
