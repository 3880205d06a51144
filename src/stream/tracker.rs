use std::{
    collections::HashMap,
    fmt,
    sync::{Mutex, MutexGuard, PoisonError},
};
use uuid::Uuid;

/// Identity of one intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestRewriteState {
    Unprocessed,
    Processed,
}

/// Per-request "already inspected" markers.
///
/// The tracker only holds request ids, never the requests themselves; the
/// owner of a request calls [`forget`](Self::forget) once it is done with it.
#[derive(Debug, Default)]
pub struct ResponseRewriteTracker {
    states: Mutex<HashMap<RequestId, RequestRewriteState>>,
}

impl ResponseRewriteTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn states(&self) -> MutexGuard<'_, HashMap<RequestId, RequestRewriteState>> {
        // Entries are plain values; a panic elsewhere cannot leave them half-written.
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self, id: &RequestId) -> RequestRewriteState {
        self.states()
            .get(id)
            .copied()
            .unwrap_or(RequestRewriteState::Unprocessed)
    }

    pub fn should_process(&self, id: &RequestId) -> bool {
        self.state(id) == RequestRewriteState::Unprocessed
    }

    /// Idempotent.
    pub fn mark_processed(&self, id: &RequestId) {
        self.states().insert(*id, RequestRewriteState::Processed);
    }

    /// Check and mark under one lock. Returns `true` exactly once per id.
    pub fn try_claim(&self, id: &RequestId) -> bool {
        let mut states = self.states();
        match states.insert(*id, RequestRewriteState::Processed) {
            Some(RequestRewriteState::Processed) => false,
            Some(RequestRewriteState::Unprocessed) | None => true,
        }
    }

    /// Drop the entry for a request that no longer exists.
    pub fn forget(&self, id: &RequestId) {
        self.states().remove(id);
    }

    pub fn len(&self) -> usize {
        self.states().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
