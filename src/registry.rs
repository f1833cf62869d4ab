//! In-memory refresh token registry.
//!
//! The single point of replay prevention: a refresh token is honored from
//! the moment it is issued until it is consumed by a successful refresh or
//! removed by logout. The registry is process-wide and emptied on restart,
//! which silently invalidates all outstanding refresh tokens.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Keyed set of currently-honored refresh token strings.
///
/// Cheap to clone; all clones share the same underlying set. Callers never
/// mutate the set directly - everything goes through the methods below so
/// the consume-and-replace step stays one critical section.
#[derive(Clone, Default)]
pub struct RefreshTokenRegistry {
    inner: Arc<Mutex<HashSet<String>>>,
}

impl RefreshTokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly issued refresh token.
    pub fn insert(&self, token: String) {
        self.lock().insert(token);
    }

    /// Remove a refresh token. Idempotent: removing an absent token is not
    /// an error. Returns whether the token was present.
    pub fn remove(&self, token: &str) -> bool {
        self.lock().remove(token)
    }

    /// Whether the token is currently honored.
    pub fn contains(&self, token: &str) -> bool {
        self.lock().contains(token)
    }

    /// Atomically consume `old` and register `new`.
    ///
    /// Returns false and registers nothing when `old` is not a member
    /// (already consumed, never issued, or issued before a restart).
    /// Removal and registration happen under one lock so a concurrent
    /// second refresh with the same now-stale token cannot succeed.
    pub fn swap(&self, old: &str, new: String) -> bool {
        let mut set = self.lock();
        if !set.remove(old) {
            return false;
        }
        set.insert(new);
        true
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        self.inner.lock().expect("refresh token registry poisoned")
    }
}
