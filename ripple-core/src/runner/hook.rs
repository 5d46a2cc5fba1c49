//! Hook types for the dispatch system.
//!
//! Observers and veto guards are registered on runners by identity.
//! Closures have no identity of their own in Rust, so both are wrapped in
//! cheap cloneable handles carrying a [`HookId`]. Registration is
//! idempotent per id and removal deregisters by id.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Unique identifier for a hook or guard.
///
/// Uses an atomic counter to ensure uniqueness across threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookId(u64);

impl HookId {
    /// Generate a new unique hook ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for HookId {
    fn default() -> Self {
        Self::new()
    }
}

/// An observer hook invoked with each dispatched result.
///
/// Cloning a hook clones the handle, not the callback; all clones share
/// one identity, which is what makes `add` idempotent and `remove` exact.
pub struct Hook<T> {
    id: HookId,
    callback: Arc<dyn Fn(&T) + Send + Sync>,
}

impl<T> Hook<T> {
    /// Create a new hook from a callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        Self {
            id: HookId::new(),
            callback: Arc::new(callback),
        }
    }

    /// Get the hook's unique ID.
    pub fn id(&self) -> HookId {
        self.id
    }

    /// Invoke the hook with a dispatched value.
    pub fn invoke(&self, value: &T) {
        (self.callback)(value);
    }
}

impl<T> Clone for Hook<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<T> Debug for Hook<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hook").field("id", &self.id).finish()
    }
}

/// A veto predicate evaluated before a runner's operation.
///
/// Guards run in registration order against the call arguments; the first
/// one returning `true` blocks the call entirely.
pub struct Guard<A> {
    id: HookId,
    predicate: Arc<dyn Fn(&A) -> bool + Send + Sync>,
}

impl<A> Guard<A> {
    /// Create a new guard from a predicate. Returning `true` vetoes.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&A) -> bool + Send + Sync + 'static,
    {
        Self {
            id: HookId::new(),
            predicate: Arc::new(predicate),
        }
    }

    /// Get the guard's unique ID.
    pub fn id(&self) -> HookId {
        self.id
    }

    /// Evaluate the guard against call arguments.
    pub fn check(&self, args: &A) -> bool {
        (self.predicate)(args)
    }
}

impl<A> Clone for Guard<A> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<A> Debug for Guard<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Guard").field("id", &self.id).finish()
    }
}
