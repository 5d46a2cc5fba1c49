//! Signal Implementation
//!
//! A Signal is a runner over the identity operation: a pure event channel.
//! Every emit dispatches (unless vetoed or locked), and late subscribers
//! can catch up on the last emitted value via `bind`.
//!
//! Signals double as the completion channel for asynchronous work: a
//! [`Task`](super::task::Task) hands a fresh signal to its operation and
//! the operation emits on it when the work finishes.

use std::fmt::Debug;

use super::core::{Dispatch, Runner};
use super::hook::{Guard, Hook};

/// A pure event channel with last-value replay.
///
/// # Example
///
/// ```rust,ignore
/// let clicks = Signal::new();
/// clicks.add(&Hook::new(|pos: &(f32, f32)| println!("{pos:?}")));
/// clicks.emit((10.0, 20.0));
/// ```
pub struct Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    runner: Runner<T, T>,
}

impl<T> Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a new signal.
    pub fn new() -> Self {
        Self {
            runner: Runner::new(|value: &T| Dispatch::Value(value.clone())),
        }
    }

    /// Get the signal's unique ID.
    pub fn id(&self) -> u64 {
        self.runner.id()
    }

    /// Emit a value to all observers.
    ///
    /// Returns the value back, or `None` if a guard vetoed the emit.
    pub fn emit(&self, value: T) -> Option<T> {
        self.runner.call(value).and_then(Dispatch::into_value)
    }

    /// Register an observer hook. Idempotent per hook identity.
    pub fn add(&self, hook: &Hook<T>) {
        self.runner.add(hook);
    }

    /// Deregister an observer hook.
    pub fn remove(&self, hook: &Hook<T>) {
        self.runner.remove(hook);
    }

    /// Register and replay: if a value has been emitted before, the hook
    /// is invoked with it immediately.
    pub fn bind(&self, hook: &Hook<T>) {
        self.runner.bind(hook);
    }

    /// Register a veto guard.
    pub fn before(&self, guard: &Guard<T>) {
        self.runner.before(guard);
    }

    /// Deregister a veto guard.
    pub fn remove_before(&self, guard: &Guard<T>) {
        self.runner.remove_before(guard);
    }

    /// Suppress the next emit's dispatch (one-shot).
    pub fn lock(&self) {
        self.runner.lock();
    }

    /// Check whether the one-shot lock is set.
    pub fn is_locked(&self) -> bool {
        self.runner.is_locked()
    }

    /// Get the last emitted value, if any.
    pub fn last(&self) -> Option<T> {
        self.runner.last().and_then(Dispatch::into_value)
    }

    /// Get (creating if absent) the named scope derived from this signal.
    pub fn scope(&self, name: &str) -> Signal<T> {
        Signal {
            runner: self.runner.scope(name),
        }
    }

    /// Access the underlying runner.
    pub fn runner(&self) -> &Runner<T, T> {
        &self.runner
    }
}

impl<T> Default for Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            runner: self.runner.clone(),
        }
    }
}

impl<T> Debug for Signal<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.id())
            .field("last", &self.last())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Arc;

    #[test]
    fn signal_passes_emitted_value_to_observers() {
        let signal = Signal::new();
        let seen = Arc::new(AtomicI32::new(0));
        let seen_clone = seen.clone();

        signal.add(&Hook::new(move |value: &i32| {
            seen_clone.store(*value, Ordering::SeqCst);
        }));

        assert_eq!(signal.emit(42), Some(42));
        assert_eq!(seen.load(Ordering::SeqCst), 42);
    }

    #[test]
    fn signal_replays_last_value_on_bind() {
        let signal = Signal::new();
        signal.emit("test");

        let seen = Arc::new(AtomicI32::new(0));
        let seen_clone = seen.clone();
        signal.bind(&Hook::new(move |_: &&str| {
            seen_clone.fetch_add(1, Ordering::SeqCst);
        }));

        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(signal.last(), Some("test"));
    }

    #[test]
    fn signal_does_not_replay_without_prior_emit() {
        let signal: Signal<i32> = Signal::new();
        let calls = Arc::new(AtomicI32::new(0));
        let calls_clone = calls.clone();

        signal.bind(&Hook::new(move |_: &i32| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        }));

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn locked_signal_skips_one_emit() {
        let signal = Signal::new();
        let calls = Arc::new(AtomicI32::new(0));
        let calls_clone = calls.clone();
        signal.add(&Hook::new(move |_: &i32| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        }));

        signal.lock();
        signal.emit(1);
        signal.emit(2);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
