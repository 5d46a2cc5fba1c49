//! Property Implementation
//!
//! A Property is a runner layered with mutation suppression: it stores a
//! value and dispatches only when a genuinely new value is written.
//!
//! # Suppression Rules
//!
//! - Reads never dispatch. `get` goes straight to the store without
//!   touching the runner, which is observably identical to the classic
//!   lock-on-read trick and cannot be misused.
//! - Writing the currently stored value never dispatches.
//! - Writing a different value stores it and dispatches exactly once.
//!
//! # Construction Modes
//!
//! The original system decided between "value store" and "pass-through"
//! by inspecting the constructor argument at runtime. Here each mode is
//! its own constructor:
//!
//! - [`Property::new`] / [`Property::with_default`] — plain value store.
//! - [`Property::with_setter`] — a custom setter receives a [`Slot`] guard
//!   and decides what (if anything) to store; dispatch happens iff the
//!   slot actually changed.
//! - [`Property::passthrough`] — returns a plain [`Runner`] that invokes
//!   the function on every call, with no storage or suppression.

use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use super::core::{Dispatch, Runner, Step};
use super::hook::{Guard, Hook};

/// The mutable cell handed to a custom setter.
///
/// `get` reads the stored value; `put` stores a value if it differs from
/// the current one. Whether the property dispatches after the setter runs
/// depends solely on whether any `put` actually changed the slot.
pub struct Slot<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    stored: Arc<RwLock<Option<T>>>,
    changed: AtomicBool,
}

impl<T> Slot<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn new(stored: Arc<RwLock<Option<T>>>) -> Self {
        Self {
            stored,
            changed: AtomicBool::new(false),
        }
    }

    /// Read the stored value.
    pub fn get(&self) -> Option<T> {
        self.stored.read().expect("value lock poisoned").clone()
    }

    /// Store a value if it differs from the current one.
    pub fn put(&self, value: T) {
        let mut stored = self.stored.write().expect("value lock poisoned");
        if stored.as_ref() != Some(&value) {
            *stored = Some(value);
            self.changed.store(true, Ordering::SeqCst);
        }
    }
}

/// A change-suppressed value store.
///
/// # Example
///
/// ```rust,ignore
/// let width = Property::with_default(0u32);
/// width.add(&Hook::new(|w: &u32| println!("width -> {w}")));
///
/// width.set(10); // dispatches
/// width.set(10); // suppressed, same value
/// width.get();   // never dispatches
/// ```
pub struct Property<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    runner: Runner<T, T>,
    stored: Arc<RwLock<Option<T>>>,
}

impl<T> Property<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Create an unset property.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Create a property holding a default value.
    ///
    /// The default is stored without dispatching, but `bind` will replay
    /// it to late subscribers.
    pub fn with_default(value: T) -> Self {
        Self::build(Some(value))
    }

    fn build(initial: Option<T>) -> Self {
        let stored = Arc::new(RwLock::new(initial));
        let cell = stored.clone();
        let runner = Runner::from_step(move |value: &T| {
            let mut current = cell.write().expect("value lock poisoned");
            if current.as_ref() == Some(value) {
                Step::Muted(value.clone())
            } else {
                *current = Some(value.clone());
                Step::Value(value.clone())
            }
        });
        Self { runner, stored }
    }

    /// Create a property with a custom setter.
    ///
    /// The setter receives the [`Slot`] and the incoming value; it may
    /// read, transform, accumulate, or ignore. Dispatch occurs iff the
    /// slot changed while the setter ran.
    pub fn with_setter<F>(initial: T, setter: F) -> Self
    where
        F: Fn(&Slot<T>, &T) + Send + Sync + 'static,
    {
        let stored = Arc::new(RwLock::new(Some(initial)));
        let slot = Arc::new(Slot::new(stored.clone()));
        let runner = Runner::from_step(move |value: &T| {
            slot.changed.store(false, Ordering::SeqCst);
            setter(&slot, value);
            if slot.changed.swap(false, Ordering::SeqCst) {
                Step::Value(slot.get().expect("changed slot always holds a value"))
            } else {
                match slot.get() {
                    Some(current) => Step::Muted(current),
                    None => Step::Muted(value.clone()),
                }
            }
        });
        Self { runner, stored }
    }

    /// Wrap a function as a plain pass-through runner: every call invokes
    /// it and dispatches its result, with no storage involved.
    pub fn passthrough<F>(f: F) -> Runner<T, T>
    where
        F: Fn(&T) -> T + Send + Sync + 'static,
    {
        Runner::new(move |value: &T| Dispatch::Value(f(value)))
    }

    /// Write a value. Dispatches iff it differs from the stored one.
    ///
    /// Returns the stored value after the write, or `None` if a guard
    /// vetoed the call.
    pub fn set(&self, value: T) -> Option<T> {
        self.runner.call(value).and_then(Dispatch::into_value)
    }

    /// Read the stored value. Never dispatches.
    pub fn get(&self) -> Option<T> {
        self.stored.read().expect("value lock poisoned").clone()
    }

    /// Check whether a value is stored.
    pub fn is_set(&self) -> bool {
        self.stored
            .read()
            .expect("value lock poisoned")
            .is_some()
    }

    /// Register an observer hook. Idempotent per hook identity.
    pub fn add(&self, hook: &Hook<T>) {
        self.runner.add(hook);
    }

    /// Deregister an observer hook.
    pub fn remove(&self, hook: &Hook<T>) {
        self.runner.remove(hook);
    }

    /// Register and replay the stored value, if one is present. Unlike a
    /// signal this includes a constructed default that was never
    /// dispatched.
    pub fn bind(&self, hook: &Hook<T>) {
        self.runner.add(hook);
        if let Some(value) = self.get() {
            hook.invoke(&value);
        }
    }

    /// Register a veto guard.
    pub fn before(&self, guard: &Guard<T>) {
        self.runner.before(guard);
    }

    /// Deregister a veto guard.
    pub fn remove_before(&self, guard: &Guard<T>) {
        self.runner.remove_before(guard);
    }

    /// Suppress the next dispatch (one-shot).
    pub fn lock(&self) {
        self.runner.lock();
    }

    /// Get (creating if absent) the named scope derived from this
    /// property's runner.
    pub fn scope(&self, name: &str) -> Runner<T, T> {
        self.runner.scope(name)
    }

    /// Access the underlying runner.
    pub fn runner(&self) -> &Runner<T, T> {
        &self.runner
    }
}

impl<T> Default for Property<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Property<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            runner: self.runner.clone(),
            stored: Arc::clone(&self.stored),
        }
    }
}

impl<T> Debug for Property<T>
where
    T: Clone + PartialEq + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Property")
            .field("id", &self.runner.id())
            .field("value", &self.get())
            .finish()
    }
}
