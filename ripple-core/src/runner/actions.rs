//! Action Registry
//!
//! An ordered registry of named operations over one value type. Plain
//! functions are inserted as-is; [`Actions::decorate`] wraps every plain
//! entry into a [`Runner`] in place, skipping entries that are already
//! wrapped, so observers can then be attached by name.

use std::fmt::Debug;
use std::sync::{Arc, RwLock};

use indexmap::IndexMap;
use tracing::debug;

use crate::error::Error;

use super::core::{Dispatch, Runner};

enum Entry<T>
where
    T: Clone + Send + Sync + 'static,
{
    Plain(Arc<dyn Fn(&T) -> T + Send + Sync>),
    Wrapped(Runner<T, T>),
}

/// A name-keyed, order-preserving set of operations `T -> T`.
pub struct Actions<T>
where
    T: Clone + Send + Sync + 'static,
{
    entries: RwLock<IndexMap<String, Entry<T>>>,
}

impl<T> Actions<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(IndexMap::new()),
        }
    }

    /// Insert a plain function under a name. It stays unobservable until
    /// [`Actions::decorate`] wraps it.
    pub fn insert<F>(&self, name: &str, action: F)
    where
        F: Fn(&T) -> T + Send + Sync + 'static,
    {
        self.entries
            .write()
            .expect("entries lock poisoned")
            .insert(name.to_owned(), Entry::Plain(Arc::new(action)));
    }

    /// Insert an already-wrapped runner under a name.
    pub fn insert_runner(&self, name: &str, runner: Runner<T, T>) {
        self.entries
            .write()
            .expect("entries lock poisoned")
            .insert(name.to_owned(), Entry::Wrapped(runner));
    }

    /// Wrap every plain entry into a runner, in place. Entries already
    /// wrapped are left untouched. Returns how many entries were wrapped.
    pub fn decorate(&self) -> usize {
        let mut entries = self.entries.write().expect("entries lock poisoned");
        let mut wrapped = 0;
        for (name, entry) in entries.iter_mut() {
            if let Entry::Plain(action) = entry {
                let action = action.clone();
                *entry = Entry::Wrapped(Runner::new(move |arg: &T| Dispatch::Value(action(arg))));
                debug!(action = name.as_str(), "plain action wrapped");
                wrapped += 1;
            }
        }
        wrapped
    }

    /// Look up the runner for a decorated action.
    pub fn runner(&self, name: &str) -> Result<Runner<T, T>, Error> {
        match self.entries.read().expect("entries lock poisoned").get(name) {
            Some(Entry::Wrapped(runner)) => Ok(runner.clone()),
            Some(Entry::Plain(_)) => Err(Error::PlainAction(name.to_owned())),
            None => Err(Error::UnknownAction(name.to_owned())),
        }
    }

    /// Invoke a decorated action by name.
    pub fn call(&self, name: &str, arg: T) -> Result<Option<Dispatch<T>>, Error> {
        Ok(self.runner(name)?.call(arg))
    }

    /// Check whether a name is registered (wrapped or not).
    pub fn contains(&self, name: &str) -> bool {
        self.entries
            .read()
            .expect("entries lock poisoned")
            .contains_key(name)
    }

    /// Get the number of registered actions.
    pub fn len(&self) -> usize {
        self.entries.read().expect("entries lock poisoned").len()
    }

    /// Check whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for Actions<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Debug for Actions<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Actions").field("len", &self.len()).finish()
    }
}
