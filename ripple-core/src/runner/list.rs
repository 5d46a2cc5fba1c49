//! List Implementation
//!
//! A List holds an ordered sequence and re-dispatches the whole sequence
//! whenever it changes. Pushes additionally announce the pushed item on a
//! dedicated channel, so observers can subscribe to "something was added"
//! independently of "the sequence is now this".

use std::fmt::Debug;
use std::sync::{Arc, RwLock};

use super::core::{Dispatch, Runner, Step};
use super::hook::Hook;

/// An ordered sequence with whole-sequence dispatch.
pub struct List<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    items: Arc<RwLock<Vec<T>>>,
    changes: Runner<Vec<T>, Vec<T>>,
    push: Runner<T, T>,
}

impl<T> List<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Create an empty list.
    pub fn new() -> Self {
        Self::with_items(Vec::new())
    }

    /// Create a list with initial contents. They are stored without
    /// dispatching; `bind` replays them.
    pub fn with_items(initial: Vec<T>) -> Self {
        let items = Arc::new(RwLock::new(initial));
        let changes: Runner<Vec<T>, Vec<T>> =
            Runner::new(|sequence: &Vec<T>| Dispatch::Value(sequence.clone()));

        let cell = items.clone();
        let sequence_channel = changes.clone();
        let push = Runner::from_step(move |item: &T| {
            let snapshot = {
                let mut guard = cell.write().expect("items lock poisoned");
                guard.push(item.clone());
                guard.clone()
            };
            // Sequence observers first, then the push channel's own.
            sequence_channel.call(snapshot);
            Step::Value(item.clone())
        });

        Self {
            items,
            changes,
            push,
        }
    }

    /// Append an item, dispatching the full sequence to list observers
    /// and the item itself to push-channel observers.
    pub fn push(&self, item: T) {
        self.push.call(item);
    }

    /// Remove the first element equal to `item`. Dispatches the updated
    /// sequence only if a removal occurred; returns whether it did.
    pub fn remove(&self, item: &T) -> bool {
        let snapshot = {
            let mut guard = self.items.write().expect("items lock poisoned");
            match guard.iter().position(|existing| existing == item) {
                Some(index) => {
                    guard.remove(index);
                    Some(guard.clone())
                }
                None => None,
            }
        };
        match snapshot {
            Some(sequence) => {
                self.changes.call(sequence);
                true
            }
            None => false,
        }
    }

    /// Get a copy of the current sequence.
    pub fn items(&self) -> Vec<T> {
        self.items.read().expect("items lock poisoned").clone()
    }

    /// Get the number of items.
    pub fn len(&self) -> usize {
        self.items.read().expect("items lock poisoned").len()
    }

    /// Check whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Register a sequence observer. Idempotent per hook identity.
    pub fn add(&self, hook: &Hook<Vec<T>>) {
        self.changes.add(hook);
    }

    /// Deregister a sequence observer.
    pub fn remove_hook(&self, hook: &Hook<Vec<T>>) {
        self.changes.remove(hook);
    }

    /// Register a sequence observer and replay the current contents.
    pub fn bind(&self, hook: &Hook<Vec<T>>) {
        self.changes.add(hook);
        hook.invoke(&self.items());
    }

    /// The push channel: dispatches each pushed item.
    pub fn on_push(&self) -> &Runner<T, T> {
        &self.push
    }

    /// The sequence channel: dispatches the whole sequence on change.
    pub fn changes(&self) -> &Runner<Vec<T>, Vec<T>> {
        &self.changes
    }
}

impl<T> Default for List<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for List<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
            changes: self.changes.clone(),
            push: self.push.clone(),
        }
    }
}

impl<T> Debug for List<T>
where
    T: Clone + PartialEq + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("List")
            .field("items", &self.items())
            .finish()
    }
}
