//! Dispatch Primitives
//!
//! This module implements the core dispatch system: runners, signals,
//! properties, lists, and tasks. These primitives form the foundation of
//! Ripple's reactivity.
//!
//! # Concepts
//!
//! ## Runners
//!
//! A Runner wraps an operation so that invoking it automatically notifies
//! registered observers with the call's result. Veto guards can block a
//! call before the operation runs, and a one-shot lock can suppress a
//! single dispatch. Everything else in this module is a runner with a
//! specialized operation.
//!
//! ## Signals
//!
//! A Signal is a runner over the identity function: a pure event channel
//! with optional last-value replay for late subscribers.
//!
//! ## Properties and Lists
//!
//! A Property stores a value and dispatches only on genuine change; reads
//! never dispatch. A List stores an ordered sequence and re-dispatches the
//! whole sequence when it changes.
//!
//! ## Tasks
//!
//! A Task completes asynchronously through an injected completion signal,
//! with optional last-call-wins throttling and burst coalescing.
//!
//! # Implementation Notes
//!
//! All handles are cheap clones over shared state, so the same runner can
//! be held by producers and consumers alike. Dispatch is fully
//! synchronous; asynchrony enters only through the Task completion
//! signals, driven by a host-provided scheduling primitive.

mod actions;
mod core;
mod hook;
mod list;
mod property;
mod signal;
mod task;

pub use actions::Actions;
pub use hook::{Guard, Hook, HookId};
pub use list::List;
pub use property::{Property, Slot};
pub use self::core::{Dispatch, Runner, SuperOp};
pub use signal::Signal;
pub use task::Task;
