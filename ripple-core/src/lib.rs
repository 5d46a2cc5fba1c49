//! Ripple Core
//!
//! This crate provides the core runtime for the Ripple reactive dispatch
//! framework. It implements:
//!
//! - Dispatch primitives (runners, signals, properties, lists, tasks)
//! - Veto guards and one-shot dispatch suppression
//! - Named scope derivation with cascading dispatch
//! - A prototype layer with explicit super-dispatch
//!
//! # Architecture
//!
//! The crate is organized into two modules:
//!
//! - `runner`: the dispatch primitives and observer management
//! - `proto`: blueprint/prototype derivation built on top of them
//!
//! # Example
//!
//! ```rust,ignore
//! use ripple_core::{Hook, Property};
//!
//! // Create a property
//! let count = Property::with_default(0);
//!
//! // Observe changes
//! count.add(&Hook::new(|n: &i32| println!("count: {n}")));
//!
//! // Only genuine changes dispatch
//! count.set(5); // prints "count: 5"
//! count.set(5); // suppressed
//! ```
//!
//! # Error Handling
//!
//! Dispatch has no error channel: panics in guards, operations, or
//! observers propagate to the caller. Preconditions are expressed as veto
//! guards, not errors. The [`Error`] type covers only name lookups in the
//! dynamic registries.

pub mod error;
pub mod proto;
pub mod runner;

pub use error::Error;
pub use proto::{extend, Blueprint, Instance, Member, Method, Prototype, Value};
pub use runner::{
    Actions, Dispatch, Guard, Hook, HookId, List, Property, Runner, Signal, Slot, SuperOp, Task,
};
