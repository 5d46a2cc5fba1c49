//! Prototype Layer
//!
//! A dynamically typed prototype-chain builder on top of the dispatch
//! primitives. Blueprints construct instances that share a prototype;
//! deriving a blueprint shadows members and can super-dispatch to the
//! base by capturing its method handles explicitly.
//!
//! Member values are [`serde_json::Value`]; signals and properties defined
//! on a prototype are shared by all of its instances.

mod blueprint;
mod prototype;

pub use blueprint::{extend, Blueprint};
pub use prototype::{Instance, Member, Method, Prototype};

pub use serde_json::Value;
