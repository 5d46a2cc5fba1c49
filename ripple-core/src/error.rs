//! Error types.
//!
//! Dispatch itself has no error channel: a panic inside a guard, an
//! operation, or an observer propagates straight to the caller. The only
//! recoverable failures in this crate are name lookups against dynamic
//! registries (prototype members, action sets), collected here.

use thiserror::Error;

/// Errors produced by name lookups in the prototype and action layers.
#[derive(Debug, Error)]
pub enum Error {
    /// No method with this name exists anywhere on the prototype chain.
    #[error("unknown method `{0}`")]
    UnknownMethod(String),

    /// No member with this name exists anywhere on the prototype chain.
    #[error("unknown member `{0}`")]
    UnknownMember(String),

    /// A member exists under this name but is of a different kind.
    #[error("member `{0}` is not a {1}")]
    MemberKind(String, &'static str),

    /// No action registered under this name.
    #[error("unknown action `{0}`")]
    UnknownAction(String),

    /// The action exists but `decorate` has not wrapped it yet.
    #[error("action `{0}` has not been decorated")]
    PlainAction(String),
}
