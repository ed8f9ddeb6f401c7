//! Error types shared across the crate.
//!
//! None of these ever abort the engine. Configuration problems degrade the
//! engine to an unbound state, and path problems turn the offending operation
//! into a logged no-op.

use thiserror::Error;

/// Errors produced while parsing or walking a [`FieldPath`](crate::path::FieldPath).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// A segment between two separators was empty, e.g. `a..b`.
    #[error("empty segment at byte {position} in path `{path}`")]
    EmptySegment { path: String, position: usize },

    /// A `[` without a matching `]`, or brackets that do not hold an index.
    #[error("malformed bracket in path `{path}`")]
    MalformedBracket { path: String },

    /// An array index lies too far past the end of the array to pad up to it.
    #[error("index {index} is out of range in path `{path}`")]
    IndexOutOfRange { path: String, index: usize },

    /// Traversal hit a scalar where an object or array was required.
    #[error("cannot descend into a non-container value at `{path}`")]
    NotAContainer { path: String },
}

/// Errors reported by the store binding engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    /// A binding parameter was supplied without a store.
    #[error("binding parameter #{index} has no store in component {component}")]
    MissingStore { component: String, index: usize },

    /// An operation referenced a store key the engine is not bound to.
    #[error("store `{0}` is not bound to this state")]
    UnknownStore(String),

    /// A rollback-by-path targeted a path that does not exist on the engine.
    #[error("path {0} not found")]
    PathNotFound(String),

    #[error(transparent)]
    Path(#[from] PathError),
}
