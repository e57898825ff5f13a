//! Error types surfaced by the query evaluation core.

use thiserror::Error;

/// Errors the core can surface. See `ERROR HANDLING DESIGN` for the
/// propagation policy: missing field/term is not an error, only a query
/// construction or state-machine misuse is.
#[derive(Debug, Error)]
pub enum FerretError {
    /// A query was constructed in a way that violates an invariant, e.g.
    /// phrase terms spanning different fields, or a non-unique key on add.
    #[error("invalid query argument: {0}")]
    ArgError(String),

    /// An operation was invoked in a state that does not support it, e.g.
    /// reading a scorer's score before the first `next`, or reusing a
    /// weight across searchers.
    #[error("invalid state: {0}")]
    StateError(String),

    /// The reader collaborator failed while answering a query.
    #[error("index reader error: {0}")]
    IoError(String),

    /// A numeric or textual parse failed. `TypedRange` never raises this
    /// itself (it falls back to lexicographic comparison silently); this
    /// variant exists for the query-string parser layer, which is out of
    /// scope for this crate but shares the error taxonomy.
    #[error("parse error: {0}")]
    ParseError(String),
}

impl FerretError {
    pub fn arg(msg: impl Into<String>) -> Self {
        FerretError::ArgError(msg.into())
    }

    pub fn state(msg: impl Into<String>) -> Self {
        FerretError::StateError(msg.into())
    }

    pub fn io(msg: impl Into<String>) -> Self {
        FerretError::IoError(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        FerretError::ParseError(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, FerretError>;
