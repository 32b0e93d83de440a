//! # Error Types
//!
//! Structured errors for the core primitives, built with `thiserror`.
//! Each variant carries the offending input so callers can report it
//! without re-deriving context.

use thiserror::Error;

/// Errors raised when constructing identifier and version primitives.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Schema identifiers must be non-empty.
    #[error("schema identifier must not be empty")]
    EmptyIdentifier,

    /// Schema identifiers must not contain whitespace.
    #[error("schema identifier {0:?} contains whitespace")]
    IdentifierWhitespace(String),

    /// The version string is not a semantic version.
    #[error("invalid semantic version {value:?}: {reason}")]
    InvalidVersion {
        /// The rejected input.
        value: String,
        /// Which part of the grammar failed.
        reason: String,
    },
}

/// Errors during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// JSON serialization failed during canonicalization.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}
