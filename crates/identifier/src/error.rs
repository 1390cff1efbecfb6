//! Identifier Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// An identifier error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for identifier operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// Every variant is scoped to a single identifier: the caller should record
/// the identifier as unparseable and move on to the next one.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The string does not start with the `pkg:` scheme.
    #[display("missing `pkg:` scheme")]
    MissingScheme,
    /// Nothing between the scheme and the first `/`.
    #[display("missing package type")]
    MissingType,
    /// The package type contains characters outside `[a-z0-9.+-]`.
    #[display("invalid package type: {_0}")]
    InvalidType(#[error(not(source))] String),
    /// The package type is not followed by a `/`.
    #[display("missing namespace separator after package type")]
    MissingNamespaceSeparator,
    #[display("missing package name")]
    MissingName,
    /// A component was present (e.g. a trailing `@`) but empty.
    #[display("empty {_0}")]
    EmptyComponent(#[error(not(source))] &'static str),
    /// Rejected by the package URL parser (bad encoding, invalid
    /// namespace or qualifier, ...).
    #[display("malformed package URL")]
    Malformed,
    /// The requirement matches everything (`*`, `v*`).
    #[display("wildcard requirement is not allowed: {_0}")]
    WildcardRequirement(#[error(not(source))] String),
    /// A comma-separated segment of the requirement is not a strict version.
    #[display("invalid requirement: {_0}")]
    InvalidRequirement(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // The identifier is either well-formed or it's not.
        false
    }
}
