//! Catalog Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A catalog error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
/// Input errors mean the query should never have been issued; everything
/// else is a storage failure.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("database error")]
    Database,
    #[display("database migration error")]
    Migration,
    /// A mandatory query parameter was empty.
    #[display("missing required query field: {_0}")]
    MissingField(#[error(not(source))] &'static str),
    /// Usage lookup was called without a single usable hash.
    #[display("empty content hash set")]
    EmptyHashSet,
    /// A stored value could not be converted into its model type.
    #[display("invalid catalog data: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
    /// Simulated failure from the in-memory catalog.
    #[cfg(feature = "mock")]
    #[display("simulated storage failure")]
    Simulated,
}

impl ErrorKind {
    /// Returns `true` if the caller supplied invalid query input.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::MissingField(_) | Self::EmptyHashSet)
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Storage failures are surfaced, never retried.
        false
    }
}
