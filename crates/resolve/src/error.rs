//! Resolution Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.
//!
//! Only batch-level failures are errors. Problems scoped to one identifier
//! (unparseable, not found, no usage information) are classifications on the
//! [`OutputItem`](crate::OutputItem), never an `Err`.

use derive_more::{Display, Error};

/// A resolution error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for resolution operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// ### Input Errors
/// - [`ErrorKind::EmptyBatch`]
/// - [`ErrorKind::InvalidRequirement`] (per identifier, when used directly)
///
/// ### Storage Errors
/// - [`ErrorKind::Catalog`]
/// - [`ErrorKind::Usage`]
///
/// ### Cancellation Errors
/// - [`ErrorKind::Cancelled`]
/// - [`ErrorKind::DeadlineExceeded`]
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The batch contained no identifiers.
    #[display("empty batch")]
    EmptyBatch,
    /// A requirement could not be turned into a version matcher.
    #[display("invalid requirement: {_0}")]
    InvalidRequirement(#[error(not(source))] String),
    /// Reading the component catalog failed; the batch is aborted.
    #[display("catalog read failed")]
    Catalog,
    /// Reading usage facts failed; the batch is aborted.
    #[display("usage lookup failed")]
    Usage,
    /// The caller cancelled the batch.
    #[display("batch cancelled")]
    Cancelled,
    /// The batch deadline passed before every identifier was classified.
    #[display("batch deadline exceeded")]
    DeadlineExceeded,
}

impl ErrorKind {
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::EmptyBatch | Self::InvalidRequirement(_))
    }

    pub fn is_storage_error(&self) -> bool {
        matches!(self, Self::Catalog | Self::Usage)
    }

    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Storage failures are surfaced to the caller, never retried here.
        false
    }
}
