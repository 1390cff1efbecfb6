use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

/// Failures while setting up a [`Service`](crate::Service).
///
/// Lookup failures are reported with the resolution engine's own
/// [`ErrorKind`](algoscope_resolve::ErrorKind).
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The configuration is invalid.
    #[display("invalid configuration")]
    Config,
    /// The catalog database could not be opened.
    #[display("catalog database unavailable")]
    Database,
}

impl ErrorKind {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database)
    }
}
