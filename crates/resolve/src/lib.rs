//! Resolves package identifiers to the usage facts recorded for them.
//!
//! A lookup goes through the same steps for every identifier of a batch:
//!
//! 1. Parse the identifier and validate its requirement.
//! 2. Query the catalog (exact version, requirement range, or every version).
//! 3. Select versions ([`select_best`] or [`select_all_in_range`]).
//! 4. Look up usage facts for the content hashes of the selected rows.
//! 5. Classify the identifier and fold it into the batch [`Summary`].
//!
//! Problems with a single identifier never fail the batch; storage failures
//! and cancellation always do.

mod context;
mod engine;
mod error;
mod recorder;
mod report;
mod requirement;
mod select;
mod stream;
pub mod version;

pub use crate::context::Context;
pub use crate::engine::{
    Batch, Cardinality, DEFAULT_CONCURRENCY, DEFAULT_MAX_HASHES_PER_QUERY, Engine, LookupRequest, Options,
};
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::recorder::{CountingRecorder, NoopRecorder, Recorder};
pub use crate::report::{Outcome, OutputItem, Report, ResolvedVersion, Summary};
pub use crate::requirement::Requirement;
pub use crate::select::{Selection, select_all_in_range, select_best};
pub use crate::stream::LookupEvent;
