//! Component-version catalog and usage fact storage.
//!
//! The catalog is an external, read-only source of truth for the lookup
//! engine: which versions of which components are known, and what was found
//! inside each of them.
//!
//! # Architecture
//! The catalog stores two kinds of entity:
//! - **Catalog records**: one row per (component, version, provenance),
//!   carrying the content hash of what was analysed. The same release may be
//!   known from several provenances, each with its own hash.
//! - **Usage facts**: keyed by content hash, in two shapes; cryptographic
//!   [`AlgorithmUsage`] and third-party [`LibraryDetection`].
//!
//! Consumers depend on the [`CatalogStore`] and [`UsageStore`] traits. The
//! SQLite [`Repository`] is the production implementation; `MockCatalog`
//! (behind the `mock` feature) is an in-memory one for tests.

mod db;
pub mod error;
#[cfg(feature = "mock")]
mod mock;
mod models;
mod record;
mod repo;
mod store;
mod usage;

pub use crate::db::{DEFAULT_MAX_CONNECTIONS, Database};
#[cfg(feature = "mock")]
pub use crate::mock::MockCatalog;
pub use crate::record::{CatalogRecord, NO_DATA_HASH};
pub use crate::repo::Repository;
pub use crate::store::{CatalogHandle, CatalogStore, UsageHandle, UsageStore};
pub use crate::usage::{AlgorithmUsage, LibraryDetection, UsageFact};
