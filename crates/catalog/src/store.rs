//! Read contracts for the component catalog and usage fact storage.
//!
//! The resolution engine only ever talks to these traits; the SQLite
//! [`Repository`](crate::Repository) and the in-memory `MockCatalog` (behind
//! the `mock` feature) both implement them.

use crate::error::{ErrorKind, Result};
use crate::record::CatalogRecord;
use crate::usage::UsageFact;
use async_trait::async_trait;
use std::sync::Arc;

pub type CatalogHandle = Arc<dyn CatalogStore>;
pub type UsageHandle<F> = Arc<dyn UsageStore<F>>;

/// The three query shapes offered by the component catalog.
///
/// Every method returns [`MissingField`](ErrorKind::MissingField) when a
/// mandatory parameter is empty, and [`Database`](ErrorKind::Database) (or
/// another storage error) when the read itself fails. Nothing is retried.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Rows for one exact version of a component.
    ///
    /// Only rows that are fully indexed and carry a usable content hash are
    /// returned. Normally one logical version, possibly several provenances.
    async fn exact(&self, name: &str, ecosystem: &str, version: &str) -> Result<Vec<CatalogRecord>>;

    /// Every known row for a component, most recently discovered first.
    async fn by_name(&self, name: &str, ecosystem: &str) -> Result<Vec<CatalogRecord>>;

    /// Every row for a component that may take part in a range filter.
    ///
    /// Rows with the "no data" hash are excluded. The requirement is **not**
    /// applied by storage, the caller filters client-side; it is only
    /// checked for presence.
    async fn range(&self, name: &str, ecosystem: &str, requirement: &str) -> Result<Vec<CatalogRecord>>;
}

/// Batched lookup of usage facts by content hash.
#[async_trait]
pub trait UsageStore<F: UsageFact>: Send + Sync {
    /// All facts recorded for any of the given hashes, in a single read.
    ///
    /// Returns [`EmptyHashSet`](ErrorKind::EmptyHashSet) when no usable
    /// (non-empty) hash is supplied. Callers are responsible for bounding the
    /// size of the hash set. An empty result is not an error.
    async fn usage_by_hashes(&self, hashes: &[String]) -> Result<Vec<F>>;
}

pub(crate) fn require<'a>(value: &'a str, field: &'static str) -> Result<&'a str> {
    match value.trim() {
        "" => exn::bail!(ErrorKind::MissingField(field)),
        _ => Ok(value),
    }
}

pub(crate) fn usable_hashes(hashes: &[String]) -> Result<Vec<&str>> {
    let usable: Vec<&str> = hashes.iter().map(String::as_str).filter(|h| !h.is_empty()).collect();
    if usable.is_empty() {
        exn::bail!(ErrorKind::EmptyHashSet);
    }
    Ok(usable)
}
