//! In-memory catalog for testing.

use crate::error::{ErrorKind, Result};
use crate::record::{CatalogRecord, NO_DATA_HASH};
use crate::store::{CatalogStore, UsageStore, require, usable_hashes};
use crate::usage::{AlgorithmUsage, LibraryDetection, UsageFact};
use async_trait::async_trait;
use std::cmp::Reverse;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// In-memory catalog and usage storage for testing.
///
/// Mirrors the filtering and ordering of the SQLite
/// [`Repository`](crate::Repository) without touching a database. Storage
/// failures can be simulated with [`fail_reads`](Self::fail_reads), and the
/// number of reads is counted so tests can assert that a lookup was (or was
/// not) issued.
///
/// # Examples
///
/// ```
/// use algoscope_catalog::{CatalogStore, MockCatalog};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let catalog = MockCatalog::default();
/// assert!(catalog.by_name("ring", "cargo").await.unwrap().is_empty());
/// catalog.fail_reads(true);
/// assert!(catalog.by_name("ring", "cargo").await.is_err());
/// # }
/// ```
#[derive(Default)]
pub struct MockCatalog {
    records: RwLock<Vec<CatalogRecord>>,
    algorithms: RwLock<Vec<AlgorithmUsage>>,
    detections: RwLock<Vec<LibraryDetection>>,
    failing: AtomicBool,
    catalog_reads: AtomicUsize,
    usage_reads: AtomicUsize,
}

impl MockCatalog {
    /// Create a mock catalog pre-populated with records.
    pub fn with_records(records: impl IntoIterator<Item = CatalogRecord>) -> Self {
        Self {
            records: RwLock::new(records.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn with_algorithms(self, facts: impl IntoIterator<Item = AlgorithmUsage>) -> Self {
        Self {
            algorithms: RwLock::new(facts.into_iter().collect()),
            ..self
        }
    }

    pub fn with_detections(self, facts: impl IntoIterator<Item = LibraryDetection>) -> Self {
        Self {
            detections: RwLock::new(facts.into_iter().collect()),
            ..self
        }
    }

    /// Make every subsequent read fail (or succeed again).
    pub fn fail_reads(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of catalog queries issued so far.
    pub fn catalog_reads(&self) -> usize {
        self.catalog_reads.load(Ordering::SeqCst)
    }

    /// Number of usage lookups issued so far.
    pub fn usage_reads(&self) -> usize {
        self.usage_reads.load(Ordering::SeqCst)
    }

    fn check(&self, counter: &AtomicUsize) -> Result<()> {
        counter.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            exn::bail!(ErrorKind::Simulated);
        }
        Ok(())
    }

    async fn select(&self, name: &str, ecosystem: &str, filter: impl Fn(&CatalogRecord) -> bool) -> Vec<CatalogRecord> {
        let guard = self.records.read().await;
        let mut rows: Vec<CatalogRecord> = guard
            .iter()
            .filter(|r| r.component_name == name && r.ecosystem == ecosystem && filter(r))
            .cloned()
            .collect();
        rows.sort_by_key(|r| (Reverse(r.discovered_at), r.provenance_id.clone()));
        rows
    }
}

fn lookup<F: UsageFact>(facts: &[F], hashes: &[&str]) -> Vec<F> {
    facts.iter().filter(|f| hashes.contains(&f.content_hash())).cloned().collect()
}

#[async_trait]
impl CatalogStore for MockCatalog {
    async fn exact(&self, name: &str, ecosystem: &str, version: &str) -> Result<Vec<CatalogRecord>> {
        let (name, ecosystem, version) = (require(name, "name")?, require(ecosystem, "ecosystem")?, require(version, "version")?);
        self.check(&self.catalog_reads)?;
        Ok(self
            .select(name, ecosystem, |r| {
                (r.version_label == version || r.semver_label.as_deref() == Some(version)) && r.indexed && r.has_data()
            })
            .await)
    }

    async fn by_name(&self, name: &str, ecosystem: &str) -> Result<Vec<CatalogRecord>> {
        let (name, ecosystem) = (require(name, "name")?, require(ecosystem, "ecosystem")?);
        self.check(&self.catalog_reads)?;
        Ok(self.select(name, ecosystem, |_| true).await)
    }

    async fn range(&self, name: &str, ecosystem: &str, requirement: &str) -> Result<Vec<CatalogRecord>> {
        require(requirement, "requirement")?;
        let (name, ecosystem) = (require(name, "name")?, require(ecosystem, "ecosystem")?);
        self.check(&self.catalog_reads)?;
        Ok(self.select(name, ecosystem, |r| r.content_hash != NO_DATA_HASH).await)
    }
}

#[async_trait]
impl UsageStore<AlgorithmUsage> for MockCatalog {
    async fn usage_by_hashes(&self, hashes: &[String]) -> Result<Vec<AlgorithmUsage>> {
        let hashes = usable_hashes(hashes)?;
        self.check(&self.usage_reads)?;
        Ok(lookup(&self.algorithms.read().await, &hashes))
    }
}

#[async_trait]
impl UsageStore<LibraryDetection> for MockCatalog {
    async fn usage_by_hashes(&self, hashes: &[String]) -> Result<Vec<LibraryDetection>> {
        let hashes = usable_hashes(hashes)?;
        self.check(&self.usage_reads)?;
        Ok(lookup(&self.detections.read().await, &hashes))
    }
}
