//! SQLite repository for catalog rows and the usage facts keyed by their
//! content hashes.
//!
//! Lookups are read-only; the `upsert_*`/`insert_*` methods exist for catalog
//! loaders and test fixtures.

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::{AlgorithmRow, ComponentRow, DetectionRow};
use crate::record::{CatalogRecord, NO_DATA_HASH};
use crate::store::{CatalogStore, UsageStore, require, usable_hashes};
use crate::usage::{AlgorithmUsage, LibraryDetection};
use async_trait::async_trait;
use exn::ResultExt;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::instrument;

fn into_records(rows: Vec<ComponentRow>) -> Result<Vec<CatalogRecord>> {
    rows.into_iter().map(CatalogRecord::try_from).collect()
}

/// Repository over the catalog database.
///
/// # Relationships
///
/// - Many catalog rows can exist for one version of a component (one per provenance)
/// - Each row carries a content hash; usage facts reference rows only through that hash
/// - The same hash may be shared by rows of different components (vendored copies)
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}
impl From<&Database> for Repository {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}
impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Insert
    // =========================================================================

    /// Insert or replace a catalog row, keyed on (component, ecosystem,
    /// version label, provenance).
    pub async fn upsert_component(&self, record: &CatalogRecord) -> Result<()> {
        let row = ComponentRow::from(record);
        sqlx::query(include_str!("../queries/upsert_component.sql"))
            .bind(row.content_hash)
            .bind(row.component_name)
            .bind(row.version_label)
            .bind(row.semver_label)
            .bind(row.ecosystem)
            .bind(row.provenance_id)
            .bind(row.indexed)
            .bind(row.discovered_at)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    /// Record an algorithm usage; identical facts for the same hash are ignored.
    pub async fn insert_algorithm_usage(&self, usage: &AlgorithmUsage) -> Result<()> {
        require(&usage.content_hash, "content hash")?;
        sqlx::query(include_str!("../queries/insert_algorithm_usage.sql"))
            .bind(&usage.content_hash)
            .bind(&usage.algorithm)
            .bind(&usage.strength)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    /// Record a library detection, replacing any previous detection with the
    /// same id for the same hash.
    pub async fn insert_library_detection(&self, detection: &LibraryDetection) -> Result<()> {
        require(&detection.content_hash, "content hash")?;
        sqlx::query(include_str!("../queries/insert_library_detection.sql"))
            .bind(&detection.content_hash)
            .bind(&detection.detection_id)
            .bind(&detection.name)
            .bind(&detection.description)
            .bind(&detection.url)
            .bind(&detection.category)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for Repository {
    #[instrument(level = "debug", skip(self))]
    async fn exact(&self, name: &str, ecosystem: &str, version: &str) -> Result<Vec<CatalogRecord>> {
        let rows: Vec<ComponentRow> = sqlx::query_as(include_str!("../queries/get_exact.sql"))
            .bind(require(name, "name")?)
            .bind(require(ecosystem, "ecosystem")?)
            .bind(require(version, "version")?)
            .bind(NO_DATA_HASH)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        into_records(rows)
    }

    #[instrument(level = "debug", skip(self))]
    async fn by_name(&self, name: &str, ecosystem: &str) -> Result<Vec<CatalogRecord>> {
        let rows: Vec<ComponentRow> = sqlx::query_as(include_str!("../queries/get_by_name.sql"))
            .bind(require(name, "name")?)
            .bind(require(ecosystem, "ecosystem")?)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        into_records(rows)
    }

    #[instrument(level = "debug", skip(self))]
    async fn range(&self, name: &str, ecosystem: &str, requirement: &str) -> Result<Vec<CatalogRecord>> {
        require(requirement, "requirement")?;
        let rows: Vec<ComponentRow> = sqlx::query_as(include_str!("../queries/get_for_range.sql"))
            .bind(require(name, "name")?)
            .bind(require(ecosystem, "ecosystem")?)
            .bind(NO_DATA_HASH)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        into_records(rows)
    }
}

#[async_trait]
impl UsageStore<AlgorithmUsage> for Repository {
    #[instrument(level = "debug", skip_all, fields(hashes = hashes.len()))]
    async fn usage_by_hashes(&self, hashes: &[String]) -> Result<Vec<AlgorithmUsage>> {
        let hashes = usable_hashes(hashes)?;
        // SQLite has no array binding: expand `IN (?, ?, ...)` instead.
        let mut query: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("SELECT content_hash, algorithm, strength FROM algorithm_usages WHERE content_hash IN (");
        let mut list = query.separated(", ");
        for hash in hashes {
            list.push_bind(hash);
        }
        list.push_unseparated(") ORDER BY algorithm ASC, strength ASC, content_hash ASC");
        let rows: Vec<AlgorithmRow> =
            query.build_query_as().fetch_all(&self.pool).await.or_raise(|| ErrorKind::Database)?;
        Ok(rows.into_iter().map(AlgorithmUsage::from).collect())
    }
}

#[async_trait]
impl UsageStore<LibraryDetection> for Repository {
    #[instrument(level = "debug", skip_all, fields(hashes = hashes.len()))]
    async fn usage_by_hashes(&self, hashes: &[String]) -> Result<Vec<LibraryDetection>> {
        let hashes = usable_hashes(hashes)?;
        let mut query: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
            "SELECT content_hash, detection_id, name, description, url, category FROM library_detections WHERE content_hash IN (",
        );
        let mut list = query.separated(", ");
        for hash in hashes {
            list.push_bind(hash);
        }
        list.push_unseparated(") ORDER BY detection_id ASC, content_hash ASC");
        let rows: Vec<DetectionRow> =
            query.build_query_as().fetch_all(&self.pool).await.or_raise(|| ErrorKind::Database)?;
        Ok(rows.into_iter().map(LibraryDetection::from).collect())
    }
}
