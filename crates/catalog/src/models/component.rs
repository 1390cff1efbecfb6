use crate::error::{Error, ErrorKind};
use crate::record::CatalogRecord;
use exn::ResultExt;
use time::UtcDateTime;

#[derive(sqlx::FromRow)]
pub(crate) struct ComponentRow {
    pub(crate) content_hash: String,
    pub(crate) component_name: String,
    pub(crate) version_label: String,
    #[sqlx(default)]
    pub(crate) semver_label: Option<String>,
    pub(crate) ecosystem: String,
    pub(crate) provenance_id: String,
    pub(crate) indexed: bool,
    pub(crate) discovered_at: i64,
}
impl From<&CatalogRecord> for ComponentRow {
    fn from(record: &CatalogRecord) -> Self {
        Self {
            content_hash: record.content_hash.clone(),
            component_name: record.component_name.clone(),
            version_label: record.version_label.clone(),
            semver_label: record.semver_label.clone(),
            ecosystem: record.ecosystem.clone(),
            provenance_id: record.provenance_id.clone(),
            indexed: record.indexed,
            discovered_at: record.discovered_at.unix_timestamp(),
        }
    }
}
impl TryFrom<ComponentRow> for CatalogRecord {
    type Error = Error;
    fn try_from(row: ComponentRow) -> Result<Self, Self::Error> {
        Ok(Self {
            content_hash: row.content_hash,
            component_name: row.component_name,
            version_label: row.version_label,
            // Indexers write empty strings as often as NULLs.
            semver_label: row.semver_label.filter(|s| !s.trim().is_empty()),
            ecosystem: row.ecosystem,
            provenance_id: row.provenance_id,
            indexed: row.indexed,
            discovered_at: UtcDateTime::from_unix_timestamp(row.discovered_at)
                .or_raise(|| ErrorKind::InvalidData("discovery date"))?,
        })
    }
}
