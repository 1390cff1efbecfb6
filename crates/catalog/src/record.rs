use time::UtcDateTime;

/// Content hash recorded for catalog rows that were discovered but never
/// analysed. Such rows can't have usage facts.
pub const NO_DATA_HASH: &str = "NO_DATA";

/// A single row of the component-version catalog.
///
/// The same logical release can appear more than once (one row per
/// provenance), each with its own content hash. Records are read-only once
/// fetched; callers take ownership of the rows returned by a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRecord {
    /// Identity used to look up usage facts.
    pub content_hash: String,
    pub component_name: String,
    /// Version as published by the ecosystem (not necessarily semver).
    pub version_label: String,
    /// Semantic version label, when the indexer could derive one.
    pub semver_label: Option<String>,
    pub ecosystem: String,
    /// Where this row was indexed from (registry mirror, source archive...).
    pub provenance_id: String,
    /// Whether usage analysis has completed for this row.
    pub indexed: bool,
    pub discovered_at: UtcDateTime,
}

impl CatalogRecord {
    /// Returns `true` when the content hash can be used to look up usage facts.
    pub fn has_data(&self) -> bool {
        !self.content_hash.is_empty() && self.content_hash != NO_DATA_HASH
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("8b1a9953c4611296a827abf8c47804d7", true)]
    #[case("", false)]
    #[case(NO_DATA_HASH, false)]
    fn test_has_data(#[case] content_hash: &str, #[case] expected: bool) {
        let record = CatalogRecord {
            content_hash: content_hash.to_string(),
            component_name: "ring".to_string(),
            version_label: "0.17.8".to_string(),
            semver_label: Some("0.17.8".to_string()),
            ecosystem: "cargo".to_string(),
            provenance_id: "crates.io".to_string(),
            indexed: true,
            discovered_at: UtcDateTime::now(),
        };
        assert_eq!(record.has_data(), expected);
    }
}
