//! Version selection over catalog rows.
//!
//! Rows are grouped by the version they stand for. Rows whose labels do not
//! parse all share the sentinel version, so they are grouped by raw label
//! instead to keep distinct unparseable versions apart.

use crate::requirement::Requirement;
use crate::version::{precedence, record_version, sentinel};
use algoscope_catalog::CatalogRecord;
use semver::Version;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// One selected version and every catalog row (provenance) that carries it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// The [`sentinel`] for fallback selections.
    pub version: Version,
    /// Raw label of the first row in the group.
    pub label: String,
    pub records: Vec<CatalogRecord>,
    fallback: bool,
}

impl Selection {
    /// The rows of this selection could not be parsed as semantic versions.
    pub fn is_fallback(&self) -> bool {
        self.fallback
    }

    /// Canonical version string, or the raw label for fallback selections.
    pub fn display_version(&self) -> String {
        match self.is_fallback() {
            true => self.label.clone(),
            false => self.version.to_string(),
        }
    }
}

/// Unparseable rows first, by raw label, then versions by precedence.
/// Versions that differ only in build metadata are separate groups, ordered
/// by their build metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
enum GroupKey {
    Fallback(String),
    Parsed(Version),
}

impl Ord for GroupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Fallback(a), Self::Fallback(b)) => a.cmp(b),
            (Self::Fallback(_), Self::Parsed(_)) => Ordering::Less,
            (Self::Parsed(_), Self::Fallback(_)) => Ordering::Greater,
            (Self::Parsed(a), Self::Parsed(b)) => precedence(a, b).then_with(|| a.build.cmp(&b.build)),
        }
    }
}

impl PartialOrd for GroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn group(records: &[CatalogRecord], requirement: Option<&Requirement>) -> BTreeMap<GroupKey, Selection> {
    let mut groups: BTreeMap<GroupKey, Selection> = BTreeMap::new();
    for record in records {
        let version = record_version(record);
        if let Some(requirement) = requirement
            && !version.as_ref().is_some_and(|v| requirement.matches(v))
        {
            continue;
        }
        let key = match &version {
            Some(version) => GroupKey::Parsed(version.clone()),
            None => GroupKey::Fallback(record.version_label.clone()),
        };
        groups
            .entry(key)
            .or_insert_with(|| Selection {
                fallback: version.is_none(),
                version: version.unwrap_or_else(sentinel),
                label: record.version_label.clone(),
                records: Vec::new(),
            })
            .records
            .push(record.clone());
    }
    groups
}

/// The highest version satisfying `requirement`, with all rows that carry
/// it.
///
/// Rows whose version could not be parsed never win. Returns `None` when no
/// row qualifies.
pub fn select_best(records: &[CatalogRecord], requirement: Option<&Requirement>) -> Option<Selection> {
    group(records, requirement).into_values().filter(|s| !s.is_fallback()).next_back()
}

/// Every distinct version satisfying `requirement`, lowest first.
///
/// Without a requirement every row takes part, including rows whose version
/// could not be parsed (they sort first).
pub fn select_all_in_range(records: &[CatalogRecord], requirement: Option<&Requirement>) -> Vec<Selection> {
    group(records, requirement).into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::UtcDateTime;

    fn record(label: &str, provenance: &str) -> CatalogRecord {
        CatalogRecord {
            content_hash: format!("{label}-{provenance}"),
            component_name: "django".to_string(),
            version_label: label.to_string(),
            semver_label: None,
            ecosystem: "pypi".to_string(),
            provenance_id: provenance.to_string(),
            indexed: true,
            discovered_at: UtcDateTime::now(),
        }
    }

    fn records(labels: &[&str]) -> Vec<CatalogRecord> {
        labels.iter().map(|l| record(l, "registry")).collect()
    }

    fn requirement(text: &str) -> Requirement {
        Requirement::parse(text).unwrap()
    }

    fn versions(selections: &[Selection]) -> Vec<String> {
        selections.iter().map(Selection::display_version).collect()
    }

    #[test]
    fn test_best_with_partial_lower_bound() {
        let rows = records(&["v5.3.0", "v5.3.1", "v5.4.6"]);
        let best = select_best(&rows, Some(&requirement(">v5.3"))).unwrap();
        assert_eq!(best.version, Version::new(5, 4, 6));
        assert_eq!(best.label, "v5.4.6");
    }

    #[test]
    fn test_all_in_range_with_partial_lower_bound() {
        let rows = records(&["v5.3.0", "v5.3.1", "v5.4.6"]);
        let selected = select_all_in_range(&rows, Some(&requirement(">v5.3")));
        assert_eq!(versions(&selected), vec!["5.3.1", "5.4.6"]);
    }

    #[test]
    fn test_all_in_range_bounded() {
        let rows = records(&["v5.4.5", "v5.4.6", "v5.4.7"]);
        let selected = select_all_in_range(&rows, Some(&requirement(">v5.4.5,<5.4.7")));
        assert_eq!(versions(&selected), vec!["5.4.6"]);
    }

    #[test]
    fn test_best_without_requirement_skips_unparseable() {
        let rows = records(&["latest", "1.0.0", "2.1", "nightly"]);
        let best = select_best(&rows, None).unwrap();
        assert_eq!(best.display_version(), "2.1.0");
        assert!(!best.is_fallback());
    }

    #[test]
    fn test_best_none_when_only_unparseable() {
        let rows = records(&["latest", "nightly"]);
        assert_eq!(select_best(&rows, None), None);
    }

    #[test]
    fn test_all_without_requirement_keeps_unparseable_apart() {
        let rows = records(&["nightly", "1.0.0", "latest", "latest"]);
        let selected = select_all_in_range(&rows, None);
        assert_eq!(versions(&selected), vec!["latest", "nightly", "1.0.0"]);
        assert!(selected[0].is_fallback());
        assert_eq!(selected[0].records.len(), 2);
    }

    #[test]
    fn test_requirement_excludes_unparseable() {
        let rows = records(&["latest", "1.0.0"]);
        let selected = select_all_in_range(&rows, Some(&requirement(">=0.0.0")));
        assert_eq!(versions(&selected), vec!["1.0.0"]);
    }

    #[test]
    fn test_same_version_merges_provenances() {
        let rows = vec![record("1.4.0", "registry"), record("v1.4.0", "tarball"), record("1.3.0", "registry")];
        let best = select_best(&rows, None).unwrap();
        assert_eq!(best.records.len(), 2);
        assert_eq!(best.label, "1.4.0");
        let selected = select_all_in_range(&rows, None);
        assert_eq!(versions(&selected), vec!["1.3.0", "1.4.0"]);
    }

    #[test]
    fn test_semver_label_preferred() {
        let mut row = record("release-7", "registry");
        row.semver_label = Some("7.0.0".to_string());
        let best = select_best(&[row], None).unwrap();
        assert_eq!(best.version, Version::new(7, 0, 0));
        assert_eq!(best.label, "release-7");
    }

    #[test]
    fn test_nothing_in_range() {
        let rows = records(&["1.0.0", "1.1.0"]);
        assert!(select_all_in_range(&rows, Some(&requirement(">=2.0.0"))).is_empty());
        assert_eq!(select_best(&rows, Some(&requirement(">=2.0.0"))), None);
    }

    #[test]
    fn test_real_lowest_version_is_not_fallback() {
        let rows = records(&["0.0.0-0", "latest"]);
        let best = select_best(&rows, None).unwrap();
        assert!(!best.is_fallback());
        assert_eq!(best.display_version(), "0.0.0-0");
        let selected = select_all_in_range(&rows, None);
        assert_eq!(versions(&selected), vec!["latest", "0.0.0-0"]);
        assert!(selected[0].is_fallback());
        assert!(!selected[1].is_fallback());
    }

    #[test]
    fn test_build_metadata_breaks_ties_after_precedence() {
        let rows = records(&["1.0.0+b", "1.0.1-rc.1", "1.0.0+a", "1.0.0"]);
        let selected = select_all_in_range(&rows, None);
        assert_eq!(versions(&selected), vec!["1.0.0", "1.0.0+a", "1.0.0+b", "1.0.1-rc.1"]);
        let rows = records(&["1.0.0+b", "1.0.0+a", "0.9.0+z"]);
        assert_eq!(select_best(&rows, None).unwrap().display_version(), "1.0.0+b");
    }

    #[test]
    fn test_deterministic() {
        let rows = records(&["0.9.0", "latest", "1.2.0", "1.10.0", "1.2"]);
        let first = select_all_in_range(&rows, None);
        let second = select_all_in_range(&rows, None);
        assert_eq!(first, second);
        assert_eq!(versions(&first), vec!["latest", "0.9.0", "1.2.0", "1.10.0"]);
        assert_eq!(select_best(&rows, None), select_best(&rows, None));
    }
}
