//! Lenient version parsing for catalog labels.
//!
//! Catalog labels come from many registries and are far from uniform
//! (`v1.2`, `1.4.0-rc1`, `2024.01.15`, `latest`). Anything that can be
//! coerced into a semantic version is; everything else maps onto a shared
//! sentinel that sorts below every real version.

use algoscope_catalog::CatalogRecord;
use semver::{BuildMetadata, Prerelease, Version};
use std::cmp::Ordering;

/// The version assigned to labels that cannot be parsed: `0.0.0-0`.
pub fn sentinel() -> Version {
    Version {
        major: 0,
        minor: 0,
        patch: 0,
        pre: Prerelease::new("0").unwrap_or_default(),
        build: BuildMetadata::EMPTY,
    }
}

/// Coerce a version label into a semantic version.
///
/// Surrounding whitespace and a single `v`/`V` prefix are ignored, and a
/// `major` or `major.minor` core is padded with zeros. Returns `None` when
/// the label still does not parse.
///
/// ```
/// use algoscope_resolve::version::parse_lenient;
///
/// assert_eq!(parse_lenient(" v1.2-beta ").unwrap().to_string(), "1.2.0-beta");
/// assert!(parse_lenient("latest").is_none());
/// ```
pub fn parse_lenient(label: &str) -> Option<Version> {
    let label = label.trim();
    let label = label.strip_prefix(['v', 'V']).unwrap_or(label);
    let split = label.find(['-', '+']).unwrap_or(label.len());
    let (core, suffix) = label.split_at(split);
    let parts: Vec<&str> = core.split('.').collect();
    if parts.len() > 3 || parts.iter().any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit())) {
        return None;
    }
    let mut padded = parts.join(".");
    for _ in parts.len()..3 {
        padded.push_str(".0");
    }
    padded.push_str(suffix);
    Version::parse(&padded).ok()
}

/// Lenient parse with the sentinel as fallback.
pub fn parse_or_sentinel(label: &str) -> Version {
    parse_lenient(label).unwrap_or_else(sentinel)
}

/// The version a catalog row stands for.
///
/// The normalized semantic label wins over the raw label. Returns `None`
/// when neither parses; such rows are ordered as the [`sentinel`] but are
/// never mistaken for a row that really carries `0.0.0-0`.
pub fn record_version(record: &CatalogRecord) -> Option<Version> {
    record
        .semver_label
        .as_deref()
        .and_then(parse_lenient)
        .or_else(|| parse_lenient(&record.version_label))
}

/// Semantic version precedence: build metadata is ignored.
pub fn precedence(a: &Version, b: &Version) -> Ordering {
    (a.major, a.minor, a.patch).cmp(&(b.major, b.minor, b.patch)).then_with(|| a.pre.cmp(&b.pre))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1.2.3", "1.2.3")]
    #[case("v1.2.3", "1.2.3")]
    #[case("V1.2.3", "1.2.3")]
    #[case("  1.2.3\n", "1.2.3")]
    #[case("1.2", "1.2.0")]
    #[case("7", "7.0.0")]
    #[case("v5.3", "5.3.0")]
    #[case("1.4.0-rc1", "1.4.0-rc1")]
    #[case("1.4-rc.1", "1.4.0-rc.1")]
    #[case("2.0.0+build.7", "2.0.0+build.7")]
    #[case("2024.1.15", "2024.1.15")]
    fn test_parse_lenient(#[case] label: &str, #[case] expected: &str) {
        assert_eq!(parse_lenient(label).unwrap().to_string(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("latest")]
    #[case("1.2.3.4")]
    #[case("1..2")]
    #[case("vv1.2.3")]
    #[case("1.x")]
    #[case("release-2")]
    #[case("2024.01.15")]
    fn test_unparseable(#[case] label: &str) {
        assert!(parse_lenient(label).is_none(), "{label}");
        assert_eq!(parse_or_sentinel(label), sentinel());
    }

    #[test]
    fn test_sentinel_sorts_below_everything() {
        let sentinel = sentinel();
        assert_eq!(sentinel.to_string(), "0.0.0-0");
        for label in ["0.0.0", "0.0.0-alpha", "0.0.1", "1.0.0"] {
            let version = parse_or_sentinel(label);
            assert_eq!(precedence(&sentinel, &version), Ordering::Less, "{label}");
        }
    }

    fn record(version_label: &str, semver_label: Option<&str>) -> CatalogRecord {
        CatalogRecord {
            content_hash: "h".to_string(),
            component_name: "jose".to_string(),
            version_label: version_label.to_string(),
            semver_label: semver_label.map(str::to_string),
            ecosystem: "npm".to_string(),
            provenance_id: "registry".to_string(),
            indexed: true,
            discovered_at: time::UtcDateTime::now(),
        }
    }

    #[rstest]
    #[case("release-7", Some("7.0"), Some("7.0.0"))]
    #[case("v5.4.6", Some("latest"), Some("5.4.6"))]
    #[case("v5.4.6", None, Some("5.4.6"))]
    #[case("0.0.0-0", None, Some("0.0.0-0"))]
    #[case("nightly", Some("unknown"), None)]
    fn test_record_version(#[case] label: &str, #[case] semver_label: Option<&str>, #[case] expected: Option<&str>) {
        let version = record_version(&record(label, semver_label)).map(|v| v.to_string());
        assert_eq!(version.as_deref(), expected);
    }

    #[test]
    fn test_precedence_ignores_build() {
        let a = Version::parse("1.0.0+a").unwrap();
        let b = Version::parse("1.0.0+b").unwrap();
        assert_eq!(precedence(&a, &b), Ordering::Equal);
        let pre = Version::parse("1.0.0-rc.1").unwrap();
        assert_eq!(precedence(&pre, &a), Ordering::Less);
    }
}
