//! Requirement syntax validation.
//!
//! Validation is deliberately stricter than matching: every comma-separated
//! segment must name a full `major.minor.patch` version (pre-release and
//! build suffixes allowed) once its comparator and `v` prefix are removed.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;

const COMPARATOR_CHARS: &[char] = &['>', '<', '=', '~', '^'];

fn is_wildcard(requirement: &str) -> bool {
    matches!(requirement, "*" | "v*")
}

/// Check that a requirement is well-formed before it is used to filter a
/// range query.
///
/// ```
/// use algoscope_identifier::validate_requirement;
///
/// assert!(validate_requirement(">=1.2.3, <2.0.0").is_ok());
/// assert!(validate_requirement("~v1.2.3-beta.1").is_ok());
/// assert!(validate_requirement(">1.2").is_err());
/// assert!(validate_requirement("*").is_err());
/// ```
pub fn validate(requirement: &str) -> Result<()> {
    if is_wildcard(requirement.trim()) {
        exn::bail!(ErrorKind::WildcardRequirement(requirement.to_string()));
    }
    for segment in requirement.split(',') {
        let segment = segment.trim();
        if segment.is_empty() {
            exn::bail!(ErrorKind::InvalidRequirement(requirement.to_string()));
        }
        let version = segment.trim_start_matches(COMPARATOR_CHARS);
        let version = version.strip_prefix('v').unwrap_or(version);
        semver::Version::parse(version).or_raise(|| ErrorKind::InvalidRequirement(requirement.to_string()))?;
    }
    Ok(())
}

/// Boolean form of [`validate`].
pub fn is_valid(requirement: &str) -> bool {
    validate(requirement).is_ok()
}

/// If the requirement pins exactly one version (`1.2.3`, `v1.2.3`, `=1.2.3`
/// or `==1.2.3`), return that version without its operator or prefix.
pub fn as_exact_version(requirement: &str) -> Option<String> {
    let requirement = requirement.trim();
    let version = requirement.strip_prefix("==").or_else(|| requirement.strip_prefix('=')).unwrap_or(requirement);
    let version = version.trim_start();
    let version = version.strip_prefix('v').unwrap_or(version);
    semver::Version::parse(version).ok().map(|v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1.2.3")]
    #[case("v1.2.3")]
    #[case(">1.2.3")]
    #[case(">=1.2.3")]
    #[case("<=v1.2.3")]
    #[case("~1.2.3")]
    #[case("^1.2.3")]
    #[case(">v5.4.5,<5.4.7")]
    #[case(" >=1.0.0 , <2.0.0 ")]
    #[case("1.2.3-rc.1+build.5")]
    fn test_valid(#[case] requirement: &str) {
        assert!(is_valid(requirement), "{requirement} should be valid");
    }

    #[rstest]
    #[case("")]
    #[case(",")]
    #[case(">=1.0.0,")]
    #[case(">v5.3")]
    #[case("1.2")]
    #[case("1.2.x")]
    #[case("1.2.3 || 2.0.0")]
    #[case("!=1.2.3")]
    #[case("vv1.2.3")]
    #[case(">= 1.2.3")]
    fn test_invalid(#[case] requirement: &str) {
        let err = validate(requirement).unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidRequirement(requirement.to_string()));
    }

    #[rstest]
    #[case("*")]
    #[case("v*")]
    #[case("  *  ")]
    fn test_wildcards(#[case] requirement: &str) {
        let err = validate(requirement).unwrap_err();
        assert!(matches!(*err, ErrorKind::WildcardRequirement(_)));
    }

    #[rstest]
    #[case("1.2.3", Some("1.2.3"))]
    #[case("v1.2.3", Some("1.2.3"))]
    #[case("=1.2.3", Some("1.2.3"))]
    #[case("== v1.2.3", Some("1.2.3"))]
    #[case("1.2.3-alpha", Some("1.2.3-alpha"))]
    #[case(">=1.2.3", None)]
    #[case("1.2", None)]
    #[case("1.2.3,<2.0.0", None)]
    fn test_exact_version(#[case] requirement: &str, #[case] expected: Option<&str>) {
        assert_eq!(as_exact_version(requirement).as_deref(), expected);
    }
}
