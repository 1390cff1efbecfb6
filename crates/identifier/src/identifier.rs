use crate::error::Result;
use crate::purl::PackageUrl;
use crate::requirement::as_exact_version;

/// Characters that never appear in a plain version label but always appear in
/// a range expression.
const RANGE_CHARS: &[char] = &['<', '>', '=', '!', '~', '^', '*', ',', '|', ' '];

/// A package identifier, reduced to what the catalog needs to know.
///
/// `version` and `requirement` refine each other: when no version is given
/// but the requirement pins exactly one version, the requirement is promoted
/// to `version` so that the cheaper exact catalog lookup can be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    /// The string exactly as it was received.
    pub raw: String,
    /// Ecosystem (package URL type), e.g. `npm` or `maven`.
    pub ecosystem: String,
    /// Bare name used as the catalog key.
    pub name: String,
    pub version: Option<String>,
    pub requirement: Option<String>,
}

impl Identifier {
    /// Parse a raw package identifier.
    ///
    /// An explicit `requirement` takes precedence over a range embedded in the
    /// identifier's version component (`pkg:npm/jose@>=4.0.0,<5.0.0`). The
    /// requirement is **not** validated here; see
    /// [`validate_requirement`](crate::validate_requirement).
    pub fn parse(raw: impl Into<String>, requirement: Option<&str>) -> Result<Self> {
        let raw = raw.into();
        let purl: PackageUrl = raw.parse()?;
        let (mut version, embedded) = match purl.version.as_deref() {
            Some(v) if v.contains(RANGE_CHARS) => (None, Some(v.to_string())),
            Some(v) => (Some(v.to_string()), None),
            None => (None, None),
        };
        let mut requirement = requirement
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .or(embedded);
        if version.is_none()
            && let Some(exact) = requirement.as_deref().and_then(as_exact_version)
        {
            tracing::trace!(identifier = %raw, version = %exact, "Promoting exact requirement to version");
            version = Some(exact);
            requirement = None;
        }
        Ok(Self {
            ecosystem: purl.ty.clone(),
            name: purl.catalog_name(),
            raw,
            version,
            requirement,
        })
    }
}
