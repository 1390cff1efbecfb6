//! Package URL (`pkg:type/namespace/name@version?qualifiers#subpath`) parsing.
//!
//! Decoding and component validation are done by the `packageurl` crate.
//! This module adds what the catalog needs on top: a stricter shape check
//! (a type must be followed by `/`), per-ecosystem name normalisation, and
//! the catalog key.

use crate::error::{Error, ErrorKind, Result};
use exn::ResultExt;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

const SCHEME: &str = "pkg";

/// A parsed package URL.
///
/// All components are stored percent-decoded. Type-specific name
/// normalisation (lower-casing, `_` to `-` for PyPI) has already been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageUrl {
    pub ty: String,
    pub namespace: Option<String>,
    pub name: String,
    pub version: Option<String>,
    pub qualifiers: BTreeMap<String, String>,
    pub subpath: Option<String>,
}

impl PackageUrl {
    /// Name used to key the component catalog.
    ///
    /// Some ecosystems treat the namespace as part of the package identity
    /// (npm scopes, Go module paths, GitHub owners), so it is kept. Maven
    /// joins group and artifact with a colon. Everything else uses the bare
    /// name.
    pub fn catalog_name(&self) -> String {
        match (self.ty.as_str(), &self.namespace) {
            ("maven", Some(namespace)) => format!("{namespace}:{}", self.name),
            ("npm" | "golang" | "github" | "bitbucket" | "composer" | "swift", Some(namespace)) => {
                format!("{namespace}/{}", self.name)
            },
            _ => self.name.clone(),
        }
    }
}

/// `pkg:<type>/...` with a non-empty type; the rest is left to `packageurl`.
fn check_shape(s: &str) -> Result<()> {
    let rest = match s.split_once(':') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case(SCHEME) => rest,
        _ => exn::bail!(ErrorKind::MissingScheme),
    };
    let rest = rest.trim_start_matches('/');
    let head = rest.split(['?', '#']).next().unwrap_or_default();
    match head.split_once('/') {
        Some(("", _)) => exn::bail!(ErrorKind::MissingNamespaceSeparator),
        Some(_) => Ok(()),
        None if head.is_empty() => exn::bail!(ErrorKind::MissingType),
        None => exn::bail!(ErrorKind::MissingNamespaceSeparator),
    }
}

fn validate_type(ty: &str) -> Result<String> {
    let ty = ty.to_ascii_lowercase();
    let valid_chars = ty.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '+' | '-'));
    if !valid_chars || ty.starts_with(|c: char| c.is_ascii_digit()) {
        exn::bail!(ErrorKind::InvalidType(ty));
    }
    Ok(ty)
}

fn normalize_name(ty: &str, name: &str) -> String {
    match ty {
        "pypi" => name.to_lowercase().replace('_', "-"),
        "github" | "bitbucket" | "npm" => name.to_lowercase(),
        _ => name.to_string(),
    }
}

fn normalize_namespace(ty: &str, namespace: &str) -> String {
    match ty {
        "github" | "bitbucket" | "npm" => namespace.to_lowercase(),
        _ => namespace.to_string(),
    }
}

impl FromStr for PackageUrl {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        check_shape(s)?;
        let purl = packageurl::PackageUrl::from_str(s).or_raise(|| ErrorKind::Malformed)?;
        let ty = validate_type(purl.ty())?;
        let name = purl.name();
        if name.trim().is_empty() {
            exn::bail!(ErrorKind::MissingName);
        }
        let version = match purl.version() {
            Some(version) if version.trim().is_empty() => exn::bail!(ErrorKind::EmptyComponent("version")),
            version => version.map(str::to_string),
        };
        let namespace = purl
            .namespace()
            .map(|ns| ns.trim_matches('/'))
            .filter(|ns| !ns.is_empty())
            .map(|ns| normalize_namespace(&ty, ns));
        let qualifiers = purl
            .qualifiers()
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Ok(Self {
            name: normalize_name(&ty, name),
            ty,
            namespace,
            version,
            qualifiers,
            subpath: purl.subpath().map(str::to_string),
        })
    }
}

impl Display for PackageUrl {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{SCHEME}:{}/", self.ty)?;
        if let Some(namespace) = &self.namespace {
            write!(f, "{namespace}/")?;
        }
        write!(f, "{}", self.name)?;
        if let Some(version) = &self.version {
            write!(f, "@{version}")?;
        }
        Ok(())
    }
}
