//! Per-identifier results and the batch summary.

use derive_more::Display;

/// How a single identifier was classified.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Outcome {
    /// At least one usage fact was found.
    #[display("found")]
    Found,
    /// The catalog knows nothing matching the identifier (and requirement).
    #[display("not_found")]
    NotFound,
    /// Catalog rows were selected but none of them has usage information.
    #[display("no_info")]
    NoInfo,
    /// The identifier or its requirement could not be parsed.
    #[display("parse_failure")]
    ParseFailure,
}

/// A version the lookup settled on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVersion {
    /// Canonical semantic version, or the raw label when it did not parse.
    pub version: String,
    pub label: String,
    pub content_hashes: Vec<String>,
}

/// Result for one input identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputItem<F> {
    /// The identifier as received.
    pub identifier: String,
    pub ecosystem: Option<String>,
    pub name: Option<String>,
    pub requirement: Option<String>,
    pub versions: Vec<ResolvedVersion>,
    /// De-duplicated usage facts across every selected version.
    pub facts: Vec<F>,
    pub outcome: Outcome,
    /// Selection involved versions that could not be parsed.
    pub without_semver: bool,
    /// Human-readable reason for parse failures.
    pub reason: Option<String>,
}

impl<F> OutputItem<F> {
    pub(crate) fn parse_failure(identifier: &str, reason: String) -> Self {
        Self {
            identifier: identifier.to_string(),
            ecosystem: None,
            name: None,
            requirement: None,
            versions: Vec::new(),
            facts: Vec::new(),
            outcome: Outcome::ParseFailure,
            without_semver: false,
            reason: Some(reason),
        }
    }
}

/// Batch totals. Every list holds raw identifiers in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    total: usize,
    failed_to_parse: Vec<String>,
    not_found: Vec<String>,
    without_info: Vec<String>,
    without_semver: Vec<String>,
}

impl Summary {
    /// Build a summary from items given in input order.
    pub fn from_items<F>(items: &[OutputItem<F>]) -> Self {
        let mut summary = Self {
            total: items.len(),
            ..Self::default()
        };
        for item in items {
            let bucket = match item.outcome {
                Outcome::Found => None,
                Outcome::NotFound => Some(&mut summary.not_found),
                Outcome::NoInfo => Some(&mut summary.without_info),
                Outcome::ParseFailure => Some(&mut summary.failed_to_parse),
            };
            if let Some(bucket) = bucket {
                bucket.push(item.identifier.clone());
            }
            if item.without_semver {
                summary.without_semver.push(item.identifier.clone());
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn failed_to_parse(&self) -> &[String] {
        &self.failed_to_parse
    }

    pub fn not_found(&self) -> &[String] {
        &self.not_found
    }

    pub fn without_info(&self) -> &[String] {
        &self.without_info
    }

    /// Identifiers whose selection involved unparseable versions. This is an
    /// annotation; these identifiers are also counted in an outcome bucket.
    pub fn without_semver(&self) -> &[String] {
        &self.without_semver
    }

    /// Identifiers classified [`Outcome::Found`].
    pub fn found(&self) -> usize {
        self.total - self.failed_to_parse.len() - self.not_found.len() - self.without_info.len()
    }
}

/// Everything a batch lookup produced, items in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report<F> {
    pub items: Vec<OutputItem<F>>,
    pub summary: Summary,
}
