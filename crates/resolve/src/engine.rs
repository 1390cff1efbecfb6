use crate::error::{ErrorKind, Result};
use crate::recorder::{NoopRecorder, Recorder};
use crate::report::{Outcome, OutputItem, ResolvedVersion};
use crate::requirement::Requirement;
use crate::select::{Selection, select_all_in_range, select_best};
use crate::version::record_version;
use algoscope_catalog::{CatalogHandle, CatalogRecord, UsageFact, UsageHandle};
use algoscope_identifier::{Identifier, validate_requirement};
use exn::ResultExt;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::instrument;

pub const DEFAULT_CONCURRENCY: usize = 16;
pub const DEFAULT_MAX_HASHES_PER_QUERY: usize = 500;

/// How many versions a lookup settles on per identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Cardinality {
    /// Only the highest matching version.
    #[default]
    Single,
    /// Every matching version.
    Many,
}

/// One identifier to look up, with an optional requirement that overrides a
/// range embedded in the identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupRequest {
    pub identifier: String,
    pub requirement: Option<String>,
}

impl LookupRequest {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            requirement: None,
        }
    }

    pub fn with_requirement(self, requirement: impl Into<String>) -> Self {
        Self {
            requirement: Some(requirement.into()),
            ..self
        }
    }
}

impl From<&str> for LookupRequest {
    fn from(identifier: &str) -> Self {
        Self::new(identifier)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    pub requests: Vec<LookupRequest>,
    pub cardinality: Cardinality,
}

impl Batch {
    pub fn new(requests: impl IntoIterator<Item = impl Into<LookupRequest>>, cardinality: Cardinality) -> Self {
        Self {
            requests: requests.into_iter().map(Into::into).collect(),
            cardinality,
        }
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Identifiers processed at the same time.
    pub concurrency: usize,
    /// Upper bound on the hash set of a single usage query.
    pub max_hashes_per_query: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            max_hashes_per_query: DEFAULT_MAX_HASHES_PER_QUERY,
        }
    }
}

/// Resolves batches of identifiers to usage facts of type `F`.
///
/// The engine owns nothing but handles: cloning it is cheap, and one engine
/// can serve any number of concurrent batches.
#[derive(Clone)]
pub struct Engine<F: UsageFact> {
    pub(crate) catalog: CatalogHandle,
    pub(crate) usage: UsageHandle<F>,
    pub(crate) recorder: Arc<dyn Recorder>,
    pub(crate) options: Options,
}

impl<F: UsageFact> Engine<F> {
    pub fn new(catalog: CatalogHandle, usage: UsageHandle<F>) -> Self {
        Self {
            catalog,
            usage,
            recorder: Arc::new(NoopRecorder),
            options: Options::default(),
        }
    }

    pub fn with_recorder(self, recorder: Arc<dyn Recorder>) -> Self {
        Self { recorder, ..self }
    }

    /// Zero bounds are raised to one.
    pub fn with_options(self, options: Options) -> Self {
        let options = Options {
            concurrency: options.concurrency.max(1),
            max_hashes_per_query: options.max_hashes_per_query.max(1),
        };
        Self { options, ..self }
    }

    pub fn options(&self) -> Options {
        self.options
    }

    pub(crate) async fn resolve_indexed(
        &self,
        index: usize,
        request: &LookupRequest,
        cardinality: Cardinality,
    ) -> Result<(usize, OutputItem<F>)> {
        let item = self.resolve(request, cardinality).await?;
        Ok((index, item))
    }

    /// Classify one identifier. Only storage failures are errors.
    #[instrument(level = "debug", skip_all, fields(identifier = %request.identifier))]
    async fn resolve(&self, request: &LookupRequest, cardinality: Cardinality) -> Result<OutputItem<F>> {
        let identifier = match Identifier::parse(request.identifier.as_str(), request.requirement.as_deref()) {
            Ok(identifier) => identifier,
            Err(err) => {
                let reason = (*err).to_string();
                tracing::debug!(%reason, "Identifier could not be parsed");
                return Ok(OutputItem::parse_failure(&request.identifier, reason));
            },
        };
        let requirement = match identifier.requirement.as_deref().map(parse_requirement).transpose() {
            Ok(requirement) => requirement,
            Err(reason) => {
                tracing::debug!(%reason, "Requirement could not be parsed");
                return Ok(OutputItem::parse_failure(&request.identifier, reason));
            },
        };

        let mut item = OutputItem {
            identifier: request.identifier.clone(),
            ecosystem: Some(identifier.ecosystem.clone()),
            name: Some(identifier.name.clone()),
            requirement: identifier.requirement.clone(),
            versions: Vec::new(),
            facts: Vec::new(),
            outcome: Outcome::NotFound,
            without_semver: false,
            reason: None,
        };

        let (name, ecosystem) = (identifier.name.as_str(), identifier.ecosystem.as_str());
        let query = match (identifier.version.as_deref(), requirement.as_ref()) {
            (Some(version), _) => self.catalog.exact(name, ecosystem, version).await,
            (None, Some(requirement)) => self.catalog.range(name, ecosystem, requirement.as_str()).await,
            (None, None) => self.catalog.by_name(name, ecosystem).await,
        };
        let records = match query {
            Ok(records) => records,
            // The store refused the query itself: the identifier is at fault.
            Err(err) if err.is_input_error() => {
                let reason = (*err).to_string();
                tracing::debug!(%reason, "Catalog rejected the identifier");
                return Ok(OutputItem::parse_failure(&request.identifier, reason));
            },
            Err(err) => return Err(err).or_raise(|| ErrorKind::Catalog),
        };
        let selections = match identifier.version {
            // Every row is already the requested version: keep them all.
            Some(_) => select_all_in_range(&records, None),
            None => select(&records, requirement.as_ref(), cardinality),
        };

        item.without_semver = match selections.is_empty() {
            true => records.iter().any(|r| record_version(r).is_none()),
            false => selections.iter().any(Selection::is_fallback),
        };
        if selections.is_empty() {
            tracing::debug!(candidates = records.len(), "No catalog version selected");
            return Ok(item);
        }

        item.versions = selections.iter().map(resolved_version).collect();
        let hashes: BTreeSet<&str> = selections
            .iter()
            .flat_map(|s| &s.records)
            .filter(|r| r.has_data())
            .map(|r| r.content_hash.as_str())
            .collect();
        if hashes.is_empty() {
            tracing::debug!(versions = item.versions.len(), "Selected versions carry no usable content hash");
            item.outcome = Outcome::NoInfo;
            return Ok(item);
        }

        let hashes: Vec<String> = hashes.into_iter().map(str::to_string).collect();
        let mut facts: BTreeMap<F::Key, F> = BTreeMap::new();
        for chunk in hashes.chunks(self.options.max_hashes_per_query) {
            for fact in self.usage.usage_by_hashes(chunk).await.or_raise(|| ErrorKind::Usage)? {
                facts.entry(fact.identity()).or_insert(fact);
            }
        }
        item.facts = facts.into_values().collect();
        item.outcome = match item.facts.is_empty() {
            true => Outcome::NoInfo,
            false => Outcome::Found,
        };
        tracing::debug!(outcome = %item.outcome, facts = item.facts.len(), hashes = hashes.len(), "Identifier resolved");
        Ok(item)
    }
}

fn parse_requirement(requirement: &str) -> std::result::Result<Requirement, String> {
    validate_requirement(requirement).map_err(|err| (*err).to_string())?;
    Requirement::parse(requirement).map_err(|err| (*err).to_string())
}

fn select(records: &[CatalogRecord], requirement: Option<&Requirement>, cardinality: Cardinality) -> Vec<Selection> {
    match cardinality {
        Cardinality::Single => select_best(records, requirement).into_iter().collect(),
        Cardinality::Many => select_all_in_range(records, requirement),
    }
}

fn resolved_version(selection: &Selection) -> ResolvedVersion {
    ResolvedVersion {
        version: selection.display_version(),
        label: selection.label.clone(),
        content_hashes: selection
            .records
            .iter()
            .filter(|r| r.has_data())
            .map(|r| r.content_hash.clone())
            .collect(),
    }
}
