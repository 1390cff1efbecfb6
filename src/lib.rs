//! Look up the cryptographic algorithms and libraries used by package
//! versions.
//!
//! [`Service`] ties the pieces together: it opens the configured catalog
//! database and exposes one lookup engine per usage fact shape.
//!
//! ```no_run
//! use algoscope::{Batch, Cardinality, Config, Service};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load(None).map_err(|e| (*e).to_string())?;
//! let service = Service::connect(&config).await.map_err(|e| (*e).to_string())?;
//! let batch = Batch::new(["pkg:pypi/cryptography@42.0.5"], Cardinality::Single);
//! let report = service.algorithms(&batch).await.map_err(|e| (*e).to_string())?;
//! println!("{} of {} found", report.summary.found(), report.summary.total());
//! # Ok(())
//! # }
//! ```

mod error;

pub use crate::error::{Error, ErrorKind, Result};
pub use algoscope_catalog::{AlgorithmUsage, CatalogRecord, Database, LibraryDetection, NO_DATA_HASH, Repository};
pub use algoscope_config::{Config, DatabaseConfig, LookupConfig};
pub use algoscope_identifier::{Identifier, PackageUrl};
pub use algoscope_resolve::{
    Batch, Cardinality, Context, CountingRecorder, Engine, LookupEvent, LookupRequest, NoopRecorder, Outcome,
    OutputItem, Recorder, Report, ResolvedVersion, Summary,
};
use exn::ResultExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// The lookup service over one catalog database.
#[derive(Clone)]
pub struct Service {
    db: Database,
    algorithms: Engine<AlgorithmUsage>,
    libraries: Engine<LibraryDetection>,
    timeout: Option<Duration>,
}

impl Service {
    /// Open (creating if needed) the catalog database named by `config`.
    #[instrument(skip_all, fields(path = %config.database.path.display()))]
    pub async fn connect(config: &Config) -> Result<Self> {
        config.validate().or_raise(|| ErrorKind::Config)?;
        if let Some(parent) = config.database.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).or_raise(|| ErrorKind::Database)?;
        }
        let db = Database::connect_with_limit(&config.database.path, config.database.max_connections)
            .await
            .or_raise(|| ErrorKind::Database)?;
        tracing::info!("Catalog database ready");
        Ok(Self::from_database(db, &config.lookup))
    }

    /// Build the service over an already connected database.
    pub fn from_database(db: Database, lookup: &LookupConfig) -> Self {
        let repo = Arc::new(Repository::from(&db));
        Self {
            algorithms: Engine::<AlgorithmUsage>::new(repo.clone(), repo.clone()).with_options(lookup.options()),
            libraries: Engine::<LibraryDetection>::new(repo.clone(), repo).with_options(lookup.options()),
            timeout: lookup.timeout(),
            db,
        }
    }

    /// Report lookup metrics to `recorder`.
    pub fn with_recorder(self, recorder: Arc<dyn Recorder>) -> Self {
        Self {
            algorithms: self.algorithms.with_recorder(recorder.clone()),
            libraries: self.libraries.with_recorder(recorder),
            ..self
        }
    }

    /// Repository over the same database, for catalog loaders.
    pub fn repository(&self) -> Repository {
        Repository::from(&self.db)
    }

    /// A fresh context honouring the configured timeout.
    pub fn context(&self) -> Context {
        match self.timeout {
            Some(timeout) => Context::new().with_timeout(timeout),
            None => Context::new(),
        }
    }

    pub fn algorithm_engine(&self) -> &Engine<AlgorithmUsage> {
        &self.algorithms
    }

    pub fn library_engine(&self) -> &Engine<LibraryDetection> {
        &self.libraries
    }

    /// Cryptographic algorithms used by each identifier of the batch.
    pub async fn algorithms(&self, batch: &Batch) -> algoscope_resolve::Result<Report<AlgorithmUsage>> {
        self.algorithms.lookup(batch, &self.context()).await
    }

    /// Known cryptography libraries detected in each identifier of the batch.
    pub async fn libraries(&self, batch: &Batch) -> algoscope_resolve::Result<Report<LibraryDetection>> {
        self.libraries.lookup(batch, &self.context()).await
    }

    pub async fn close(self) {
        self.db.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use time::UtcDateTime;

    fn record(name: &str, ecosystem: &str, version: &str, hash: &str) -> CatalogRecord {
        CatalogRecord {
            content_hash: hash.to_string(),
            component_name: name.to_string(),
            version_label: version.to_string(),
            semver_label: Some(version.to_string()),
            ecosystem: ecosystem.to_string(),
            provenance_id: "registry".to_string(),
            indexed: true,
            discovered_at: UtcDateTime::now(),
        }
    }

    async fn seeded() -> Service {
        let db = Database::connect_in_memory().await.unwrap();
        let service = Service::from_database(db, &LookupConfig::default());
        let repo = service.repository();
        for r in [
            record("cryptography", "pypi", "41.0.7", "c417"),
            record("cryptography", "pypi", "42.0.5", "c425"),
            record("org.bouncycastle:bcprov-jdk18on", "maven", "1.78", "bc178"),
        ] {
            repo.upsert_component(&r).await.unwrap();
        }
        for (hash, algorithm, strength) in
            [("c417", "SHA-1", "weak"), ("c425", "AES-256-GCM", "strong"), ("c425", "SHA-1", "weak")]
        {
            let usage = AlgorithmUsage {
                content_hash: hash.to_string(),
                algorithm: algorithm.to_string(),
                strength: strength.to_string(),
            };
            repo.insert_algorithm_usage(&usage).await.unwrap();
        }
        repo.insert_library_detection(&LibraryDetection {
            content_hash: "bc178".to_string(),
            detection_id: "bouncycastle".to_string(),
            name: "Bouncy Castle".to_string(),
            description: None,
            url: Some("https://www.bouncycastle.org".to_string()),
            category: Some("provider".to_string()),
        })
        .await
        .unwrap();
        service
    }

    #[tokio::test]
    async fn test_algorithms_over_sqlite() {
        let service = seeded().await;
        let batch = Batch::new(
            [
                LookupRequest::new("pkg:pypi/Cryptography"),
                LookupRequest::new("pkg:pypi/cryptography").with_requirement(">=41.0.0, <42.0.0"),
                LookupRequest::new("pkg:pypi"),
            ],
            Cardinality::Single,
        );
        let report = service.algorithms(&batch).await.unwrap();
        let latest: Vec<_> = report.items[0].facts.iter().map(|f| f.algorithm.as_str()).collect();
        assert_eq!(latest, vec!["AES-256-GCM", "SHA-1"]);
        assert_eq!(report.items[0].versions[0].version, "42.0.5");
        assert_eq!(report.items[1].versions[0].version, "41.0.7");
        assert_eq!(report.items[2].outcome, Outcome::ParseFailure);
        assert_eq!(report.summary.found(), 2);
        service.close().await;
    }

    #[rstest]
    #[case::latest("pkg:pypi/cryptography", None, Cardinality::Single, Outcome::Found, &["42.0.5"])]
    #[case::exact("pkg:pypi/cryptography@41.0.7", None, Cardinality::Single, Outcome::Found, &["41.0.7"])]
    #[case::all("pkg:pypi/cryptography", None, Cardinality::Many, Outcome::Found, &["41.0.7", "42.0.5"])]
    #[case::embedded("pkg:pypi/cryptography@%3E%3D42.0.0", None, Cardinality::Many, Outcome::Found, &["42.0.5"])]
    #[case::excluded("pkg:pypi/cryptography", Some(">=43.0.0"), Cardinality::Many, Outcome::NotFound, &[])]
    #[case::no_usage("pkg:maven/org.bouncycastle/bcprov-jdk18on@1.78", None, Cardinality::Single, Outcome::NoInfo, &["1.78.0"])]
    #[case::unknown("pkg:cargo/ring", None, Cardinality::Single, Outcome::NotFound, &[])]
    #[case::blank_name("pkg:pypi/%20", None, Cardinality::Single, Outcome::ParseFailure, &[])]
    #[case::wildcard("pkg:pypi/cryptography", Some("*"), Cardinality::Single, Outcome::ParseFailure, &[])]
    #[tokio::test]
    async fn test_algorithm_lookup_over_sqlite(
        #[case] identifier: &str,
        #[case] requirement: Option<&str>,
        #[case] cardinality: Cardinality,
        #[case] outcome: Outcome,
        #[case] versions: &[&str],
    ) {
        let service = seeded().await;
        let request = match requirement {
            Some(requirement) => LookupRequest::new(identifier).with_requirement(requirement),
            None => LookupRequest::new(identifier),
        };
        let report = service.algorithms(&Batch::new([request], cardinality)).await.unwrap();
        let item = &report.items[0];
        assert_eq!(item.outcome, outcome, "{identifier}");
        let received: Vec<_> = item.versions.iter().map(|v| v.version.as_str()).collect();
        assert_eq!(received, versions, "{identifier}");
        service.close().await;
    }

    #[tokio::test]
    async fn test_libraries_over_sqlite() {
        let service = seeded().await;
        let batch = Batch::new(["pkg:maven/org.bouncycastle/bcprov-jdk18on@1.78"], Cardinality::Many);
        let report = service.libraries(&batch).await.unwrap();
        assert_eq!(report.items[0].outcome, Outcome::Found);
        assert_eq!(report.items[0].facts[0].detection_id, "bouncycastle");
        service.close().await;
    }

    #[tokio::test]
    async fn test_recorder_is_shared() {
        let recorder = Arc::new(CountingRecorder::default());
        let service = seeded().await.with_recorder(recorder.clone());
        let batch = Batch::new(["pkg:pypi/cryptography@42.0.5"], Cardinality::Single);
        service.algorithms(&batch).await.unwrap();
        service.libraries(&batch).await.unwrap();
        assert_eq!(recorder.count("pypi", Outcome::Found), 1);
        assert_eq!(recorder.count("pypi", Outcome::NoInfo), 1);
        assert_eq!(recorder.batches(), 2);
        service.close().await;
    }

    #[tokio::test]
    async fn test_connect_creates_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.database.path = dir.path().join("nested").join("catalog.sqlite");
        config.lookup.timeout_secs = Some(10);
        let service = Service::connect(&config).await.unwrap();
        assert!(config.database.path.exists());
        assert!(service.context().deadline().is_some());
        let batch = Batch::new(["pkg:cargo/ring"], Cardinality::Single);
        let report = service.algorithms(&batch).await.unwrap();
        assert_eq!(report.summary.not_found(), ["pkg:cargo/ring"]);
        service.close().await;
    }

    #[tokio::test]
    async fn test_connect_rejects_invalid_config() {
        let mut config = Config::default();
        config.lookup.concurrency = 0;
        let err = Service::connect(&config).await.err().unwrap();
        assert_eq!(*err, ErrorKind::Config);
    }
}
