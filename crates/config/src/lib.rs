//! Layered configuration for algoscope.
//!
//! Sources are merged in order, later ones winning:
//!
//! 1. Built-in defaults.
//! 2. A configuration file (TOML, YAML or JSON, chosen by extension). Either
//!    the path given explicitly, or `config.toml` in the user configuration
//!    directory when that file exists.
//! 3. Environment variables prefixed with `ALGOSCOPE_`, using `__` to
//!    separate nested keys (`ALGOSCOPE_LOOKUP__CONCURRENCY=8`).

mod error;

pub use crate::error::{Error, ErrorKind, Result};
use algoscope_catalog::DEFAULT_MAX_CONNECTIONS;
use algoscope_resolve::{DEFAULT_CONCURRENCY, DEFAULT_MAX_HASHES_PER_QUERY, Options};
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_PREFIX: &str = "ALGOSCOPE_";
const DATABASE_FILE: &str = "catalog.sqlite";

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("dev", "algoscope", "algoscope")
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub lookup: LookupConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite catalog file.
    pub path: PathBuf,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: project_dirs()
                .map(|dirs| dirs.data_dir().join(DATABASE_FILE))
                .unwrap_or_else(|| PathBuf::from(DATABASE_FILE)),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Identifiers resolved at the same time within one batch.
    pub concurrency: usize,
    pub max_hashes_per_query: usize,
    /// Per-batch deadline; unset means no deadline.
    pub timeout_secs: Option<u64>,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            max_hashes_per_query: DEFAULT_MAX_HASHES_PER_QUERY,
            timeout_secs: None,
        }
    }
}

impl LookupConfig {
    pub fn options(&self) -> Options {
        Options {
            concurrency: self.concurrency,
            max_hashes_per_query: self.max_hashes_per_query,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Config {
    /// `config.toml` in the user configuration directory.
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load from defaults, `path` (or the default file, if present) and the
    /// environment, then validate.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::from_figment(Self::figment(path)?)
    }

    /// The merged providers, without extracting or validating anything.
    pub fn figment(path: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        let file = match path {
            Some(path) if !path.is_file() => exn::bail!(ErrorKind::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path().filter(|p| p.is_file()),
        };
        if let Some(file) = file {
            tracing::debug!(path = %file.display(), "Loading configuration file");
            figment = match file.extension().and_then(|e| e.to_str()) {
                Some("toml") => figment.merge(Toml::file(&file)),
                Some("yaml" | "yml") => figment.merge(Yaml::file(&file)),
                Some("json") => figment.merge(Json::file(&file)),
                _ => exn::bail!(ErrorKind::UnsupportedFormat(file)),
            };
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().or_raise(|| ErrorKind::Invalid)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.database.max_connections == 0 {
            exn::bail!(ErrorKind::OutOfRange("database.max_connections"));
        }
        if self.lookup.concurrency == 0 {
            exn::bail!(ErrorKind::OutOfRange("lookup.concurrency"));
        }
        if self.lookup.max_hashes_per_query == 0 {
            exn::bail!(ErrorKind::OutOfRange("lookup.max_hashes_per_query"));
        }
        if self.lookup.timeout_secs == Some(0) {
            exn::bail!(ErrorKind::OutOfRange("lookup.timeout_secs"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use rstest::rstest;
    use std::fs;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.lookup.options(), Options::default());
        assert_eq!(config.lookup.timeout(), None);
        assert!(config.database.path.ends_with(DATABASE_FILE));
    }

    #[rstest]
    #[case("config.toml", "[database]\npath = \"/srv/catalog.sqlite\"\n\n[lookup]\nconcurrency = 4\ntimeout_secs = 30\n")]
    #[case("config.yaml", "database:\n  path: /srv/catalog.sqlite\nlookup:\n  concurrency: 4\n  timeout_secs: 30\n")]
    #[case("config.yml", "database:\n  path: /srv/catalog.sqlite\nlookup:\n  concurrency: 4\n  timeout_secs: 30\n")]
    #[case(
        "config.json",
        r#"{"database": {"path": "/srv/catalog.sqlite"}, "lookup": {"concurrency": 4, "timeout_secs": 30}}"#
    )]
    fn test_file_formats(#[case] name: &str, #[case] contents: &str) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        let config = Config::from_figment(Config::figment(Some(&path)).unwrap()).unwrap();
        assert_eq!(config.database.path, PathBuf::from("/srv/catalog.sqlite"));
        assert_eq!(config.database.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.lookup.concurrency, 4);
        assert_eq!(config.lookup.max_hashes_per_query, DEFAULT_MAX_HASHES_PER_QUERY);
        assert_eq!(config.lookup.timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let err = Config::load(Some(&path)).unwrap_err();
        assert_eq!(*err, ErrorKind::NotFound(path));
    }

    #[test]
    fn test_unsupported_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");
        fs::write(&path, "concurrency = 4").unwrap();
        let err = Config::load(Some(&path)).unwrap_err();
        assert_eq!(*err, ErrorKind::UnsupportedFormat(path));
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[lookup]\nconcurrency = \"many\"\n").unwrap();
        let err = Config::load(Some(&path)).unwrap_err();
        assert_eq!(*err, ErrorKind::Invalid);
    }

    #[rstest]
    #[case("[database]\nmax_connections = 0\n", "database.max_connections")]
    #[case("[lookup]\nconcurrency = 0\n", "lookup.concurrency")]
    #[case("[lookup]\nmax_hashes_per_query = 0\n", "lookup.max_hashes_per_query")]
    #[case("[lookup]\ntimeout_secs = 0\n", "lookup.timeout_secs")]
    fn test_out_of_range(#[case] contents: &str, #[case] field: &'static str) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, contents).unwrap();
        let err = Config::load(Some(&path)).unwrap_err();
        assert_eq!(*err, ErrorKind::OutOfRange(field));
    }

    #[test]
    fn test_environment_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[lookup]\nconcurrency = 4\nmax_hashes_per_query = 100\n")?;
            jail.set_env("ALGOSCOPE_LOOKUP__CONCURRENCY", "32");
            jail.set_env("ALGOSCOPE_DATABASE__PATH", "/tmp/other.sqlite");
            let config = Config::load(Some(Path::new("config.toml"))).map_err(|e| (*e).to_string())?;
            assert_eq!(config.lookup.concurrency, 32);
            assert_eq!(config.lookup.max_hashes_per_query, 100);
            assert_eq!(config.database.path, PathBuf::from("/tmp/other.sqlite"));
            Ok(())
        });
    }
}
