//! Configuration loading.
//!
//! # Responsibilities
//! - Read and parse the document
//! - Run the defaulting and validation pipeline in order
//! - Bind the result to its source file for staleness checks
//!
//! # Design Decisions
//! - Every load starts from `Config::new()`; a failed load is dropped whole
//! - Rewriters compile before any origin is processed, since origins and
//!   paths resolve them by name

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::config::document::Document;
use crate::config::schema::{
    FrontendConfig, LoggingConfig, MainConfig, MetricsConfig, NegativeCacheConfig, ReloadingConfig,
    DEFAULT_PPROF_SERVER, PPROF_SERVER_NAMES,
};
use crate::config::watcher::FileStamp;
use crate::config::{overlay, validation, Config};
use crate::observability::metrics;
use crate::rewriter::RewriterError;
use crate::rules::RuleOptions;
use crate::tls::TlsError;

/// Errors that reject a configuration load.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config document: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value at {path}: {message}")]
    InvalidField { path: String, message: String },

    #[error("invalid pprof server name [{0}]")]
    InvalidPprofServer(String),

    #[error("failed to compile request rewriter: {0}")]
    Rewriter(#[from] RewriterError),

    #[error("invalid rewriter name [{rewriter}] in origin config [{origin}]")]
    UnknownOriginRewriter { origin: String, rewriter: String },

    #[error("invalid rewriter name [{rewriter}] in path [{path}] of origin config [{origin}]")]
    UnknownPathRewriter {
        origin: String,
        path: String,
        rewriter: String,
    },

    #[error("invalid collapsed_forwarding name [{name}] in path [{path}] of origin config [{origin}]")]
    InvalidCollapsedForwarding {
        origin: String,
        path: String,
        name: String,
    },

    #[error("invalid origin name [{0}]")]
    InvalidOriginName(String),

    #[error("invalid rule name [{rule}] provided in origin config [{origin}]")]
    UnknownRule { origin: String, rule: String },

    #[error("invalid cache name [{cache}] provided in origin config [{origin}]")]
    UnknownCache { origin: String, cache: String },

    #[error("cache [{cache}]: max_size_backoff_bytes ({backoff}) can't be larger than max_size_bytes ({cap})")]
    BackoffBytesExceedCap { cache: String, backoff: u64, cap: u64 },

    #[error("cache [{cache}]: max_size_backoff_objects ({backoff}) can't be larger than max_size_objects ({cap})")]
    BackoffObjectsExceedCap { cache: String, backoff: u64, cap: u64 },

    #[error("invalid tls options in origin config [{origin}]: {source}")]
    Tls {
        origin: String,
        #[source]
        source: TlsError,
    },

    #[error("configuration is not bound to a source file")]
    NoSourceFile,

    #[error("failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

impl Config {
    /// Load, default and validate the configuration file at `path`.
    ///
    /// The result is bound to `path` for staleness checks.
    pub fn load_file(path: impl AsRef<Path>) -> ConfigResult<Config> {
        let path = path.as_ref();
        tracing::debug!(path = ?path, "Loading configuration file");

        // stamped before reading so an edit racing the read is seen as stale
        let stamp = FileStamp::read(path);
        let text = fs::read_to_string(path).map_err(|source| {
            metrics::record_config_load(false, 0);
            ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }
        })?;

        let config = Self::load_str(&text)?;
        config.staleness.bind_stamped(path, stamp);
        Ok(config)
    }

    /// Load, default and validate a TOML document held in memory.
    pub fn load_str(text: &str) -> ConfigResult<Config> {
        let doc = Document::parse(text).inspect_err(|_| metrics::record_config_load(false, 0))?;
        Self::from_document(doc)
    }

    /// Default and validate an already parsed document.
    pub fn from_document(doc: Document) -> ConfigResult<Config> {
        let mut config = Config::new();
        match config.apply_document(doc) {
            Ok(()) => {
                for warning in &config.loader_warnings {
                    tracing::warn!(warning = %warning, "Configuration loader warning");
                }
                tracing::info!(
                    origins = config.origins.len(),
                    caches = config.caches.len(),
                    warnings = config.loader_warnings.len(),
                    serve_tls = config.frontend.serve_tls,
                    "Configuration loaded"
                );
                metrics::record_config_load(true, config.loader_warnings.len());
                Ok(config)
            }
            Err(e) => {
                tracing::error!(error = %e, "Configuration rejected");
                metrics::record_config_load(false, 0);
                Err(e)
            }
        }
    }

    /// Built-in defaults run through the same pipeline as a loaded document.
    pub fn defaults() -> Config {
        let mut config = Config::new();
        match config.apply_document(Document::empty()) {
            Ok(()) => config,
            Err(e) => {
                tracing::error!(error = %e, "Built-in defaults failed validation");
                Config::new()
            }
        }
    }

    /// Load `path`, substituting the defaults-only configuration on failure
    /// so the process can still report a coherent state.
    ///
    /// The substitute stays bound to `path`, so fixing the file makes it
    /// stale and a reload picks the fix up.
    pub fn load_or_defaults(path: impl AsRef<Path>) -> (Config, Option<ConfigError>) {
        let path = path.as_ref();
        match Self::load_file(path) {
            Ok(config) => (config, None),
            Err(e) => {
                let config = Self::defaults();
                config.staleness.bind(path);
                (config, Some(e))
            }
        }
    }

    fn apply_document(&mut self, doc: Document) -> ConfigResult<()> {
        if let Some(main) = doc.decode::<MainConfig>(&["main"])? {
            self.main = main;
        }
        if let Some(frontend) = doc.decode::<FrontendConfig>(&["frontend"])? {
            self.frontend = frontend;
        }
        if let Some(logging) = doc.decode::<LoggingConfig>(&["logging"])? {
            self.logging = logging;
        }
        if let Some(metrics) = doc.decode::<MetricsConfig>(&["metrics"])? {
            self.metrics = metrics;
        }
        if let Some(reloading) = doc.decode::<ReloadingConfig>(&["reloading"])? {
            self.reloading = reloading;
        }
        if let Some(negative) =
            doc.decode::<BTreeMap<String, NegativeCacheConfig>>(&["negative_caches"])?
        {
            self.negative_caches.extend(negative);
        }

        self.process_pprof_config()?;

        if let Some(mut rules) = doc.decode::<BTreeMap<String, RuleOptions>>(&["rules"])? {
            for (name, rule) in rules.iter_mut() {
                rule.name = name.clone();
            }
            self.rules = Some(rules);
        }

        overlay::process_rewriters(self, &doc)?;
        overlay::process_origins(self, &doc)?;
        overlay::process_tracing(self, &doc)?;
        overlay::process_caches(self, &doc)?;

        validation::validate_config_mappings(self)?;
        validation::validate_tls_configs(self)?;

        self.resources.document = Some(Arc::new(doc));
        Ok(())
    }

    fn process_pprof_config(&mut self) -> ConfigResult<()> {
        let name = self.main.pprof_server.as_str();
        if name.is_empty() {
            self.main.pprof_server = DEFAULT_PPROF_SERVER.to_string();
            return Ok(());
        }
        if PPROF_SERVER_NAMES.contains(&name) {
            return Ok(());
        }
        Err(ConfigError::InvalidPprofServer(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_yields_defaults() {
        let config = Config::load_str("").unwrap();
        let origin = &config.origins["default"];
        assert!(origin.is_default, "single origin becomes the default");
        assert!(config.caches.contains_key("default"));
        assert_eq!(config.main.pprof_server, "both");
        assert!(config.resources.document.is_some());
    }

    #[test]
    fn test_plain_sections_keep_unset_defaults() {
        let config = Config::load_str(
            r#"
            [frontend]
            listen_port = 9090

            [logging]
            log_level = "debug"

            [reloading]
            rate_limit_secs = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.frontend.listen_port, 9090);
        assert_eq!(config.frontend.tls_listen_port, 8483);
        assert_eq!(config.logging.log_level, "debug");
        assert_eq!(config.reloading.rate_limit_secs, 10);
        assert_eq!(config.reloading.drain_timeout_secs, 30);
        assert_eq!(config.metrics.listen_port, 8481);
    }

    #[test]
    fn test_pprof_server_names() {
        let config = Config::load_str("[main]\npprof_server = \"\"\n").unwrap();
        assert_eq!(config.main.pprof_server, "both");

        let config = Config::load_str("[main]\npprof_server = \"off\"\n").unwrap();
        assert_eq!(config.main.pprof_server, "off");

        let err = Config::load_str("[main]\npprof_server = \"everywhere\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPprofServer(n) if n == "everywhere"));
    }

    #[test]
    fn test_negative_caches_merge_with_default() {
        let config = Config::load_str(
            r#"
            [negative_caches.strict]
            404 = 30
            500 = 5
            "#,
        )
        .unwrap();
        assert!(config.negative_caches.contains_key("default"));
        assert_eq!(config.negative_caches["strict"]["404"], 30);
    }

    #[test]
    fn test_rules_get_their_names() {
        let config = Config::load_str(
            r#"
            [rules.by_tenant]
            input_source = "header"
            input_key = "X-Tenant"
            "#,
        )
        .unwrap();
        let rules = config.rules.as_ref().unwrap();
        assert_eq!(rules["by_tenant"].name, "by_tenant");
    }

    #[test]
    fn test_malformed_document_is_a_parse_error() {
        assert!(matches!(
            Config::load_str("[origins.web\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cachegate.toml");
        let (config, err) = Config::load_or_defaults(&path);
        assert!(matches!(err, Some(ConfigError::Io { .. })));
        assert!(config.origins.contains_key("default"));
        assert_eq!(config.config_file_path().as_deref(), Some(path.as_path()));

        std::fs::write(&path, "[main]\ninstance_id = 4\n").unwrap();
        assert!(config.is_stale(), "a file appearing later triggers a reload");
    }

    #[test]
    fn test_load_file_binds_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cachegate.toml");
        std::fs::write(&path, "[origins.web]\norigin_url = \"http://web:8080\"\n").unwrap();

        let config = Config::load_file(&path).unwrap();
        assert_eq!(config.config_file_path().as_deref(), Some(path.as_path()));
        assert!(config.check_file_last_modified().is_some());
        assert!(!config.is_stale());
    }
}
