//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → document.rs (parse, answer "was this field authored?")
//!     → overlay.rs (fresh defaults per section, authored fields copied on top,
//!                   unreferenced caches pruned)
//!     → validation.rs (origin → cache / rule references, TLS)
//!     → Config (validated, published via live.rs)
//!
//! On the reload timer:
//!     watcher.rs asks Config::is_stale()
//!     → loader.rs loads a fresh Config from the same file
//!     → live.rs swaps it in, or keeps the current one on failure
//!
//! snapshot.rs produces independent deep copies and the redacted text form.
//! ```
//!
//! # Design Decisions
//! - A load builds a brand new Config; nothing is mutated in place across reloads
//! - Any error aborts the whole load; warnings never do
//! - Staleness bookkeeping has its own lock, separate from reload publishing

pub mod document;
pub mod live;
pub mod loader;
pub mod overlay;
pub mod schema;
pub mod snapshot;
pub mod validation;
pub mod watcher;

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use serde::Serialize;

use crate::cache::CacheOptions;
use crate::lifecycle::Shutdown;
use crate::observability::tracing::TracingOptions;
use crate::origins::OriginOptions;
use crate::rewriter::{RewriteInstructions, RewriterOptions};
use crate::rules::RuleOptions;

pub use document::Document;
pub use live::LiveConfig;
pub use loader::{ConfigError, ConfigResult};
pub use schema::{
    FrontendConfig, LoggingConfig, MainConfig, MetricsConfig, NegativeCacheConfig, ReloadingConfig,
};
pub use snapshot::REDACTED;
pub use watcher::{ConfigWatcher, StalenessMonitor};

/// Name of the entries every section starts with.
pub const DEFAULT_NAME: &str = "default";

/// Runtime handles owned by a configuration. Never serialized.
#[derive(Debug, Default)]
pub struct Resources {
    /// Fired when this configuration is replaced or the process stops.
    pub quit: Shutdown,

    /// The document this configuration was loaded from.
    pub document: Option<Arc<Document>>,
}

/// The complete runtime configuration.
#[derive(Debug, Serialize)]
pub struct Config {
    pub main: MainConfig,

    pub origins: BTreeMap<String, OriginOptions>,

    pub caches: BTreeMap<String, CacheOptions>,

    pub frontend: FrontendConfig,

    pub logging: LoggingConfig,

    pub metrics: MetricsConfig,

    #[serde(rename = "tracing")]
    pub tracing_configs: BTreeMap<String, TracingOptions>,

    pub negative_caches: BTreeMap<String, NegativeCacheConfig>,

    /// `None` when the document declares no rules.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules: Option<BTreeMap<String, RuleOptions>>,

    /// `None` when the document declares no rewriters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_rewriters: Option<BTreeMap<String, RewriterOptions>>,

    pub reloading: ReloadingConfig,

    #[serde(skip)]
    pub resources: Resources,

    #[serde(skip)]
    pub compiled_rewriters: BTreeMap<String, RewriteInstructions>,

    /// Non-fatal problems found while loading.
    #[serde(skip)]
    pub loader_warnings: Vec<String>,

    /// Cache names referenced by at least one origin.
    #[serde(skip)]
    pub(crate) active_caches: BTreeSet<String>,

    #[serde(skip)]
    pub(crate) staleness: StalenessMonitor,
}

impl Config {
    /// A configuration holding only the built-in defaults.
    ///
    /// Not bound to any file, so it is never stale.
    pub fn new() -> Self {
        let mut origins = BTreeMap::new();
        origins.insert(DEFAULT_NAME.to_string(), OriginOptions::new(DEFAULT_NAME));

        let mut caches = BTreeMap::new();
        caches.insert(DEFAULT_NAME.to_string(), CacheOptions::new(DEFAULT_NAME));

        let mut tracing_configs = BTreeMap::new();
        tracing_configs.insert(DEFAULT_NAME.to_string(), TracingOptions::new(DEFAULT_NAME));

        let mut negative_caches = BTreeMap::new();
        negative_caches.insert(DEFAULT_NAME.to_string(), NegativeCacheConfig::new());

        Self {
            main: MainConfig::default(),
            origins,
            caches,
            frontend: FrontendConfig::default(),
            logging: LoggingConfig::default(),
            metrics: MetricsConfig::default(),
            tracing_configs,
            negative_caches,
            rules: None,
            request_rewriters: None,
            reloading: ReloadingConfig::default(),
            resources: Resources::default(),
            compiled_rewriters: BTreeMap::new(),
            loader_warnings: Vec::new(),
            active_caches: BTreeSet::new(),
            staleness: StalenessMonitor::default(),
        }
    }

    /// File this configuration was loaded from, if any.
    pub fn config_file_path(&self) -> Option<PathBuf> {
        self.staleness.source_path()
    }

    /// Current modification time of the source file.
    ///
    /// `None` when unbound or when the file cannot be read.
    pub fn check_file_last_modified(&self) -> Option<SystemTime> {
        self.staleness.current_modified()
    }

    /// Returns true if the source file changed since this configuration was
    /// loaded. Checks at most once per `reloading.rate_limit_secs`.
    pub fn is_stale(&self) -> bool {
        self.staleness
            .is_stale(Duration::from_secs(self.reloading.rate_limit_secs))
    }

    /// Cache names referenced by at least one origin.
    pub fn active_caches(&self) -> &BTreeSet<String> {
        &self.active_caches
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_config_has_default_entries() {
        let config = Config::new();
        assert!(config.origins.contains_key(DEFAULT_NAME));
        assert!(config.caches.contains_key(DEFAULT_NAME));
        assert!(config.tracing_configs.contains_key(DEFAULT_NAME));
        assert!(config.negative_caches.contains_key(DEFAULT_NAME));
        assert!(config.rules.is_none());
        assert!(config.request_rewriters.is_none());
    }

    #[test]
    fn test_unbound_config_is_never_stale() {
        let config = Config::new();
        assert!(config.config_file_path().is_none());
        assert!(config.check_file_last_modified().is_none());
        assert!(!config.is_stale());
    }
}
