//! Atomically published live configuration.
//!
//! Readers take a snapshot with [`LiveConfig::load`] and keep it for as long
//! as they need; a reload never mutates a published configuration, it swaps
//! in a new one and fires the old one's quit signal.

use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;

use crate::config::loader::{ConfigError, ConfigResult};
use crate::config::Config;
use crate::observability::metrics;

/// Shared handle to the current configuration. Clones share the same slot.
#[derive(Debug, Clone)]
pub struct LiveConfig {
    current: Arc<ArcSwap<Config>>,
    reload_lock: Arc<Mutex<()>>,
}

impl LiveConfig {
    pub fn new(config: Config) -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(config)),
            reload_lock: Arc::new(Mutex::new(())),
        }
    }

    /// The configuration published most recently.
    pub fn load(&self) -> Arc<Config> {
        self.current.load_full()
    }

    /// Publish `config`, signalling tasks bound to the previous one to quit.
    pub fn publish(&self, config: Config) -> Arc<Config> {
        let config = Arc::new(config);
        let previous = self.current.swap(Arc::clone(&config));
        previous.resources.quit.trigger();
        config
    }

    /// Reload from the file the current configuration was loaded from.
    ///
    /// On failure the current configuration stays published.
    pub fn reload(&self) -> ConfigResult<Arc<Config>> {
        let _guard = self.reload_lock.lock().unwrap_or_else(|e| e.into_inner());

        let path = self
            .load()
            .config_file_path()
            .ok_or(ConfigError::NoSourceFile)?;

        match Config::load_file(&path) {
            Ok(config) => {
                let config = self.publish(config);
                tracing::info!(path = ?path, "Configuration reloaded");
                metrics::record_reload(true);
                Ok(config)
            }
            Err(e) => {
                tracing::warn!(path = ?path, error = %e, "Reload rejected, keeping current configuration");
                metrics::record_reload(false);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_publish_signals_previous_config() {
        let live = LiveConfig::new(Config::new());
        let previous = live.load();
        let mut quit = previous.resources.quit.subscribe();

        live.publish(Config::new());
        assert!(quit.try_recv().is_ok());
        assert!(previous.resources.quit.is_triggered());
        assert!(!live.load().resources.quit.is_triggered());
    }

    #[test]
    fn test_reload_requires_source_file() {
        let live = LiveConfig::new(Config::new());
        assert!(matches!(live.reload(), Err(ConfigError::NoSourceFile)));
    }

    #[test]
    fn test_failed_reload_keeps_current() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cachegate.toml");
        fs::write(&path, "[main]\ninstance_id = 1\n").unwrap();

        let live = LiveConfig::new(Config::load_file(&path).unwrap());
        let before = live.load();

        fs::write(&path, "[caches.default.index]\nmax_size_bytes = 1\nmax_size_backoff_bytes = 2\n").unwrap();
        assert!(matches!(
            live.reload(),
            Err(ConfigError::BackoffBytesExceedCap { .. })
        ));
        assert!(Arc::ptr_eq(&before, &live.load()));

        fs::write(&path, "[main]\ninstance_id = 2\n").unwrap();
        let after = live.reload().unwrap();
        assert_eq!(after.main.instance_id, 2);
        assert_eq!(live.load().main.instance_id, 2);
    }
}
