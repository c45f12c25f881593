//! Configuration schema for the process-wide sections.
//!
//! These sections are decoded directly with Serde. Every container carries
//! `#[serde(default)]` so a partially authored section keeps the engine
//! defaults for the fields it leaves out.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Pprof listener choices accepted in `main.pprof_server`.
pub const PPROF_SERVER_NAMES: [&str; 4] = ["metrics", "reload", "both", "off"];

/// Default pprof listener.
pub const DEFAULT_PPROF_SERVER: &str = "both";

/// General settings for the running instance.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MainConfig {
    /// Distinguishes multiple instances on the same host.
    pub instance_id: u32,

    /// Path serving the running configuration.
    pub config_handler_path: String,

    /// Path answering liveness pings.
    pub ping_handler_path: String,

    /// Path that triggers a configuration reload.
    pub reload_handler_path: String,

    /// Base path for origin health checks.
    pub health_handler_path: String,

    /// Listener hosting the pprof routes: "metrics", "reload", "both" or "off".
    pub pprof_server: String,

    /// Name conveyed upstream in Via headers.
    pub server_name: String,
}

impl Default for MainConfig {
    fn default() -> Self {
        Self {
            instance_id: 0,
            config_handler_path: "/cachegate/config".to_string(),
            ping_handler_path: "/cachegate/ping".to_string(),
            reload_handler_path: "/cachegate/config/reload".to_string(),
            health_handler_path: "/cachegate/health".to_string(),
            pprof_server: DEFAULT_PPROF_SERVER.to_string(),
            server_name: default_server_name(),
        }
    }
}

fn default_server_name() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

/// Main HTTP front end.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FrontendConfig {
    /// Bind address for the plaintext listener. Empty binds all interfaces.
    pub listen_address: String,

    /// Port for the plaintext listener.
    pub listen_port: u16,

    /// Bind address for the TLS listener.
    pub tls_listen_address: String,

    /// Port for the TLS listener.
    pub tls_listen_port: u16,

    /// Maximum concurrent front end connections (0 = unlimited).
    pub connections_limit: u32,

    /// Set during validation when at least one origin carries a usable
    /// certificate and key.
    #[serde(skip)]
    pub serve_tls: bool,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            listen_address: String::new(),
            listen_port: 8480,
            tls_listen_address: String::new(),
            tls_listen_port: 8483,
            connections_limit: 0,
            serve_tls: false,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log file path. Empty logs to the console.
    pub log_file: String,

    /// Most granular level to log (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_file: String::new(),
            log_level: "INFO".to_string(),
        }
    }
}

/// Metrics exposition listener.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Bind address. Empty binds all interfaces.
    pub listen_address: String,

    /// Port serving `/metrics`.
    pub listen_port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            listen_address: String::new(),
            listen_port: 8481,
        }
    }
}

impl MetricsConfig {
    /// Socket address string for the metrics listener.
    pub fn bind_address(&self) -> String {
        let host = if self.listen_address.is_empty() {
            "0.0.0.0"
        } else {
            self.listen_address.as_str()
        };
        format!("{}:{}", host, self.listen_port)
    }
}

/// In-process configuration reloading.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ReloadingConfig {
    /// Bind address for the reload listener.
    pub listen_address: String,

    /// Port for the reload listener.
    pub listen_port: u16,

    /// Path that triggers a reload.
    pub handler_path: String,

    /// Time allowed for in-flight requests on the old configuration.
    pub drain_timeout_secs: u64,

    /// Minimum interval between on-disk staleness checks.
    pub rate_limit_secs: u64,
}

impl Default for ReloadingConfig {
    fn default() -> Self {
        Self {
            listen_address: "127.0.0.1".to_string(),
            listen_port: 8484,
            handler_path: "/cachegate/config/reload".to_string(),
            drain_timeout_secs: 30,
            rate_limit_secs: 3,
        }
    }
}

/// Response status code (as text) to negative-cache TTL in seconds.
pub type NegativeCacheConfig = BTreeMap<String, u64>;
