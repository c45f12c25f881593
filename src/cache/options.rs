//! Per-cache options.

use serde::Serialize;

use crate::cache::types::CacheType;

/// One configured cache.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheOptions {
    /// Map key this cache was configured under.
    #[serde(skip)]
    pub name: String,

    /// Backend name as authored (lower-cased).
    pub cache_type: String,

    /// Resolved backend. Unknown names keep the memory backend.
    #[serde(skip)]
    pub cache_type_id: CacheType,

    pub index: IndexOptions,
    pub redis: RedisOptions,
    pub filesystem: FilesystemOptions,
    pub bbolt: BboltOptions,
    pub badger: BadgerOptions,
}

impl CacheOptions {
    /// Engine defaults for a cache named `name`.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            name: String::new(),
            cache_type: CacheType::Memory.to_string(),
            cache_type_id: CacheType::Memory,
            index: IndexOptions::default(),
            redis: RedisOptions::default(),
            filesystem: FilesystemOptions::default(),
            bbolt: BboltOptions::default(),
            badger: BadgerOptions::default(),
        }
    }
}

/// Cache index tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexOptions {
    /// Interval between expired-object reaps.
    pub reap_interval_secs: u64,

    /// Interval between index flushes to the backend.
    pub flush_interval_secs: u64,

    /// Hard byte cap (0 = unlimited).
    pub max_size_bytes: u64,

    /// Bytes to evict below the cap once it is hit.
    pub max_size_backoff_bytes: u64,

    /// Hard object-count cap (0 = unlimited).
    pub max_size_objects: u64,

    /// Objects to evict below the cap once it is hit.
    pub max_size_backoff_objects: u64,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            reap_interval_secs: 3,
            flush_interval_secs: 5,
            max_size_bytes: 512 * 1024 * 1024,
            max_size_backoff_bytes: 16 * 1024 * 1024,
            max_size_objects: 0,
            max_size_backoff_objects: 100,
        }
    }
}

/// Redis client settings. Only overlaid when the cache type is redis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedisOptions {
    /// "standard", "cluster" or "sentinel".
    pub client_type: String,
    pub protocol: String,
    /// Single endpoint for the standard client.
    pub endpoint: String,
    /// Endpoint list for the cluster and sentinel clients.
    pub endpoints: Vec<String>,
    pub sentinel_master: String,
    pub password: String,
    pub db: u32,
    pub max_retries: u32,
    pub min_retry_backoff_ms: u64,
    pub max_retry_backoff_ms: u64,
    pub dial_timeout_ms: u64,
    pub read_timeout_ms: u64,
    pub write_timeout_ms: u64,
    pub pool_size: u32,
    pub min_idle_conns: u32,
    pub max_conn_age_ms: u64,
    pub pool_timeout_ms: u64,
    pub idle_timeout_ms: u64,
    pub idle_check_frequency_ms: u64,
}

impl Default for RedisOptions {
    fn default() -> Self {
        Self {
            client_type: "standard".to_string(),
            protocol: "tcp".to_string(),
            endpoint: "redis:6379".to_string(),
            endpoints: vec!["redis:6379".to_string()],
            sentinel_master: String::new(),
            password: String::new(),
            db: 0,
            max_retries: 0,
            min_retry_backoff_ms: 0,
            max_retry_backoff_ms: 0,
            dial_timeout_ms: 0,
            read_timeout_ms: 0,
            write_timeout_ms: 0,
            pool_size: 0,
            min_idle_conns: 0,
            max_conn_age_ms: 0,
            pool_timeout_ms: 0,
            idle_timeout_ms: 0,
            idle_check_frequency_ms: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilesystemOptions {
    pub cache_path: String,
}

impl Default for FilesystemOptions {
    fn default() -> Self {
        Self {
            cache_path: "/tmp/cachegate".to_string(),
        }
    }
}

/// Embedded bbolt key/value file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BboltOptions {
    pub filename: String,
    pub bucket: String,
}

impl Default for BboltOptions {
    fn default() -> Self {
        Self {
            filename: "cachegate.db".to_string(),
            bucket: "cachegate".to_string(),
        }
    }
}

/// Embedded badger key/value directories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BadgerOptions {
    pub directory: String,
    pub value_directory: String,
}

impl Default for BadgerOptions {
    fn default() -> Self {
        Self {
            directory: "/tmp/cachegate".to_string(),
            value_directory: "/tmp/cachegate".to_string(),
        }
    }
}
