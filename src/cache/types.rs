//! Name lookup tables for cache backends and eviction methods.

use std::fmt;

/// Storage backend of a cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CacheType {
    #[default]
    Memory,
    Filesystem,
    Redis,
    Bbolt,
    Badger,
}

impl CacheType {
    const NAMES: [(&'static str, CacheType); 5] = [
        ("memory", CacheType::Memory),
        ("filesystem", CacheType::Filesystem),
        ("redis", CacheType::Redis),
        ("bbolt", CacheType::Bbolt),
        ("badger", CacheType::Badger),
    ];

    /// Resolve a lower-case backend name.
    pub fn lookup(name: &str) -> Option<Self> {
        Self::NAMES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, t)| *t)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CacheType::Memory => "memory",
            CacheType::Filesystem => "filesystem",
            CacheType::Redis => "redis",
            CacheType::Bbolt => "bbolt",
            CacheType::Badger => "badger",
        }
    }
}

impl fmt::Display for CacheType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a time series cache drops data once it exceeds its retention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EvictionMethod {
    /// Drop the oldest timestamps first.
    #[default]
    Oldest,
    /// Drop the least recently used timestamps first.
    Lru,
}

impl EvictionMethod {
    const NAMES: [(&'static str, EvictionMethod); 2] =
        [("oldest", EvictionMethod::Oldest), ("lru", EvictionMethod::Lru)];

    /// Resolve a lower-case method name.
    pub fn lookup(name: &str) -> Option<Self> {
        Self::NAMES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, m)| *m)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EvictionMethod::Oldest => "oldest",
            EvictionMethod::Lru => "lru",
        }
    }
}

impl fmt::Display for EvictionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
