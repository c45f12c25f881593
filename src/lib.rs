//! Configuration core for the cachegate caching proxy.
//!
//! Loads a TOML document, fills unset fields from engine defaults, checks
//! references between sections, watches the source file for edits, and
//! renders redacted snapshots.

pub mod cache;
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod origins;
pub mod rewriter;
pub mod rules;
pub mod tls;

pub use config::{Config, ConfigError, ConfigResult, LiveConfig};
pub use lifecycle::Shutdown;
