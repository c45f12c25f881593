//! Cache backend definitions.
//!
//! The configuration core only assembles these options. Backends are built
//! elsewhere, and only for caches at least one origin references.

pub mod options;
pub mod types;

pub use options::CacheOptions;
pub use types::{CacheType, EvictionMethod};
