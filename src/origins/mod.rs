//! Upstream origin definitions.

pub mod options;
pub mod paths;

pub use options::OriginOptions;
pub use paths::{CollapsedForwardingType, MatchType, PathOptions};

use crate::config::ConfigError;

/// Names that cannot be used for an origin.
const RESERVED_ORIGIN_NAMES: [&str; 2] = ["", "frontend"];

/// Check an origin name against the naming rules.
pub fn validate_origin_name(name: &str) -> Result<(), ConfigError> {
    if RESERVED_ORIGIN_NAMES.contains(&name) {
        return Err(ConfigError::InvalidOriginName(name.to_string()));
    }
    Ok(())
}
