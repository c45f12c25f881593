//! Cross-reference validation.
//!
//! # Responsibilities
//! - Check origin names against the naming rules
//! - Bind rule origins to their rule, check cache origins against caches
//! - Validate per-origin TLS and derive the secure-listener flag
//!
//! # Design Decisions
//! - Runs after the overlay pass, so caches are already pruned
//! - An origin is checked against exactly one regime: rule or cache
//! - First failure aborts the load

use crate::config::loader::{ConfigError, ConfigResult};
use crate::config::Config;
use crate::origins::validate_origin_name;

/// Check origin → rule and origin → cache references.
///
/// Rule origins get a copy of their rule bound onto them.
pub(crate) fn validate_config_mappings(config: &mut Config) -> ConfigResult<()> {
    for (name, origin) in config.origins.iter_mut() {
        validate_origin_name(name)?;

        if origin.is_rule_type() {
            let rule = config
                .rules
                .as_ref()
                .and_then(|rules| rules.get(&origin.rule_name))
                .ok_or_else(|| ConfigError::UnknownRule {
                    origin: name.clone(),
                    rule: origin.rule_name.clone(),
                })?;
            let mut bound = rule.clone();
            bound.name = origin.rule_name.clone();
            origin.rule_options = Some(bound);
            continue;
        }

        if !config.caches.contains_key(&origin.cache_name) {
            return Err(ConfigError::UnknownCache {
                origin: name.clone(),
                cache: origin.cache_name.clone(),
            });
        }
    }
    Ok(())
}

/// Validate each origin's TLS options and raise `frontend.serve_tls` if
/// any origin serves TLS.
pub(crate) fn validate_tls_configs(config: &mut Config) -> ConfigResult<()> {
    let mut serve_tls = false;
    for (name, origin) in &config.origins {
        let Some(tls) = &origin.tls else {
            continue;
        };
        let applicable = tls.validate().map_err(|source| ConfigError::Tls {
            origin: name.clone(),
            source,
        })?;
        if applicable {
            tracing::debug!(origin = %name, "Origin serves TLS");
            serve_tls = true;
        }
    }
    config.frontend.serve_tls = serve_tls;
    Ok(())
}
