//! Per-origin options.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::cache::EvictionMethod;
use crate::origins::paths::PathOptions;
use crate::rewriter::RewriteInstructions;
use crate::rules::RuleOptions;
use crate::tls::TlsOptions;

/// Content types compressed by default.
pub const DEFAULT_COMPRESSABLE_TYPES: [&str; 8] = [
    "text/javascript",
    "text/css",
    "text/plain",
    "text/xml",
    "text/json",
    "application/json",
    "application/javascript",
    "application/xml",
];

/// Origin type that delegates to a rule instead of a cache.
pub const RULE_ORIGIN_TYPE: &str = "rule";

/// One configured upstream.
#[derive(Debug, Clone, Serialize)]
pub struct OriginOptions {
    /// Map key this origin was configured under.
    #[serde(skip)]
    pub name: String,

    /// Upstream flavour, e.g. "reverseproxycache", "prometheus", "rule".
    pub origin_type: String,

    /// Upstream base URL.
    pub origin_url: String,

    /// Host headers routed to this origin.
    pub hosts: Vec<String>,

    /// Serves requests that match no other origin.
    pub is_default: bool,

    pub path_routing_disabled: bool,

    /// "standard", "x", "both" or "none".
    pub forwarded_headers: String,

    pub require_tls: bool,

    /// Cache used by this origin. Ignored for rule origins.
    pub cache_name: String,

    pub cache_key_prefix: String,

    /// Rule used by rule origins.
    pub rule_name: String,

    pub req_rewriter_name: String,
    pub negative_cache_name: String,
    pub tracing_name: String,
    pub compressable_types: Vec<String>,

    pub timeout_secs: u64,
    pub max_idle_conns: u32,
    pub keep_alive_timeout_secs: u64,
    pub max_object_size_bytes: u64,
    pub revalidation_factor: f64,
    pub multipart_ranges_disabled: bool,
    pub dearticulate_upstream_ranges: bool,

    pub timeseries_retention_factor: u64,
    /// Eviction method name, lower-cased.
    pub timeseries_eviction_method: String,
    pub timeseries_ttl_secs: u64,
    pub max_ttl_secs: u64,
    pub fastforward_ttl_secs: u64,
    pub fast_forward_disable: bool,
    pub backfill_tolerance_secs: u64,

    /// Upstream path probed by health checks; "-" disables.
    pub health_check_upstream_path: String,
    pub health_check_verb: String,
    pub health_check_query: String,
    pub health_check_headers: BTreeMap<String, String>,

    /// Route table keyed by [`PathOptions::route_key`].
    pub paths: BTreeMap<String, PathOptions>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<TlsOptions>,

    #[serde(skip)]
    pub eviction_method: EvictionMethod,

    #[serde(skip)]
    pub req_rewriter: Option<RewriteInstructions>,

    /// Bound during validation for rule origins.
    #[serde(skip)]
    pub rule_options: Option<RuleOptions>,
}

impl OriginOptions {
    /// Engine defaults for an origin named `name`.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn is_rule_type(&self) -> bool {
        self.origin_type == RULE_ORIGIN_TYPE
    }
}

impl Default for OriginOptions {
    fn default() -> Self {
        Self {
            name: String::new(),
            origin_type: String::new(),
            origin_url: String::new(),
            hosts: Vec::new(),
            is_default: false,
            path_routing_disabled: false,
            forwarded_headers: "standard".to_string(),
            require_tls: false,
            cache_name: "default".to_string(),
            cache_key_prefix: String::new(),
            rule_name: String::new(),
            req_rewriter_name: String::new(),
            negative_cache_name: "default".to_string(),
            tracing_name: "default".to_string(),
            compressable_types: DEFAULT_COMPRESSABLE_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            timeout_secs: 180,
            max_idle_conns: 20,
            keep_alive_timeout_secs: 300,
            max_object_size_bytes: 512 * 1024,
            revalidation_factor: 2.0,
            multipart_ranges_disabled: false,
            dearticulate_upstream_ranges: false,
            timeseries_retention_factor: 1024,
            timeseries_eviction_method: EvictionMethod::Oldest.to_string(),
            timeseries_ttl_secs: 21600,
            max_ttl_secs: 86400,
            fastforward_ttl_secs: 15,
            fast_forward_disable: false,
            backfill_tolerance_secs: 0,
            health_check_upstream_path: "-".to_string(),
            health_check_verb: "-".to_string(),
            health_check_query: "-".to_string(),
            health_check_headers: BTreeMap::new(),
            paths: BTreeMap::new(),
            tls: None,
            eviction_method: EvictionMethod::Oldest,
            req_rewriter: None,
            rule_options: None,
        }
    }
}
