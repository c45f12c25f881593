//! Per-path route entries of an origin.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::rewriter::RewriteInstructions;

/// Methods a path serves when the author lists none.
pub const DEFAULT_METHODS: [&str; 2] = ["GET", "HEAD"];

/// Optional path fields whose explicit presence is recorded in
/// [`PathOptions::custom`].
pub const PATH_MEMBERS: [&str; 16] = [
    "path",
    "match_type",
    "handler",
    "methods",
    "cache_key_params",
    "cache_key_headers",
    "default_ttl_secs",
    "request_headers",
    "response_headers",
    "request_params",
    "response_code",
    "response_body",
    "no_metrics",
    "collapsed_forwarding",
    "req_rewriter_name",
    "cache_key_form_fields",
];

/// How a path pattern is compared with the request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MatchType {
    #[default]
    Exact,
    Prefix,
}

impl MatchType {
    const NAMES: [(&'static str, MatchType); 2] =
        [("exact", MatchType::Exact), ("prefix", MatchType::Prefix)];

    /// Resolve a lower-case match type name.
    pub fn lookup(name: &str) -> Option<Self> {
        Self::NAMES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, m)| *m)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Exact => "exact",
            MatchType::Prefix => "prefix",
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How concurrent identical upstream requests are collapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CollapsedForwardingType {
    /// One upstream request, followers wait for the full response.
    #[default]
    Basic,
    /// One upstream request, followers stream the response as it arrives.
    Progressive,
}

impl CollapsedForwardingType {
    const NAMES: [(&'static str, CollapsedForwardingType); 2] = [
        ("basic", CollapsedForwardingType::Basic),
        ("progressive", CollapsedForwardingType::Progressive),
    ];

    /// Resolve a collapsed forwarding name. Unknown names are rejected.
    pub fn lookup(name: &str) -> Option<Self> {
        Self::NAMES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, c)| *c)
    }
}

/// Serves requests routed to a path. Bound by the proxy runtime after load.
pub trait PathHandler: Send + Sync + fmt::Debug {
    /// Registered handler name.
    fn name(&self) -> &str;
}

/// Derives a cache key from a request path and its key parameters.
#[derive(Clone, Copy)]
pub struct KeyHasher(pub fn(&str, &BTreeMap<String, String>) -> String);

impl fmt::Debug for KeyHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyHasher(..)")
    }
}

/// One route entry of an origin.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PathOptions {
    /// Route pattern.
    pub path: String,

    /// Match type name, normalised during load.
    pub match_type: String,

    /// Name of the handler serving this path.
    pub handler: String,

    /// Allowed methods; defaults to [`DEFAULT_METHODS`].
    pub methods: Vec<String>,

    pub cache_key_params: Vec<String>,
    pub cache_key_headers: Vec<String>,
    pub cache_key_form_fields: Vec<String>,
    pub default_ttl_secs: u64,

    /// Status code of a synthesized response (0 = proxy upstream).
    pub response_code: u16,

    /// Body of a synthesized response.
    pub response_body: String,

    pub no_metrics: bool,

    /// Collapsed forwarding name; absent means basic.
    pub collapsed_forwarding: String,

    /// Rewriter applied to requests on this path.
    pub req_rewriter_name: String,

    pub request_params: BTreeMap<String, String>,
    pub request_headers: BTreeMap<String, String>,
    pub response_headers: BTreeMap<String, String>,

    #[serde(skip)]
    pub match_kind: MatchType,

    #[serde(skip)]
    pub collapsed_forwarding_type: CollapsedForwardingType,

    /// Optional members explicitly authored in the document.
    #[serde(skip)]
    pub custom: Vec<String>,

    #[serde(skip)]
    pub response_body_bytes: Vec<u8>,

    #[serde(skip)]
    pub has_custom_response_body: bool,

    #[serde(skip)]
    pub req_rewriter: Option<RewriteInstructions>,

    #[serde(skip)]
    pub handler_impl: Option<Arc<dyn PathHandler>>,

    #[serde(skip)]
    pub key_hasher: Option<KeyHasher>,
}

impl PathOptions {
    /// Composite map key: the pattern followed by each method, joined by `-`.
    pub fn route_key(&self) -> String {
        route_key(&self.path, &self.methods)
    }

    /// Returns true if `member` was explicitly authored.
    pub fn is_custom(&self, member: &str) -> bool {
        self.custom.iter().any(|m| m == member)
    }
}

/// Build the composite key of a path entry.
pub fn route_key(path: &str, methods: &[String]) -> String {
    let mut key = path.to_string();
    for method in methods {
        key.push('-');
        key.push_str(method);
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_key() {
        let methods = vec!["GET".to_string(), "HEAD".to_string()];
        assert_eq!(route_key("/api/v1", &methods), "/api/v1-GET-HEAD");
        assert_eq!(route_key("/", &[]), "/");
    }

    #[test]
    fn test_match_type_lookup() {
        assert_eq!(MatchType::lookup("prefix"), Some(MatchType::Prefix));
        assert_eq!(MatchType::lookup("regex"), None);
        assert_eq!(MatchType::default().to_string(), "exact");
    }

    #[test]
    fn test_collapsed_forwarding_lookup() {
        assert_eq!(
            CollapsedForwardingType::lookup("progressive"),
            Some(CollapsedForwardingType::Progressive)
        );
        assert_eq!(CollapsedForwardingType::lookup("eager"), None);
    }
}
