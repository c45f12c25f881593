//! Rule definitions.
//!
//! A rule routes a request to another origin based on a value extracted
//! from the request. Origins of type `rule` delegate to a rule instead of
//! proxying through a cache; validation binds the named rule onto them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One configured rule.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RuleOptions {
    /// Map key this rule was configured under.
    #[serde(skip)]
    pub name: String,

    /// Request part to inspect: "url", "header", "host", "method", "path", "param".
    pub input_source: String,

    /// Header or parameter name when the source needs one.
    pub input_key: String,

    /// How to interpret the input: "string", "num" or "bool".
    pub input_type: String,

    /// Optional decoding applied before evaluation, e.g. "base64".
    pub input_encoding: String,

    /// Part to use after splitting on `input_delimiter`; -1 uses the whole value.
    pub input_index: i64,

    pub input_delimiter: String,

    /// Comparison applied to each case, e.g. "eq", "prefix", "contains".
    pub operation: String,

    /// Argument for operations that take one.
    pub operation_arg: String,

    /// Origin used when no case matches.
    pub next_route: String,

    /// Rewriter run before evaluation.
    pub ingress_req_rewriter_name: String,

    /// Rewriter run after a case matched.
    pub egress_req_rewriter_name: String,

    /// Rewriter run when no case matched.
    pub nomatch_req_rewriter_name: String,

    /// Redirect target instead of `next_route`, if set.
    pub redirect_url: String,

    /// Upper bound on chained rule evaluations per request.
    pub max_rule_executions: u32,

    pub cases: BTreeMap<String, RuleCaseOptions>,
}

impl Default for RuleOptions {
    fn default() -> Self {
        Self {
            name: String::new(),
            input_source: String::new(),
            input_key: String::new(),
            input_type: "string".to_string(),
            input_encoding: String::new(),
            input_index: -1,
            input_delimiter: " ".to_string(),
            operation: String::new(),
            operation_arg: String::new(),
            next_route: String::new(),
            ingress_req_rewriter_name: String::new(),
            egress_req_rewriter_name: String::new(),
            nomatch_req_rewriter_name: String::new(),
            redirect_url: String::new(),
            max_rule_executions: 16,
            cases: BTreeMap::new(),
        }
    }
}

/// One case of a rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RuleCaseOptions {
    /// Values that select this case.
    pub matches: Vec<String>,

    /// Origin the request continues to.
    pub next_route: String,

    pub req_rewriter_name: String,

    pub redirect_url: String,
}
