//! Distributed tracing options.
//!
//! # Responsibilities
//! - Describe each named tracer an origin can reference via `tracing_name`
//! - Carry exporter endpoint and credentials for the tracing runtime
//!
//! # Design Decisions
//! - Disabled by default (`noop` exporter)
//! - Sample rate defaults to every request once an exporter is chosen

use std::collections::BTreeMap;

use serde::Serialize;

/// One named tracing configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TracingOptions {
    /// Map key this tracer was configured under.
    #[serde(skip)]
    pub name: String,

    /// Tracing implementation, e.g. "opentelemetry".
    pub implementation: String,

    /// "noop", "stdout", "jaeger" or "zipkin".
    pub exporter: String,

    pub service_name: String,
    pub collector_url: String,
    pub collector_user: String,
    pub collector_pass: String,

    /// Fraction of requests traced, 0.0 to 1.0.
    pub sample_rate: f64,

    /// Tags attached to every span.
    pub tags: BTreeMap<String, String>,

    /// Default tags left off spans.
    pub omit_tags: Vec<String>,

    pub stdout_pretty_print: bool,
}

impl TracingOptions {
    /// Engine defaults for a tracer named `name`.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }
}

impl Default for TracingOptions {
    fn default() -> Self {
        Self {
            name: String::new(),
            implementation: "opentelemetry".to_string(),
            exporter: "noop".to_string(),
            service_name: "cachegate".to_string(),
            collector_url: String::new(),
            collector_user: String::new(),
            collector_pass: String::new(),
            sample_rate: 1.0,
            tags: BTreeMap::new(),
            omit_tags: Vec::new(),
            stdout_pretty_print: false,
        }
    }
}
