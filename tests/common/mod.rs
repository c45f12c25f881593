//! Shared utilities for integration tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tempfile::TempDir;

/// A scratch directory holding one config file.
pub struct ConfigFile {
    // kept alive so the directory outlives the test
    _dir: TempDir,
    pub path: PathBuf,
}

impl ConfigFile {
    /// Write `body` to a fresh `cachegate.toml`.
    pub fn new(body: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cachegate.toml");
        fs::write(&path, body).unwrap();
        Self { _dir: dir, path }
    }

    /// Replace the file contents atomically and push its mtime into the
    /// future so the change is visible regardless of clock resolution.
    pub fn rewrite(&self, body: &str) {
        let staged = self.path.with_extension("toml.new");
        fs::write(&staged, body).unwrap();
        set_modified(&staged, SystemTime::now() + Duration::from_secs(30));
        fs::rename(&staged, &self.path).unwrap();
    }

    /// Move the modification time forward without changing contents.
    #[allow(dead_code)]
    pub fn touch(&self) {
        set_modified(&self.path, SystemTime::now() + Duration::from_secs(60));
    }
}

pub fn set_modified(path: &Path, modified: SystemTime) {
    fs::File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(modified)
        .unwrap();
}

/// A document exercising every map section.
#[allow(dead_code)]
pub const FULL_CONFIG: &str = r#"
[main]
instance_id = 3
pprof_server = "metrics"

[frontend]
listen_port = 9480

[reloading]
rate_limit_secs = 0

[negative_caches.strict]
404 = 30

[rules.tenant]
input_source = "header"
input_key = "X-Tenant"

[request_rewriters.edge]
instructions = [
    ["header", "set", "X-Edge", "cachegate"],
    ["path", "replace", "/v1", "/v2"],
]

[origins.prom]
origin_type = "prometheus"
origin_url = "http://prometheus:9090"
cache_name = "metrics"
negative_cache_name = "strict"
req_rewriter_name = "edge"
is_default = true
health_check_headers = { Authorization = "Bearer health-token" }

[origins.prom.paths.query]
path = "/api/v1/query"
match_type = "prefix"
methods = ["GET", "POST"]
request_headers = { Authorization = "Basic cXVlcnk=" }

[origins.router]
origin_type = "rule"
rule_name = "tenant"

[caches.metrics]
cache_type = "redis"
[caches.metrics.redis]
client_type = "cluster"
endpoints = ["redis-0:6379", "redis-1:6379"]
password = "redis-secret"

[caches.orphan]
cache_type = "filesystem"

[tracing.jaeger]
exporter = "jaeger"
collector_url = "http://jaeger:14268"
collector_pass = "jaeger-secret"
"#;
