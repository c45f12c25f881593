//! Deep copies and redacted rendering.
//!
//! # Responsibilities
//! - Clone a configuration with no state shared with the original
//! - Render a copy to TOML with credentials masked
//!
//! # Design Decisions
//! - Runtime handles are recreated on clone, never shared
//! - Unset rules and rewriters stay `None` in the copy; an empty map is
//!   normalised to `None` as well
//! - Redaction always works on a copy; the live configuration is untouched

use std::collections::BTreeMap;
use std::fmt;

use crate::config::loader::ConfigResult;
use crate::config::{Config, Resources};

/// Token written in place of secrets.
pub const REDACTED: &str = "*****";

/// Header names whose values are masked. Matched case-sensitively.
pub const SENSITIVE_HEADERS: [&str; 1] = ["Authorization"];

impl Clone for Config {
    fn clone(&self) -> Self {
        Self {
            main: self.main.clone(),
            origins: self.origins.clone(),
            caches: self.caches.clone(),
            frontend: self.frontend.clone(),
            logging: self.logging.clone(),
            metrics: self.metrics.clone(),
            tracing_configs: self.tracing_configs.clone(),
            negative_caches: self.negative_caches.clone(),
            rules: self.rules.clone().filter(|rules| !rules.is_empty()),
            request_rewriters: self
                .request_rewriters
                .clone()
                .filter(|rewriters| !rewriters.is_empty()),
            reloading: self.reloading.clone(),
            resources: Resources::default(),
            compiled_rewriters: self.compiled_rewriters.clone(),
            loader_warnings: self.loader_warnings.clone(),
            active_caches: self.active_caches.clone(),
            staleness: self.staleness.clone(),
        }
    }
}

fn mask_headers(headers: &mut BTreeMap<String, String>) {
    for name in SENSITIVE_HEADERS {
        if let Some(value) = headers.get_mut(name) {
            *value = REDACTED.to_string();
        }
    }
}

impl Config {
    /// A deep copy with secrets masked and non-serialisable runtime
    /// bindings cleared.
    pub fn redacted(&self) -> Config {
        let mut copy = self.clone();

        for origin in copy.origins.values_mut() {
            mask_headers(&mut origin.health_check_headers);
            for path in origin.paths.values_mut() {
                path.handler_impl = None;
                path.key_hasher = None;
                mask_headers(&mut path.request_headers);
                mask_headers(&mut path.response_headers);
            }
        }

        for cache in copy.caches.values_mut() {
            if !cache.redis.password.is_empty() {
                cache.redis.password = REDACTED.to_string();
            }
        }

        for tracer in copy.tracing_configs.values_mut() {
            if !tracer.collector_pass.is_empty() {
                tracer.collector_pass = REDACTED.to_string();
            }
        }

        copy
    }

    /// Redacted TOML rendering, safe to log or serve.
    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(&self.redacted())?)
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.to_toml_string().map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use super::*;
    use crate::origins::paths::{KeyHasher, PathHandler};

    const DOC: &str = r#"
        [rules.tenant]
        input_source = "header"

        [request_rewriters.tag]
        instructions = [["header", "set", "X-Edge", "1"]]

        [origins.web]
        origin_url = "http://web:8080"
        cache_name = "r"
        hosts = ["web.example.com"]
        health_check_headers = { Authorization = "Basic c2VjcmV0", Accept = "*/*" }

        [origins.web.paths.api]
        path = "/api"
        request_headers = { Authorization = "Bearer abc", "X-Trace" = "1" }
        response_headers = { authorization = "left alone" }

        [caches.r]
        cache_type = "redis"
        redis = { endpoint = "r:6379", password = "hunter2" }

        [tracing.jaeger]
        collector_pass = "tracepass"
    "#;

    #[derive(Debug)]
    struct Echo;

    impl PathHandler for Echo {
        fn name(&self) -> &str {
            "echo"
        }
    }

    fn hash(path: &str, _params: &BTreeMap<String, String>) -> String {
        path.to_string()
    }

    #[test]
    fn test_clone_is_independent() {
        let original = Config::load_str(DOC).unwrap();
        let mut copy = original.clone();

        copy.origins.get_mut("web").unwrap().hosts.push("other.example.com".to_string());
        copy.origins
            .get_mut("web")
            .unwrap()
            .paths
            .get_mut("/api-GET-HEAD")
            .unwrap()
            .methods
            .push("POST".to_string());
        copy.caches.get_mut("r").unwrap().redis.endpoints.clear();
        copy.negative_caches.get_mut("default").unwrap().insert("404".to_string(), 1);
        copy.rules.as_mut().unwrap().clear();

        {
            let api = copy
                .origins
                .get_mut("web")
                .unwrap()
                .paths
                .get_mut("/api-GET-HEAD")
                .unwrap();
            api.request_headers.remove("Authorization");
            api.request_headers.insert("X-Added".to_string(), "1".to_string());
        }
        copy.tracing_configs
            .get_mut("jaeger")
            .unwrap()
            .tags
            .insert("env".to_string(), "staging".to_string());
        copy.request_rewriters
            .as_mut()
            .unwrap()
            .get_mut("tag")
            .unwrap()
            .instructions
            .clear();
        copy.compiled_rewriters.get_mut("tag").unwrap().clear();
        copy.main.instance_id = 42;
        copy.main.server_name = "copy".to_string();
        copy.frontend.listen_port = 1;
        copy.logging.log_level = "trace".to_string();
        copy.metrics.listen_port = 2;
        copy.reloading.rate_limit_secs = 99;
        copy.loader_warnings.push("copy only".to_string());
        copy.resources.quit.trigger();

        let web = &original.origins["web"];
        assert_eq!(web.hosts, vec!["web.example.com"]);
        let api = &web.paths["/api-GET-HEAD"];
        assert_eq!(api.methods, vec!["GET", "HEAD"]);
        assert_eq!(api.request_headers["Authorization"], "Bearer abc");
        assert!(!api.request_headers.contains_key("X-Added"));
        assert_eq!(original.caches["r"].redis.endpoints, vec!["redis:6379"]);
        assert!(original.negative_caches["default"].is_empty());
        assert_eq!(original.rules.as_ref().unwrap().len(), 1);
        assert!(original.tracing_configs["jaeger"].tags.is_empty());
        assert_eq!(
            original.request_rewriters.as_ref().unwrap()["tag"].instructions.len(),
            1
        );
        assert_eq!(original.compiled_rewriters["tag"].len(), 1);
        assert_ne!(original.main.instance_id, 42);
        assert_ne!(original.main.server_name, "copy");
        assert_eq!(original.frontend.listen_port, 8480);
        assert_eq!(original.logging.log_level, "INFO");
        assert_eq!(original.metrics.listen_port, 8481);
        assert_eq!(original.reloading.rate_limit_secs, 3);
        assert!(original.loader_warnings.is_empty());
        assert!(!original.resources.quit.is_triggered());
    }

    #[test]
    fn test_clone_recreates_resources() {
        let original = Config::load_str(DOC).unwrap();
        let _rx = original.resources.quit.subscribe();

        let copy = original.clone();
        assert_eq!(copy.resources.quit.receiver_count(), 0);
        assert!(copy.resources.document.is_none());
        assert_eq!(copy.compiled_rewriters, original.compiled_rewriters);
    }

    #[test]
    fn test_clone_keeps_unset_sections_unset() {
        let config = Config::load_str("").unwrap();
        let copy = config.clone();
        assert!(copy.rules.is_none());
        assert!(copy.request_rewriters.is_none());

        let mut config = Config::load_str(DOC).unwrap();
        config.rules = Some(BTreeMap::new());
        assert!(config.clone().rules.is_none());
    }

    #[test]
    fn test_redaction_masks_secrets_in_copy_only() {
        let mut config = Config::load_str(DOC).unwrap();
        {
            let path = config
                .origins
                .get_mut("web")
                .unwrap()
                .paths
                .get_mut("/api-GET-HEAD")
                .unwrap();
            path.handler_impl = Some(Arc::new(Echo));
            path.key_hasher = Some(KeyHasher(hash));
        }

        let redacted = config.redacted();
        let web = &redacted.origins["web"];
        let api = &web.paths["/api-GET-HEAD"];
        assert_eq!(web.health_check_headers["Authorization"], REDACTED);
        assert_eq!(web.health_check_headers["Accept"], "*/*");
        assert_eq!(api.request_headers["Authorization"], REDACTED);
        assert_eq!(api.request_headers["X-Trace"], "1");
        assert_eq!(api.response_headers["authorization"], "left alone");
        assert!(api.handler_impl.is_none());
        assert!(api.key_hasher.is_none());
        assert_eq!(redacted.caches["r"].redis.password, REDACTED);
        assert_eq!(redacted.tracing_configs["jaeger"].collector_pass, REDACTED);
        assert_eq!(redacted.tracing_configs["default"].collector_pass, "");

        let live = &config.origins["web"];
        assert_eq!(live.health_check_headers["Authorization"], "Basic c2VjcmV0");
        assert!(live.paths["/api-GET-HEAD"].handler_impl.is_some());
        assert!(live.paths["/api-GET-HEAD"].key_hasher.is_some());
        assert_eq!(config.caches["r"].redis.password, "hunter2");
    }

    #[test]
    fn test_rendered_text_never_leaks_secrets() {
        let config = Config::load_str(DOC).unwrap();
        let text = config.to_string();

        for secret in ["hunter2", "c2VjcmV0", "Bearer abc", "tracepass"] {
            assert!(!text.contains(secret), "leaked {secret}");
        }
        assert!(text.contains(REDACTED));
        assert!(text.contains("http://web:8080"));

        let parsed: toml::Table = toml::from_str(&text).unwrap();
        assert!(parsed.contains_key("origins"));
        assert!(parsed.contains_key("rules"));
    }

    #[test]
    fn test_rendering_omits_unset_sections() {
        let text = Config::load_str("").unwrap().to_toml_string().unwrap();
        assert!(!text.contains("[rules"));
        assert!(!text.contains("[request_rewriters"));
    }
}
