//! Sparse-overlay defaulting of the map sections.
//!
//! # Responsibilities
//! - Build every origin, cache, tracer and rewriter from a fresh default
//!   instance, copying across only the fields the document authored
//! - Resolve rewriter, eviction, match type and collapsed forwarding names
//! - Record which caches origins reference and prune the rest
//!
//! # Design Decisions
//! - A field set to its zero value in the document is still authored and
//!   wins over the default; an absent field never does
//! - Collections (hosts, methods, header maps) are copied whole or not at all
//! - Origins run before caches so the active-cache set is complete when
//!   caches are pruned

use std::collections::{BTreeMap, BTreeSet};

use crate::cache::{CacheOptions, CacheType, EvictionMethod};
use crate::config::document::{Cursor, Document};
use crate::config::loader::{ConfigError, ConfigResult};
use crate::config::Config;
use crate::observability::tracing::TracingOptions;
use crate::origins::paths::{CollapsedForwardingType, MatchType, PathOptions, DEFAULT_METHODS, PATH_MEMBERS};
use crate::origins::OriginOptions;
use crate::rewriter::{compile_all, RewriteInstructions, RewriterOptions};
use crate::tls::TlsOptions;

/// Section names authored in the document, or the built-in entries when the
/// document leaves the section out.
fn section_names(section: &Cursor<'_>, builtin: impl Iterator<Item = String>) -> ConfigResult<Vec<String>> {
    if section.exists() {
        section.keys()
    } else {
        Ok(builtin.collect())
    }
}

/// Overlay and compile the `request_rewriters` section.
pub(crate) fn process_rewriters(config: &mut Config, doc: &Document) -> ConfigResult<()> {
    let section = doc.cursor(&["request_rewriters"]);
    if !section.exists() {
        return Ok(());
    }

    let mut rewriters = BTreeMap::new();
    for name in section.keys()? {
        let mut options = RewriterOptions::default();
        section
            .child(&name)
            .overlay("instructions", &mut options.instructions)?;
        rewriters.insert(name, options);
    }

    config.compiled_rewriters = compile_all(&rewriters)?;
    config.request_rewriters = Some(rewriters);
    Ok(())
}

/// Overlay the `origins` section and collect the active cache names.
pub(crate) fn process_origins(config: &mut Config, doc: &Document) -> ConfigResult<()> {
    let section = doc.cursor(&["origins"]);
    let names = section_names(&section, config.origins.keys().cloned())?;
    let single = names.len() == 1;

    let mut origins = BTreeMap::new();
    let mut active = BTreeSet::new();
    for name in names {
        let origin = overlay_origin(&name, &section.child(&name), single, &config.compiled_rewriters)?;
        active.insert(origin.cache_name.clone());
        origins.insert(name, origin);
    }

    config.origins = origins;
    config.active_caches = active;
    Ok(())
}

fn overlay_origin(
    name: &str,
    cur: &Cursor<'_>,
    single: bool,
    rewriters: &BTreeMap<String, RewriteInstructions>,
) -> ConfigResult<OriginOptions> {
    let mut oc = OriginOptions::new(name);

    if let Some(rewriter) = cur.decode::<String>("req_rewriter_name")? {
        if !rewriter.is_empty() {
            let instructions =
                rewriters
                    .get(&rewriter)
                    .ok_or_else(|| ConfigError::UnknownOriginRewriter {
                        origin: name.to_string(),
                        rewriter: rewriter.clone(),
                    })?;
            oc.req_rewriter = Some(instructions.clone());
            oc.req_rewriter_name = rewriter;
        }
    }

    cur.overlay("origin_type", &mut oc.origin_type)?;
    cur.overlay("rule_name", &mut oc.rule_name)?;
    cur.overlay("path_routing_disabled", &mut oc.path_routing_disabled)?;
    cur.overlay("hosts", &mut oc.hosts)?;

    // a lone origin is unambiguous: it is the default unless the author says otherwise
    let explicit_default = cur.overlay("is_default", &mut oc.is_default)?;
    if single && !explicit_default {
        oc.is_default = true;
    }

    cur.overlay("forwarded_headers", &mut oc.forwarded_headers)?;
    cur.overlay("require_tls", &mut oc.require_tls)?;
    cur.overlay("cache_name", &mut oc.cache_name)?;
    cur.overlay("cache_key_prefix", &mut oc.cache_key_prefix)?;
    cur.overlay("origin_url", &mut oc.origin_url)?;
    cur.overlay("compressable_types", &mut oc.compressable_types)?;
    cur.overlay("timeout_secs", &mut oc.timeout_secs)?;
    cur.overlay("max_idle_conns", &mut oc.max_idle_conns)?;
    cur.overlay("keep_alive_timeout_secs", &mut oc.keep_alive_timeout_secs)?;
    cur.overlay("timeseries_retention_factor", &mut oc.timeseries_retention_factor)?;

    if cur.overlay("timeseries_eviction_method", &mut oc.timeseries_eviction_method)? {
        oc.timeseries_eviction_method = oc.timeseries_eviction_method.to_lowercase();
        if let Some(method) = EvictionMethod::lookup(&oc.timeseries_eviction_method) {
            oc.eviction_method = method;
        }
    }

    cur.overlay("timeseries_ttl_secs", &mut oc.timeseries_ttl_secs)?;
    cur.overlay("max_ttl_secs", &mut oc.max_ttl_secs)?;
    cur.overlay("fastforward_ttl_secs", &mut oc.fastforward_ttl_secs)?;
    cur.overlay("fast_forward_disable", &mut oc.fast_forward_disable)?;
    cur.overlay("backfill_tolerance_secs", &mut oc.backfill_tolerance_secs)?;

    if cur.is_defined("paths") {
        oc.paths = overlay_paths(name, &cur.child("paths"), rewriters)?;
    }

    cur.overlay("negative_cache_name", &mut oc.negative_cache_name)?;
    cur.overlay("tracing_name", &mut oc.tracing_name)?;
    cur.overlay("health_check_upstream_path", &mut oc.health_check_upstream_path)?;
    cur.overlay("health_check_verb", &mut oc.health_check_verb)?;
    cur.overlay("health_check_query", &mut oc.health_check_query)?;
    cur.overlay("health_check_headers", &mut oc.health_check_headers)?;
    cur.overlay("max_object_size_bytes", &mut oc.max_object_size_bytes)?;
    cur.overlay("revalidation_factor", &mut oc.revalidation_factor)?;
    cur.overlay("multipart_ranges_disabled", &mut oc.multipart_ranges_disabled)?;
    cur.overlay("dearticulate_upstream_ranges", &mut oc.dearticulate_upstream_ranges)?;

    oc.tls = cur.decode::<TlsOptions>("tls")?;

    Ok(oc)
}

fn overlay_paths(
    origin: &str,
    cur: &Cursor<'_>,
    rewriters: &BTreeMap<String, RewriteInstructions>,
) -> ConfigResult<BTreeMap<String, PathOptions>> {
    let mut paths = BTreeMap::new();

    for label in cur.keys()? {
        let entry = cur.child(&label);
        let mut p: PathOptions = cur.decode(&label)?.unwrap_or_default();

        if entry.is_defined("req_rewriter_name") && !p.req_rewriter_name.is_empty() {
            let instructions = rewriters.get(&p.req_rewriter_name).ok_or_else(|| {
                ConfigError::UnknownPathRewriter {
                    origin: origin.to_string(),
                    path: label.clone(),
                    rewriter: p.req_rewriter_name.clone(),
                }
            })?;
            p.req_rewriter = Some(instructions.clone());
        }

        if p.methods.is_empty() {
            p.methods = DEFAULT_METHODS.iter().map(|m| m.to_string()).collect();
        }

        p.custom = PATH_MEMBERS
            .iter()
            .filter(|member| entry.is_defined(member))
            .map(|member| member.to_string())
            .collect();

        if entry.is_defined("response_body") {
            p.response_body_bytes = p.response_body.as_bytes().to_vec();
            p.has_custom_response_body = true;
        }

        p.collapsed_forwarding_type = if entry.is_defined("collapsed_forwarding") {
            CollapsedForwardingType::lookup(&p.collapsed_forwarding).ok_or_else(|| {
                ConfigError::InvalidCollapsedForwarding {
                    origin: origin.to_string(),
                    path: label.clone(),
                    name: p.collapsed_forwarding.clone(),
                }
            })?
        } else {
            CollapsedForwardingType::Basic
        };

        p.match_kind = MatchType::lookup(&p.match_type.to_lowercase()).unwrap_or_default();
        p.match_type = p.match_kind.to_string();

        paths.insert(p.route_key(), p);
    }

    Ok(paths)
}

/// Overlay the `tracing` section. Authored tracers are added to the
/// built-in ones rather than replacing them.
pub(crate) fn process_tracing(config: &mut Config, doc: &Document) -> ConfigResult<()> {
    let section = doc.cursor(&["tracing"]);
    let mut names: BTreeSet<String> = config.tracing_configs.keys().cloned().collect();
    names.extend(section.keys()?);

    let mut configs = BTreeMap::new();
    for name in names {
        let cur = section.child(&name);
        let mut tc = TracingOptions::new(&name);

        cur.overlay("implementation", &mut tc.implementation)?;
        cur.overlay("exporter", &mut tc.exporter)?;
        cur.overlay("service_name", &mut tc.service_name)?;
        cur.overlay("collector_url", &mut tc.collector_url)?;
        cur.overlay("collector_user", &mut tc.collector_user)?;
        cur.overlay("collector_pass", &mut tc.collector_pass)?;
        cur.overlay("sample_rate", &mut tc.sample_rate)?;
        cur.overlay("tags", &mut tc.tags)?;
        cur.overlay("omit_tags", &mut tc.omit_tags)?;
        cur.overlay("stdout_pretty_print", &mut tc.stdout_pretty_print)?;

        configs.insert(name, tc);
    }

    config.tracing_configs = configs;
    Ok(())
}

/// Prune unreferenced caches, then overlay the rest.
///
/// Must run after [`process_origins`].
pub(crate) fn process_caches(config: &mut Config, doc: &Document) -> ConfigResult<()> {
    let section = doc.cursor(&["caches"]);
    let names = section_names(&section, config.caches.keys().cloned())?;

    let mut caches = BTreeMap::new();
    for name in names {
        if !config.active_caches.contains(&name) {
            // not used by any origin, so never instantiate it
            tracing::debug!(cache = %name, "Pruning cache not referenced by any origin");
            continue;
        }
        let cache = overlay_cache(&name, &section.child(&name), &mut config.loader_warnings)?;
        caches.insert(name, cache);
    }

    config.caches = caches;
    Ok(())
}

fn overlay_cache(name: &str, cur: &Cursor<'_>, warnings: &mut Vec<String>) -> ConfigResult<CacheOptions> {
    let mut cc = CacheOptions::new(name);

    if cur.overlay("cache_type", &mut cc.cache_type)? {
        cc.cache_type = cc.cache_type.to_lowercase();
        if let Some(id) = CacheType::lookup(&cc.cache_type) {
            cc.cache_type_id = id;
        }
    }

    let index = cur.child("index");
    index.overlay("reap_interval_secs", &mut cc.index.reap_interval_secs)?;
    index.overlay("flush_interval_secs", &mut cc.index.flush_interval_secs)?;
    index.overlay("max_size_bytes", &mut cc.index.max_size_bytes)?;
    index.overlay("max_size_backoff_bytes", &mut cc.index.max_size_backoff_bytes)?;

    if cc.index.max_size_bytes > 0 && cc.index.max_size_backoff_bytes > cc.index.max_size_bytes {
        return Err(ConfigError::BackoffBytesExceedCap {
            cache: name.to_string(),
            backoff: cc.index.max_size_backoff_bytes,
            cap: cc.index.max_size_bytes,
        });
    }

    index.overlay("max_size_objects", &mut cc.index.max_size_objects)?;
    index.overlay("max_size_backoff_objects", &mut cc.index.max_size_backoff_objects)?;

    if cc.index.max_size_objects > 0 && cc.index.max_size_backoff_objects > cc.index.max_size_objects {
        return Err(ConfigError::BackoffObjectsExceedCap {
            cache: name.to_string(),
            backoff: cc.index.max_size_backoff_objects,
            cap: cc.index.max_size_objects,
        });
    }

    if cc.cache_type_id == CacheType::Redis {
        overlay_redis(&cur.child("redis"), &mut cc, warnings)?;
    }

    cur.child("filesystem")
        .overlay("cache_path", &mut cc.filesystem.cache_path)?;

    let bbolt = cur.child("bbolt");
    bbolt.overlay("filename", &mut cc.bbolt.filename)?;
    bbolt.overlay("bucket", &mut cc.bbolt.bucket)?;

    let badger = cur.child("badger");
    badger.overlay("directory", &mut cc.badger.directory)?;
    badger.overlay("value_directory", &mut cc.badger.value_directory)?;

    Ok(cc)
}

fn overlay_redis(cur: &Cursor<'_>, cc: &mut CacheOptions, warnings: &mut Vec<String>) -> ConfigResult<()> {
    let redis = &mut cc.redis;

    if cur.overlay("client_type", &mut redis.client_type)? {
        redis.client_type = redis.client_type.to_lowercase();
    }
    cur.overlay("protocol", &mut redis.protocol)?;
    let has_endpoint = cur.overlay("endpoint", &mut redis.endpoint)?;
    let has_endpoints = cur.overlay("endpoints", &mut redis.endpoints)?;

    if redis.client_type == "standard" {
        if has_endpoints && !has_endpoint {
            warnings.push(format!(
                "cache [{}]: 'standard' redis type configured, but 'endpoints' value is provided instead of 'endpoint'",
                cc.name
            ));
        }
    } else if has_endpoint && !has_endpoints {
        warnings.push(format!(
            "cache [{}]: '{}' redis type configured, but 'endpoint' value is provided instead of 'endpoints'",
            cc.name, redis.client_type
        ));
    }

    cur.overlay("sentinel_master", &mut redis.sentinel_master)?;
    cur.overlay("password", &mut redis.password)?;
    cur.overlay("db", &mut redis.db)?;
    cur.overlay("max_retries", &mut redis.max_retries)?;
    cur.overlay("min_retry_backoff_ms", &mut redis.min_retry_backoff_ms)?;
    cur.overlay("max_retry_backoff_ms", &mut redis.max_retry_backoff_ms)?;
    cur.overlay("dial_timeout_ms", &mut redis.dial_timeout_ms)?;
    cur.overlay("read_timeout_ms", &mut redis.read_timeout_ms)?;
    cur.overlay("write_timeout_ms", &mut redis.write_timeout_ms)?;
    cur.overlay("pool_size", &mut redis.pool_size)?;
    cur.overlay("min_idle_conns", &mut redis.min_idle_conns)?;
    cur.overlay("max_conn_age_ms", &mut redis.max_conn_age_ms)?;
    cur.overlay("pool_timeout_ms", &mut redis.pool_timeout_ms)?;
    cur.overlay("idle_timeout_ms", &mut redis.idle_timeout_ms)?;
    cur.overlay("idle_check_frequency_ms", &mut redis.idle_check_frequency_ms)?;

    Ok(())
}
