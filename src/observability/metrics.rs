//! Metrics collection and exposition.
//!
//! # Metrics
//! - `config_loads_total` (counter): load attempts by `result`
//! - `config_staleness_checks_total` (counter): on-disk checks by `outcome`
//! - `config_reloads_total` (counter): hot reloads by `result`
//! - `config_loader_warnings` (gauge): warnings raised by the last load

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter listening on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_config_load(success: bool, warnings: usize) {
    let result = if success { "success" } else { "failure" };
    metrics::counter!("config_loads_total", "result" => result).increment(1);
    if success {
        metrics::gauge!("config_loader_warnings").set(warnings as f64);
    }
}

pub fn record_staleness_check(outcome: &'static str) {
    metrics::counter!("config_staleness_checks_total", "outcome" => outcome).increment(1);
}

pub fn record_reload(success: bool) {
    let result = if success { "success" } else { "failure" };
    metrics::counter!("config_reloads_total", "result" => result).increment(1);
}
