//! cachegate configuration service
//!
//! Loads the caching proxy configuration, keeps it live across edits to the
//! file, and reports it in redacted form.
//!
//! ```text
//!     cachegate.toml ──▶ Config::load_file ──▶ LiveConfig ◀── ConfigWatcher (poll is_stale)
//!                                                  ▲
//!                                   SIGHUP ────────┘ reload
//!                                   SIGTERM / ctrl-c ──▶ shutdown
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

use cachegate::config::{Config, ConfigWatcher, LiveConfig};
use cachegate::lifecycle::signals::{next_signal, SignalKind};
use cachegate::lifecycle::Shutdown;
use cachegate::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "cachegate")]
#[command(about = "Configuration core for the cachegate caching proxy", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "cachegate.toml")]
    config: PathBuf,

    /// Load and validate the configuration, then exit
    #[arg(long)]
    validate: bool,

    /// Print the redacted configuration, then exit
    #[arg(long)]
    print: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let (config, load_error) = Config::load_or_defaults(&cli.config);

    if cli.validate {
        if let Some(e) = load_error {
            eprintln!("cachegate: {}", e);
            return ExitCode::FAILURE;
        }
        for warning in &config.loader_warnings {
            println!("warning: {}", warning);
        }
        println!("configuration ok: {}", cli.config.display());
        return ExitCode::SUCCESS;
    }

    if cli.print {
        if let Some(e) = &load_error {
            eprintln!("cachegate: {}; showing built-in defaults", e);
        }
        return match config.to_toml_string() {
            Ok(text) => {
                print!("{}", text);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("cachegate: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    logging::init_logging(&config.logging);
    tracing::info!(config = ?cli.config, "cachegate v0.1.0 starting");
    if let Some(e) = &load_error {
        tracing::error!(
            error = %e,
            "Configuration rejected, running with built-in defaults until the file is fixed"
        );
    }

    let metrics_address = config.metrics.bind_address();
    match metrics_address.parse::<SocketAddr>() {
        Ok(addr) => {
            if let Err(e) = metrics::init_metrics(addr) {
                tracing::error!(error = %e, "Failed to start metrics exporter");
            }
        }
        Err(_) => {
            tracing::error!(metrics_address = %metrics_address, "Failed to parse metrics address");
        }
    }

    // ConfigWatcher clamps this to its supported range
    let poll_interval = Duration::from_secs(config.reloading.rate_limit_secs.max(1));
    let live = LiveConfig::new(config);
    let shutdown = Shutdown::new();

    let (watcher, mut updates) = ConfigWatcher::new(live.clone(), poll_interval);
    let watcher_handle = watcher.spawn(shutdown.subscribe());

    tokio::spawn(async move {
        while let Some(config) = updates.recv().await {
            tracing::info!(
                origins = config.origins.len(),
                caches = config.caches.len(),
                "Published new configuration"
            );
        }
    });

    loop {
        match next_signal().await {
            Ok(SignalKind::Reload) => {
                tracing::info!("SIGHUP received, reloading configuration");
                if let Err(e) = live.reload() {
                    tracing::error!(error = %e, "Reload failed");
                }
            }
            Ok(SignalKind::Shutdown) => {
                tracing::info!("Shutdown signal received");
                break;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for signals");
                break;
            }
        }
    }

    shutdown.trigger();
    live.load().resources.quit.trigger();
    let _ = watcher_handle.await;

    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}
