//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber from the `logging` section
//! - Route output to the console or to `logging.log_file`
//!
//! # Design Decisions
//! - `RUST_LOG` overrides the configured level when set
//! - An unusable log file falls back to the console rather than failing startup

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Build the filter for the configured level.
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(config.log_level.to_lowercase()).unwrap_or_else(|_| EnvFilter::new("info"))
    })
}

/// Install the global subscriber. Later calls are ignored.
pub fn init_logging(config: &LoggingConfig) {
    let filter = env_filter(config);

    if !config.log_file.is_empty() {
        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.log_file)
        {
            Ok(file) => {
                let _ = tracing_subscriber::registry()
                    .with(filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .with_ansi(false)
                            .with_writer(Mutex::new(file)),
                    )
                    .try_init();
                return;
            }
            Err(e) => {
                eprintln!(
                    "failed to open log file {}: {}; logging to console",
                    config.log_file, e
                );
            }
        }
    }

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
