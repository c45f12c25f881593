//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! config loader / staleness monitor / reload watcher
//!     → logging.rs (structured log events)
//!     → metrics.rs (load, staleness and reload counters)
//!
//! tracing.rs holds the named tracer options origins refer to.
//! ```
//!
//! # Design Decisions
//! - Structured logging through `tracing` everywhere
//! - Metrics go through the `metrics` facade; the binary installs the
//!   Prometheus exporter
//! - Counters are cheap, so every load and check is recorded

pub mod logging;
pub mod metrics;
pub mod tracing;
