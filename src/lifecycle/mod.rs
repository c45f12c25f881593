//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     One per configuration as its quit signal, one for the process
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → process shutdown
//!     SIGHUP → config reload
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
