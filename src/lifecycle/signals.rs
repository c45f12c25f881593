//! OS signal handling.
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - SIGHUP triggers a config reload, not shutdown
//! - SIGTERM and ctrl-c trigger shutdown

/// What the process was asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Reload,
    Shutdown,
}

/// Wait for the next reload or shutdown signal.
#[cfg(unix)]
pub async fn next_signal() -> std::io::Result<SignalKind> {
    use tokio::signal::unix::{signal, SignalKind as UnixSignal};

    let mut hangup = signal(UnixSignal::hangup())?;
    let mut terminate = signal(UnixSignal::terminate())?;

    tokio::select! {
        _ = hangup.recv() => Ok(SignalKind::Reload),
        _ = terminate.recv() => Ok(SignalKind::Shutdown),
        res = tokio::signal::ctrl_c() => res.map(|_| SignalKind::Shutdown),
    }
}

/// Wait for the next reload or shutdown signal.
#[cfg(not(unix))]
pub async fn next_signal() -> std::io::Result<SignalKind> {
    tokio::signal::ctrl_c().await?;
    Ok(SignalKind::Shutdown)
}
