//! Source file staleness detection for hot reload.
//!
//! # Responsibilities
//! - Remember which file a configuration came from and how it looked then
//! - Answer "has the file changed?" at most once per interval
//! - Poll on a timer and trigger reloads of the live configuration
//!
//! # Design Decisions
//! - Polls modification stamps instead of subscribing to filesystem events
//! - The stamp is the modification time plus the file length, so an edit
//!   that lands within the same mtime tick but changes the size is caught
//! - Unreadable files are never stale; a reload is not forced on a file
//!   that cannot be seen
//! - Bookkeeping sits behind its own mutex, separate from reload publishing

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant, SystemTime};

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::config::{Config, LiveConfig};
use crate::observability::metrics;

/// What a file looked like when it was last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStamp {
    modified: SystemTime,
    len: u64,
}

impl FileStamp {
    /// Observe `path` now. `None` if its metadata cannot be read.
    pub fn read(path: &Path) -> Option<Self> {
        let meta = fs::metadata(path).ok()?;
        Some(Self {
            modified: meta.modified().ok()?,
            len: meta.len(),
        })
    }
}

/// When the filesystem may next be consulted.
#[derive(Debug, Clone, Copy, Default)]
enum Recheck {
    #[default]
    Now,
    At(Instant),
    /// The interval does not fit in an `Instant`; the file is checked once.
    Never,
}

#[derive(Debug, Clone, Default)]
struct SourceState {
    path: Option<PathBuf>,
    loaded: Option<FileStamp>,
    next_check: Recheck,
}

/// Staleness bookkeeping for one configuration.
#[derive(Debug, Default)]
pub struct StalenessMonitor {
    state: Mutex<SourceState>,
}

impl Clone for StalenessMonitor {
    fn clone(&self) -> Self {
        Self {
            state: Mutex::new(self.lock().clone()),
        }
    }
}

impl StalenessMonitor {
    fn lock(&self) -> MutexGuard<'_, SourceState> {
        // the state is plain data, so a poisoned guard is still consistent
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Bind to `path`, recording how the file looks right now.
    pub fn bind(&self, path: &Path) {
        self.bind_stamped(path, FileStamp::read(path));
    }

    /// Bind to `path` with a stamp taken before its contents were read, so
    /// an edit racing the read still shows up as stale.
    pub fn bind_stamped(&self, path: &Path, loaded: Option<FileStamp>) {
        let mut state = self.lock();
        state.loaded = loaded;
        state.path = Some(path.to_path_buf());
        state.next_check = Recheck::Now;
    }

    pub fn source_path(&self) -> Option<PathBuf> {
        self.lock().path.clone()
    }

    /// Modification time of the bound file as it is on disk now.
    pub fn current_modified(&self) -> Option<SystemTime> {
        let path = self.source_path()?;
        FileStamp::read(&path).map(|stamp| stamp.modified)
    }

    /// Returns true if the bound file differs from when it was loaded.
    ///
    /// Calls within `interval` of the previous check return false without
    /// touching the filesystem.
    pub fn is_stale(&self, interval: Duration) -> bool {
        let mut state = self.lock();
        let Some(path) = state.path.clone() else {
            return false;
        };

        let now = Instant::now();
        let due = match state.next_check {
            Recheck::Now => true,
            Recheck::At(deadline) => now >= deadline,
            Recheck::Never => false,
        };
        if !due {
            metrics::record_staleness_check("rate_limited");
            return false;
        }
        state.next_check = now
            .checked_add(interval)
            .map_or(Recheck::Never, Recheck::At);

        let Some(current) = FileStamp::read(&path) else {
            tracing::warn!(path = ?path, "Could not read config file metadata");
            metrics::record_staleness_check("unreadable");
            return false;
        };

        let stale = state.loaded != Some(current);
        if stale {
            tracing::info!(path = ?path, "Config file changed on disk");
            metrics::record_staleness_check("stale");
        } else {
            metrics::record_staleness_check("fresh");
        }
        stale
    }
}

/// Bounds on the watcher's tick period.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(3600);

/// Polls the live configuration for staleness and reloads it.
pub struct ConfigWatcher {
    live: LiveConfig,
    poll_interval: Duration,
    update_tx: mpsc::UnboundedSender<Arc<Config>>,
}

impl ConfigWatcher {
    /// Create a watcher over `live`, ticking every `poll_interval` clamped to
    /// [`MIN_POLL_INTERVAL`]..=[`MAX_POLL_INTERVAL`].
    ///
    /// Returns the watcher and a receiver for each configuration it publishes.
    pub fn new(
        live: LiveConfig,
        poll_interval: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<Arc<Config>>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        (
            Self {
                live,
                poll_interval: poll_interval.clamp(MIN_POLL_INTERVAL, MAX_POLL_INTERVAL),
                update_tx,
            },
            update_rx,
        )
    }

    /// Run the poll loop until `shutdown` fires.
    pub fn spawn(self, mut shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            tracing::info!(interval = ?self.poll_interval, "Config watcher started");

            loop {
                tokio::select! {
                    _ = shutdown.recv() => {
                        tracing::info!("Config watcher stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        if !self.live.load().is_stale() {
                            continue;
                        }
                        match self.live.reload() {
                            Ok(config) => {
                                let _ = self.update_tx.send(config);
                            }
                            Err(e) => {
                                tracing::error!(error = %e, "Failed to reload config. Keeping current configuration.");
                            }
                        }
                    }
                }
            }
        })
    }
}
