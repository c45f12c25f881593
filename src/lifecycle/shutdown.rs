//! Quit signalling for configurations and the process.
//!
//! Every [`Config`](crate::config::Config) owns one as its quit channel.
//! Publishing a replacement fires the old one so tasks bound to it (pollers,
//! listeners sized from its settings) wind down. The binary holds a second
//! one for process shutdown.
//!
//! # Design Decisions
//! - Latched: once fired it stays fired, so a task that subscribes after a
//!   configuration was replaced still sees it through [`Shutdown::wait`]
//! - Cloning a configuration creates a new signal; copies never share one

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::broadcast;

/// One-shot, latched broadcast signal.
#[derive(Debug)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
    fired: AtomicBool,
}

impl Shutdown {
    /// Create a new, unfired signal.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            fired: AtomicBool::new(false),
        }
    }

    /// Subscribe to the signal. Receivers created after it fired get nothing;
    /// use [`Shutdown::wait`] when that matters.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Fire the signal. Only the first call notifies subscribers.
    pub fn trigger(&self) {
        if !self.fired.swap(true, Ordering::SeqCst) {
            let _ = self.tx.send(());
        }
    }

    /// Returns true once the signal has fired.
    pub fn is_triggered(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    /// Resolve when the signal fires, immediately if it already has.
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        if self.is_triggered() {
            return;
        }
        let _ = rx.recv().await;
    }

    /// Number of live subscribers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_trigger_reaches_subscribers_once() {
        let quit = Shutdown::new();
        let mut rx = quit.subscribe();
        assert_eq!(quit.receiver_count(), 1);
        assert!(!quit.is_triggered());

        quit.trigger();
        quit.trigger();
        assert!(rx.recv().await.is_ok());
        assert!(rx.try_recv().is_err(), "second trigger is a no-op");
        assert!(quit.is_triggered());
    }

    #[tokio::test]
    async fn test_late_waiter_sees_earlier_trigger() {
        let quit = Shutdown::new();
        quit.trigger();
        tokio::time::timeout(Duration::from_secs(1), quit.wait())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_waiter_wakes_on_trigger() {
        let quit = Arc::new(Shutdown::new());
        let waiter = {
            let quit = Arc::clone(&quit);
            tokio::spawn(async move { quit.wait().await })
        };
        tokio::task::yield_now().await;

        quit.trigger();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }
}
