//! Polling change detection for automatic rebuilds.
//!
//! The watcher compares modification-time fingerprints of the watched trees
//! every time an external trigger ticks. A detected change is reported once on
//! a single-slot channel; further changes found while that slot is full are
//! folded into the pending one.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error};
use walkdir::WalkDir;

use crate::shutdown::Shutdown;

// =============================================================================
// Errors
// =============================================================================

#[derive(thiserror::Error, Debug)]
pub enum WatchError {
    #[error("failed to walk watched directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("failed to read modification time: {0}")]
    Io(#[from] std::io::Error),

    #[error("fingerprint task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

// =============================================================================
// Fingerprint
// =============================================================================

/// Modification times of every file under a set of roots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fingerprint(BTreeMap<PathBuf, SystemTime>);

impl Fingerprint {
    pub fn capture(roots: &[PathBuf]) -> Result<Self, WatchError> {
        let mut files = BTreeMap::new();
        for root in roots {
            for entry in WalkDir::new(root) {
                let entry = entry?;
                if entry.file_type().is_dir() {
                    continue;
                }
                let modified = entry.metadata()?.modified()?;
                files.insert(entry.into_path(), modified);
            }
        }
        Ok(Self(files))
    }

    async fn capture_blocking(roots: Vec<PathBuf>) -> Result<Self, WatchError> {
        tokio::task::spawn_blocking(move || Self::capture(&roots)).await?
    }
}

// =============================================================================
// Watcher
// =============================================================================

/// Receives a timestamp whenever the watched trees change.
#[derive(Debug)]
pub struct Watcher {
    rx: mpsc::Receiver<SystemTime>,
}

impl Watcher {
    /// Capture the initial fingerprint and start polling on every `trigger` tick.
    ///
    /// The change channel closes when `shutdown` fires, when the trigger
    /// closes, or when a later fingerprint fails.
    pub fn start(
        roots: Vec<PathBuf>,
        mut trigger: mpsc::Receiver<SystemTime>,
        mut shutdown: Shutdown,
    ) -> Result<Self, WatchError> {
        let mut baseline = Fingerprint::capture(&roots)?;
        let (tx, rx) = mpsc::channel(1);

        tokio::spawn(async move {
            loop {
                let tick = tokio::select! {
                    _ = shutdown.wait() => break,
                    tick = trigger.recv() => match tick {
                        Some(tick) => tick,
                        None => break,
                    },
                };

                let current = match Fingerprint::capture_blocking(roots.clone()).await {
                    Ok(current) => current,
                    Err(e) => {
                        error!("stopped watching for changes: {e}");
                        break;
                    }
                };

                if current != baseline {
                    baseline = current;
                    if tx.try_send(tick).is_err() {
                        debug!("change already pending");
                    }
                }
            }
        });

        Ok(Self { rx })
    }

    /// Wait for the next change. `None` once the watcher has stopped.
    pub async fn changed(&mut self) -> Option<SystemTime> {
        self.rx.recv().await
    }
}

/// Emit the current time every `period` until the receiver is dropped.
pub fn ticker(period: Duration) -> mpsc::Receiver<SystemTime> {
    let (tx, rx) = mpsc::channel(1);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            if tx.send(SystemTime::now()).await.is_err() {
                break;
            }
        }
    });
    rx
}
