use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use arc_swap::ArcSwapOption;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::build::{BuildError, BuildSummary, Builder, Watcher};
use crate::shutdown::Shutdown;

/// Something that can build the site into a directory.
pub trait SiteBuilder: Send + Sync + 'static {
    fn build(&self, dest: &Path) -> Result<BuildSummary, BuildError>;
}

impl SiteBuilder for Builder {
    fn build(&self, dest: &Path) -> Result<BuildSummary, BuildError> {
        Builder::build(self, dest)
    }
}

/// A stream of change notifications. `None` means no more changes will come.
pub trait ChangeSource: Send + 'static {
    fn next_change(&mut self) -> impl Future<Output = Option<SystemTime>> + Send;
}

impl ChangeSource for Watcher {
    fn next_change(&mut self) -> impl Future<Output = Option<SystemTime>> + Send {
        self.changed()
    }
}

/// The build the preview server currently answers from.
#[derive(Debug)]
pub struct BuildSnapshot {
    /// Directory of the most recent successful build
    pub dir: Option<PathBuf>,
    /// Error of the most recent build, if it failed
    pub error: Option<BuildError>,
    pub generation: u64,
}

pub type SharedSnapshot = Arc<ArcSwapOption<BuildSnapshot>>;

/// Rebuilds the site into fresh scratch directories and publishes the result.
pub struct Rebuilder<B> {
    builder: Arc<B>,
    scratch_dir: PathBuf,
    snapshot: SharedSnapshot,
    reload: broadcast::Sender<()>,
    generation: u64,
}

impl<B: SiteBuilder> Rebuilder<B> {
    pub fn new(builder: B, scratch_dir: PathBuf) -> Self {
        let (reload, _) = broadcast::channel(16);
        Self {
            builder: Arc::new(builder),
            scratch_dir,
            snapshot: Arc::new(ArcSwapOption::empty()),
            reload,
            generation: 0,
        }
    }

    pub fn snapshot(&self) -> SharedSnapshot {
        Arc::clone(&self.snapshot)
    }

    /// Sender notified after every rebuild, successful or not.
    pub fn reload_sender(&self) -> broadcast::Sender<()> {
        self.reload.clone()
    }

    /// Build once and publish the result, even if the build failed.
    pub async fn initial_build(&mut self) {
        self.rebuild().await;
    }

    /// Rebuild on every change until `shutdown` fires, then remove the scratch directory.
    ///
    /// If the change source ends first, the current build keeps being served
    /// until shutdown.
    pub async fn run<C: ChangeSource>(mut self, mut changes: C, mut shutdown: Shutdown) {
        loop {
            tokio::select! {
                _ = shutdown.wait() => break,
                change = changes.next_change() => match change {
                    Some(at) => {
                        debug!(?at, "change detected");
                        self.rebuild().await;
                    }
                    None => {
                        warn!("change detection stopped, no further rebuilds");
                        shutdown.wait().await;
                        break;
                    }
                },
            }
        }

        debug!(dir = %self.scratch_dir.display(), "removing scratch directory");
        remove_dir(&self.scratch_dir).await;
    }

    async fn rebuild(&mut self) {
        self.generation += 1;
        let generation = self.generation;
        let dest = self.scratch_dir.join(format!("build-{generation}"));

        info!(generation, "building site");
        let result = self.build_blocking(dest.clone()).await;

        let previous_dir = self
            .snapshot
            .load()
            .as_ref()
            .and_then(|snapshot| snapshot.dir.clone());

        match result {
            Ok(summary) => {
                info!(
                    generation,
                    pages = summary.pages,
                    files = summary.files,
                    "build succeeded"
                );
                self.snapshot.store(Some(Arc::new(BuildSnapshot {
                    dir: Some(dest),
                    error: None,
                    generation,
                })));
                if let Some(previous_dir) = previous_dir {
                    remove_dir(&previous_dir).await;
                }
            }
            Err(e) => {
                error!(generation, "build failed: {e}");
                remove_dir(&dest).await;
                self.snapshot.store(Some(Arc::new(BuildSnapshot {
                    dir: previous_dir,
                    error: Some(e),
                    generation,
                })));
            }
        }

        // No listeners is fine.
        let _ = self.reload.send(());
    }

    async fn build_blocking(&self, dest: PathBuf) -> Result<BuildSummary, BuildError> {
        let builder = Arc::clone(&self.builder);
        let task = tokio::task::spawn_blocking(move || -> Result<BuildSummary, BuildError> {
            std::fs::create_dir_all(&dest)?;
            builder.build(&dest)
        });

        match task.await {
            Ok(result) => result,
            Err(e) => Err(BuildError::Io(std::io::Error::other(e))),
        }
    }
}

async fn remove_dir(dir: &Path) {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %dir.display(), "failed to remove build directory: {e}"),
    }
}
