//! The controller behind a file browser window.
//!
//! Owns the current location, history, clipboard and selection. All of
//! that state is written only from methods on [`Explorer`]; the background
//! worker reports back through [`Completion`]s, which the caller consumes
//! with [`next_completion`](Explorer::next_completion),
//! [`pump`](Explorer::pump) or [`settle`](Explorer::settle).

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;

use burrow_types::{ClipboardMode, Entry, Failure, Snapshot};

use crate::clipboard::Clipboard;
use crate::config::ExplorerConfig;
use crate::error::CommandError;
use crate::executor::{BatchOp, Executor};
use crate::history::HistoryStack;
use crate::lister::DirectoryLister;
use crate::path_util;
use crate::paths;
use crate::scheduler::{Completion, JobId, JobInfo, JobStatus, Worker};
use crate::vfs::Filesystem;

/// Launches a file in its associated application.
pub trait Opener: Send + Sync {
    fn open(&self, path: &Path) -> io::Result<()>;
}

/// What [`Explorer::open`] did with a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    /// The path was a directory and is now the current location.
    Navigated(PathBuf),
    /// The path was handed to the [`Opener`].
    Launched(PathBuf),
    /// The opener refused. Not fatal; shown to the user as a notice.
    LaunchFailed { path: PathBuf, message: String },
}

pub struct Explorer {
    lister: DirectoryLister,
    executor: Executor,
    opener: Arc<dyn Opener>,
    history: HistoryStack,
    clipboard: Clipboard,
    selection: Vec<PathBuf>,
    snapshot: Snapshot,
    worker: Worker,
    completions: mpsc::UnboundedReceiver<Completion>,
    pending: usize,
}

impl Explorer {
    /// Open an explorer at the configured start directory.
    ///
    /// Fails if the start directory cannot be listed.
    pub async fn start(
        config: ExplorerConfig,
        fs: Arc<dyn Filesystem>,
        opener: Arc<dyn Opener>,
    ) -> Result<Self, Failure> {
        let start = path_util::normalize(&config.resolved_start_path());
        let lister = DirectoryLister::new(fs.clone());
        let snapshot = lister.list(&start).await?;

        let history = match config.history_limit {
            Some(limit) => HistoryStack::with_limit(&start, limit),
            None => HistoryStack::new(&start),
        };

        let executor = Executor::new(fs);
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = Worker::spawn(executor.clone(), tx);

        tracing::info!(path = %start.display(), "explorer started");
        Ok(Self {
            lister,
            executor,
            opener,
            history,
            clipboard: Clipboard::new(),
            selection: Vec::new(),
            snapshot,
            worker,
            completions: rx,
            pending: 0,
        })
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    /// Make `path` the current location.
    ///
    /// The history only changes if the listing succeeds. Navigating to the
    /// current location refreshes without adding a history entry.
    pub async fn navigate(&mut self, path: &Path) -> Result<(), Failure> {
        let path = path_util::normalize(path);
        let snapshot = self.lister.list(&path).await?;
        if path != self.history.current() {
            self.history.navigate(&path);
        }
        self.install(snapshot);
        Ok(())
    }

    /// Navigate to a typed location: absolute, relative to the current
    /// directory, or `~`-prefixed.
    pub async fn navigate_to(&mut self, text: &str) -> Result<(), Failure> {
        let home = paths::home_dir();
        let target = path_util::resolve_input(self.current_path(), text, home.as_deref());
        self.navigate(&target).await
    }

    /// Step back. `Ok(None)` when there is nothing to go back to.
    pub async fn back(&mut self) -> Result<Option<PathBuf>, Failure> {
        let Some(target) = self.history.back().map(Path::to_path_buf) else {
            return Ok(None);
        };
        match self.lister.list(&target).await {
            Ok(snapshot) => {
                self.install(snapshot);
                Ok(Some(target))
            }
            Err(failure) => {
                self.history.forward();
                Err(failure)
            }
        }
    }

    /// Step forward. `Ok(None)` when there is nothing ahead.
    pub async fn forward(&mut self) -> Result<Option<PathBuf>, Failure> {
        let Some(target) = self.history.forward().map(Path::to_path_buf) else {
            return Ok(None);
        };
        match self.lister.list(&target).await {
            Ok(snapshot) => {
                self.install(snapshot);
                Ok(Some(target))
            }
            Err(failure) => {
                self.history.back();
                Err(failure)
            }
        }
    }

    /// Go to the parent directory. `Ok(None)` at a root.
    pub async fn up(&mut self) -> Result<Option<PathBuf>, Failure> {
        let Some(parent) = self.history.up(self.current_path()) else {
            return Ok(None);
        };
        self.navigate(&parent).await?;
        Ok(Some(parent))
    }

    /// Navigate into a directory, or hand a file to the opener.
    pub async fn open(&mut self, path: &Path) -> Result<OpenOutcome, Failure> {
        let entry = self.lister.entry(path).await?;
        if entry.is_dir {
            self.navigate(path).await?;
            return Ok(OpenOutcome::Navigated(self.current_path().to_path_buf()));
        }
        match self.opener.open(path) {
            Ok(()) => Ok(OpenOutcome::Launched(path.to_path_buf())),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "open failed");
                Ok(OpenOutcome::LaunchFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })
            }
        }
    }

    /// Open the first selected entry.
    pub async fn open_selected(&mut self) -> Result<OpenOutcome, CommandError> {
        let target = self
            .selection
            .first()
            .cloned()
            .ok_or(CommandError::NothingSelected)?;
        Ok(self.open(&target).await?)
    }

    /// Re-list the current location. Clears the selection.
    pub async fn refresh(&mut self) -> Result<(), Failure> {
        let snapshot = self.lister.list(self.history.current()).await?;
        self.install(snapshot);
        Ok(())
    }

    fn install(&mut self, snapshot: Snapshot) {
        self.snapshot = snapshot;
        self.selection.clear();
    }

    async fn refresh_after(&mut self, what: &str) {
        if let Err(failure) = self.refresh().await {
            tracing::warn!(after = what, error = %failure, "refresh failed");
        }
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    pub fn set_selection(&mut self, paths: impl IntoIterator<Item = PathBuf>) {
        self.selection.clear();
        for path in paths {
            self.select(path);
        }
    }

    pub fn select(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if !self.selection.contains(&path) {
            self.selection.push(path);
        }
    }

    pub fn deselect(&mut self, path: &Path) {
        self.selection.retain(|p| p != path);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn selection(&self) -> &[PathBuf] {
        &self.selection
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Create a folder in the current directory.
    pub async fn create_folder(&mut self, name: &str) -> Result<PathBuf, Failure> {
        let path = self
            .executor
            .create_folder(self.history.current(), name)
            .await?;
        self.refresh_after("create folder").await;
        Ok(path)
    }

    /// Create an empty file in the current directory.
    pub async fn create_file(&mut self, name: &str) -> Result<PathBuf, Failure> {
        let path = self
            .executor
            .create_file(self.history.current(), name)
            .await?;
        self.refresh_after("create file").await;
        Ok(path)
    }

    /// Rename the first selected entry.
    pub async fn rename_selected(&mut self, new_name: &str) -> Result<PathBuf, CommandError> {
        let target = self
            .selection
            .first()
            .cloned()
            .ok_or(CommandError::NothingSelected)?;
        let renamed = self.executor.rename(&target, new_name).await?;
        if renamed != target {
            self.refresh_after("rename").await;
        }
        Ok(renamed)
    }

    /// Stage the selection for copying. Returns the number of items staged.
    pub fn copy_selected(&mut self) -> Result<usize, CommandError> {
        self.stage_selection(ClipboardMode::Copy)
    }

    /// Stage the selection for moving. Returns the number of items staged.
    pub fn cut_selected(&mut self) -> Result<usize, CommandError> {
        self.stage_selection(ClipboardMode::Cut)
    }

    fn stage_selection(&mut self, mode: ClipboardMode) -> Result<usize, CommandError> {
        if self.selection.is_empty() {
            return Err(CommandError::NothingSelected);
        }
        self.clipboard.stage(self.selection.iter().cloned(), mode);
        tracing::debug!(mode = %mode, items = self.clipboard.items().len(), "staged");
        Ok(self.clipboard.items().len())
    }

    /// Paste the clipboard into the current directory on the worker.
    pub async fn paste(&mut self) -> Result<JobId, CommandError> {
        if self.clipboard.is_empty() {
            return Err(CommandError::ClipboardEmpty);
        }
        let sources = self.clipboard.items().to_vec();
        let destination = self.history.current().to_path_buf();
        let (op, generation) = match self.clipboard.mode() {
            ClipboardMode::Cut => (
                BatchOp::Move {
                    sources,
                    destination,
                },
                Some(self.clipboard.generation()),
            ),
            _ => (
                BatchOp::Copy {
                    sources,
                    destination,
                },
                None,
            ),
        };
        self.dispatch(op, generation).await
    }

    /// Delete the selection on the worker.
    ///
    /// The caller is responsible for having confirmed this with the user.
    pub async fn delete_selected(&mut self) -> Result<JobId, CommandError> {
        if self.selection.is_empty() {
            return Err(CommandError::NothingSelected);
        }
        let paths = std::mem::take(&mut self.selection);
        self.dispatch(BatchOp::Delete { paths }, None).await
    }

    async fn dispatch(
        &mut self,
        op: BatchOp,
        generation: Option<u64>,
    ) -> Result<JobId, CommandError> {
        let id = self.worker.dispatch(op, generation).await?;
        self.pending += 1;
        Ok(id)
    }

    /// Metadata for one path.
    pub async fn properties(&self, path: &Path) -> Result<Entry, Failure> {
        self.lister.entry(path).await
    }

    // ------------------------------------------------------------------
    // Completions
    // ------------------------------------------------------------------

    /// Wait for the next batch to finish and apply it.
    ///
    /// Returns `None` immediately when nothing is outstanding.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        if self.pending == 0 {
            return None;
        }
        match self.completions.recv().await {
            Some(completion) => {
                self.apply(&completion).await;
                Some(completion)
            }
            None => {
                tracing::warn!(lost = self.pending, "worker stopped with jobs outstanding");
                self.pending = 0;
                None
            }
        }
    }

    /// Apply every completion that has already arrived, without waiting.
    pub async fn pump(&mut self) -> Vec<Completion> {
        let mut done = Vec::new();
        while let Ok(completion) = self.completions.try_recv() {
            self.settle_state(&completion);
            done.push(completion);
        }
        if !done.is_empty() {
            self.refresh_after("batch").await;
        }
        done
    }

    /// Wait until every outstanding batch has finished.
    pub async fn settle(&mut self) -> Vec<Completion> {
        let mut done = Vec::new();
        while let Some(completion) = self.next_completion().await {
            done.push(completion);
        }
        done
    }

    /// Stop the worker after it has run every queued batch, then apply
    /// their completions.
    pub async fn shutdown(&mut self) -> Vec<Completion> {
        self.worker.shutdown().await;
        let done = self.settle().await;
        tracing::info!("explorer shut down");
        done
    }

    async fn apply(&mut self, completion: &Completion) {
        self.settle_state(completion);
        self.refresh_after("batch").await;
    }

    /// Foreground bookkeeping for a finished batch, before the refresh.
    fn settle_state(&mut self, completion: &Completion) {
        self.pending = self.pending.saturating_sub(1);
        if let (BatchOp::Move { .. }, Some(generation)) =
            (&completion.op, completion.clipboard_generation)
        {
            self.clipboard.settle_paste(generation, &completion.result);
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn current_path(&self) -> &Path {
        self.history.current()
    }

    pub fn history(&self) -> &HistoryStack {
        &self.history
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    /// Batches dispatched but not yet applied.
    pub fn pending_jobs(&self) -> usize {
        self.pending
    }

    pub async fn job_status(&self, id: JobId) -> Option<JobStatus> {
        self.worker.status(id).await
    }

    pub async fn jobs(&self) -> Vec<JobInfo> {
        self.worker.list().await
    }
}
