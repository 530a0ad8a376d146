//! Create, copy, move, delete and rename.
//!
//! Batch commands (copy, move, delete) attempt every item and collect the
//! outcome in an [`OperationResult`]; one failing item never stops the
//! rest. Single-target commands (create, rename) return `Result`.
//!
//! Recursion never follows symlinks: a link is copied as a link and
//! deleted as a link, so a link cycle cannot make a walk loop.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use burrow_types::{ErrorKind, Failure, OperationResult};

use crate::clipboard::Clipboard;
use crate::path_util;
use crate::vfs::{is_cross_device, DirEntryKind, Filesystem};

type TreeFuture<'a> = Pin<Box<dyn Future<Output = Result<(), Failure>> + Send + 'a>>;

/// A batch command, as queued on the background worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    Copy {
        sources: Vec<PathBuf>,
        destination: PathBuf,
    },
    Move {
        sources: Vec<PathBuf>,
        destination: PathBuf,
    },
    Delete {
        paths: Vec<PathBuf>,
    },
}

impl BatchOp {
    /// Short label for logs and job listings.
    pub fn describe(&self) -> String {
        match self {
            BatchOp::Copy { sources, destination } => {
                format!("copy {} item(s) to {}", sources.len(), destination.display())
            }
            BatchOp::Move { sources, destination } => {
                format!("move {} item(s) to {}", sources.len(), destination.display())
            }
            BatchOp::Delete { paths } => format!("delete {} item(s)", paths.len()),
        }
    }
}

/// Runs mutations against a [`Filesystem`].
#[derive(Clone)]
pub struct Executor {
    fs: Arc<dyn Filesystem>,
}

impl Executor {
    pub fn new(fs: Arc<dyn Filesystem>) -> Self {
        Self { fs }
    }

    /// Run a batch command to completion.
    pub async fn run(&self, op: &BatchOp) -> OperationResult {
        match op {
            BatchOp::Copy { sources, destination } => self.copy(sources, destination).await,
            BatchOp::Move { sources, destination } => self.move_items(sources, destination).await,
            BatchOp::Delete { paths } => self.delete_all(paths).await,
        }
    }

    /// Create `parent/name` as a directory.
    ///
    /// An existing directory of that name counts as success.
    pub async fn create_folder(&self, parent: &Path, name: &str) -> Result<PathBuf, Failure> {
        let target = Self::child(parent, name)?;
        if self.fs.exists(&target).await {
            return match self.fs.stat(&target).await {
                Ok(meta) if meta.is_dir() => Ok(target),
                _ => Err(Failure::new(
                    &target,
                    ErrorKind::AlreadyExists,
                    "a file with that name already exists",
                )),
            };
        }
        self.fs
            .mkdir(&target)
            .await
            .map_err(|e| Failure::from_io(&target, &e))?;
        tracing::debug!(path = %target.display(), "created folder");
        Ok(target)
    }

    /// Create `parent/name` as an empty file.
    ///
    /// An existing file of that name is left as it is and counts as success.
    pub async fn create_file(&self, parent: &Path, name: &str) -> Result<PathBuf, Failure> {
        let target = Self::child(parent, name)?;
        if self.fs.exists(&target).await {
            return match self.fs.stat(&target).await {
                Ok(meta) if !meta.is_dir() => Ok(target),
                _ => Err(Failure::new(
                    &target,
                    ErrorKind::AlreadyExists,
                    "a folder with that name already exists",
                )),
            };
        }
        self.fs
            .create_file(&target)
            .await
            .map_err(|e| Failure::from_io(&target, &e))?;
        tracing::debug!(path = %target.display(), "created file");
        Ok(target)
    }

    /// Rename `path` within its parent directory. Returns the new path.
    ///
    /// Renaming to the current name is a successful no-op.
    pub async fn rename(&self, path: &Path, new_name: &str) -> Result<PathBuf, Failure> {
        if let Err(problem) = path_util::validate_name(new_name) {
            return Err(Failure::invalid_name(path, problem.message()));
        }
        if !self.fs.exists(path).await {
            return Err(Failure::not_found(path));
        }
        if path_util::file_name(path).as_deref() == Some(new_name) {
            return Ok(path.to_path_buf());
        }
        let parent = path_util::parent(path)
            .ok_or_else(|| Failure::invalid_name(path, "cannot rename a root"))?;
        let target = parent.join(new_name);
        if self.fs.exists(&target).await {
            return Err(Failure::new(
                &target,
                ErrorKind::AlreadyExists,
                format!("{new_name} already exists"),
            ));
        }
        self.fs
            .rename(path, &target)
            .await
            .map_err(|e| Failure::from_io(path, &e))?;
        tracing::debug!(from = %path.display(), to = %target.display(), "renamed");
        Ok(target)
    }

    /// Delete every path; directories are removed with all their contents.
    pub async fn delete_all(&self, paths: &[PathBuf]) -> OperationResult {
        let mut result = OperationResult::new();
        for path in paths {
            let outcome = if self.fs.exists(path).await {
                self.remove_tree(path).await.map(|()| path.clone())
            } else {
                Err(Failure::not_found(path))
            };
            Self::log_item("delete", path, &outcome);
            result.record(outcome);
        }
        result
    }

    /// Copy every source into `destination`, renaming on conflict.
    pub async fn copy(&self, sources: &[PathBuf], destination: &Path) -> OperationResult {
        let mut result = OperationResult::new();
        for source in sources {
            let outcome = self.copy_one(source, destination).await;
            Self::log_item("copy", source, &outcome);
            result.record(outcome);
        }
        result
    }

    /// Move every source into `destination`, renaming on conflict.
    ///
    /// Uses a rename where possible and falls back to copy-then-delete when
    /// source and destination are on different volumes.
    pub async fn move_items(&self, sources: &[PathBuf], destination: &Path) -> OperationResult {
        let mut result = OperationResult::new();
        for source in sources {
            let outcome = self.move_one(source, destination).await;
            Self::log_item("move", source, &outcome);
            result.record(outcome);
        }
        result
    }

    async fn copy_one(&self, source: &Path, destination: &Path) -> Result<PathBuf, Failure> {
        let dest = self.prepare_transfer(source, destination).await?;
        self.copy_tree(source, &dest).await.map_err(|f| Self::on_item(source, f))?;
        Ok(dest)
    }

    async fn move_one(&self, source: &Path, destination: &Path) -> Result<PathBuf, Failure> {
        let dest = self.prepare_transfer(source, destination).await?;
        match self.fs.rename(source, &dest).await {
            Ok(()) => Ok(dest),
            Err(e) if is_cross_device(&e) => self.move_across_volumes(source, &dest).await,
            Err(e) => Err(Failure::from_io(source, &e)),
        }
    }

    async fn move_across_volumes(&self, source: &Path, dest: &Path) -> Result<PathBuf, Failure> {
        tracing::debug!(
            from = %source.display(),
            to = %dest.display(),
            "rename crosses volumes, copying instead"
        );
        if let Err(failure) = self.copy_tree(source, dest).await {
            // Explicitly ignored: removing a partial copy is best-effort
            let _ = self.remove_tree(dest).await;
            return Err(Failure::new(
                source,
                ErrorKind::CrossVolumeMoveFailed,
                format!("copy failed: {failure}"),
            ));
        }
        if let Err(failure) = self.remove_tree(source).await {
            return Err(Failure::new(
                source,
                ErrorKind::CrossVolumeMoveFailed,
                format!(
                    "copied to {} but the source could not be removed: {failure}",
                    dest.display()
                ),
            ));
        }
        Ok(dest.to_path_buf())
    }

    /// Common checks for copy and move. Returns the conflict-free target.
    async fn prepare_transfer(&self, source: &Path, destination: &Path) -> Result<PathBuf, Failure> {
        let source_meta = self
            .fs
            .lstat(source)
            .await
            .map_err(|e| Failure::from_io(source, &e))?;

        match self.fs.stat(destination).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(Failure::new(
                    source,
                    ErrorKind::NotFound,
                    format!("{} is not a directory", destination.display()),
                ));
            }
            Err(e) => return Err(Failure::from_io(source, &e)),
        }

        if source_meta.kind == DirEntryKind::Directory && destination.starts_with(source) {
            return Err(Failure::new(
                source,
                ErrorKind::Unknown("cannot copy a folder into itself".into()),
                format!("{} is inside {}", destination.display(), source.display()),
            ));
        }

        Clipboard::resolve_destination(self.fs.as_ref(), source, destination).await
    }

    /// Recursively copy `from` to `to`, which must not exist.
    fn copy_tree<'a>(&'a self, from: &'a Path, to: &'a Path) -> TreeFuture<'a> {
        Box::pin(async move {
            let meta = self
                .fs
                .lstat(from)
                .await
                .map_err(|e| Failure::from_io(from, &e))?;

            match meta.kind {
                DirEntryKind::Symlink => {
                    let target = self
                        .fs
                        .read_link(from)
                        .await
                        .map_err(|e| Failure::from_io(from, &e))?;
                    self.fs
                        .symlink(&target, to)
                        .await
                        .map_err(|e| Failure::from_io(to, &e))
                }
                DirEntryKind::Directory => {
                    self.fs.mkdir(to).await.map_err(|e| Failure::from_io(to, &e))?;
                    let names = self
                        .fs
                        .list(from)
                        .await
                        .map_err(|e| Failure::from_io(from, &e))?;
                    for name in names {
                        let (child_from, child_to) = (from.join(&name), to.join(&name));
                        self.copy_tree(&child_from, &child_to).await?;
                    }
                    if let Some(modified) = meta.modified {
                        // Explicitly ignored: timestamps are preserved where possible
                        let _ = self.fs.set_modified(to, modified).await;
                    }
                    Ok(())
                }
                DirEntryKind::File => self
                    .fs
                    .copy_file(from, to)
                    .await
                    .map_err(|e| Failure::from_io(from, &e)),
            }
        })
    }

    /// Recursively remove `path`. Symlinks are removed, not followed.
    fn remove_tree<'a>(&'a self, path: &'a Path) -> TreeFuture<'a> {
        Box::pin(async move {
            let meta = self
                .fs
                .lstat(path)
                .await
                .map_err(|e| Failure::from_io(path, &e))?;

            if meta.kind == DirEntryKind::Directory {
                let names = self
                    .fs
                    .list(path)
                    .await
                    .map_err(|e| Failure::from_io(path, &e))?;
                for name in names {
                    let child = path.join(&name);
                    self.remove_tree(&child).await?;
                }
            }
            self.fs
                .remove(path)
                .await
                .map_err(|e| Failure::from_io(path, &e))
        })
    }

    /// Validate `name` and join it onto `parent`.
    fn child(parent: &Path, name: &str) -> Result<PathBuf, Failure> {
        match path_util::validate_name(name) {
            Ok(()) => Ok(parent.join(name)),
            Err(problem) => Err(Failure::invalid_name(parent, problem.message())),
        }
    }

    /// Attribute a failure deep inside a tree to the top-level item.
    fn on_item(item: &Path, inner: Failure) -> Failure {
        if inner.path == item {
            return inner;
        }
        let message = inner.to_string();
        Failure::new(item, inner.kind, message)
    }

    fn log_item(op: &str, path: &Path, outcome: &Result<PathBuf, Failure>) {
        match outcome {
            Ok(dest) => {
                tracing::debug!(op, path = %path.display(), result = %dest.display(), "item done");
            }
            Err(failure) => {
                tracing::debug!(op, path = %path.display(), error = %failure, "item failed");
            }
        }
    }
}
