//! Staged copy/cut sets and destination naming.

use std::path::{Path, PathBuf};

use burrow_types::{ClipboardMode, Failure, OperationResult};

use crate::path_util;
use crate::vfs::Filesystem;

/// Pending copy or cut set.
///
/// Every [`stage`](Self::stage) bumps a generation counter. A paste
/// remembers the generation it was dispatched with, so a completion that
/// arrives after the user staged something else leaves the new set alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Clipboard {
    items: Vec<PathBuf>,
    mode: ClipboardMode,
    generation: u64,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the staged set. Last stage wins; nothing is merged.
    pub fn stage(&mut self, paths: impl IntoIterator<Item = PathBuf>, mode: ClipboardMode) {
        let mut items: Vec<PathBuf> = Vec::new();
        for path in paths {
            if !items.contains(&path) {
                items.push(path);
            }
        }
        self.mode = if items.is_empty() { ClipboardMode::None } else { mode };
        self.items = items;
        self.generation += 1;
    }

    pub fn items(&self) -> &[PathBuf] {
        &self.items
    }

    pub fn mode(&self) -> ClipboardMode {
        self.mode
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty() || self.mode == ClipboardMode::None
    }

    /// Reset to empty. Used after a cut has been pasted.
    pub fn clear(&mut self) {
        self.items.clear();
        self.mode = ClipboardMode::None;
    }

    /// Empty the clipboard if it holds a cut set. A copy set persists so it
    /// can be pasted again.
    pub fn clear_if_cut(&mut self) {
        if self.mode == ClipboardMode::Cut {
            self.clear();
        }
    }

    /// Apply the outcome of a paste dispatched with `generation`.
    ///
    /// A fully successful cut empties the clipboard. A cut with failures
    /// keeps only the sources that failed, still staged as cut.
    pub fn settle_paste(&mut self, generation: u64, result: &OperationResult) {
        if generation != self.generation || self.mode != ClipboardMode::Cut {
            return;
        }
        if result.ok() {
            self.clear_if_cut();
            return;
        }
        self.items
            .retain(|item| result.failures.iter().any(|f| &f.path == item));
        if self.items.is_empty() {
            self.clear();
        }
    }

    /// First free name for `source` inside `destination_dir`.
    ///
    /// `dir/name.ext` if nothing is there, otherwise `dir/name (1).ext`,
    /// `dir/name (2).ext`, ... The counter starts at 1 on every call.
    pub async fn resolve_destination(
        fs: &dyn Filesystem,
        source: &Path,
        destination_dir: &Path,
    ) -> Result<PathBuf, Failure> {
        let name = path_util::file_name(source)
            .ok_or_else(|| Failure::invalid_name(source, "source has no file name"))?;

        let candidate = destination_dir.join(&name);
        if !fs.exists(&candidate).await {
            return Ok(candidate);
        }

        let mut counter: u64 = 1;
        loop {
            let candidate = destination_dir.join(path_util::numbered_name(&name, counter));
            if !fs.exists(&candidate).await {
                return Ok(candidate);
            }
            counter += 1;
        }
    }
}
