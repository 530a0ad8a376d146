//! Core VFS traits and types.

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Kind of directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirEntryKind {
    File,
    Directory,
    Symlink,
}

/// Metadata for one path, as reported by a backend.
#[derive(Debug, Clone)]
pub struct DirEntry {
    /// Name of the entry (not full path).
    pub name: String,
    /// Kind of entry.
    pub kind: DirEntryKind,
    /// Size in bytes (0 for directories).
    pub size: u64,
    /// Last modification time, if available.
    pub modified: Option<SystemTime>,
    /// For symlinks, the target path.
    pub symlink_target: Option<PathBuf>,
}

impl DirEntry {
    /// Create a new directory entry.
    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: DirEntryKind::Directory,
            size: 0,
            modified: None,
            symlink_target: None,
        }
    }

    /// Create a new file entry.
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            kind: DirEntryKind::File,
            size,
            modified: None,
            symlink_target: None,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == DirEntryKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == DirEntryKind::File
    }

    pub fn is_symlink(&self) -> bool {
        self.kind == DirEntryKind::Symlink
    }
}

/// True if `err` is the error a rename returns when its endpoints live on
/// different volumes.
pub fn is_cross_device(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::CrossesDevices
}

/// Abstract filesystem interface.
///
/// Paths are absolute from the backend's point of view. A `LocalFs` rooted
/// at `/` sees host paths unchanged.
#[async_trait]
pub trait Filesystem: Send + Sync {
    /// Names of the direct children of a directory, in enumeration order.
    async fn list(&self, path: &Path) -> io::Result<Vec<String>>;

    /// Get metadata for a path, following symlinks.
    async fn stat(&self, path: &Path) -> io::Result<DirEntry>;

    /// Get metadata for a path without following symlinks.
    async fn lstat(&self, path: &Path) -> io::Result<DirEntry> {
        self.stat(path).await
    }

    /// Read the entire contents of a file.
    async fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Write data to a file, creating or truncating it.
    async fn write(&self, path: &Path, data: &[u8]) -> io::Result<()>;

    /// Create an empty file. Fails with `AlreadyExists` if anything is
    /// already at `path`.
    async fn create_file(&self, path: &Path) -> io::Result<()> {
        if self.exists(path).await {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", path.display()),
            ));
        }
        self.write(path, &[]).await
    }

    /// Create a single directory. The parent must exist.
    async fn mkdir(&self, path: &Path) -> io::Result<()>;

    /// Remove a file, a symlink or an empty directory.
    async fn remove(&self, path: &Path) -> io::Result<()>;

    /// Rename (move) a file or directory within this filesystem.
    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Copy one regular file, keeping its modification time where the
    /// backend can store one.
    async fn copy_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        let meta = self.stat(from).await?;
        let data = self.read(from).await?;
        self.write(to, &data).await?;
        if let Some(modified) = meta.modified {
            // Explicitly ignored: timestamps are preserved where possible
            let _ = self.set_modified(to, modified).await;
        }
        Ok(())
    }

    /// Set the modification time of a path.
    async fn set_modified(&self, path: &Path, modified: SystemTime) -> io::Result<()> {
        let _ = (path, modified);
        Ok(())
    }

    /// Read the target of a symbolic link without following it.
    async fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        let _ = path;
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "symlinks not supported by this filesystem",
        ))
    }

    /// Create a symbolic link at `link` pointing to `target`.
    async fn symlink(&self, target: &Path, link: &Path) -> io::Result<()> {
        let _ = (target, link);
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "symlinks not supported by this filesystem",
        ))
    }

    /// Check if anything (including a dangling symlink) occupies a path.
    async fn exists(&self, path: &Path) -> bool {
        self.lstat(path).await.is_ok()
    }

    /// Get the real host path for a VFS path.
    ///
    /// Returns `Some(path)` for backends backed by the real filesystem, or
    /// `None` for virtual backends like `MemoryFs`.
    fn real_path(&self, path: &Path) -> Option<PathBuf> {
        let _ = path;
        None
    }
}
