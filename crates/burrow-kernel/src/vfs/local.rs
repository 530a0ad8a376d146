//! Local filesystem backend.
//!
//! Provides access to real filesystem paths, with optional read-only mode.

use super::traits::{DirEntry, DirEntryKind, Filesystem};
use async_trait::async_trait;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;

/// Local filesystem backend.
///
/// All operations are relative to `root`. With the default root of `/`
/// host paths are used unchanged; with root `/srv/share`, the VFS path
/// `/docs/a.txt` is the host path `/srv/share/docs/a.txt`.
#[derive(Debug, Clone)]
pub struct LocalFs {
    root: PathBuf,
    read_only: bool,
}

impl Default for LocalFs {
    fn default() -> Self {
        Self::new("/")
    }
}

impl LocalFs {
    /// Create a new local filesystem rooted at the given path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            read_only: false,
        }
    }

    /// Create a read-only local filesystem.
    pub fn read_only(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            read_only: true,
        }
    }

    /// Map a VFS path onto the host, without following symlinks.
    ///
    /// `.` and `..` are resolved lexically; a path that climbs above the
    /// root is rejected.
    fn resolve(&self, path: &Path) -> io::Result<PathBuf> {
        let mut normalized = PathBuf::new();
        for component in path.components() {
            match component {
                Component::ParentDir => {
                    if !normalized.pop() {
                        return Err(io::Error::new(
                            io::ErrorKind::PermissionDenied,
                            format!("path escapes root: {}", path.display()),
                        ));
                    }
                }
                Component::Normal(c) => normalized.push(c),
                Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            }
        }
        Ok(self.root.join(normalized))
    }

    /// Map a host link target back into VFS terms.
    ///
    /// Absolute targets under the root lose the root prefix so that
    /// `symlink` can re-root them. Relative targets and targets outside
    /// the root are returned unchanged.
    fn unresolve_target(&self, target: PathBuf) -> PathBuf {
        if !target.is_absolute() {
            return target;
        }
        match target.strip_prefix(&self.root) {
            Ok(rest) => Path::new("/").join(rest),
            Err(_) => target,
        }
    }

    /// Check if write operations are allowed.
    fn check_writable(&self) -> io::Result<()> {
        if self.read_only {
            Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "filesystem is read-only",
            ))
        } else {
            Ok(())
        }
    }

    fn entry_name(path: &Path) -> String {
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "/".to_string())
    }
}

#[async_trait]
impl Filesystem for LocalFs {
    async fn list(&self, path: &Path) -> io::Result<Vec<String>> {
        let full_path = self.resolve(path)?;
        let mut names = Vec::new();
        let mut dir = fs::read_dir(&full_path).await?;
        while let Some(entry) = dir.next_entry().await? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    async fn stat(&self, path: &Path) -> io::Result<DirEntry> {
        let full_path = self.resolve(path)?;
        // stat follows symlinks
        let meta = fs::metadata(&full_path).await?;

        // Special files (sockets, pipes, devices) are reported as File.
        let kind = if meta.is_dir() {
            DirEntryKind::Directory
        } else {
            DirEntryKind::File
        };

        Ok(DirEntry {
            name: Self::entry_name(path),
            kind,
            size: if meta.is_dir() { 0 } else { meta.len() },
            modified: meta.modified().ok(),
            symlink_target: None,
        })
    }

    async fn lstat(&self, path: &Path) -> io::Result<DirEntry> {
        let full_path = self.resolve(path)?;
        let meta = fs::symlink_metadata(&full_path).await?;

        let file_type = meta.file_type();
        let kind = if file_type.is_symlink() {
            DirEntryKind::Symlink
        } else if meta.is_dir() {
            DirEntryKind::Directory
        } else {
            DirEntryKind::File
        };

        let symlink_target = if file_type.is_symlink() {
            fs::read_link(&full_path)
                .await
                .ok()
                .map(|t| self.unresolve_target(t))
        } else {
            None
        };

        Ok(DirEntry {
            name: Self::entry_name(path),
            kind,
            size: if kind == DirEntryKind::Directory { 0 } else { meta.len() },
            modified: meta.modified().ok(),
            symlink_target,
        })
    }

    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let full_path = self.resolve(path)?;
        fs::read(&full_path).await
    }

    async fn write(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        self.check_writable()?;
        let full_path = self.resolve(path)?;
        fs::write(&full_path, data).await
    }

    async fn create_file(&self, path: &Path) -> io::Result<()> {
        self.check_writable()?;
        let full_path = self.resolve(path)?;
        fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&full_path)
            .await?;
        Ok(())
    }

    async fn mkdir(&self, path: &Path) -> io::Result<()> {
        self.check_writable()?;
        let full_path = self.resolve(path)?;
        fs::create_dir(&full_path).await
    }

    async fn remove(&self, path: &Path) -> io::Result<()> {
        self.check_writable()?;
        let full_path = self.resolve(path)?;
        // symlink_metadata: a link to a directory is removed as a file
        let meta = fs::symlink_metadata(&full_path).await?;

        if meta.is_dir() {
            fs::remove_dir(&full_path).await
        } else {
            fs::remove_file(&full_path).await
        }
    }

    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        self.check_writable()?;
        let from_path = self.resolve(from)?;
        let to_path = self.resolve(to)?;
        fs::rename(&from_path, &to_path).await
    }

    async fn copy_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        self.check_writable()?;
        let from_path = self.resolve(from)?;
        let to_path = self.resolve(to)?;
        fs::copy(&from_path, &to_path).await?;
        if let Ok(modified) = fs::metadata(&from_path).await.and_then(|m| m.modified()) {
            // Explicitly ignored: timestamps are preserved where possible
            let _ = self.set_modified(to, modified).await;
        }
        Ok(())
    }

    async fn set_modified(&self, path: &Path, modified: SystemTime) -> io::Result<()> {
        self.check_writable()?;
        let full_path = self.resolve(path)?;
        tokio::task::spawn_blocking(move || {
            let file = std::fs::File::open(&full_path)?;
            file.set_modified(modified)
        })
        .await
        .map_err(io::Error::other)?
    }

    async fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        let full_path = self.resolve(path)?;
        let target = fs::read_link(&full_path).await?;
        Ok(self.unresolve_target(target))
    }

    async fn symlink(&self, target: &Path, link: &Path) -> io::Result<()> {
        self.check_writable()?;

        // Absolute targets are VFS paths too; relative ones are stored as-is
        let target = if target.is_absolute() {
            self.resolve(target)?
        } else {
            target.to_path_buf()
        };
        let link_path = self.resolve(link)?;

        #[cfg(unix)]
        {
            fs::symlink(&target, &link_path).await
        }
        #[cfg(windows)]
        {
            fs::symlink_file(&target, &link_path).await
        }
    }

    fn real_path(&self, path: &Path) -> Option<PathBuf> {
        self.resolve(path).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn setup() -> (LocalFs, TempDir) {
        let dir = TempDir::new().unwrap();
        (LocalFs::new(dir.path()), dir)
    }

    #[tokio::test]
    async fn test_write_and_read() {
        let (fs, _dir) = setup();

        fs.write(Path::new("/test.txt"), b"hello").await.unwrap();
        let data = fs.read(Path::new("/test.txt")).await.unwrap();
        assert_eq!(data, b"hello");
    }

    #[tokio::test]
    async fn test_read_only() {
        let (_, dir) = setup();
        let fs = LocalFs::read_only(dir.path());

        let result = fs.write(Path::new("/test.txt"), b"data").await;
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::PermissionDenied);
    }

    #[tokio::test]
    async fn test_list_returns_names() {
        let (fs, _dir) = setup();

        fs.write(Path::new("/a.txt"), b"a").await.unwrap();
        fs.mkdir(Path::new("/subdir")).await.unwrap();

        let mut names = fs.list(Path::new("/")).await.unwrap();
        names.sort();
        assert_eq!(names, vec!["a.txt".to_string(), "subdir".to_string()]);
    }

    #[tokio::test]
    async fn test_stat_reports_zero_size_for_dirs() {
        let (fs, _dir) = setup();

        fs.write(Path::new("/file.txt"), b"content").await.unwrap();
        fs.mkdir(Path::new("/dir")).await.unwrap();

        let file = fs.stat(Path::new("/file.txt")).await.unwrap();
        assert!(file.is_file());
        assert_eq!(file.size, 7);

        let dir = fs.stat(Path::new("/dir")).await.unwrap();
        assert!(dir.is_dir());
        assert_eq!(dir.size, 0);
    }

    #[tokio::test]
    async fn test_create_file_refuses_existing() {
        let (fs, _dir) = setup();

        fs.create_file(Path::new("/new.txt")).await.unwrap();
        let err = fs.create_file(Path::new("/new.txt")).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
    }

    #[tokio::test]
    async fn test_remove_non_empty_dir_fails() {
        let (fs, _dir) = setup();

        fs.mkdir(Path::new("/full")).await.unwrap();
        fs.write(Path::new("/full/f"), b"x").await.unwrap();
        assert!(fs.remove(Path::new("/full")).await.is_err());
        assert!(fs.exists(Path::new("/full")).await);
    }

    #[tokio::test]
    async fn test_copy_file_keeps_mtime() {
        let (fs, _dir) = setup();

        fs.write(Path::new("/src.txt"), b"payload").await.unwrap();
        let past = SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_000_000_000);
        fs.set_modified(Path::new("/src.txt"), past).await.unwrap();

        fs.copy_file(Path::new("/src.txt"), Path::new("/dst.txt"))
            .await
            .unwrap();
        let copied = fs.stat(Path::new("/dst.txt")).await.unwrap();
        assert_eq!(copied.modified, Some(past));
        assert_eq!(fs.read(Path::new("/dst.txt")).await.unwrap(), b"payload");
    }

    #[tokio::test]
    async fn test_path_escape_blocked() {
        let (fs, _dir) = setup();

        let result = fs.read(Path::new("/../../../etc/passwd")).await;
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::PermissionDenied);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_lstat_sees_symlink() {
        let (fs, _dir) = setup();

        fs.write(Path::new("/target.txt"), b"content").await.unwrap();
        fs.symlink(Path::new("target.txt"), Path::new("/link.txt"))
            .await
            .unwrap();

        let entry = fs.lstat(Path::new("/link.txt")).await.unwrap();
        assert!(entry.is_symlink());
        assert_eq!(entry.symlink_target, Some(PathBuf::from("target.txt")));

        let followed = fs.stat(Path::new("/link.txt")).await.unwrap();
        assert!(followed.is_file());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_absolute_link_target_is_a_vfs_path() {
        let (fs, dir) = setup();

        fs.write(Path::new("/target.txt"), b"content").await.unwrap();
        fs.symlink(Path::new("/target.txt"), Path::new("/link"))
            .await
            .unwrap();

        let host_target = std::fs::read_link(dir.path().join("link")).unwrap();
        assert_eq!(host_target, dir.path().join("target.txt"));
        assert_eq!(
            fs.read_link(Path::new("/link")).await.unwrap(),
            PathBuf::from("/target.txt")
        );
        let entry = fs.lstat(Path::new("/link")).await.unwrap();
        assert_eq!(entry.symlink_target, Some(PathBuf::from("/target.txt")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_copied_absolute_link_still_resolves() {
        let (fs, _dir) = setup();
        let fs = Arc::new(fs);
        let exec = crate::executor::Executor::new(fs.clone());

        fs.write(Path::new("/target.txt"), b"content").await.unwrap();
        fs.mkdir(Path::new("/src")).await.unwrap();
        fs.mkdir(Path::new("/dst")).await.unwrap();
        fs.symlink(Path::new("/target.txt"), Path::new("/src/link"))
            .await
            .unwrap();

        let result = exec
            .copy(&[PathBuf::from("/src/link")], Path::new("/dst"))
            .await;
        assert!(result.ok(), "{result:?}");
        assert_eq!(
            fs.read_link(Path::new("/dst/link")).await.unwrap(),
            PathBuf::from("/target.txt")
        );
        assert_eq!(fs.read(Path::new("/dst/link")).await.unwrap(), b"content");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_dangling_symlink_exists_but_does_not_stat() {
        let (fs, _dir) = setup();

        fs.symlink(Path::new("nowhere"), Path::new("/broken"))
            .await
            .unwrap();
        assert!(fs.exists(Path::new("/broken")).await);
        assert!(fs.stat(Path::new("/broken")).await.is_err());
    }
}
