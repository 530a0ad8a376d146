//! Lists one directory into a sorted [`Snapshot`].

use std::path::Path;
use std::sync::Arc;

use burrow_types::{Entry, ErrorKind, Failure, Snapshot};

use crate::vfs::{DirEntryKind, Filesystem};

/// Produces snapshots of single directories.
///
/// The directory itself is a precondition: if it cannot be opened the
/// listing fails. Its children are best-effort: a child that cannot be
/// stat'ed (a dangling link, a permission race) is left out.
#[derive(Clone)]
pub struct DirectoryLister {
    fs: Arc<dyn Filesystem>,
}

impl DirectoryLister {
    pub fn new(fs: Arc<dyn Filesystem>) -> Self {
        Self { fs }
    }

    /// List the direct children of `path`.
    pub async fn list(&self, path: &Path) -> Result<Snapshot, Failure> {
        let meta = self
            .fs
            .stat(path)
            .await
            .map_err(|e| Failure::from_io(path, &e))?;
        if meta.kind != DirEntryKind::Directory {
            return Err(Failure::new(path, ErrorKind::NotFound, "not a directory"));
        }

        let names = self
            .fs
            .list(path)
            .await
            .map_err(|e| Failure::from_io(path, &e))?;

        let mut entries = Vec::with_capacity(names.len());
        for name in names {
            let child = path.join(&name);
            match self.fs.stat(&child).await {
                Ok(meta) => {
                    let entry = if meta.is_dir() {
                        Entry::directory(name, child)
                    } else {
                        Entry::file(name, child, meta.size)
                    };
                    entries.push(entry.with_modified(meta.modified));
                }
                Err(e) => {
                    tracing::debug!(path = %child.display(), error = %e, "skipping unreadable entry");
                }
            }
        }

        Ok(Snapshot::new(path, entries))
    }

    /// Metadata for a single path, as an [`Entry`].
    pub async fn entry(&self, path: &Path) -> Result<Entry, Failure> {
        let meta = self
            .fs
            .stat(path)
            .await
            .map_err(|e| Failure::from_io(path, &e))?;
        let name = crate::path_util::file_name(path).unwrap_or_else(|| meta.name.clone());
        let entry = if meta.is_dir() {
            Entry::directory(name, path)
        } else {
            Entry::file(name, path, meta.size)
        };
        Ok(entry.with_modified(meta.modified))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::MemoryFs;
    use std::path::PathBuf;

    fn lister_with(fs: MemoryFs) -> DirectoryLister {
        DirectoryLister::new(Arc::new(fs))
    }

    #[tokio::test]
    async fn test_lists_dirs_first() {
        let fs = MemoryFs::new();
        fs.mkdir_all(Path::new("/tmp/x/y")).await.unwrap();
        fs.write(Path::new("/tmp/x/b.txt"), b"0123456789").await.unwrap();
        let lister = lister_with(fs);

        let snap = lister.list(Path::new("/tmp/x")).await.unwrap();
        let entries = snap.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "y");
        assert!(entries[0].is_dir);
        assert_eq!(entries[0].size, 0);
        assert_eq!(entries[1].name, "b.txt");
        assert!(!entries[1].is_dir);
        assert_eq!(entries[1].size, 10);
        assert_eq!(entries[1].path, Path::new("/tmp/x/b.txt"));
    }

    #[tokio::test]
    async fn test_is_not_recursive() {
        let fs = MemoryFs::new();
        fs.mkdir_all(Path::new("/d/sub/deeper")).await.unwrap();
        fs.write(Path::new("/d/sub/inner.txt"), b"x").await.unwrap();
        let lister = lister_with(fs);

        let snap = lister.list(Path::new("/d")).await.unwrap();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap.entries()[0].name, "sub");
    }

    #[tokio::test]
    async fn test_missing_directory_is_not_found() {
        let lister = lister_with(MemoryFs::new());
        let err = lister.list(Path::new("/nope")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_file_is_not_listable() {
        let fs = MemoryFs::new();
        fs.write(Path::new("/f.txt"), b"x").await.unwrap();
        let lister = lister_with(fs);

        let err = lister.list(Path::new("/f.txt")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(err.message, "not a directory");
    }

    /// A backend whose one directory stats fine but cannot be opened.
    struct Unreadable {
        inner: MemoryFs,
        locked: &'static str,
    }

    #[async_trait::async_trait]
    impl Filesystem for Unreadable {
        async fn list(&self, path: &Path) -> std::io::Result<Vec<String>> {
            if path == Path::new(self.locked) {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "permission denied",
                ));
            }
            self.inner.list(path).await
        }
        async fn stat(&self, path: &Path) -> std::io::Result<crate::vfs::DirEntry> {
            self.inner.stat(path).await
        }
        async fn read(&self, path: &Path) -> std::io::Result<Vec<u8>> {
            self.inner.read(path).await
        }
        async fn write(&self, path: &Path, data: &[u8]) -> std::io::Result<()> {
            self.inner.write(path, data).await
        }
        async fn mkdir(&self, path: &Path) -> std::io::Result<()> {
            self.inner.mkdir(path).await
        }
        async fn remove(&self, path: &Path) -> std::io::Result<()> {
            self.inner.remove(path).await
        }
        async fn rename(&self, from: &Path, to: &Path) -> std::io::Result<()> {
            self.inner.rename(from, to).await
        }
    }

    #[tokio::test]
    async fn test_unopenable_directory_is_access_denied() {
        let inner = MemoryFs::new();
        inner.mkdir_all(Path::new("/private")).await.unwrap();
        inner.write(Path::new("/private/secret"), b"x").await.unwrap();
        let lister = DirectoryLister::new(Arc::new(Unreadable {
            inner,
            locked: "/private",
        }));

        let err = lister.list(Path::new("/private")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::AccessDenied);
        assert_eq!(err.path, PathBuf::from("/private"));
        // Other directories are unaffected
        assert_eq!(lister.list(Path::new("/")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_entry_for_single_path() {
        let fs = MemoryFs::new();
        fs.write(Path::new("/f.txt"), b"abc").await.unwrap();
        let lister = lister_with(fs);

        let entry = lister.entry(Path::new("/f.txt")).await.unwrap();
        assert_eq!(entry.name, "f.txt");
        assert_eq!(entry.size, 3);
        assert!(entry.modified.is_some());
    }
}
