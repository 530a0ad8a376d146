//! Mounts backends at paths and routes operations to them.

use super::traits::{DirEntry, Filesystem};
use async_trait::async_trait;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

/// Description of one mount, for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountInfo {
    /// Absolute mount point.
    pub path: PathBuf,
    /// Host path backing the mount root, if the backend is real.
    pub real_root: Option<PathBuf>,
}

struct Mount {
    point: PathBuf,
    fs: Arc<dyn Filesystem>,
}

/// Routes paths to mounted backends.
///
/// The mount with the longest matching mount point wins. Each mount is a
/// separate volume: renames never cross mounts.
#[derive(Default)]
pub struct VfsRouter {
    mounts: Vec<Mount>,
}

impl std::fmt::Debug for VfsRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VfsRouter")
            .field("mounts", &self.mounts.iter().map(|m| &m.point).collect::<Vec<_>>())
            .finish()
    }
}

/// Lexically normalise to an absolute path.
fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::from("/");
    for component in path.components() {
        match component {
            Component::ParentDir => {
                result.pop();
            }
            Component::Normal(s) => result.push(s),
            Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
        }
    }
    result
}

impl VfsRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount a backend at `point`, replacing any existing mount there.
    pub fn mount(&mut self, point: impl AsRef<Path>, fs: impl Filesystem + 'static) {
        self.mount_arc(point, Arc::new(fs));
    }

    /// Mount an already shared backend.
    pub fn mount_arc(&mut self, point: impl AsRef<Path>, fs: Arc<dyn Filesystem>) {
        let point = normalize(point.as_ref());
        self.mounts.retain(|m| m.point != point);
        self.mounts.push(Mount { point, fs });
        // Longest first, so the first match is the most specific
        self.mounts
            .sort_by(|a, b| b.point.as_os_str().len().cmp(&a.point.as_os_str().len()));
    }

    /// All mounts, most specific first.
    pub fn mounts(&self) -> Vec<MountInfo> {
        self.mounts
            .iter()
            .map(|m| MountInfo {
                path: m.point.clone(),
                real_root: m.fs.real_path(Path::new("/")),
            })
            .collect()
    }

    /// Find the mount owning `path`. Returns its index and the path
    /// relative to the mount root (as an absolute backend path).
    fn route(&self, path: &Path) -> io::Result<(usize, PathBuf)> {
        let path = normalize(path);
        for (idx, mount) in self.mounts.iter().enumerate() {
            if let Ok(rest) = path.strip_prefix(&mount.point) {
                return Ok((idx, Path::new("/").join(rest)));
            }
        }
        Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("no mount for {}", path.display()),
        ))
    }

    fn backend(&self, path: &Path) -> io::Result<(&Arc<dyn Filesystem>, PathBuf)> {
        let (idx, rel) = self.route(path)?;
        Ok((&self.mounts[idx].fs, rel))
    }
}

#[async_trait]
impl Filesystem for VfsRouter {
    async fn list(&self, path: &Path) -> io::Result<Vec<String>> {
        let (fs, rel) = self.backend(path)?;
        let mut names = fs.list(&rel).await?;

        // Mount points directly under `path` show up as children
        let here = normalize(path);
        for mount in &self.mounts {
            if mount.point.parent() == Some(here.as_path()) {
                if let Some(name) = mount.point.file_name() {
                    let name = name.to_string_lossy().into_owned();
                    if !names.contains(&name) {
                        names.push(name);
                    }
                }
            }
        }
        Ok(names)
    }

    async fn stat(&self, path: &Path) -> io::Result<DirEntry> {
        let (fs, rel) = self.backend(path)?;
        fs.stat(&rel).await
    }

    async fn lstat(&self, path: &Path) -> io::Result<DirEntry> {
        let (fs, rel) = self.backend(path)?;
        fs.lstat(&rel).await
    }

    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let (fs, rel) = self.backend(path)?;
        fs.read(&rel).await
    }

    async fn write(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        let (fs, rel) = self.backend(path)?;
        fs.write(&rel, data).await
    }

    async fn create_file(&self, path: &Path) -> io::Result<()> {
        let (fs, rel) = self.backend(path)?;
        fs.create_file(&rel).await
    }

    async fn mkdir(&self, path: &Path) -> io::Result<()> {
        let (fs, rel) = self.backend(path)?;
        fs.mkdir(&rel).await
    }

    async fn remove(&self, path: &Path) -> io::Result<()> {
        let (idx, rel) = self.route(path)?;
        if rel == Path::new("/") {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{} is a mount point", self.mounts[idx].point.display()),
            ));
        }
        self.mounts[idx].fs.remove(&rel).await
    }

    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let (from_idx, from_rel) = self.route(from)?;
        let (to_idx, to_rel) = self.route(to)?;
        if from_idx != to_idx {
            return Err(io::Error::new(
                io::ErrorKind::CrossesDevices,
                format!(
                    "{} and {} are on different volumes",
                    from.display(),
                    to.display()
                ),
            ));
        }
        self.mounts[from_idx].fs.rename(&from_rel, &to_rel).await
    }

    async fn copy_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        let (from_idx, from_rel) = self.route(from)?;
        let (to_idx, to_rel) = self.route(to)?;
        let src = &self.mounts[from_idx].fs;
        let dst = &self.mounts[to_idx].fs;

        if from_idx == to_idx {
            return src.copy_file(&from_rel, &to_rel).await;
        }

        let meta = src.stat(&from_rel).await?;
        match (src.real_path(&from_rel), dst.real_path(&to_rel)) {
            (Some(real_from), Some(real_to)) => {
                tokio::fs::copy(&real_from, &real_to).await?;
            }
            _ => {
                let data = src.read(&from_rel).await?;
                dst.write(&to_rel, &data).await?;
            }
        }
        if let Some(modified) = meta.modified {
            // Explicitly ignored: timestamps are preserved where possible
            let _ = dst.set_modified(&to_rel, modified).await;
        }
        Ok(())
    }

    async fn set_modified(&self, path: &Path, modified: SystemTime) -> io::Result<()> {
        let (fs, rel) = self.backend(path)?;
        fs.set_modified(&rel, modified).await
    }

    async fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        let (fs, rel) = self.backend(path)?;
        fs.read_link(&rel).await
    }

    async fn symlink(&self, target: &Path, link: &Path) -> io::Result<()> {
        let (fs, rel) = self.backend(link)?;
        fs.symlink(target, &rel).await
    }

    fn real_path(&self, path: &Path) -> Option<PathBuf> {
        let (fs, rel) = self.backend(path).ok()?;
        fs.real_path(&rel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::MemoryFs;

    async fn two_volumes() -> VfsRouter {
        let root = MemoryFs::new();
        root.mkdir_all(Path::new("/a")).await.unwrap();
        root.write(Path::new("/a/f.txt"), b"payload").await.unwrap();

        let mut vfs = VfsRouter::new();
        vfs.mount("/", root);
        vfs.mount("/b", MemoryFs::new());
        vfs
    }

    #[tokio::test]
    async fn test_longest_mount_wins() {
        let vfs = two_volumes().await;
        vfs.write(Path::new("/b/x.txt"), b"x").await.unwrap();

        assert!(vfs.exists(Path::new("/b/x.txt")).await);
        assert!(vfs.exists(Path::new("/a/f.txt")).await);
        assert_eq!(vfs.mounts()[0].path, PathBuf::from("/b"));
    }

    #[tokio::test]
    async fn test_mount_points_listed_as_children() {
        let vfs = two_volumes().await;
        let names = vfs.list(Path::new("/")).await.unwrap();
        assert!(names.contains(&"a".to_string()));
        assert!(names.contains(&"b".to_string()));
        assert!(vfs.stat(Path::new("/b")).await.unwrap().is_dir());
    }

    #[tokio::test]
    async fn test_rename_across_mounts_is_cross_device() {
        let vfs = two_volumes().await;
        let err = vfs
            .rename(Path::new("/a/f.txt"), Path::new("/b/f.txt"))
            .await
            .unwrap_err();
        assert!(crate::vfs::is_cross_device(&err));
        assert!(vfs.exists(Path::new("/a/f.txt")).await);
    }

    #[tokio::test]
    async fn test_copy_file_across_mounts() {
        let vfs = two_volumes().await;
        vfs.copy_file(Path::new("/a/f.txt"), Path::new("/b/f.txt"))
            .await
            .unwrap();
        assert_eq!(vfs.read(Path::new("/b/f.txt")).await.unwrap(), b"payload");
    }

    #[tokio::test]
    async fn test_mount_point_cannot_be_removed() {
        let vfs = two_volumes().await;
        let err = vfs.remove(Path::new("/b")).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }

    #[tokio::test]
    async fn test_dotdot_does_not_escape_into_other_mount() {
        let vfs = two_volumes().await;
        vfs.write(Path::new("/b/../a/g.txt"), b"g").await.unwrap();
        assert!(vfs.exists(Path::new("/a/g.txt")).await);
        assert!(!vfs.exists(Path::new("/b/a/g.txt")).await);
    }
}
