//! In-memory filesystem implementation.
//!
//! Used for tests and scratch mounts. All data is ephemeral.

use super::traits::{DirEntry, DirEntryKind, Filesystem};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;
use tokio::sync::RwLock;

/// Entry in the memory filesystem.
#[derive(Debug, Clone)]
enum Node {
    File { data: Vec<u8>, modified: SystemTime },
    Directory { modified: SystemTime },
}

impl Node {
    fn is_dir(&self) -> bool {
        matches!(self, Node::Directory { .. })
    }
}

/// In-memory filesystem.
///
/// Thread-safe via internal `RwLock`. Children enumerate in name order,
/// which keeps listings deterministic in tests.
#[derive(Debug)]
pub struct MemoryFs {
    nodes: RwLock<BTreeMap<PathBuf, Node>>,
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFs {
    /// Create a new empty in-memory filesystem.
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        // Root directory always exists
        nodes.insert(
            PathBuf::new(),
            Node::Directory {
                modified: SystemTime::now(),
            },
        );
        Self {
            nodes: RwLock::new(nodes),
        }
    }

    /// Normalize a path: remove leading `/`, resolve `.` and `..`.
    fn normalize(path: &Path) -> PathBuf {
        let mut result = PathBuf::new();
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

    fn not_found(path: &Path) -> io::Error {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("{}: not found", path.display()),
        )
    }

    fn name_of(path: &Path) -> String {
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "/".to_string())
    }

    /// Fail unless the parent of `key` is an existing directory.
    fn check_parent(nodes: &BTreeMap<PathBuf, Node>, key: &Path, path: &Path) -> io::Result<()> {
        let parent = key.parent().unwrap_or(Path::new(""));
        match nodes.get(parent) {
            Some(node) if node.is_dir() => Ok(()),
            Some(_) => Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("{}: parent is not a directory", path.display()),
            )),
            None => Err(Self::not_found(path)),
        }
    }

    /// Create a directory and any missing parents. Test fixture helper.
    pub async fn mkdir_all(&self, path: &Path) -> io::Result<()> {
        let key = Self::normalize(path);
        let mut nodes = self.nodes.write().await;
        let mut current = PathBuf::new();
        for component in key.components() {
            current.push(component);
            match nodes.get(&current) {
                Some(node) if node.is_dir() => {}
                Some(_) => {
                    return Err(io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        format!("{}: is a file", current.display()),
                    ));
                }
                None => {
                    nodes.insert(
                        current.clone(),
                        Node::Directory {
                            modified: SystemTime::now(),
                        },
                    );
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Filesystem for MemoryFs {
    async fn list(&self, path: &Path) -> io::Result<Vec<String>> {
        let key = Self::normalize(path);
        let nodes = self.nodes.read().await;

        match nodes.get(&key) {
            Some(node) if node.is_dir() => {}
            Some(_) => {
                return Err(io::Error::new(
                    io::ErrorKind::NotADirectory,
                    format!("{}: not a directory", path.display()),
                ));
            }
            None => return Err(Self::not_found(path)),
        }

        Ok(nodes
            .keys()
            .filter(|k| !k.as_os_str().is_empty() && k.parent() == Some(key.as_path()))
            .map(|k| Self::name_of(k))
            .collect())
    }

    async fn stat(&self, path: &Path) -> io::Result<DirEntry> {
        let key = Self::normalize(path);
        let nodes = self.nodes.read().await;
        let node = nodes.get(&key).ok_or_else(|| Self::not_found(path))?;

        Ok(match node {
            Node::File { data, modified } => DirEntry {
                name: Self::name_of(&key),
                kind: DirEntryKind::File,
                size: data.len() as u64,
                modified: Some(*modified),
                symlink_target: None,
            },
            Node::Directory { modified } => DirEntry {
                name: Self::name_of(&key),
                kind: DirEntryKind::Directory,
                size: 0,
                modified: Some(*modified),
                symlink_target: None,
            },
        })
    }

    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let key = Self::normalize(path);
        let nodes = self.nodes.read().await;
        match nodes.get(&key) {
            Some(Node::File { data, .. }) => Ok(data.clone()),
            Some(Node::Directory { .. }) => Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("{}: is a directory", path.display()),
            )),
            None => Err(Self::not_found(path)),
        }
    }

    async fn write(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        let key = Self::normalize(path);
        let mut nodes = self.nodes.write().await;
        Self::check_parent(&nodes, &key, path)?;
        if nodes.get(&key).is_some_and(Node::is_dir) {
            return Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("{}: is a directory", path.display()),
            ));
        }
        nodes.insert(
            key,
            Node::File {
                data: data.to_vec(),
                modified: SystemTime::now(),
            },
        );
        Ok(())
    }

    async fn mkdir(&self, path: &Path) -> io::Result<()> {
        let key = Self::normalize(path);
        let mut nodes = self.nodes.write().await;
        if nodes.contains_key(&key) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{}: already exists", path.display()),
            ));
        }
        Self::check_parent(&nodes, &key, path)?;
        nodes.insert(
            key,
            Node::Directory {
                modified: SystemTime::now(),
            },
        );
        Ok(())
    }

    async fn remove(&self, path: &Path) -> io::Result<()> {
        let key = Self::normalize(path);
        let mut nodes = self.nodes.write().await;

        let node = nodes.get(&key).ok_or_else(|| Self::not_found(path))?;
        if key.as_os_str().is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "cannot remove root",
            ));
        }
        if node.is_dir() && nodes.keys().any(|k| k != &key && k.starts_with(&key)) {
            return Err(io::Error::new(
                io::ErrorKind::DirectoryNotEmpty,
                format!("{}: directory not empty", path.display()),
            ));
        }
        nodes.remove(&key);
        Ok(())
    }

    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let from_key = Self::normalize(from);
        let to_key = Self::normalize(to);
        let mut nodes = self.nodes.write().await;

        if !nodes.contains_key(&from_key) {
            return Err(Self::not_found(from));
        }
        if nodes.contains_key(&to_key) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{}: already exists", to.display()),
            ));
        }
        if to_key.starts_with(&from_key) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "cannot move a directory into itself",
            ));
        }
        Self::check_parent(&nodes, &to_key, to)?;

        let moved: Vec<PathBuf> = nodes
            .keys()
            .filter(|k| k.starts_with(&from_key))
            .cloned()
            .collect();
        for old in moved {
            if let Some(node) = nodes.remove(&old) {
                let suffix = old.strip_prefix(&from_key).unwrap_or(Path::new(""));
                let new = if suffix.as_os_str().is_empty() {
                    to_key.clone()
                } else {
                    to_key.join(suffix)
                };
                nodes.insert(new, node);
            }
        }
        Ok(())
    }

    async fn set_modified(&self, path: &Path, modified: SystemTime) -> io::Result<()> {
        let key = Self::normalize(path);
        let mut nodes = self.nodes.write().await;
        match nodes.get_mut(&key) {
            Some(Node::File { modified: m, .. }) | Some(Node::Directory { modified: m }) => {
                *m = modified;
                Ok(())
            }
            None => Err(Self::not_found(path)),
        }
    }
}
