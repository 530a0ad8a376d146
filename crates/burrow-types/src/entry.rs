//! Directory entries and listing snapshots.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// One child of a listed directory.
///
/// Entries are value objects: they are produced by a listing and never
/// updated afterwards. A new listing produces new entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// File name (last path component).
    pub name: String,
    /// Absolute path of the entry.
    pub path: PathBuf,
    /// True for directories (and symlinks that resolve to directories).
    pub is_dir: bool,
    /// Size in bytes, always 0 for directories.
    pub size: u64,
    /// Last modification time, if the platform reports one.
    pub modified: Option<SystemTime>,
}

impl Entry {
    /// Build a directory entry.
    pub fn directory(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            is_dir: true,
            size: 0,
            modified: None,
        }
    }

    /// Build a file entry.
    pub fn file(name: impl Into<String>, path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            is_dir: false,
            size,
            modified: None,
        }
    }

    /// Attach a modification time.
    pub fn with_modified(mut self, modified: Option<SystemTime>) -> Self {
        self.modified = modified;
        self
    }
}

/// Column a snapshot can be re-sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Name,
    Size,
    Modified,
}

impl std::str::FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(SortKey::Name),
            "size" => Ok(SortKey::Size),
            "modified" | "mtime" => Ok(SortKey::Modified),
            other => Err(format!("unknown sort key: {other}")),
        }
    }
}

/// The full listing of one directory at one instant.
///
/// Canonical order: directories before files, then case-insensitive name
/// ascending. Ties keep their enumeration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    directory: PathBuf,
    entries: Vec<Entry>,
}

impl Snapshot {
    /// Build a snapshot from entries in enumeration order.
    pub fn new(directory: impl Into<PathBuf>, mut entries: Vec<Entry>) -> Self {
        entries.sort_by_cached_key(|e| (!e.is_dir, e.name.to_lowercase()));
        Self {
            directory: directory.into(),
            entries,
        }
    }

    /// Directory this snapshot lists.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find an entry by exact name.
    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Number of (files, folders), for a status line.
    pub fn counts(&self) -> (usize, usize) {
        let folders = self.entries.iter().filter(|e| e.is_dir).count();
        (self.entries.len() - folders, folders)
    }

    /// A copy of this snapshot ordered by a single column.
    ///
    /// The sort is stable, so entries that compare equal keep their
    /// canonical relative order. Name comparison is case-insensitive.
    pub fn sorted_by(&self, key: SortKey, reverse: bool) -> Snapshot {
        let mut entries = self.entries.clone();
        let compare = |a: &Entry, b: &Entry| match key {
            SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            SortKey::Size => a.size.cmp(&b.size),
            SortKey::Modified => a.modified.cmp(&b.modified),
        };
        // Reverse the comparator, not the result, so ties stay put
        if reverse {
            entries.sort_by(|a, b| compare(b, a));
        } else {
            entries.sort_by(compare);
        }
        Snapshot {
            directory: self.directory.clone(),
            entries,
        }
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn names(snapshot: &Snapshot) -> Vec<&str> {
        snapshot.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn directories_sort_before_files() {
        let snap = Snapshot::new(
            "/tmp/x",
            vec![
                Entry::file("b.txt", "/tmp/x/b.txt", 10),
                Entry::directory("y", "/tmp/x/y"),
            ],
        );
        assert_eq!(names(&snap), vec!["y", "b.txt"]);
    }

    #[test]
    fn names_sort_case_insensitively() {
        let snap = Snapshot::new(
            "/d",
            vec![
                Entry::file("beta", "/d/beta", 1),
                Entry::file("Alpha", "/d/Alpha", 1),
                Entry::file("gamma", "/d/gamma", 1),
                Entry::directory("Zed", "/d/Zed"),
                Entry::directory("apple", "/d/apple"),
            ],
        );
        assert_eq!(names(&snap), vec!["apple", "Zed", "Alpha", "beta", "gamma"]);
    }

    #[test]
    fn case_folded_ties_keep_enumeration_order() {
        let snap = Snapshot::new(
            "/d",
            vec![
                Entry::file("README", "/d/README", 1),
                Entry::file("readme", "/d/readme", 2),
                Entry::file("ReadMe", "/d/ReadMe", 3),
            ],
        );
        assert_eq!(names(&snap), vec!["README", "readme", "ReadMe"]);
    }

    #[test]
    fn counts_split_files_and_folders() {
        let snap = Snapshot::new(
            "/d",
            vec![
                Entry::file("a", "/d/a", 1),
                Entry::file("b", "/d/b", 1),
                Entry::directory("c", "/d/c"),
            ],
        );
        assert_eq!(snap.counts(), (2, 1));
    }

    #[test]
    fn sorted_by_size_is_a_new_snapshot() {
        let snap = Snapshot::new(
            "/d",
            vec![
                Entry::file("big", "/d/big", 900),
                Entry::file("small", "/d/small", 3),
                Entry::directory("dir", "/d/dir"),
            ],
        );
        let by_size = snap.sorted_by(SortKey::Size, false);
        assert_eq!(names(&by_size), vec!["dir", "small", "big"]);
        let desc = snap.sorted_by(SortKey::Size, true);
        assert_eq!(names(&desc), vec!["big", "small", "dir"]);
        // Original untouched
        assert_eq!(names(&snap), vec!["dir", "big", "small"]);
    }

    #[test]
    fn descending_sort_keeps_ties_in_canonical_order() {
        let snap = Snapshot::new(
            "/d",
            vec![
                Entry::file("a", "/d/a", 5),
                Entry::file("b", "/d/b", 5),
                Entry::file("c", "/d/c", 1),
            ],
        );
        assert_eq!(names(&snap.sorted_by(SortKey::Size, true)), vec!["a", "b", "c"]);
        assert_eq!(names(&snap.sorted_by(SortKey::Size, false)), vec!["c", "a", "b"]);
    }

    #[test]
    fn sorted_by_modified() {
        let t0 = SystemTime::UNIX_EPOCH;
        let snap = Snapshot::new(
            "/d",
            vec![
                Entry::file("new", "/d/new", 1).with_modified(Some(t0 + Duration::from_secs(50))),
                Entry::file("old", "/d/old", 1).with_modified(Some(t0 + Duration::from_secs(5))),
            ],
        );
        assert_eq!(names(&snap.sorted_by(SortKey::Modified, false)), vec!["old", "new"]);
    }

    #[test]
    fn sort_key_parses() {
        assert_eq!("size".parse::<SortKey>(), Ok(SortKey::Size));
        assert_eq!("mtime".parse::<SortKey>(), Ok(SortKey::Modified));
        assert!("colour".parse::<SortKey>().is_err());
    }

    #[test]
    fn snapshot_serializes() {
        let snap = Snapshot::new("/d", vec![Entry::file("a.txt", "/d/a.txt", 4)]);
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["entries"][0]["name"], "a.txt");
        assert_eq!(json["entries"][0]["size"], 4);
    }
}
