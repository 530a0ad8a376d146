//! Pure path and formatting helpers.

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

const SIZE_UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

/// Render a byte count with one decimal, stepping by 1024.
///
/// ```
/// use burrow_kernel::path_util::format_size;
/// assert_eq!(format_size(10), "10.0 B");
/// assert_eq!(format_size(1536), "1.5 KB");
/// ```
pub fn format_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in SIZE_UNITS {
        if size < 1024.0 {
            return format!("{size:.1} {unit}");
        }
        size /= 1024.0;
    }
    format!("{size:.1} TB")
}

/// Render a modification time as local `DD.MM.YYYY HH:MM`.
pub fn format_modified(time: SystemTime) -> String {
    let local: DateTime<Local> = time.into();
    local.format("%d.%m.%Y %H:%M").to_string()
}

/// Parent of `path`, or `None` at a filesystem root.
pub fn parent(path: &Path) -> Option<PathBuf> {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() && p != path => Some(p.to_path_buf()),
        _ => None,
    }
}

/// The `counter`-th alternative for `file_name`: `name (N).ext`.
///
/// Only the last extension is kept after the counter, and a leading dot
/// does not start an extension (`.bashrc` → `.bashrc (1)`).
pub fn numbered_name(file_name: &str, counter: u64) -> String {
    let path = Path::new(file_name);
    match (path.file_stem(), path.extension()) {
        (Some(stem), Some(ext)) => format!(
            "{} ({counter}).{}",
            stem.to_string_lossy(),
            ext.to_string_lossy()
        ),
        _ => format!("{file_name} ({counter})"),
    }
}

/// Why a user-supplied entry name is unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameProblem {
    Empty,
    Separator,
    Reserved,
}

impl NameProblem {
    pub fn message(self) -> &'static str {
        match self {
            NameProblem::Empty => "name is empty",
            NameProblem::Separator => "name contains a path separator",
            NameProblem::Reserved => "name is reserved",
        }
    }
}

/// Check that `name` names a single entry inside a directory.
pub fn validate_name(name: &str) -> Result<(), NameProblem> {
    if name.is_empty() {
        return Err(NameProblem::Empty);
    }
    if name.chars().any(|c| std::path::is_separator(c) || c == '\0') {
        return Err(NameProblem::Separator);
    }
    if name == "." || name == ".." {
        return Err(NameProblem::Reserved);
    }
    Ok(())
}

/// Last component of `path` as a string.
pub fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

/// Resolve user input against the current directory.
///
/// Absolute input is taken as-is, `~` expands to `home`, and anything else
/// is joined onto `cwd`. `.` and `..` are folded lexically.
pub fn resolve_input(cwd: &Path, input: &str, home: Option<&Path>) -> PathBuf {
    let input = input.trim();
    let joined = if input == "~" {
        home.map(Path::to_path_buf).unwrap_or_else(|| cwd.to_path_buf())
    } else if let (Some(rest), Some(home)) = (input.strip_prefix("~/"), home) {
        home.join(rest)
    } else if Path::new(input).is_absolute() {
        PathBuf::from(input)
    } else {
        cwd.join(input)
    };
    normalize(&joined)
}

/// Fold `.` and `..` without touching the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    use std::path::Component;

    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                // Never pop past the root
                if result.parent().is_some() {
                    result.pop();
                }
            }
            Component::CurDir => {}
            other => result.push(other.as_os_str()),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::zero(0, "0.0 B")]
    #[case::bytes(10, "10.0 B")]
    #[case::just_under_kb(1023, "1023.0 B")]
    #[case::one_kb(1024, "1.0 KB")]
    #[case::kb_and_half(1536, "1.5 KB")]
    #[case::mb(5 * 1024 * 1024, "5.0 MB")]
    #[case::gb(3 * 1024 * 1024 * 1024, "3.0 GB")]
    #[case::tb(2 * 1024 * 1024 * 1024 * 1024, "2.0 TB")]
    fn test_format_size(#[case] bytes: u64, #[case] expected: &str) {
        assert_eq!(format_size(bytes), expected);
    }

    #[rstest]
    #[case::with_ext("b.txt", 1, "b (1).txt")]
    #[case::no_ext("notes", 2, "notes (2)")]
    #[case::double_ext("archive.tar.gz", 1, "archive.tar (1).gz")]
    #[case::dotfile(".bashrc", 3, ".bashrc (3)")]
    fn test_numbered_name(#[case] name: &str, #[case] counter: u64, #[case] expected: &str) {
        assert_eq!(numbered_name(name, counter), expected);
    }

    #[rstest]
    #[case::plain("report.pdf", Ok(()))]
    #[case::spaces("my file", Ok(()))]
    #[case::empty("", Err(NameProblem::Empty))]
    #[case::slash("a/b", Err(NameProblem::Separator))]
    #[case::nul("a\0b", Err(NameProblem::Separator))]
    #[case::dot(".", Err(NameProblem::Reserved))]
    #[case::dotdot("..", Err(NameProblem::Reserved))]
    fn test_validate_name(#[case] name: &str, #[case] expected: Result<(), NameProblem>) {
        assert_eq!(validate_name(name), expected);
    }

    #[test]
    fn parent_of_root_is_none() {
        assert_eq!(parent(Path::new("/")), None);
        assert_eq!(parent(Path::new("/tmp")), Some(PathBuf::from("/")));
        assert_eq!(parent(Path::new("/tmp/x")), Some(PathBuf::from("/tmp")));
    }

    #[test]
    fn resolve_input_handles_relative_absolute_and_home() {
        let cwd = Path::new("/home/amy/src");
        let home = Some(Path::new("/home/amy"));

        assert_eq!(resolve_input(cwd, "lib", home), PathBuf::from("/home/amy/src/lib"));
        assert_eq!(resolve_input(cwd, "/etc", home), PathBuf::from("/etc"));
        assert_eq!(resolve_input(cwd, "..", home), PathBuf::from("/home/amy"));
        assert_eq!(resolve_input(cwd, "~", home), PathBuf::from("/home/amy"));
        assert_eq!(resolve_input(cwd, "~/docs", home), PathBuf::from("/home/amy/docs"));
        assert_eq!(resolve_input(cwd, "../../../..", home), PathBuf::from("/"));
    }

    #[test]
    fn format_modified_shape() {
        let rendered = format_modified(SystemTime::now());
        // DD.MM.YYYY HH:MM
        assert_eq!(rendered.len(), 16);
        assert_eq!(&rendered[2..3], ".");
        assert_eq!(&rendered[5..6], ".");
        assert_eq!(&rendered[13..14], ":");
    }
}
