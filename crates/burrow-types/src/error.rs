//! Error kinds reported by engine commands.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Classification of a failed filesystem operation.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ErrorKind {
    #[error("not found")]
    NotFound,
    #[error("access denied")]
    AccessDenied,
    #[error("already exists")]
    AlreadyExists,
    #[error("invalid name")]
    InvalidName,
    /// A move across volumes whose copy-then-delete fallback also failed.
    #[error("cross-volume move failed")]
    CrossVolumeMoveFailed,
    #[error("{0}")]
    Unknown(String),
}

impl ErrorKind {
    /// Classify an io error.
    pub fn from_io(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => ErrorKind::NotFound,
            io::ErrorKind::PermissionDenied => ErrorKind::AccessDenied,
            io::ErrorKind::AlreadyExists => ErrorKind::AlreadyExists,
            _ => ErrorKind::Unknown(err.to_string()),
        }
    }
}

/// A failure attributed to one path.
///
/// Single-target commands return this as their error; batch commands
/// collect them in [`crate::OperationResult::failures`].
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{}: {message}", path.display())]
pub struct Failure {
    pub path: PathBuf,
    pub kind: ErrorKind,
    pub message: String,
}

impl Failure {
    pub fn new(path: impl Into<PathBuf>, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            message: message.into(),
        }
    }

    /// Build a failure from an io error on `path`.
    pub fn from_io(path: &Path, err: &io::Error) -> Self {
        Self::new(path, ErrorKind::from_io(err), err.to_string())
    }

    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::new(path, ErrorKind::NotFound, "no such file or directory")
    }

    pub fn invalid_name(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::new(path, ErrorKind::InvalidName, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_kinds_map_to_error_kinds() {
        let nf = io::Error::new(io::ErrorKind::NotFound, "gone");
        assert_eq!(ErrorKind::from_io(&nf), ErrorKind::NotFound);

        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        assert_eq!(ErrorKind::from_io(&denied), ErrorKind::AccessDenied);

        let exists = io::Error::new(io::ErrorKind::AlreadyExists, "taken");
        assert_eq!(ErrorKind::from_io(&exists), ErrorKind::AlreadyExists);

        let other = io::Error::other("disk on fire");
        assert_eq!(
            ErrorKind::from_io(&other),
            ErrorKind::Unknown("disk on fire".into())
        );
    }

    #[test]
    fn failure_displays_path_and_message() {
        let f = Failure::not_found("/tmp/x/gone.txt");
        assert_eq!(f.to_string(), "/tmp/x/gone.txt: no such file or directory");
    }
}
