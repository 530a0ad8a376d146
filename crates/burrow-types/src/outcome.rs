//! The per-batch outcome of a mutation command.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ErrorKind, Failure};

/// Outcome of a batch command.
///
/// Each item is attempted independently: a failure on one path is recorded
/// here and never stops the remaining items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationResult {
    /// Paths the command produced or removed successfully. For copy and
    /// move these are the destination paths.
    pub succeeded: Vec<PathBuf>,
    /// Per-item failures in the order they were recorded.
    pub failures: Vec<Failure>,
}

impl OperationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&mut self, path: impl Into<PathBuf>) {
        self.succeeded.push(path.into());
    }

    pub fn record_failure(&mut self, failure: Failure) {
        self.failures.push(failure);
    }

    /// Record the outcome of one item.
    pub fn record(&mut self, outcome: Result<PathBuf, Failure>) {
        match outcome {
            Ok(path) => self.record_success(path),
            Err(failure) => self.record_failure(failure),
        }
    }

    /// True if no item failed.
    pub fn ok(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of items attempted.
    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failures.len()
    }

    /// The failure recorded for `path`, if any.
    pub fn failure_for(&self, path: &Path) -> Option<&Failure> {
        self.failures.iter().find(|f| f.path == path)
    }

    /// Whether any failure has the given kind.
    pub fn has_failure_kind(&self, kind: &ErrorKind) -> bool {
        self.failures.iter().any(|f| &f.kind == kind)
    }

    /// Human summary for a status line.
    pub fn summary(&self) -> String {
        if self.failures.is_empty() {
            format!("{} item(s) done", self.succeeded.len())
        } else {
            format!(
                "{} item(s) done, {} failed",
                self.succeeded.len(),
                self.failures.len()
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_mixed_outcomes() {
        let mut result = OperationResult::new();
        result.record(Ok(PathBuf::from("/a")));
        result.record(Err(Failure::not_found("/b")));

        assert!(!result.ok());
        assert_eq!(result.attempted(), 2);
        assert_eq!(
            result.failure_for(Path::new("/b")).map(|f| &f.kind),
            Some(&ErrorKind::NotFound)
        );
        assert!(result.has_failure_kind(&ErrorKind::NotFound));
        assert_eq!(result.summary(), "1 item(s) done, 1 failed");
    }

    #[test]
    fn empty_result_is_ok() {
        let result = OperationResult::new();
        assert!(result.ok());
        assert_eq!(result.summary(), "0 item(s) done");
    }
}
