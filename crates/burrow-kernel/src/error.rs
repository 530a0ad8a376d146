//! Errors returned by controller commands.

use burrow_types::Failure;
use thiserror::Error;

/// Why a controller command could not run.
///
/// Caller-input problems are separate variants. Anything that went wrong on
/// the filesystem is a [`Failure`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("nothing selected")]
    NothingSelected,
    #[error("clipboard is empty")]
    ClipboardEmpty,
    /// The background worker has shut down and accepts no more jobs.
    #[error("background worker stopped")]
    WorkerStopped,
    #[error(transparent)]
    Failure(#[from] Failure),
}

impl CommandError {
    /// The underlying filesystem failure, if there is one.
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            CommandError::Failure(f) => Some(f),
            _ => None,
        }
    }
}
