//! Background execution of batch operations.
//!
//! One worker task takes jobs from a FIFO queue and runs them one at a
//! time. Results go back to the controller on a completion channel; the
//! worker never touches controller state.
//!
//! ```text
//! Explorer ──dispatch──▶ [queue] ──▶ worker task ──▶ Executor
//!    ▲                                    │
//!    └──────────── Completion ◀───────────┘
//! ```

mod worker;

pub use worker::Worker;

use std::fmt;

use burrow_types::OperationResult;

use crate::executor::BatchOp;

/// Identifier of a dispatched batch. Assigned in dispatch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a batch job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Queued,
    Running,
    Done,
    /// Finished with this many failed items.
    Failed(usize),
}

impl JobStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Failed(_))
    }

    pub(crate) fn from_result(result: &OperationResult) -> Self {
        if result.ok() {
            JobStatus::Done
        } else {
            JobStatus::Failed(result.failures.len())
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "queued"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Done => write!(f, "done"),
            JobStatus::Failed(n) => write!(f, "failed:{n}"),
        }
    }
}

/// A job as shown by `jobs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobInfo {
    pub id: JobId,
    pub description: String,
    pub status: JobStatus,
}

/// A finished batch, handed back to the controller.
#[derive(Debug, Clone)]
pub struct Completion {
    pub job: JobId,
    pub op: BatchOp,
    /// Clipboard generation a cut paste was dispatched with.
    pub clipboard_generation: Option<u64>,
    pub result: OperationResult,
}

impl Completion {
    pub fn status(&self) -> JobStatus {
        JobStatus::from_result(&self.result)
    }
}
