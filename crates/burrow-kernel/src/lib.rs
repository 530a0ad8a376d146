//! burrow-kernel: the non-visual engine behind a file browser.
//!
//! This crate provides:
//!
//! - **vfs**: the filesystem seam (`Filesystem` trait, `LocalFs`, `MemoryFs`,
//!   `VfsRouter`)
//! - **lister**: one directory into a sorted [`Snapshot`]
//! - **history**: back/forward navigation state
//! - **clipboard**: staged copy/cut sets and destination conflict resolution
//! - **executor**: create, copy, move, delete and rename
//! - **scheduler**: the background worker that runs batch operations
//! - **explorer**: the controller that owns current path, history,
//!   clipboard and selection
//!
//! [`Snapshot`]: burrow_types::Snapshot

pub mod clipboard;
pub mod config;
pub mod error;
pub mod executor;
pub mod explorer;
pub mod history;
pub mod lister;
pub mod path_util;
pub mod paths;
pub mod scheduler;
pub mod vfs;

pub use burrow_types::{ClipboardMode, Entry, ErrorKind, Failure, OperationResult, Snapshot, SortKey};
pub use config::ExplorerConfig;
pub use error::CommandError;
pub use executor::{BatchOp, Executor};
pub use explorer::{Explorer, OpenOutcome, Opener};
pub use scheduler::{Completion, JobId, JobInfo, JobStatus};
