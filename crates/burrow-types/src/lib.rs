//! burrow-types: the values that cross the engine boundary.
//!
//! Everything here is plain data. The presentation layer renders
//! [`Snapshot`]s and [`OperationResult`]s; it never sees the filesystem.

mod clipboard;
mod entry;
mod error;
mod outcome;

pub use clipboard::ClipboardMode;
pub use entry::{Entry, Snapshot, SortKey};
pub use error::{ErrorKind, Failure};
pub use outcome::OperationResult;
