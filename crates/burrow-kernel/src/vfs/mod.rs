//! Virtual Filesystem (VFS) for burrow.
//!
//! The engine never touches the host filesystem directly. Every operation
//! goes through the [`Filesystem`] trait:
//!
//! - **LocalFs**: real filesystem access, rooted at a directory
//! - **MemoryFs**: in-memory ephemeral storage (tests, scratch)
//! - **VfsRouter**: routes paths to mounted backends
//!
//! # Volumes
//!
//! Each mount of a [`VfsRouter`] behaves as its own volume:
//!
//! ```text
//! /                      # LocalFs (host root)
//! ├── /mnt/usb/          # LocalFs (another device)
//! └── /scratch/          # MemoryFs
//! ```
//!
//! A rename between two mounts fails with `CrossesDevices`, the same way a
//! host rename fails across devices, so callers need one fallback path for
//! both cases.

mod local;
mod memory;
mod router;
mod traits;

pub use local::LocalFs;
pub use memory::MemoryFs;
pub use router::{MountInfo, VfsRouter};
pub use traits::{is_cross_device, DirEntry, DirEntryKind, Filesystem};
