//! # Bookie Storage
//!
//! File channel and filesystem abstractions for bookie ledger storage.
//!
//! This crate provides the lowest-level I/O seam used by the ledger index
//! and journal code. Channels are **opaque byte stores** - they do not
//! interpret the data they hold.
//!
//! ## Design Principles
//!
//! - Channels are positional byte stores (read at, write at, transfer)
//! - No knowledge of index headers or journal records
//! - Must be `Send + Sync` for concurrent access
//! - All path-level operations (open, rename, delete, list) go through [`Vfs`]
//!   so callers can substitute a fault-injecting implementation in tests
//!
//! ## Available Implementations
//!
//! - [`InMemoryChannel`] - For testing and ephemeral data
//! - [`OsFileChannel`] - Positional access to an OS file
//! - [`OsVfs`] - The real filesystem
//!
//! ## Example
//!
//! ```rust
//! use bookie_storage::{FileChannel, InMemoryChannel};
//!
//! let source = InMemoryChannel::with_data(b"hello world".to_vec());
//! let mut target = InMemoryChannel::new();
//! let moved = source.transfer_to(0, 5, &mut target, 0).unwrap();
//! assert_eq!(moved, 5);
//! assert_eq!(target.data(), b"hello");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod channel;
mod error;
mod file;
mod memory;
mod vfs;

pub use channel::FileChannel;
pub use error::{StorageError, StorageResult};
pub use file::OsFileChannel;
pub use memory::InMemoryChannel;
pub use vfs::{OpenMode, OsVfs, Vfs};
