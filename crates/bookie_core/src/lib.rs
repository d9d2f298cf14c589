//! # Bookie Core
//!
//! Ledger index files and journal directories for a bookie storage node.
//!
//! This crate provides:
//! - [`IndexFile`], a handle over one ledger index file with lazy opening,
//!   header validation, fencing and crash-safe relocation
//! - [`journal::list_journal_ids`], a tolerant scan of a journal directory
//!   for `<hex>.txn` segments
//!
//! ## Example
//!
//! ```rust
//! use bookie_core::journal::{list_journal_ids, RollingFilter};
//! use bookie_core::JournalId;
//!
//! let dir = tempfile::tempdir().unwrap();
//! std::fs::write(dir.path().join("2.txn"), b"").unwrap();
//! std::fs::write(dir.path().join("1.txn"), b"").unwrap();
//!
//! let filter = RollingFilter::new(JournalId::new(2));
//! let ids = list_journal_ids(Some(dir.path()), Some(&filter)).unwrap();
//! assert_eq!(ids, vec![JournalId::new(1)]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
pub mod index;
pub mod journal;
mod types;

pub use config::{Config, DEFAULT_TRANSFER_CHUNK_SIZE};
pub use error::{CoreError, CoreResult};
pub use index::{IndexFile, IndexHeader};
pub use journal::{JournalDirectory, JournalIdFilter};
pub use types::JournalId;
