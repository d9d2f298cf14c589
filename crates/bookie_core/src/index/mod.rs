//! Ledger index files.
//!
//! An index file starts with a small header (signature, version, master
//! key, state bits) followed by the entry-offset data region. [`IndexFile`]
//! owns one such file and can relocate it to another ledger directory.

mod file;
mod header;

pub use file::{relocation_copy_len, staging_path, IndexFile, RELOCATION_SUFFIX};
pub use header::{
    IndexHeader, CURRENT_HEADER_VERSION, SIGNATURE, START_OF_DATA, STATE_FENCED_BIT,
};
