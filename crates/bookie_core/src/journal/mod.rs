//! Journal directory scanning.
//!
//! A bookie journal directory holds one file per journal segment, named by
//! the segment id in lowercase hex:
//!
//! ```text
//! <journal_dir>/
//! ├─ 1.txn
//! ├─ 2.txn
//! ├─ 1a.txn
//! └─ lastMark          # ignored, like any non-journal entry
//! ```
//!
//! Listing is tolerant: entries that are not `<hex>.txn` are skipped
//! silently so lock files and temporary files can share the directory.

mod filter;

pub use filter::{AcceptAll, JournalIdFilter, RollingFilter};

use crate::error::{CoreError, CoreResult};
use crate::types::JournalId;
use bookie_storage::{OsVfs, Vfs};
use std::path::{Path, PathBuf};
use tracing::trace;

/// Extension of journal segment files.
pub const JOURNAL_SUFFIX: &str = "txn";

/// Returns the file name of journal `id`, e.g. `1a.txn`.
#[must_use]
pub fn journal_file_name(id: JournalId) -> String {
    format!("{id}.{JOURNAL_SUFFIX}")
}

/// Parses a journal file name back into its id.
///
/// The name is split at its last `.`; the extension must be exactly `txn`
/// and the stem must be non-empty hexadecimal that fits in 64 bits.
#[must_use]
pub fn parse_journal_file_name(name: &str) -> Option<JournalId> {
    let (stem, suffix) = name.rsplit_once('.')?;
    if suffix != JOURNAL_SUFFIX {
        return None;
    }
    if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    stem.parse().ok()
}

/// Lists the journal ids in `path`, ascending, keeping those `filter`
/// accepts. No filter keeps everything.
///
/// A missing path, or one that is not a directory, lists as empty.
///
/// # Errors
///
/// Returns [`CoreError::InvalidArgument`] if `path` is `None`, or a storage
/// error if an existing directory cannot be read.
pub fn list_journal_ids(
    path: Option<&Path>,
    filter: Option<&dyn JournalIdFilter>,
) -> CoreResult<Vec<JournalId>> {
    list_journal_ids_with(&OsVfs::new(), path, filter)
}

/// Same as [`list_journal_ids`] but scans through `vfs`.
///
/// # Errors
///
/// See [`list_journal_ids`].
pub fn list_journal_ids_with(
    vfs: &dyn Vfs,
    path: Option<&Path>,
    filter: Option<&dyn JournalIdFilter>,
) -> CoreResult<Vec<JournalId>> {
    let Some(path) = path else {
        return Err(CoreError::invalid_argument("journal directory must be provided"));
    };

    if !vfs.is_dir(path) {
        return Ok(Vec::new());
    }

    let mut ids = Vec::new();
    for name in vfs.read_dir(path)? {
        let Some(id) = name.to_str().and_then(parse_journal_file_name) else {
            trace!(dir = %path.display(), entry = ?name, "skipping non-journal entry");
            continue;
        };
        if filter.map_or(true, |f| f.accept(id)) {
            ids.push(id);
        }
    }

    ids.sort_unstable();
    Ok(ids)
}

/// A journal directory on the OS filesystem.
#[derive(Debug, Clone)]
pub struct JournalDirectory {
    path: PathBuf,
}

impl JournalDirectory {
    /// Creates a handle over `path`. The directory need not exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the directory path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the path of journal `id` inside this directory.
    #[must_use]
    pub fn file_path(&self, id: JournalId) -> PathBuf {
        self.path.join(journal_file_name(id))
    }

    /// Lists the journal ids present, ascending.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory exists but cannot be read.
    pub fn list_ids(&self, filter: Option<&dyn JournalIdFilter>) -> CoreResult<Vec<JournalId>> {
        list_journal_ids(Some(&self.path), filter)
    }
}
