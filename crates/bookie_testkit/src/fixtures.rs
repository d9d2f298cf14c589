//! Test fixtures for index files and journal directories.
//!
//! Provides temporary on-disk layouts matching the scenarios the
//! relocation and journal-listing tests run against.

use bookie_core::index::{IndexHeader, CURRENT_HEADER_VERSION};
use bookie_core::journal::journal_file_name;
use bookie_core::JournalId;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Size of the index file created by [`IndexFixture::new`].
pub const CURRENT_FILE_SIZE: u64 = 1024;

/// Writes an index file at `path` holding a valid header for `master_key`
/// padded with a deterministic byte pattern to `total_len` bytes.
///
/// Returns the bytes written.
pub fn write_index_file(path: &Path, master_key: &[u8], total_len: usize) -> Vec<u8> {
    let header = IndexHeader::new(CURRENT_HEADER_VERSION, master_key.to_vec());
    let mut data = header.encode().expect("Failed to encode index header");
    let header_len = data.len();
    data.resize(total_len.max(header_len), 0);
    for (i, byte) in data.iter_mut().enumerate().skip(header_len) {
        *byte = (i % 251) as u8;
    }
    fs::write(path, &data).expect("Failed to write index file");
    data
}

/// A temporary directory holding a current index file and an existing
/// relocation target.
pub struct IndexFixture {
    /// The temporary directory (kept alive to prevent cleanup).
    pub dir: TempDir,
    /// The index file a handle is opened over.
    pub current: PathBuf,
    /// An existing, empty file to relocate onto.
    pub new_location: PathBuf,
    /// Bytes of `current` at setup.
    pub original: Vec<u8>,
}

impl IndexFixture {
    /// Creates a [`CURRENT_FILE_SIZE`]-byte index with an empty master key
    /// and an empty relocation target beside it.
    pub fn new() -> Self {
        Self::with_size(CURRENT_FILE_SIZE as usize)
    }

    /// Creates a fixture whose current index is `size` bytes long.
    pub fn with_size(size: usize) -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let current = dir.path().join("current_file.idx");
        let new_location = dir.path().join("new_location_file.idx");

        let original = write_index_file(&current, &[], size);
        fs::write(&new_location, b"").expect("Failed to create relocation target");

        Self {
            dir,
            current,
            new_location,
            original,
        }
    }

    /// Returns a path inside a directory that does not exist.
    pub fn missing_dir_target(&self) -> PathBuf {
        self.dir.path().join("does").join("not").join("exist").join("x.idx")
    }
}

impl Default for IndexFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// The journal directory layouts used by listing tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalDirKind {
    /// The directory is never created.
    NotExisting,
    /// An empty directory.
    Empty,
    /// A directory with only non-journal entries.
    NoLogFiles,
    /// A directory holding `7.txn`.
    OneLogFile,
    /// A directory holding `1.txn` and `2.txn`.
    TwoLogFiles,
}

impl JournalDirKind {
    /// Returns the directory name used for this layout.
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::NotExisting => "not_existing_dir",
            Self::Empty => "empty_dir",
            Self::NoLogFiles => "no_log_files_dir",
            Self::OneLogFile => "one_log_file_dir",
            Self::TwoLogFiles => "two_log_files_dir",
        }
    }

    /// Returns the journal ids present in this layout.
    pub fn journal_ids(self) -> Vec<JournalId> {
        match self {
            Self::NotExisting | Self::Empty | Self::NoLogFiles => Vec::new(),
            Self::OneLogFile => vec![JournalId::new(7)],
            Self::TwoLogFiles => vec![JournalId::new(1), JournalId::new(2)],
        }
    }

    /// Materializes this layout under `root` and returns its path.
    pub fn create(self, root: &Path) -> PathBuf {
        let path = root.join(self.dir_name());
        if self == Self::NotExisting {
            return path;
        }

        fs::create_dir_all(&path).expect("Failed to create journal directory");
        if self == Self::NoLogFiles {
            for name in ["lastMark", "journal.lock", "7.log", "notes.txt"] {
                fs::write(path.join(name), b"").expect("Failed to create file");
            }
        }
        for id in self.journal_ids() {
            fs::write(path.join(journal_file_name(id)), b"").expect("Failed to create journal");
        }
        path
    }
}

/// A temporary root holding every [`JournalDirKind`] layout.
pub struct JournalFixture {
    /// The temporary directory (kept alive to prevent cleanup).
    pub root: TempDir,
}

impl JournalFixture {
    /// Creates an empty fixture root.
    pub fn new() -> Self {
        Self {
            root: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Materializes `kind` and returns its path.
    pub fn dir(&self, kind: JournalDirKind) -> PathBuf {
        kind.create(self.root.path())
    }

    /// Creates a directory containing one empty file per name.
    pub fn dir_with_files(&self, dir_name: &str, names: &[&str]) -> PathBuf {
        let path = self.root.path().join(dir_name);
        fs::create_dir_all(&path).expect("Failed to create directory");
        for name in names {
            fs::write(path.join(name), b"").expect("Failed to create file");
        }
        path
    }
}

impl Default for JournalFixture {
    fn default() -> Self {
        Self::new()
    }
}
