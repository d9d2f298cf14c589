//! Filesystem abstraction for path-level operations.

use crate::channel::FileChannel;
use crate::error::{StorageError, StorageResult};
use crate::file::OsFileChannel;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// How [`Vfs::open`] treats the target path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Open an existing file; fail if it is missing.
    Existing,
    /// Open the file, creating it empty if it is missing.
    Create,
    /// Create the file, discarding any existing content.
    CreateTruncate,
}

/// Path-level filesystem operations.
///
/// Everything that touches a directory entry (open, rename, unlink, list)
/// goes through this trait. [`OsVfs`] maps each call onto `std::fs`; test
/// harnesses wrap it to inject faults or reorder directory listings.
pub trait Vfs: Send + Sync {
    /// Opens a channel on `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened in the requested mode.
    fn open(&self, path: &Path, mode: OpenMode) -> StorageResult<Box<dyn FileChannel>>;

    /// Returns `true` if `path` names an existing entry.
    fn exists(&self, path: &Path) -> bool;

    /// Returns `true` if `path` names an existing directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Atomically renames `from` to `to`, replacing `to` if it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the rename fails.
    fn rename(&self, from: &Path, to: &Path) -> StorageResult<()>;

    /// Removes the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be removed.
    fn remove_file(&self, path: &Path) -> StorageResult<()>;

    /// Creates `path` and all missing ancestors.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be created.
    fn create_dir_all(&self, path: &Path) -> StorageResult<()>;

    /// Resolves `path` to a canonical absolute path. The path must exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be resolved.
    fn canonicalize(&self, path: &Path) -> StorageResult<PathBuf>;

    /// Returns the names of the entries in directory `path`, in scan order.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    fn read_dir(&self, path: &Path) -> StorageResult<Vec<OsString>>;

    /// Syncs directory `path` so that entry creations, renames and removals
    /// within it are durable.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be opened or synced.
    fn sync_dir(&self, path: &Path) -> StorageResult<()>;
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsVfs;

impl OsVfs {
    /// Creates a handle to the OS filesystem.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Vfs for OsVfs {
    fn open(&self, path: &Path, mode: OpenMode) -> StorageResult<Box<dyn FileChannel>> {
        let channel = match mode {
            OpenMode::Existing => OsFileChannel::open(path, false)?,
            OpenMode::Create => OsFileChannel::open(path, true)?,
            OpenMode::CreateTruncate => OsFileChannel::create_truncated(path)?,
        };
        Ok(Box::new(channel))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn rename(&self, from: &Path, to: &Path) -> StorageResult<()> {
        fs::rename(from, to).map_err(|e| StorageError::path("rename", from, e))
    }

    fn remove_file(&self, path: &Path) -> StorageResult<()> {
        fs::remove_file(path).map_err(|e| StorageError::path("remove", path, e))
    }

    fn create_dir_all(&self, path: &Path) -> StorageResult<()> {
        fs::create_dir_all(path).map_err(|e| StorageError::path("create_dir_all", path, e))
    }

    fn canonicalize(&self, path: &Path) -> StorageResult<PathBuf> {
        fs::canonicalize(path).map_err(|e| StorageError::path("canonicalize", path, e))
    }

    fn read_dir(&self, path: &Path) -> StorageResult<Vec<OsString>> {
        let entries = fs::read_dir(path).map_err(|e| StorageError::path("read_dir", path, e))?;

        let mut names = Vec::new();
        for entry in entries {
            names.push(entry?.file_name());
        }
        Ok(names)
    }

    /// On Windows, directory fsync is not supported in the same way as Unix;
    /// NTFS journaling covers metadata durability, so this is a no-op there.
    fn sync_dir(&self, path: &Path) -> StorageResult<()> {
        #[cfg(unix)]
        {
            let dir = fs::File::open(path).map_err(|e| StorageError::path("sync_dir", path, e))?;
            dir.sync_all()?;
        }
        #[cfg(not(unix))]
        let _ = path;
        Ok(())
    }
}
