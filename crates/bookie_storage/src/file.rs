//! OS file channel for persistent storage.

use crate::channel::FileChannel;
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// A positional channel over an OS file.
///
/// # Durability
///
/// - `sync()` calls `File::sync_all()` to ensure data and metadata are on disk
///
/// # Thread Safety
///
/// The file handle sits behind a lock so the channel can be shared across
/// threads; every positional access seeks under the write lock.
///
/// # Example
///
/// ```no_run
/// use bookie_storage::{FileChannel, OsFileChannel};
/// use std::path::Path;
///
/// let mut channel = OsFileChannel::open(Path::new("1.idx"), true).unwrap();
/// channel.write_at(0, b"BKLE").unwrap();
/// channel.sync().unwrap();
/// ```
#[derive(Debug)]
pub struct OsFileChannel {
    path: PathBuf,
    file: RwLock<File>,
}

impl OsFileChannel {
    /// Opens a channel at the given path for reading and writing.
    ///
    /// When `create` is true a missing file is created; existing content is
    /// never truncated.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or created.
    pub fn open(path: &Path, create: bool) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(create)
            .truncate(false)
            .open(path)
            .map_err(|e| StorageError::path("open", path, e))?;

        Ok(Self::from_file(path, file))
    }

    /// Creates a channel at the given path, discarding any existing content.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created.
    pub fn create_truncated(path: &Path) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|e| StorageError::path("create", path, e))?;

        Ok(Self::from_file(path, file))
    }

    fn from_file(path: &Path, file: File) -> Self {
        Self {
            path: path.to_path_buf(),
            file: RwLock::new(file),
        }
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FileChannel for OsFileChannel {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let size = self.size()?;
        let end = offset.saturating_add(len as u64);

        if offset > size || end > size {
            return Err(StorageError::ReadPastEnd { offset, len, size });
        }

        if len == 0 {
            return Ok(Vec::new());
        }

        let mut file = self.file.write();
        file.seek(SeekFrom::Start(offset))?;

        let mut buffer = vec![0u8; len];
        file.read_exact(&mut buffer)?;

        Ok(buffer)
    }

    fn write_at(&mut self, offset: u64, data: &[u8]) -> StorageResult<()> {
        if data.is_empty() {
            return Ok(());
        }

        let mut file = self.file.write();
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(data)?;

        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.file.read().metadata()?.len())
    }

    fn sync(&mut self) -> StorageResult<()> {
        let file = self.file.write();
        file.sync_all()?;
        Ok(())
    }

    fn truncate(&mut self, new_size: u64) -> StorageResult<()> {
        let file = self.file.write();
        let size = file.metadata()?.len();

        if new_size > size {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!(
                    "cannot truncate to size {} which is greater than current size {}",
                    new_size, size
                ),
            )));
        }

        file.set_len(new_size)?;
        file.sync_all()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_create_new() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.idx");

        let channel = OsFileChannel::open(&path, true).unwrap();
        assert_eq!(channel.size().unwrap(), 0);
        assert!(path.exists());
    }

    #[test]
    fn file_open_missing_without_create_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.idx");

        let err = OsFileChannel::open(&path, false).unwrap_err();
        assert!(err.is_not_found());
        assert!(!path.exists());
    }

    #[test]
    fn file_write_and_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.idx");

        let mut channel = OsFileChannel::open(&path, true).unwrap();
        channel.write_at(0, b"hello").unwrap();
        channel.write_at(5, b" world").unwrap();

        assert_eq!(channel.size().unwrap(), 11);
        assert_eq!(channel.read_at(0, 11).unwrap(), b"hello world");
        assert_eq!(channel.read_at(6, 5).unwrap(), b"world");
    }

    #[test]
    fn file_read_past_end_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.idx");

        let mut channel = OsFileChannel::open(&path, true).unwrap();
        channel.write_at(0, b"hello").unwrap();

        let result = channel.read_at(10, 5);
        assert!(matches!(result, Err(StorageError::ReadPastEnd { .. })));
    }

    #[test]
    fn file_persistence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.idx");

        {
            let mut channel = OsFileChannel::open(&path, true).unwrap();
            channel.write_at(0, b"persistent data").unwrap();
            channel.sync().unwrap();
        }

        {
            let channel = OsFileChannel::open(&path, false).unwrap();
            assert_eq!(channel.size().unwrap(), 15);
            assert_eq!(channel.read_at(0, 15).unwrap(), b"persistent data");
        }
    }

    #[test]
    fn file_create_truncated_discards_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.idx.rloc");
        std::fs::write(&path, b"stale bytes").unwrap();

        let channel = OsFileChannel::create_truncated(&path).unwrap();
        assert_eq!(channel.size().unwrap(), 0);
    }

    #[test]
    fn file_transfer_between_files() {
        let dir = tempdir().unwrap();
        let src_path = dir.path().join("src.idx");
        let dst_path = dir.path().join("dst.idx");
        std::fs::write(&src_path, vec![7u8; 300]).unwrap();

        let source = OsFileChannel::open(&src_path, false).unwrap();
        let mut target = OsFileChannel::open(&dst_path, true).unwrap();

        let moved = source.transfer_to(0, 200, &mut target, 0).unwrap();
        assert_eq!(moved, 200);
        assert_eq!(target.size().unwrap(), 200);
    }

    #[test]
    fn file_truncate() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.idx");

        let mut channel = OsFileChannel::open(&path, true).unwrap();
        channel.write_at(0, b"hello world").unwrap();
        channel.truncate(5).unwrap();

        assert_eq!(channel.size().unwrap(), 5);
        assert!(channel.truncate(6).is_err());
    }

    #[test]
    fn file_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.idx");

        let channel = OsFileChannel::open(&path, true).unwrap();
        assert_eq!(channel.path(), path);
    }
}
