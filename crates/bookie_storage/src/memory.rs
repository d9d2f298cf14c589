//! In-memory file channel for testing.

use crate::channel::FileChannel;
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;

/// An in-memory file channel.
///
/// This channel stores all data in memory and is suitable for:
/// - Unit tests
/// - Wrapping by fault-injecting channels in test harnesses
///
/// # Thread Safety
///
/// This channel is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use bookie_storage::{FileChannel, InMemoryChannel};
///
/// let mut channel = InMemoryChannel::new();
/// channel.write_at(0, b"test data").unwrap();
/// assert_eq!(channel.size().unwrap(), 9);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryChannel {
    data: RwLock<Vec<u8>>,
}

impl InMemoryChannel {
    /// Creates a new empty in-memory channel.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory channel with pre-existing data.
    #[must_use]
    pub fn with_data(data: Vec<u8>) -> Self {
        Self {
            data: RwLock::new(data),
        }
    }

    /// Returns a copy of all data in the channel.
    #[must_use]
    pub fn data(&self) -> Vec<u8> {
        self.data.read().clone()
    }
}

impl FileChannel for InMemoryChannel {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let data = self.data.read();
        let size = data.len() as u64;
        let end = offset.saturating_add(len as u64);

        if offset > size || end > size {
            return Err(StorageError::ReadPastEnd { offset, len, size });
        }

        let start = offset as usize;
        Ok(data[start..start + len].to_vec())
    }

    fn write_at(&mut self, offset: u64, new_data: &[u8]) -> StorageResult<()> {
        let mut data = self.data.write();
        let start = usize::try_from(offset).map_err(|_| {
            StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("offset {offset} does not fit in memory"),
            ))
        })?;
        let end = start + new_data.len();

        if data.len() < end {
            data.resize(end, 0);
        }
        data[start..end].copy_from_slice(new_data);
        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.data.read().len() as u64)
    }

    fn sync(&mut self) -> StorageResult<()> {
        // Nothing to make durable
        Ok(())
    }

    fn truncate(&mut self, new_size: u64) -> StorageResult<()> {
        let mut data = self.data.write();
        let current_size = data.len() as u64;

        if new_size > current_size {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!(
                    "cannot truncate to size {} which is greater than current size {}",
                    new_size, current_size
                ),
            )));
        }

        data.truncate(new_size as usize);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_new_is_empty() {
        let channel = InMemoryChannel::new();
        assert_eq!(channel.size().unwrap(), 0);
        assert!(channel.data().is_empty());
    }

    #[test]
    fn memory_write_then_read() {
        let mut channel = InMemoryChannel::new();
        channel.write_at(0, b"hello world").unwrap();

        assert_eq!(channel.read_at(0, 5).unwrap(), b"hello");
        assert_eq!(channel.read_at(6, 5).unwrap(), b"world");
    }

    #[test]
    fn memory_write_past_end_zero_fills() {
        let mut channel = InMemoryChannel::new();
        channel.write_at(3, b"x").unwrap();
        assert_eq!(channel.data(), vec![0, 0, 0, b'x']);
    }

    #[test]
    fn memory_overwrite_in_place() {
        let mut channel = InMemoryChannel::with_data(b"hello".to_vec());
        channel.write_at(1, b"EL").unwrap();
        assert_eq!(channel.data(), b"hELlo");
    }

    #[test]
    fn memory_read_at_past_end_fails() {
        let channel = InMemoryChannel::with_data(b"hello".to_vec());

        let result = channel.read_at(3, 10);
        assert!(matches!(result, Err(StorageError::ReadPastEnd { .. })));
    }

    #[test]
    fn memory_truncate_partial() {
        let mut channel = InMemoryChannel::with_data(b"hello world".to_vec());

        channel.truncate(5).unwrap();
        assert_eq!(channel.size().unwrap(), 5);
        assert_eq!(channel.read_at(0, 5).unwrap(), b"hello");
    }

    #[test]
    fn memory_truncate_to_larger_size_fails() {
        let mut channel = InMemoryChannel::with_data(b"hello".to_vec());
        assert!(channel.truncate(100).is_err());
    }
}
