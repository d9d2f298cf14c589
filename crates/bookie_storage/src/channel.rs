//! File channel trait definition.

use crate::error::StorageResult;

/// A positional, seekable byte channel over a single file.
///
/// Channels are **opaque byte stores**. They provide positional reads and
/// writes plus a bulk transfer primitive. Callers own all format
/// interpretation - channels do not understand index headers or journals.
///
/// # Invariants
///
/// - `read_at` returns exactly the bytes previously written at that offset
/// - `write_at` past the current end extends the channel
/// - `transfer_to` never reports more bytes than it actually wrote
/// - Channels must be `Send + Sync` for concurrent access
///
/// # Implementors
///
/// - [`super::InMemoryChannel`] - For testing
/// - [`super::OsFileChannel`] - For persistent storage
pub trait FileChannel: Send + Sync {
    /// Reads `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The read would extend beyond the current size
    /// - An I/O error occurs
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>>;

    /// Writes `data` at `offset`, extending the channel if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn write_at(&mut self, offset: u64, data: &[u8]) -> StorageResult<()>;

    /// Returns the current size of the channel in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&self) -> StorageResult<u64>;

    /// Syncs all data and metadata to durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync operation fails.
    fn sync(&mut self) -> StorageResult<()>;

    /// Truncates the channel to the given size.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The truncation fails
    /// - `new_size` is greater than current size
    fn truncate(&mut self, new_size: u64) -> StorageResult<()>;

    /// Transfers up to `count` bytes starting at `position` into `target`
    /// at `target_offset`.
    ///
    /// Returns the number of bytes actually moved. A return of `0` means no
    /// progress was made; callers decide whether that is an error. The
    /// default implementation moves as many bytes as are available at
    /// `position`, bounded by `count`, in a single read/write pair.
    ///
    /// # Errors
    ///
    /// Returns an error if reading from `self` or writing to `target` fails.
    fn transfer_to(
        &self,
        position: u64,
        count: u64,
        target: &mut dyn FileChannel,
        target_offset: u64,
    ) -> StorageResult<u64> {
        let size = self.size()?;
        if count == 0 || position >= size {
            return Ok(0);
        }

        let available = count.min(size - position);
        let len = usize::try_from(available).unwrap_or(usize::MAX);
        let data = self.read_at(position, len)?;
        target.write_at(target_offset, &data)?;

        Ok(data.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryChannel;

    #[test]
    fn transfer_copies_prefix() {
        let source = InMemoryChannel::with_data(b"0123456789".to_vec());
        let mut target = InMemoryChannel::new();

        let moved = source.transfer_to(0, 4, &mut target, 0).unwrap();
        assert_eq!(moved, 4);
        assert_eq!(target.data(), b"0123");
    }

    #[test]
    fn transfer_is_bounded_by_source_size() {
        let source = InMemoryChannel::with_data(b"abc".to_vec());
        let mut target = InMemoryChannel::new();

        let moved = source.transfer_to(1, 100, &mut target, 0).unwrap();
        assert_eq!(moved, 2);
        assert_eq!(target.data(), b"bc");
    }

    #[test]
    fn transfer_past_end_makes_no_progress() {
        let source = InMemoryChannel::with_data(b"abc".to_vec());
        let mut target = InMemoryChannel::new();

        assert_eq!(source.transfer_to(3, 10, &mut target, 0).unwrap(), 0);
        assert_eq!(source.transfer_to(0, 0, &mut target, 0).unwrap(), 0);
        assert!(target.data().is_empty());
    }

    #[test]
    fn transfer_writes_at_target_offset() {
        let source = InMemoryChannel::with_data(b"xyz".to_vec());
        let mut target = InMemoryChannel::with_data(b"ab".to_vec());

        source.transfer_to(0, 3, &mut target, 2).unwrap();
        assert_eq!(target.data(), b"abxyz");
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn chunked_transfer_reassembles_source(
                data in prop::collection::vec(any::<u8>(), 0..2048),
                chunk in 1u64..300,
            ) {
                let source = InMemoryChannel::with_data(data.clone());
                let mut target = InMemoryChannel::new();

                let mut written = 0u64;
                loop {
                    let moved = source.transfer_to(written, chunk, &mut target, written).unwrap();
                    prop_assert!(moved <= chunk);
                    if moved == 0 {
                        break;
                    }
                    written += moved;
                }

                prop_assert_eq!(written, data.len() as u64);
                prop_assert_eq!(target.data(), data);
            }
        }
    }
}
