//! Ledger index file header.
//!
//! ```text
//! offset 0   SIGNATURE          u32 BE  "BKLE"
//!        4   header version     u32 BE
//!        8   master key length  u32 BE
//!       12   master key         [u8; len]
//!   12+len   state word         u32 BE
//! ```
//!
//! Entry data starts at [`START_OF_DATA`], or right after the header when
//! the master key is too long to fit below it.

use crate::error::{CoreError, CoreResult};
use bookie_storage::FileChannel;

/// Magic number at the start of every index file.
pub const SIGNATURE: u32 = u32::from_be_bytes(*b"BKLE");

/// Newest header version this crate reads and writes.
pub const CURRENT_HEADER_VERSION: u32 = 1;

/// Offset at which entry data starts for headers that fit below it.
pub const START_OF_DATA: u64 = 1024;

/// State word bit recording that the ledger is fenced.
pub const STATE_FENCED_BIT: u32 = 0x1;

/// Header bytes excluding the master key.
const FIXED_HEADER_LEN: usize = 16;

/// Largest master key the header can describe.
const MAX_MASTER_KEY_LEN: usize = i32::MAX as usize;

/// Decoded index file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexHeader {
    /// Header format version.
    pub version: u32,
    /// Opaque master key blob.
    pub master_key: Vec<u8>,
    /// State bits (see [`STATE_FENCED_BIT`]).
    pub state: u32,
}

impl IndexHeader {
    /// Creates a header with a zeroed state word.
    #[must_use]
    pub fn new(version: u32, master_key: Vec<u8>) -> Self {
        Self {
            version,
            master_key,
            state: 0,
        }
    }

    /// Returns the encoded header size in bytes.
    #[must_use]
    pub fn encoded_len(&self) -> u64 {
        (FIXED_HEADER_LEN + self.master_key.len()) as u64
    }

    /// Returns the file offset of the first data byte.
    #[must_use]
    pub fn data_offset(&self) -> u64 {
        self.encoded_len().max(START_OF_DATA)
    }

    /// Returns whether the fenced bit is set.
    #[must_use]
    pub fn is_fenced(&self) -> bool {
        self.state & STATE_FENCED_BIT != 0
    }

    /// Encodes the header to bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the master key is too long to be described by
    /// the length field.
    pub fn encode(&self) -> CoreResult<Vec<u8>> {
        if self.master_key.len() > MAX_MASTER_KEY_LEN {
            return Err(CoreError::invalid_header(format!(
                "master key of {} bytes is too long",
                self.master_key.len()
            )));
        }

        let mut buf = Vec::with_capacity(FIXED_HEADER_LEN + self.master_key.len());
        buf.extend_from_slice(&SIGNATURE.to_be_bytes());
        buf.extend_from_slice(&self.version.to_be_bytes());
        buf.extend_from_slice(&(self.master_key.len() as u32).to_be_bytes());
        buf.extend_from_slice(&self.master_key);
        buf.extend_from_slice(&self.state.to_be_bytes());
        Ok(buf)
    }

    /// Decodes a header from the start of `data`. Trailing bytes are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the signature is wrong, the version is newer than
    /// [`CURRENT_HEADER_VERSION`] or `data` is too short.
    pub fn decode(data: &[u8]) -> CoreResult<Self> {
        let (version, key_len) = Self::decode_prefix(data)?;

        let key_end = 12 + key_len;
        if data.len() < key_end + 4 {
            return Err(CoreError::invalid_header("header too short"));
        }
        let master_key = data[12..key_end].to_vec();
        let state = read_u32(data, key_end);

        Ok(Self {
            version,
            master_key,
            state,
        })
    }

    /// Reads and decodes the header at offset 0 of `channel`.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel is shorter than the header it
    /// describes or the header is invalid.
    pub fn read_from(channel: &dyn FileChannel) -> CoreResult<Self> {
        let size = channel.size()?;
        if size < FIXED_HEADER_LEN as u64 {
            return Err(CoreError::invalid_header(format!(
                "file of {size} bytes cannot hold a header"
            )));
        }

        let prefix = channel.read_at(0, 12)?;
        let (_, key_len) = Self::decode_prefix(&prefix)?;
        let total = FIXED_HEADER_LEN as u64 + key_len as u64;
        if size < total {
            return Err(CoreError::invalid_header(format!(
                "header needs {total} bytes but file has {size}"
            )));
        }

        let data = channel.read_at(0, total as usize)?;
        Self::decode(&data)
    }

    /// Writes the encoded header at offset 0 of `channel`.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the write fails.
    pub fn write_to(&self, channel: &mut dyn FileChannel) -> CoreResult<()> {
        let data = self.encode()?;
        channel.write_at(0, &data)?;
        Ok(())
    }

    fn decode_prefix(data: &[u8]) -> CoreResult<(u32, usize)> {
        if data.len() < 12 {
            return Err(CoreError::invalid_header("header too short"));
        }

        let signature = read_u32(data, 0);
        if signature != SIGNATURE {
            return Err(CoreError::invalid_header(format!(
                "missing ledger signature, found {signature:08x}"
            )));
        }

        let version = read_u32(data, 4);
        if version > CURRENT_HEADER_VERSION {
            return Err(CoreError::invalid_header(format!(
                "unsupported header version: {version}"
            )));
        }

        let key_len = read_u32(data, 8) as usize;
        if key_len > MAX_MASTER_KEY_LEN {
            return Err(CoreError::invalid_header(format!(
                "master key length {key_len} is out of range"
            )));
        }

        Ok((version, key_len))
    }
}

fn read_u32(data: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}
