//! Index file configuration.

/// Default upper bound on bytes moved by one transfer call.
pub const DEFAULT_TRANSFER_CHUNK_SIZE: usize = 64 * 1024;

/// Configuration for index file handles.
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether to fsync the staging file before renaming it into place.
    pub sync_on_relocate: bool,

    /// Whether to fsync the destination directory after a relocation.
    pub sync_directory: bool,

    /// Maximum number of bytes requested from a single transfer call.
    pub transfer_chunk_size: usize,

    /// Whether to create a missing destination parent directory instead of
    /// failing the relocation.
    pub create_missing_parents: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sync_on_relocate: true,
            sync_directory: true,
            transfer_chunk_size: DEFAULT_TRANSFER_CHUNK_SIZE,
            create_missing_parents: false,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to fsync the staging file before rename.
    #[must_use]
    pub const fn sync_on_relocate(mut self, value: bool) -> Self {
        self.sync_on_relocate = value;
        self
    }

    /// Sets whether to fsync the destination directory.
    #[must_use]
    pub const fn sync_directory(mut self, value: bool) -> Self {
        self.sync_directory = value;
        self
    }

    /// Sets the transfer chunk size. Zero is treated as one byte.
    #[must_use]
    pub const fn transfer_chunk_size(mut self, size: usize) -> Self {
        self.transfer_chunk_size = size;
        self
    }

    /// Sets whether to create missing destination parents.
    #[must_use]
    pub const fn create_missing_parents(mut self, value: bool) -> Self {
        self.create_missing_parents = value;
        self
    }
}
