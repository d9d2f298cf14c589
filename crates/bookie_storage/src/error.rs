//! Error types for storage operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Attempted to read beyond the end of the channel.
    #[error("read beyond end of channel: offset {offset}, len {len}, size {size}")]
    ReadPastEnd {
        /// The requested read offset.
        offset: u64,
        /// The requested read length.
        len: usize,
        /// The current channel size.
        size: u64,
    },

    /// A path-level operation failed on the given path.
    #[error("{op} failed for {}: {source}", path.display())]
    Path {
        /// Name of the failed operation (`open`, `rename`, ...).
        op: &'static str,
        /// The path the operation was applied to.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },
}

impl StorageError {
    /// Wraps an I/O error with the operation and path it came from.
    pub fn path(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Path {
            op,
            path: path.into(),
            source,
        }
    }

    /// Returns `true` if the underlying cause is a missing file or directory.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Io(e) | Self::Path { source: e, .. } => e.kind() == io::ErrorKind::NotFound,
            Self::ReadPastEnd { .. } => false,
        }
    }
}
