//! Error types for bookie core.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in ledger index and journal operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage layer error.
    #[error("storage error: {0}")]
    Storage(#[from] bookie_storage::StorageError),

    /// A required argument was missing or malformed.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the problem.
        message: String,
    },

    /// The parent directory of a relocation target does not exist.
    #[error("parent directory does not exist: {}", path.display())]
    MissingParent {
        /// The missing directory.
        path: PathBuf,
    },

    /// The transfer primitive stopped making progress.
    #[error("copying to {} stalled after {written} of {expected} bytes", path.display())]
    TransferStalled {
        /// The staging file being written.
        path: PathBuf,
        /// Bytes copied before the stall.
        written: u64,
        /// Bytes that should have been copied.
        expected: u64,
    },

    /// The previous backing file could not be removed after relocation.
    #[error("failed to delete the previous index file {}", path.display())]
    DeleteFailed {
        /// The file that is still present.
        path: PathBuf,
    },

    /// The staging file could not be renamed over the destination.
    #[error("failed to rename {} to {}: {source}", from.display(), to.display())]
    RenameFailed {
        /// The staging file.
        from: PathBuf,
        /// The relocation destination.
        to: PathBuf,
        /// The underlying failure.
        #[source]
        source: bookie_storage::StorageError,
    },

    /// The index header is missing, truncated or unsupported.
    #[error("invalid index header: {message}")]
    InvalidHeader {
        /// Description of the header issue.
        message: String,
    },

    /// The index file was deleted through this handle.
    #[error("index file has been deleted: {}", path.display())]
    FileDeleted {
        /// Path the handle referenced when it was deleted.
        path: PathBuf,
    },

    /// The index file has not been written to disk yet.
    #[error("index file does not exist: {}", path.display())]
    NotMaterialized {
        /// Path the handle references.
        path: PathBuf,
    },
}

impl CoreError {
    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates an invalid header error.
    pub fn invalid_header(message: impl Into<String>) -> Self {
        Self::InvalidHeader {
            message: message.into(),
        }
    }

    /// Returns `true` for failures raised by a filesystem operation, as
    /// opposed to bad arguments, bad file contents or handle state.
    #[must_use]
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            Self::Storage(_)
                | Self::MissingParent { .. }
                | Self::TransferStalled { .. }
                | Self::DeleteFailed { .. }
                | Self::RenameFailed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argument_errors_are_not_io() {
        assert!(!CoreError::invalid_argument("missing path").is_io());
        assert!(CoreError::DeleteFailed {
            path: PathBuf::from("0.idx")
        }
        .is_io());
        assert!(CoreError::Storage(bookie_storage::StorageError::ReadPastEnd {
            offset: 0,
            len: 1,
            size: 0
        })
        .is_io());
    }

    #[test]
    fn content_and_state_errors_are_not_io() {
        assert!(!CoreError::invalid_header("bad signature").is_io());
        assert!(!CoreError::FileDeleted {
            path: PathBuf::from("0.idx")
        }
        .is_io());
        assert!(!CoreError::NotMaterialized {
            path: PathBuf::from("0.idx")
        }
        .is_io());
    }

    #[test]
    fn messages_name_the_path() {
        let err = CoreError::TransferStalled {
            path: PathBuf::from("/ledgers/1.idx.rloc"),
            written: 0,
            expected: 1024,
        };
        let msg = err.to_string();
        assert!(msg.contains("/ledgers/1.idx.rloc"));
        assert!(msg.contains("0 of 1024"));
    }
}
