//! Shared scenario vectors for relocation and journal listing.
//!
//! The vectors are plain data so harnesses in other languages can load the
//! same table from JSON and check identical behavior.

use crate::fixtures::{JournalDirKind, CURRENT_FILE_SIZE};
use serde::{Deserialize, Serialize};

/// Where a relocation is pointed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelocationTarget {
    /// No destination at all.
    Missing,
    /// A file inside a directory that does not exist.
    MissingDirectory,
    /// An existing file beside the current index.
    ExistingFile,
    /// The handle's current path.
    CurrentPath,
}

/// What a relocation is expected to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelocationOutcome {
    /// The call fails.
    Error,
    /// The call succeeds and the destination holds this many bytes.
    Copied {
        /// Expected destination size.
        bytes: u64,
    },
    /// The call succeeds without moving anything.
    Unchanged,
}

/// One relocation scenario against a [`CURRENT_FILE_SIZE`]-byte index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelocationVector {
    /// Unique identifier for this vector.
    pub id: String,
    /// Destination kind.
    pub target: RelocationTarget,
    /// The `size_limit` argument.
    pub size_limit: i64,
    /// Expected outcome.
    pub expected: RelocationOutcome,
}

/// Relocation scenarios.
pub fn relocation_vectors() -> Vec<RelocationVector> {
    let size = CURRENT_FILE_SIZE;
    let vector = |id: &str, target, size_limit, expected| RelocationVector {
        id: id.into(),
        target,
        size_limit,
        expected,
    };

    vec![
        vector(
            "null_destination",
            RelocationTarget::Missing,
            0,
            RelocationOutcome::Error,
        ),
        vector(
            "missing_directory",
            RelocationTarget::MissingDirectory,
            i64::MAX,
            RelocationOutcome::Error,
        ),
        vector(
            "full_copy",
            RelocationTarget::ExistingFile,
            i64::MAX,
            RelocationOutcome::Copied { bytes: size },
        ),
        vector(
            "capped_above_size",
            RelocationTarget::ExistingFile,
            size as i64 + 1,
            RelocationOutcome::Copied { bytes: size },
        ),
        vector(
            "truncated_copy",
            RelocationTarget::ExistingFile,
            size as i64 - 1,
            RelocationOutcome::Copied { bytes: size - 1 },
        ),
        vector(
            "negative_size",
            RelocationTarget::ExistingFile,
            -1,
            RelocationOutcome::Copied { bytes: 0 },
        ),
        vector(
            "zero_size",
            RelocationTarget::ExistingFile,
            0,
            RelocationOutcome::Copied { bytes: 0 },
        ),
        vector(
            "same_path",
            RelocationTarget::CurrentPath,
            0,
            RelocationOutcome::Unchanged,
        ),
        vector(
            "same_path_positive_size",
            RelocationTarget::CurrentPath,
            16,
            RelocationOutcome::Unchanged,
        ),
    ]
}

/// Which filter a journal listing uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    /// No filter.
    None,
    /// Accepts ids below 100.
    Rolling,
    /// Accepts ids above 30.
    Above30,
}

impl FilterKind {
    /// Applies the filter to a raw id.
    pub fn accepts(self, id: u64) -> bool {
        match self {
            Self::None => true,
            Self::Rolling => id < 100,
            Self::Above30 => id > 30,
        }
    }
}

/// One journal listing scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalVector {
    /// Unique identifier for this vector.
    pub id: String,
    /// Directory layout, or `None` for a missing path argument.
    pub dir: Option<JournalDirLayout>,
    /// Filter applied.
    pub filter: FilterKind,
    /// Whether the directory listing is returned in reverse order.
    pub reverse_scan: bool,
    /// Expected ids, or `None` if the call fails.
    pub expected: Option<Vec<u64>>,
}

/// Serializable mirror of [`JournalDirKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalDirLayout {
    /// See [`JournalDirKind::NotExisting`].
    NotExisting,
    /// See [`JournalDirKind::Empty`].
    Empty,
    /// See [`JournalDirKind::NoLogFiles`].
    NoLogFiles,
    /// See [`JournalDirKind::OneLogFile`].
    OneLogFile,
    /// See [`JournalDirKind::TwoLogFiles`].
    TwoLogFiles,
}

impl From<JournalDirLayout> for JournalDirKind {
    fn from(layout: JournalDirLayout) -> Self {
        match layout {
            JournalDirLayout::NotExisting => Self::NotExisting,
            JournalDirLayout::Empty => Self::Empty,
            JournalDirLayout::NoLogFiles => Self::NoLogFiles,
            JournalDirLayout::OneLogFile => Self::OneLogFile,
            JournalDirLayout::TwoLogFiles => Self::TwoLogFiles,
        }
    }
}

/// Journal listing scenarios.
pub fn journal_vectors() -> Vec<JournalVector> {
    use JournalDirLayout::*;

    let vector = |id: &str, dir, filter, reverse_scan, expected| JournalVector {
        id: id.into(),
        dir,
        filter,
        reverse_scan,
        expected,
    };

    vec![
        vector("null_path", None, FilterKind::None, false, None),
        vector(
            "not_existing_dir",
            Some(NotExisting),
            FilterKind::Above30,
            false,
            Some(vec![]),
        ),
        vector("empty_dir", Some(Empty), FilterKind::None, false, Some(vec![])),
        vector(
            "no_log_files",
            Some(NoLogFiles),
            FilterKind::Above30,
            false,
            Some(vec![]),
        ),
        vector(
            "one_log_file_rolling",
            Some(OneLogFile),
            FilterKind::Rolling,
            false,
            Some(vec![7]),
        ),
        vector(
            "one_log_file_unfiltered",
            Some(OneLogFile),
            FilterKind::None,
            false,
            Some(vec![7]),
        ),
        vector(
            "one_log_file_filtered_out",
            Some(OneLogFile),
            FilterKind::Above30,
            false,
            Some(vec![]),
        ),
        vector(
            "two_log_files_reverse_scan",
            Some(TwoLogFiles),
            FilterKind::None,
            true,
            Some(vec![1, 2]),
        ),
    ]
}

/// Serializes every vector set as pretty-printed JSON.
pub fn vectors_json() -> serde_json::Result<String> {
    serde_json::to_string_pretty(&serde_json::json!({
        "relocation": relocation_vectors(),
        "journal": journal_vectors(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn vector_ids_are_unique() {
        let mut seen = HashSet::new();
        for v in relocation_vectors() {
            assert!(seen.insert(v.id.clone()), "duplicate {}", v.id);
        }
        for v in journal_vectors() {
            assert!(seen.insert(v.id.clone()), "duplicate {}", v.id);
        }
    }

    #[test]
    fn json_export_parses_back() {
        let json = vectors_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let relocation: Vec<RelocationVector> =
            serde_json::from_value(value["relocation"].clone()).unwrap();
        assert_eq!(relocation.len(), relocation_vectors().len());
        assert_eq!(value["journal"][0]["id"], "null_path");
    }

    #[test]
    fn filters() {
        assert!(FilterKind::Rolling.accepts(7));
        assert!(!FilterKind::Above30.accepts(7));
        assert!(FilterKind::None.accepts(u64::MAX));
    }
}
