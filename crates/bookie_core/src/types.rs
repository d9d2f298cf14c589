//! Core type definitions.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Identifier of a journal segment.
///
/// Journal ids are written as unpadded lowercase hexadecimal, which is also
/// the stem of the segment's file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JournalId(pub u64);

impl JournalId {
    /// Creates a new journal ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for JournalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}", self.0)
    }
}

impl FromStr for JournalId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        u64::from_str_radix(s, 16).map(Self)
    }
}

impl From<u64> for JournalId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}
