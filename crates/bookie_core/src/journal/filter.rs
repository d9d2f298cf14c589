//! Predicates over journal ids.

use crate::types::JournalId;

/// Decides which journal ids a listing keeps.
///
/// Any `Fn(JournalId) -> bool` closure is a filter.
pub trait JournalIdFilter {
    /// Returns `true` to keep `id`.
    fn accept(&self, id: JournalId) -> bool;
}

impl<F> JournalIdFilter for F
where
    F: Fn(JournalId) -> bool,
{
    fn accept(&self, id: JournalId) -> bool {
        self(id)
    }
}

/// Accepts every id. Equivalent to passing no filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl JournalIdFilter for AcceptAll {
    fn accept(&self, _id: JournalId) -> bool {
        true
    }
}

/// Accepts journals older than a marked journal.
///
/// Journals strictly below the mark have been fully checkpointed and are
/// candidates for garbage collection.
#[derive(Debug, Clone, Copy)]
pub struct RollingFilter {
    mark: JournalId,
}

impl RollingFilter {
    /// Creates a filter accepting ids below `mark`.
    #[must_use]
    pub const fn new(mark: JournalId) -> Self {
        Self { mark }
    }

    /// Returns the mark.
    #[must_use]
    pub const fn mark(&self) -> JournalId {
        self.mark
    }
}

impl JournalIdFilter for RollingFilter {
    fn accept(&self, id: JournalId) -> bool {
        id < self.mark
    }
}
