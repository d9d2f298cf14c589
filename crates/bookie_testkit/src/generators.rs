//! Property-based test generators using proptest.
//!
//! Provides strategies for journal directory contents and relocation
//! arguments.

use bookie_core::journal::journal_file_name;
use bookie_core::JournalId;
use proptest::prelude::*;

/// Strategy for generating journal ids.
///
/// Mostly small ids so collisions and ordering across digit counts show up,
/// with the occasional full-width id.
pub fn journal_id_strategy() -> impl Strategy<Value = JournalId> {
    prop_oneof![
        4 => (0u64..4096).prop_map(JournalId::new),
        1 => any::<u64>().prop_map(JournalId::new),
    ]
}

/// Strategy for generating a set of journal ids, possibly with duplicates.
pub fn journal_ids_strategy(max_len: usize) -> impl Strategy<Value = Vec<JournalId>> {
    prop::collection::vec(journal_id_strategy(), 0..max_len)
}

/// Strategy for generating directory entries that must never list as
/// journals.
pub fn non_journal_name_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        // Wrong extension
        "[0-9a-f]{1,8}\\.(log|idx|TXN|tx|txnn)",
        // Journal name with a trailing suffix
        "[0-9a-f]{1,8}\\.txn\\.(rloc|tmp|bak)",
        // Non-hex stem
        "[g-z][0-9a-z]{0,7}\\.txn",
        // No extension
        "[a-zA-Z][a-zA-Z0-9_]{0,15}",
        // Stem too wide for 64 bits
        "[1-9a-f][0-9a-f]{16,20}\\.txn",
    ]
    .prop_filter("must not equal a journal name", |name| {
        bookie_core::journal::parse_journal_file_name(name).is_none()
    })
}

/// Strategy for the `size_limit` argument of a relocation.
///
/// Biased toward the edges: negative, zero, near `current_size`, and huge.
pub fn size_limit_strategy(current_size: u64) -> impl Strategy<Value = i64> {
    let size = i64::try_from(current_size).unwrap_or(i64::MAX);
    prop_oneof![
        1 => i64::MIN..0,
        1 => Just(0i64),
        3 => 0..=size.saturating_add(1),
        1 => Just(i64::MAX),
    ]
}

/// Strategy for index file lengths, always long enough to hold a header
/// with an empty master key.
pub fn index_len_strategy() -> impl Strategy<Value = usize> {
    16usize..8192
}

/// A journal directory to materialize: file names and the ids among them.
#[derive(Debug, Clone)]
pub struct JournalDirContents {
    /// Every file name to create.
    pub names: Vec<String>,
    /// Ids of the journal files in `names`.
    pub ids: Vec<JournalId>,
}

/// Strategy for a mixed journal directory.
pub fn journal_dir_strategy() -> impl Strategy<Value = JournalDirContents> {
    (
        journal_ids_strategy(32),
        prop::collection::vec(non_journal_name_strategy(), 0..8),
    )
        .prop_map(|(ids, noise)| {
            let mut names: Vec<String> = ids.iter().copied().map(journal_file_name).collect();
            names.extend(noise);
            names.sort_unstable();
            names.dedup();
            JournalDirContents { names, ids }
        })
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropertyTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropertyTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropertyTestConfig {
    /// Creates a quick configuration for filesystem-heavy properties.
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to a proptest configuration.
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
