//! # Bookie Testkit
//!
//! Test utilities for bookie ledger storage.
//!
//! This crate provides:
//! - Temporary index files and journal directory layouts
//! - A fault-injecting [`Vfs`](bookie_storage::Vfs) for failure paths
//! - Property-based test generators using proptest
//! - Shared scenario vectors, exportable as JSON
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bookie_testkit::prelude::*;
//!
//! #[test]
//! fn relocation_survives_stall() {
//!     let fixture = IndexFixture::new();
//!     let vfs = FaultInjectingVfs::os();
//!     vfs.inject(FaultSpec::transfer_stall("*.idx"));
//!     // ... open an IndexFile over fixture.current with `vfs`
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fault;
pub mod fixtures;
pub mod generators;
pub mod vectors;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fault::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::vectors::*;
}

pub use fault::{FaultInjectingVfs, FaultKind, FaultSpec};
pub use fixtures::*;
pub use vectors::*;
