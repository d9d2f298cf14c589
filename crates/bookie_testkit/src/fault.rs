//! Deterministic fault injection for [`Vfs`] operations.
//!
//! [`FaultInjectingVfs`] wraps any [`Vfs`] and injects faults on paths
//! matching declarative [`FaultSpec`] rules. Every triggered fault is
//! recorded so tests can assert that the failure path was actually taken.
//!
//! # Example
//!
//! ```rust,ignore
//! use bookie_testkit::fault::{FaultInjectingVfs, FaultSpec};
//!
//! let vfs = FaultInjectingVfs::os();
//! vfs.inject(FaultSpec::transfer_stall("*.idx"));
//! vfs.inject(FaultSpec::remove_failure("current_file.idx"));
//! ```

use bookie_storage::{FileChannel, OpenMode, OsVfs, StorageError, StorageResult, Vfs};
use parking_lot::Mutex;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// The kind of fault to inject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// Channels opened on the path report zero progress from `transfer_to`.
    TransferStall,
    /// `remove_file` fails and leaves the file in place.
    RemoveFailure,
    /// `rename` from the path fails and leaves both entries in place.
    RenameFailure,
    /// `read_dir` of the path lists entries in descending name order.
    ReverseListing,
    /// Opening the existing file fails.
    OpenFailure,
    /// `remove_file` deletes the file but reports it as already missing,
    /// as if another process removed it first.
    RemoveVanished,
    /// `sync_dir` of the path fails.
    SyncDirFailure,
}

/// A fault bound to a path pattern.
///
/// Patterns match against the final path component: `*` matches anything,
/// `*suffix` matches names ending in `suffix`, anything else must equal the
/// name exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultSpec {
    kind: FaultKind,
    pattern: String,
}

impl FaultSpec {
    /// Stalls transfers out of files matching `pattern`.
    pub fn transfer_stall(pattern: impl Into<String>) -> Self {
        Self::new(FaultKind::TransferStall, pattern)
    }

    /// Fails removal of files matching `pattern`.
    pub fn remove_failure(pattern: impl Into<String>) -> Self {
        Self::new(FaultKind::RemoveFailure, pattern)
    }

    /// Fails renames whose source matches `pattern`.
    pub fn rename_failure(pattern: impl Into<String>) -> Self {
        Self::new(FaultKind::RenameFailure, pattern)
    }

    /// Reverses listings of directories matching `pattern`.
    pub fn reverse_listing(pattern: impl Into<String>) -> Self {
        Self::new(FaultKind::ReverseListing, pattern)
    }

    /// Fails opening existing files matching `pattern`.
    pub fn open_failure(pattern: impl Into<String>) -> Self {
        Self::new(FaultKind::OpenFailure, pattern)
    }

    /// Removes files matching `pattern` but reports them as not found.
    pub fn remove_vanished(pattern: impl Into<String>) -> Self {
        Self::new(FaultKind::RemoveVanished, pattern)
    }

    /// Fails directory syncs of directories matching `pattern`.
    pub fn sync_dir_failure(pattern: impl Into<String>) -> Self {
        Self::new(FaultKind::SyncDirFailure, pattern)
    }

    fn new(kind: FaultKind, pattern: impl Into<String>) -> Self {
        Self {
            kind,
            pattern: pattern.into(),
        }
    }

    /// Returns the fault kind.
    pub fn kind(&self) -> FaultKind {
        self.kind
    }

    fn matches(&self, kind: FaultKind, path: &Path) -> bool {
        if self.kind != kind {
            return false;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        match self.pattern.strip_prefix('*') {
            Some(suffix) => name.ends_with(suffix),
            None => name == self.pattern,
        }
    }
}

/// A fault that fired during a test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultRecord {
    /// The kind of fault injected.
    pub kind: FaultKind,
    /// The path it fired on.
    pub path: PathBuf,
}

type FaultLog = Arc<Mutex<Vec<FaultRecord>>>;

fn record(log: &FaultLog, kind: FaultKind, path: &Path) {
    debug!(?kind, path = %path.display(), "injecting fault");
    log.lock().push(FaultRecord {
        kind,
        path: path.to_path_buf(),
    });
}

/// A [`Vfs`] wrapper that injects faults.
pub struct FaultInjectingVfs {
    inner: Arc<dyn Vfs>,
    specs: Mutex<Vec<FaultSpec>>,
    triggered: FaultLog,
}

impl FaultInjectingVfs {
    /// Wraps `inner`.
    pub fn new(inner: Arc<dyn Vfs>) -> Self {
        Self {
            inner,
            specs: Mutex::new(Vec::new()),
            triggered: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Wraps the OS filesystem.
    pub fn os() -> Self {
        Self::new(Arc::new(OsVfs::new()))
    }

    /// Adds a fault rule.
    pub fn inject(&self, spec: FaultSpec) {
        self.specs.lock().push(spec);
    }

    /// Returns every fault that has fired so far.
    pub fn triggered(&self) -> Vec<FaultRecord> {
        self.triggered.lock().clone()
    }

    /// Returns how many faults of `kind` have fired.
    pub fn count(&self, kind: FaultKind) -> usize {
        self.triggered.lock().iter().filter(|r| r.kind == kind).count()
    }

    fn armed(&self, kind: FaultKind, path: &Path) -> bool {
        self.specs.lock().iter().any(|s| s.matches(kind, path))
    }
}

fn injected(op: &'static str, path: &Path) -> StorageError {
    injected_kind(op, path, io::ErrorKind::PermissionDenied)
}

fn injected_kind(op: &'static str, path: &Path, kind: io::ErrorKind) -> StorageError {
    StorageError::path(op, path, io::Error::new(kind, "injected fault"))
}

impl Vfs for FaultInjectingVfs {
    fn open(&self, path: &Path, mode: OpenMode) -> StorageResult<Box<dyn FileChannel>> {
        if mode == OpenMode::Existing && self.armed(FaultKind::OpenFailure, path) {
            record(&self.triggered, FaultKind::OpenFailure, path);
            return Err(injected("open", path));
        }
        let channel = self.inner.open(path, mode)?;
        if self.armed(FaultKind::TransferStall, path) {
            return Ok(Box::new(StallingChannel {
                inner: channel,
                path: path.to_path_buf(),
                log: Arc::clone(&self.triggered),
            }));
        }
        Ok(channel)
    }

    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.inner.is_dir(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> StorageResult<()> {
        if self.armed(FaultKind::RenameFailure, from) {
            record(&self.triggered, FaultKind::RenameFailure, from);
            return Err(injected("rename", from));
        }
        self.inner.rename(from, to)
    }

    fn remove_file(&self, path: &Path) -> StorageResult<()> {
        if self.armed(FaultKind::RemoveFailure, path) {
            record(&self.triggered, FaultKind::RemoveFailure, path);
            return Err(injected("remove", path));
        }
        if self.armed(FaultKind::RemoveVanished, path) {
            record(&self.triggered, FaultKind::RemoveVanished, path);
            self.inner.remove_file(path)?;
            return Err(injected_kind("remove", path, io::ErrorKind::NotFound));
        }
        self.inner.remove_file(path)
    }

    fn create_dir_all(&self, path: &Path) -> StorageResult<()> {
        self.inner.create_dir_all(path)
    }

    fn canonicalize(&self, path: &Path) -> StorageResult<PathBuf> {
        self.inner.canonicalize(path)
    }

    fn read_dir(&self, path: &Path) -> StorageResult<Vec<OsString>> {
        let mut names = self.inner.read_dir(path)?;
        if self.armed(FaultKind::ReverseListing, path) {
            record(&self.triggered, FaultKind::ReverseListing, path);
            names.sort_unstable_by(|a, b| b.cmp(a));
        }
        Ok(names)
    }

    fn sync_dir(&self, path: &Path) -> StorageResult<()> {
        if self.armed(FaultKind::SyncDirFailure, path) {
            record(&self.triggered, FaultKind::SyncDirFailure, path);
            return Err(injected("sync_dir", path));
        }
        self.inner.sync_dir(path)
    }
}

/// A channel whose transfer primitive never makes progress.
struct StallingChannel {
    inner: Box<dyn FileChannel>,
    path: PathBuf,
    log: FaultLog,
}

impl FileChannel for StallingChannel {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        self.inner.read_at(offset, len)
    }

    fn write_at(&mut self, offset: u64, data: &[u8]) -> StorageResult<()> {
        self.inner.write_at(offset, data)
    }

    fn size(&self) -> StorageResult<u64> {
        self.inner.size()
    }

    fn sync(&mut self) -> StorageResult<()> {
        self.inner.sync()
    }

    fn truncate(&mut self, new_size: u64) -> StorageResult<()> {
        self.inner.truncate(new_size)
    }

    fn transfer_to(
        &self,
        _position: u64,
        _count: u64,
        _target: &mut dyn FileChannel,
        _target_offset: u64,
    ) -> StorageResult<u64> {
        record(&self.log, FaultKind::TransferStall, &self.path);
        Ok(0)
    }
}
