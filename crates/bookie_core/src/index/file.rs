//! Handle over a single ledger index file.

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::index::header::{IndexHeader, STATE_FENCED_BIT};
use bookie_storage::{FileChannel, OpenMode, OsVfs, Vfs};
use parking_lot::Mutex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Suffix appended to a relocation destination to name its staging file.
pub const RELOCATION_SUFFIX: &str = ".rloc";

/// Returns the staging path used while relocating to `destination`.
#[must_use]
pub fn staging_path(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_os_string();
    name.push(RELOCATION_SUFFIX);
    PathBuf::from(name)
}

/// Returns how many bytes a relocation copies from a file of
/// `current_size` bytes when asked for at most `size_limit` bytes.
#[must_use]
pub fn relocation_copy_len(size_limit: i64, current_size: u64) -> u64 {
    u64::try_from(size_limit).map_or(0, |limit| limit.min(current_size))
}

/// An open ledger index file.
///
/// The handle owns the path currently backing the index, the decoded
/// header and, once the file exists on disk, a channel over it. The channel
/// is opened lazily: constructing a handle never touches the filesystem.
///
/// All filesystem work goes through the handle's [`Vfs`], so tests can
/// substitute one that injects faults.
///
/// # Thread Safety
///
/// Mutable state sits behind a mutex; concurrent calls on one handle are
/// serialized.
///
/// # Example
///
/// ```rust,ignore
/// use bookie_core::IndexFile;
///
/// let index = IndexFile::new("ledgers/0/1.idx", b"key".to_vec(), 1);
/// index.write(0, b"entry offsets")?;
/// index.move_to_new_location(Some(Path::new("ledgers/1/1.idx")), i64::MAX)?;
/// ```
pub struct IndexFile {
    vfs: Arc<dyn Vfs>,
    config: Config,
    inner: Mutex<Inner>,
}

struct Inner {
    path: PathBuf,
    channel: Option<Box<dyn FileChannel>>,
    header: IndexHeader,
    /// The file on disk is shorter than the header; it is rewritten by the
    /// next creating access.
    header_pending: bool,
    deleted: bool,
}

impl IndexFile {
    /// Creates a handle over `path` on the OS filesystem with default
    /// configuration.
    pub fn new(path: impl Into<PathBuf>, master_key: Vec<u8>, header_version: u32) -> Self {
        Self::with_config(
            path,
            master_key,
            header_version,
            Config::default(),
            Arc::new(OsVfs::new()),
        )
    }

    /// Creates a handle with an explicit configuration and filesystem.
    pub fn with_config(
        path: impl Into<PathBuf>,
        master_key: Vec<u8>,
        header_version: u32,
        config: Config,
        vfs: Arc<dyn Vfs>,
    ) -> Self {
        Self {
            vfs,
            config,
            inner: Mutex::new(Inner {
                path: path.into(),
                channel: None,
                header: IndexHeader::new(header_version, master_key),
                header_pending: false,
                deleted: false,
            }),
        }
    }

    /// Returns the path currently backing this handle.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.inner.lock().path.clone()
    }

    /// Returns the master key.
    ///
    /// After the file has been opened this is the key stored on disk.
    #[must_use]
    pub fn master_key(&self) -> Vec<u8> {
        self.inner.lock().header.master_key.clone()
    }

    /// Returns the header version.
    #[must_use]
    pub fn header_version(&self) -> u32 {
        self.inner.lock().header.version
    }

    /// Returns whether a channel is currently open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.inner.lock().channel.is_some()
    }

    /// Writes the header, creating the file if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    pub fn flush_header(&self) -> CoreResult<()> {
        let mut inner = self.inner.lock();
        self.check_open(&mut inner, true)?;
        Self::write_header(&mut inner)
    }

    /// Returns the number of data bytes stored after the header.
    ///
    /// A file that has not been materialized has size zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn size(&self) -> CoreResult<u64> {
        let mut inner = self.inner.lock();
        self.check_open(&mut inner, false)?;

        let data_offset = inner.header.data_offset();
        match inner.channel.as_deref() {
            Some(channel) => Ok(channel.size()?.saturating_sub(data_offset)),
            None => Ok(0),
        }
    }

    /// Writes `data` at data-region `position`, creating the file if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    pub fn write(&self, position: u64, data: &[u8]) -> CoreResult<()> {
        let mut inner = self.inner.lock();
        self.check_open(&mut inner, true)?;

        let inner = &mut *inner;
        let offset = inner.header.data_offset() + position;
        match inner.channel.as_deref_mut() {
            Some(channel) => channel.write_at(offset, data)?,
            None => {
                return Err(CoreError::NotMaterialized {
                    path: inner.path.clone(),
                })
            }
        }
        Ok(())
    }

    /// Reads `len` bytes at data-region `position`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or the range is past the
    /// end of the file.
    pub fn read(&self, position: u64, len: usize) -> CoreResult<Vec<u8>> {
        let mut inner = self.inner.lock();
        self.check_open(&mut inner, false)?;

        let offset = inner.header.data_offset() + position;
        match inner.channel.as_deref() {
            Some(channel) => Ok(channel.read_at(offset, len)?),
            None => Err(CoreError::NotMaterialized {
                path: inner.path.clone(),
            }),
        }
    }

    /// Returns whether the ledger has been fenced.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn is_fenced(&self) -> CoreResult<bool> {
        let mut inner = self.inner.lock();
        self.check_open(&mut inner, false)?;
        Ok(inner.header.is_fenced())
    }

    /// Marks the ledger as fenced and persists the header.
    ///
    /// Returns `true` if the ledger was not fenced before.
    ///
    /// # Errors
    ///
    /// Returns an error if the header cannot be written.
    pub fn set_fenced(&self) -> CoreResult<bool> {
        let mut inner = self.inner.lock();
        self.check_open(&mut inner, true)?;

        if inner.header.is_fenced() {
            return Ok(false);
        }
        inner.header.state |= STATE_FENCED_BIT;
        Self::write_header(&mut inner)?;
        Ok(true)
    }

    /// Closes the channel. With `force`, pending data is synced first.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync fails; the channel is closed regardless.
    pub fn close(&self, force: bool) -> CoreResult<()> {
        let mut inner = self.inner.lock();
        if let Some(mut channel) = inner.channel.take() {
            if force {
                channel.sync()?;
            }
        }
        Ok(())
    }

    /// Closes the handle and removes its backing file.
    ///
    /// Returns whether a file was removed. Every later operation on the
    /// handle fails with [`CoreError::FileDeleted`].
    pub fn delete(&self) -> bool {
        let mut inner = self.inner.lock();
        inner.deleted = true;
        inner.channel = None;
        self.remove_backing_file(&inner.path)
    }

    /// Moves the backing file to `destination`, keeping at most
    /// `size_limit` bytes of it.
    ///
    /// The copy is staged in `<destination>.rloc`, renamed over
    /// `destination`, and only then is the old file removed. A negative
    /// `size_limit` copies nothing; a limit at or above the current size
    /// copies the whole file.
    ///
    /// Relocating onto the current path is a no-op, as is relocating a
    /// handle whose file has not been written yet (apart from the path
    /// update).
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidArgument`] if `destination` is `None`, or if its
    ///   staging path is the current file
    /// - [`CoreError::MissingParent`] if the destination directory is missing
    /// - [`CoreError::TransferStalled`] if the copy stops making progress
    /// - [`CoreError::RenameFailed`] if the staging file cannot be renamed
    /// - [`CoreError::DeleteFailed`] if the old file survives the relocation;
    ///   the destination is already in place and the handle still points at
    ///   the old path
    pub fn move_to_new_location(
        &self,
        destination: Option<&Path>,
        size_limit: i64,
    ) -> CoreResult<()> {
        let Some(destination) = destination else {
            return Err(CoreError::invalid_argument(
                "relocation destination must be provided",
            ));
        };

        let mut inner = self.inner.lock();
        self.check_open(&mut inner, false)?;

        if self.is_same_file(&inner.path, destination) {
            debug!(path = %inner.path.display(), "relocation target is the current file");
            return Ok(());
        }

        let parent = parent_dir(destination);
        if !self.vfs.is_dir(parent) {
            if !self.config.create_missing_parents {
                return Err(CoreError::MissingParent {
                    path: parent.to_path_buf(),
                });
            }
            self.vfs.create_dir_all(parent)?;
        }

        let staging = staging_path(destination);
        let materialized = inner.channel.is_some() || inner.header_pending;
        if materialized && self.is_same_file(&inner.path, &staging) {
            return Err(CoreError::invalid_argument(format!(
                "staging file {} is the current index file",
                staging.display()
            )));
        }

        let source = match inner.channel.take() {
            Some(channel) => channel,
            None if inner.header_pending => self.vfs.open(&inner.path, OpenMode::Existing)?,
            None => {
                debug!(
                    from = %inner.path.display(),
                    to = %destination.display(),
                    "index file not materialized, relocating path only"
                );
                inner.path = destination.to_path_buf();
                return Ok(());
            }
        };

        let current_size = source.size()?;
        let len = relocation_copy_len(size_limit, current_size);
        debug!(
            from = %inner.path.display(),
            staging = %staging.display(),
            len,
            current_size,
            "staging index relocation"
        );

        // Steady -> Staging. From here until the rename the old channel is
        // closed on failure and reopened lazily by the next access.
        self.stage_copy(&*source, &staging, len)?;
        drop(source);

        // Staging -> Renamed
        if let Err(source) = self.vfs.rename(&staging, destination) {
            error!(
                from = %staging.display(),
                to = %destination.display(),
                error = %source,
                "failed to rename staged index file"
            );
            self.discard_staging(&staging);
            return Err(CoreError::RenameFailed {
                from: staging,
                to: destination.to_path_buf(),
                source,
            });
        }

        // Renamed -> Finalized. A previous file that is already gone counts
        // as deleted.
        let previous = inner.path.clone();
        if !self.remove_backing_file(&previous) && self.vfs.exists(&previous) {
            error!(path = %previous.display(), "failed to delete the previous index file");
            return Err(CoreError::DeleteFailed { path: previous });
        }

        // The path moves first so a failed reopen leaves the handle on the
        // relocated file, to be reopened lazily. A copy too short to hold a
        // header stays closed until the next write restores the header.
        inner.path = destination.to_path_buf();
        inner.header_pending = len < inner.header.encoded_len();
        if !inner.header_pending {
            inner.channel = Some(self.vfs.open(destination, OpenMode::Existing)?);
        }

        if self.config.sync_directory {
            if let Err(e) = self.vfs.sync_dir(parent) {
                warn!(path = %parent.display(), error = %e, "failed to sync index directory");
            }
        }

        info!(
            from = %previous.display(),
            to = %destination.display(),
            bytes = len,
            "relocated index file"
        );
        Ok(())
    }

    /// Copies the first `len` bytes of `source` into a fresh staging file.
    /// On failure the staging file is removed.
    fn stage_copy(&self, source: &dyn FileChannel, staging: &Path, len: u64) -> CoreResult<()> {
        let mut target = self.vfs.open(staging, OpenMode::CreateTruncate)?;

        let result = self
            .transfer_prefix(source, target.as_mut(), staging, len)
            .and_then(|()| {
                if self.config.sync_on_relocate {
                    target.sync()?;
                }
                Ok(())
            });
        drop(target);

        if result.is_err() {
            self.discard_staging(staging);
        }
        result
    }

    fn transfer_prefix(
        &self,
        source: &dyn FileChannel,
        target: &mut dyn FileChannel,
        staging: &Path,
        len: u64,
    ) -> CoreResult<()> {
        let chunk = self.config.transfer_chunk_size.max(1) as u64;
        let mut written = 0u64;

        while written < len {
            let count = (len - written).min(chunk);
            let moved = source.transfer_to(written, count, target, written)?;
            if moved == 0 {
                warn!(
                    staging = %staging.display(),
                    written,
                    expected = len,
                    "index transfer made no progress"
                );
                return Err(CoreError::TransferStalled {
                    path: staging.to_path_buf(),
                    written,
                    expected: len,
                });
            }
            written += moved;
        }

        Ok(())
    }

    fn discard_staging(&self, staging: &Path) {
        if let Err(e) = self.vfs.remove_file(staging) {
            if !e.is_not_found() {
                warn!(path = %staging.display(), error = %e, "failed to remove staging file");
            }
        }
    }

    fn remove_backing_file(&self, path: &Path) -> bool {
        match self.vfs.remove_file(path) {
            Ok(()) => true,
            Err(e) => {
                if !e.is_not_found() {
                    warn!(path = %path.display(), error = %e, "failed to remove index file");
                }
                false
            }
        }
    }

    /// Opens the channel if the file exists, or creates it (with a fresh
    /// header) when `create` is set. Leaves the channel absent otherwise.
    fn check_open(&self, inner: &mut Inner, create: bool) -> CoreResult<()> {
        if inner.deleted {
            return Err(CoreError::FileDeleted {
                path: inner.path.clone(),
            });
        }
        if inner.channel.is_some() {
            return Ok(());
        }

        if inner.header_pending {
            if !create {
                return Ok(());
            }
            inner.channel = Some(self.vfs.open(&inner.path, OpenMode::Create)?);
            inner.header_pending = false;
            return Self::write_header(inner);
        }

        if !self.vfs.exists(&inner.path) {
            if !create {
                return Ok(());
            }
            inner.channel = Some(self.vfs.open(&inner.path, OpenMode::Create)?);
            return Self::write_header(inner);
        }

        let channel = self.vfs.open(&inner.path, OpenMode::Existing)?;
        if channel.size()? == 0 {
            inner.channel = Some(channel);
            return Self::write_header(inner);
        }

        inner.header = IndexHeader::read_from(&*channel)?;
        inner.channel = Some(channel);
        Ok(())
    }

    fn write_header(inner: &mut Inner) -> CoreResult<()> {
        let Inner {
            channel, header, ..
        } = inner;
        match channel.as_deref_mut() {
            Some(channel) => header.write_to(channel),
            None => Ok(()),
        }
    }

    fn is_same_file(&self, current: &Path, destination: &Path) -> bool {
        if current == destination {
            return true;
        }
        match (self.resolve(current), self.resolve(destination)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Canonical form of `path`; for a missing file, its canonical parent
    /// joined with the file name.
    fn resolve(&self, path: &Path) -> Option<PathBuf> {
        if self.vfs.exists(path) {
            return self.vfs.canonicalize(path).ok();
        }
        let name = path.file_name()?;
        self.vfs
            .canonicalize(parent_dir(path))
            .ok()
            .map(|parent| parent.join(name))
    }
}

impl fmt::Debug for IndexFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("IndexFile")
            .field("path", &inner.path)
            .field("open", &inner.channel.is_some())
            .field("header_version", &inner.header.version)
            .field("deleted", &inner.deleted)
            .finish_non_exhaustive()
    }
}

/// Directory containing `path`; `.` for bare file names.
fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}
