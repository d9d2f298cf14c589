//! Integration tests for index file relocation.

use bookie_core::index::{staging_path, CURRENT_HEADER_VERSION};
use bookie_core::{Config, CoreError, IndexFile};
use bookie_testkit::prelude::*;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

fn open(fixture: &IndexFixture) -> IndexFile {
    IndexFile::new(&fixture.current, Vec::new(), CURRENT_HEADER_VERSION)
}

fn open_with(fixture: &IndexFixture, vfs: &Arc<FaultInjectingVfs>) -> IndexFile {
    IndexFile::with_config(
        &fixture.current,
        Vec::new(),
        CURRENT_HEADER_VERSION,
        Config::default(),
        vfs.clone(),
    )
}

fn target_for(fixture: &IndexFixture, target: RelocationTarget) -> Option<PathBuf> {
    match target {
        RelocationTarget::Missing => None,
        RelocationTarget::MissingDirectory => Some(fixture.missing_dir_target()),
        RelocationTarget::ExistingFile => Some(fixture.new_location.clone()),
        RelocationTarget::CurrentPath => Some(fixture.current.clone()),
    }
}

fn assert_untouched(fixture: &IndexFixture, index: &IndexFile) {
    assert_eq!(fs::read(&fixture.current).unwrap(), fixture.original);
    assert_eq!(index.path(), fixture.current);
}

#[test]
fn relocation_vectors_hold() {
    for vector in relocation_vectors() {
        let fixture = IndexFixture::new();
        let index = open(&fixture);
        let target = target_for(&fixture, vector.target);

        let result = index.move_to_new_location(target.as_deref(), vector.size_limit);

        match vector.expected {
            RelocationOutcome::Error => {
                assert!(result.is_err(), "{}: expected failure", vector.id);
                assert_untouched(&fixture, &index);
            }
            RelocationOutcome::Unchanged => {
                assert!(result.is_ok(), "{}: {result:?}", vector.id);
                assert_untouched(&fixture, &index);
            }
            RelocationOutcome::Copied { bytes } => {
                assert!(result.is_ok(), "{}: {result:?}", vector.id);
                let target = target.unwrap();
                let copied = fs::read(&target).unwrap();
                assert_eq!(copied.len() as u64, bytes, "{}", vector.id);
                assert_eq!(copied, &fixture.original[..bytes as usize], "{}", vector.id);
                assert!(!fixture.current.exists(), "{}", vector.id);
                assert!(!staging_path(&target).exists(), "{}", vector.id);
                assert_eq!(index.path(), target, "{}", vector.id);
            }
        }
    }
}

#[test]
fn stalled_transfer_fails_and_cleans_up() {
    let fixture = IndexFixture::new();
    let vfs = Arc::new(FaultInjectingVfs::os());
    vfs.inject(FaultSpec::transfer_stall("current_file.idx"));

    let index = open_with(&fixture, &vfs);
    let err = index
        .move_to_new_location(Some(&fixture.new_location), i64::MAX)
        .unwrap_err();

    match err {
        CoreError::TransferStalled {
            written, expected, ..
        } => {
            assert_eq!(written, 0);
            assert_eq!(expected, CURRENT_FILE_SIZE);
        }
        other => panic!("expected a stalled transfer, got {other:?}"),
    }
    assert_eq!(vfs.count(FaultKind::TransferStall), 1);
    assert!(!staging_path(&fixture.new_location).exists());
    assert_eq!(fs::metadata(&fixture.new_location).unwrap().len(), 0);
    assert_untouched(&fixture, &index);

    // The handle reopens the old file on the next access.
    assert!(!index.is_open());
    assert_eq!(index.size().unwrap(), 0);
    assert!(index.is_open());
}

#[test]
fn empty_relocation_never_transfers() {
    let fixture = IndexFixture::new();
    let vfs = Arc::new(FaultInjectingVfs::os());
    vfs.inject(FaultSpec::transfer_stall("*"));

    let index = open_with(&fixture, &vfs);
    index
        .move_to_new_location(Some(&fixture.new_location), 0)
        .unwrap();

    assert_eq!(vfs.count(FaultKind::TransferStall), 0);
    assert_eq!(fs::metadata(&fixture.new_location).unwrap().len(), 0);
    assert!(!fixture.current.exists());
}

#[test]
fn failed_delete_is_reported() {
    let fixture = IndexFixture::new();
    let vfs = Arc::new(FaultInjectingVfs::os());
    vfs.inject(FaultSpec::remove_failure("current_file.idx"));

    let index = open_with(&fixture, &vfs);
    let err = index
        .move_to_new_location(Some(&fixture.new_location), i64::MAX)
        .unwrap_err();

    match err {
        CoreError::DeleteFailed { path } => assert_eq!(path, fixture.current),
        other => panic!("expected a delete failure, got {other:?}"),
    }
    assert_eq!(vfs.count(FaultKind::RemoveFailure), 1);

    // The copy is already in place; the old file is left behind.
    assert_eq!(fs::read(&fixture.new_location).unwrap(), fixture.original);
    assert!(!staging_path(&fixture.new_location).exists());
    assert_untouched(&fixture, &index);
}

#[test]
fn failed_rename_discards_staging() {
    let fixture = IndexFixture::new();
    let vfs = Arc::new(FaultInjectingVfs::os());
    vfs.inject(FaultSpec::rename_failure("*.rloc"));

    let index = open_with(&fixture, &vfs);
    let err = index
        .move_to_new_location(Some(&fixture.new_location), i64::MAX)
        .unwrap_err();

    assert!(matches!(err, CoreError::RenameFailed { .. }), "{err:?}");
    assert!(err.is_io());
    assert!(!staging_path(&fixture.new_location).exists());
    assert_eq!(fs::metadata(&fixture.new_location).unwrap().len(), 0);
    assert_untouched(&fixture, &index);
}

#[test]
fn relocation_keeps_header_and_data() {
    let fixture = IndexFixture::new();
    let index = open(&fixture);
    index.write(0, b"entry offsets").unwrap();
    assert!(index.set_fenced().unwrap());

    index
        .move_to_new_location(Some(&fixture.new_location), i64::MAX)
        .unwrap();
    index.close(true).unwrap();

    let reopened = IndexFile::new(&fixture.new_location, Vec::new(), CURRENT_HEADER_VERSION);
    assert!(reopened.is_fenced().unwrap());
    assert_eq!(reopened.read(0, 13).unwrap(), b"entry offsets");
}

#[test]
fn repeated_relocation_follows_the_file() {
    let fixture = IndexFixture::new();
    let index = open(&fixture);

    let hops: Vec<PathBuf> = (0..3)
        .map(|i| fixture.dir.path().join(format!("hop-{i}.idx")))
        .collect();
    for hop in &hops {
        index.move_to_new_location(Some(hop), i64::MAX).unwrap();
    }

    assert_eq!(index.path(), hops[2]);
    assert_eq!(fs::read(&hops[2]).unwrap(), fixture.original);
    assert!(!hops[0].exists());
    assert!(!hops[1].exists());
}

#[test]
fn absent_channel_relocates_path_only() {
    let fixture = IndexFixture::new();
    let fresh = fixture.dir.path().join("fresh.idx");
    let index = IndexFile::new(&fresh, Vec::new(), CURRENT_HEADER_VERSION);

    index
        .move_to_new_location(Some(&fixture.new_location), 0)
        .unwrap();

    assert_eq!(index.path(), fixture.new_location);
    assert!(!index.is_open());
    assert!(!fresh.exists());
    assert!(!staging_path(&fixture.new_location).exists());
    assert_eq!(fs::metadata(&fixture.new_location).unwrap().len(), 0);
}

#[test]
fn failed_reopen_keeps_handle_on_destination() {
    let fixture = IndexFixture::new();
    let vfs = Arc::new(FaultInjectingVfs::os());
    vfs.inject(FaultSpec::open_failure("new_location_file.idx"));

    let index = open_with(&fixture, &vfs);
    assert!(index
        .move_to_new_location(Some(&fixture.new_location), i64::MAX)
        .is_err());

    assert_eq!(vfs.count(FaultKind::OpenFailure), 1);
    assert!(!fixture.current.exists());
    assert_eq!(fs::read(&fixture.new_location).unwrap(), fixture.original);
    assert_eq!(index.path(), fixture.new_location);
    assert!(!index.is_open());

    // A later write must not recreate the old file.
    assert!(index.write(0, b"kept").is_err());
    assert!(!fixture.current.exists());
}

#[test]
fn vanished_old_file_counts_as_deleted() {
    let fixture = IndexFixture::new();
    let vfs = Arc::new(FaultInjectingVfs::os());
    vfs.inject(FaultSpec::remove_vanished("current_file.idx"));

    let index = open_with(&fixture, &vfs);
    index
        .move_to_new_location(Some(&fixture.new_location), i64::MAX)
        .unwrap();

    assert_eq!(vfs.count(FaultKind::RemoveVanished), 1);
    assert!(!fixture.current.exists());
    assert_eq!(fs::read(&fixture.new_location).unwrap(), fixture.original);
    assert_eq!(index.path(), fixture.new_location);
    assert!(index.is_open());
}

#[test]
fn directory_sync_failure_does_not_fail_relocation() {
    let fixture = IndexFixture::new();
    let vfs = Arc::new(FaultInjectingVfs::os());
    vfs.inject(FaultSpec::sync_dir_failure("*"));

    let index = open_with(&fixture, &vfs);
    index
        .move_to_new_location(Some(&fixture.new_location), i64::MAX)
        .unwrap();

    assert_eq!(vfs.count(FaultKind::SyncDirFailure), 1);
    assert_eq!(index.path(), fixture.new_location);
    assert_eq!(fs::read(&fixture.new_location).unwrap(), fixture.original);
}

#[test]
fn negative_limit_then_write_reopens_cleanly() {
    let fixture = IndexFixture::new();
    let index = open(&fixture);

    index
        .move_to_new_location(Some(&fixture.new_location), -1)
        .unwrap();
    assert_eq!(fs::metadata(&fixture.new_location).unwrap().len(), 0);

    index.write(0, b"abc").unwrap();
    index.close(true).unwrap();

    let reopened = IndexFile::new(&fixture.new_location, Vec::new(), CURRENT_HEADER_VERSION);
    assert_eq!(reopened.read(0, 3).unwrap(), b"abc");
}
