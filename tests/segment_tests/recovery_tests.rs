//! Tests for SegmentRecovery
//!
//! These tests verify:
//! - Replay visits every record in offset order
//! - The write offset is reset to the live length
//! - Corrupt records are skipped and counted
//! - Records the index rejects are skipped, other errors abort
//! - A broken header clears the rest of the segment

use std::fs::OpenOptions;
use std::io::{Seek, SeekFrom, Write};
use std::path::PathBuf;

use caskkv::segment::{DataType, Entry, Op, SegmentFile, SegmentRecovery};
use caskkv::CaskError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

const CAPACITY: u64 = 4096;

fn setup_temp_dir() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().to_path_buf();
    (temp_dir, path)
}

/// Write `count` Set records and close the file; returns them with offsets
fn write_segment(dir: &PathBuf, count: usize) -> Vec<(u64, Entry)> {
    let mut file = SegmentFile::open(dir, 0, DataType::Str, CAPACITY).unwrap();
    let mut written = Vec::new();
    for i in 0..count {
        let entry = Entry::new(Op::Set, format!("key{}", i), format!("value{}", i));
        let offset = file.write(&entry).unwrap();
        written.push((offset, entry));
    }
    file.close(true).unwrap();
    written
}

// =============================================================================
// Replay Tests
// =============================================================================

#[test]
fn test_replay_empty_segment() {
    let (_temp, dir) = setup_temp_dir();
    let mut file = SegmentFile::open(&dir, 0, DataType::Str, CAPACITY).unwrap();

    let result = SegmentRecovery::replay(&mut file, |_, _| Ok(())).unwrap();

    assert_eq!(result.entries_recovered, 0);
    assert_eq!(result.entries_corrupted, 0);
    assert_eq!(result.segments_scanned, 1);
    assert_eq!(file.write_offset(), 0);
}

#[test]
fn test_replay_visits_records_in_order() {
    let (_temp, dir) = setup_temp_dir();
    let written = write_segment(&dir, 10);

    let mut file = SegmentFile::open(&dir, 0, DataType::Str, CAPACITY).unwrap();
    let mut seen = Vec::new();
    let result = SegmentRecovery::replay(&mut file, |entry, offset| {
        seen.push((offset, entry));
        Ok(())
    })
    .unwrap();

    assert_eq!(result.entries_recovered, 10);
    assert_eq!(seen, written);

    let (last_offset, last) = written.last().unwrap();
    assert_eq!(file.write_offset(), last_offset + last.size());
}

#[test]
fn test_replay_skips_crc_failure() {
    let (_temp, dir) = setup_temp_dir();
    let written = write_segment(&dir, 3);

    // Flip the last value byte of the middle record
    let (offset, entry) = &written[1];
    let target = offset + entry.size() - 1;
    {
        let mut raw = OpenOptions::new()
            .read(true)
            .write(true)
            .open(dir.join("0.data.str"))
            .unwrap();
        raw.seek(SeekFrom::Start(target)).unwrap();
        raw.write_all(&[0xff]).unwrap();
        raw.sync_all().unwrap();
    }

    let mut file = SegmentFile::open(&dir, 0, DataType::Str, CAPACITY).unwrap();
    let mut keys = Vec::new();
    let result = SegmentRecovery::replay(&mut file, |entry, _| {
        keys.push(entry.key);
        Ok(())
    })
    .unwrap();

    assert_eq!(result.entries_recovered, 2);
    assert_eq!(result.entries_corrupted, 1);
    assert_eq!(keys, vec![b"key0".to_vec(), b"key2".to_vec()]);
}

#[test]
fn test_replay_skips_rejected_record() {
    let (_temp, dir) = setup_temp_dir();
    write_segment(&dir, 3);

    let mut file = SegmentFile::open(&dir, 0, DataType::Str, CAPACITY).unwrap();
    let mut keys = Vec::new();
    let result = SegmentRecovery::replay(&mut file, |entry, _| {
        if entry.key == b"key1" {
            return Err(CaskError::SegmentCorruption("rejected".to_string()));
        }
        keys.push(entry.key);
        Ok(())
    })
    .unwrap();

    assert_eq!(result.entries_recovered, 2);
    assert_eq!(result.entries_corrupted, 1);
    assert_eq!(keys, vec![b"key0".to_vec(), b"key2".to_vec()]);
}

#[test]
fn test_replay_propagates_io_error() {
    let (_temp, dir) = setup_temp_dir();
    write_segment(&dir, 2);

    let mut file = SegmentFile::open(&dir, 0, DataType::Str, CAPACITY).unwrap();
    let result = SegmentRecovery::replay(&mut file, |_, _| {
        Err(CaskError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk gone")))
    });

    assert!(matches!(result, Err(CaskError::Io(_))));
}

#[test]
fn test_replay_zeroes_tail_after_broken_header() {
    let (_temp, dir) = setup_temp_dir();
    let written = write_segment(&dir, 3);

    // Unknown data type in the state field of the middle record
    let (broken, _) = written[1];
    {
        let mut raw = OpenOptions::new()
            .read(true)
            .write(true)
            .open(dir.join("0.data.str"))
            .unwrap();
        raw.seek(SeekFrom::Start(broken + 12)).unwrap();
        raw.write_all(&[0xee]).unwrap();
        raw.sync_all().unwrap();
    }

    let mut file = SegmentFile::open(&dir, 0, DataType::Str, CAPACITY).unwrap();
    let result = SegmentRecovery::replay(&mut file, |_, _| Ok(())).unwrap();
    assert_eq!(result.entries_recovered, 1);
    assert_eq!(result.entries_corrupted, 1);
    assert_eq!(file.write_offset(), broken);
    assert!(matches!(file.read_header(written[2].0), Err(CaskError::EmptyHeader)));

    // A short record over the broken one must not expose the old key2
    let short = Entry::new(Op::Set, b"k".to_vec(), b"v".to_vec());
    file.write(&short).unwrap();
    file.close(true).unwrap();

    let mut file = SegmentFile::open(&dir, 0, DataType::Str, CAPACITY).unwrap();
    let mut keys = Vec::new();
    let result = SegmentRecovery::replay(&mut file, |entry, _| {
        keys.push(entry.key);
        Ok(())
    })
    .unwrap();
    assert_eq!(result.entries_corrupted, 0);
    assert_eq!(keys, vec![b"key0".to_vec(), b"k".to_vec()]);
}

#[test]
fn test_resume_appending_after_replay() {
    let (_temp, dir) = setup_temp_dir();
    let written = write_segment(&dir, 2);

    let mut file = SegmentFile::open(&dir, 0, DataType::Str, CAPACITY).unwrap();
    SegmentRecovery::replay(&mut file, |_, _| Ok(())).unwrap();

    let entry = Entry::new(Op::Remove, b"key0".to_vec(), Vec::new());
    let offset = file.write(&entry).unwrap();
    let (last_offset, last) = &written[1];
    assert_eq!(offset, last_offset + last.size());
    assert_eq!(file.read_at(offset).unwrap(), entry);
}
