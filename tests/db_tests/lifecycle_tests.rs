//! Tests for the Db lifecycle
//!
//! These tests verify:
//! - Replay after close, and after a drop without close
//! - Every operation fails with ClosedDatabaseUsed after close
//! - Config validation on open
//! - Segment rotation across reopen
//! - A record in the wrong segment is skipped on open
//! - Shared use from several threads

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use caskkv::segment::{Entry, Op, SegmentFile, SegmentRecovery};
use caskkv::{CaskError, Config, DataType, Db, DbState, InsertPosition, MERGED_DIR};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_dir() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().to_path_buf();
    (temp_dir, path)
}

fn open_db(path: &Path) -> Db {
    let config = Config::builder().dir(path).disable_auto_merge().build();
    Db::open(config).unwrap()
}

fn is_closed_error<T>(result: caskkv::Result<T>) -> bool {
    matches!(result, Err(CaskError::ClosedDatabaseUsed))
}

// =============================================================================
// Open/Recovery Tests
// =============================================================================

#[test]
fn test_open_creates_directories() {
    let (_temp, path) = setup_temp_dir();
    let dir = path.join("nested").join("db");

    let db = open_db(&dir);

    assert!(dir.join(MERGED_DIR).is_dir());
    assert!(dir.join("0.data.str").exists());
    assert_eq!(db.state(), DbState::Active);
    assert_eq!(db.dir(), dir.as_path());
}

#[test]
fn test_recovery_replays_last_write() {
    let (_temp, path) = setup_temp_dir();

    {
        let db = open_db(&path);
        db.set(b"aa", b"11").unwrap();
        db.remove(b"aa").unwrap();
        db.set(b"aa", b"22").unwrap();
        db.set(b"bb", b"33").unwrap();
        db.close().unwrap();
    }

    let db = open_db(&path);
    assert_eq!(db.get(b"aa").unwrap(), b"22");
    assert_eq!(db.get(b"bb").unwrap(), b"33");
    assert_eq!(db.str_len().unwrap(), 2);
}

#[test]
fn test_recovery_after_drop_without_close() {
    let (_temp, path) = setup_temp_dir();

    {
        let db = open_db(&path);
        db.set(b"k", b"v").unwrap();
        db.hset(b"h", b"f", b"v").unwrap();
    }

    let db = open_db(&path);
    assert_eq!(db.get(b"k").unwrap(), b"v");
    assert_eq!(db.hget(b"h", b"f").unwrap(), Some(b"v".to_vec()));
}

#[test]
fn test_writes_resume_after_reopen() {
    let (_temp, path) = setup_temp_dir();

    {
        let db = open_db(&path);
        db.set(b"a", b"1").unwrap();
        db.close().unwrap();
    }
    {
        let db = open_db(&path);
        db.set(b"b", b"2").unwrap();
        db.close().unwrap();
    }

    let db = open_db(&path);
    assert_eq!(db.get(b"a").unwrap(), b"1");
    assert_eq!(db.get(b"b").unwrap(), b"2");
}

#[test]
fn test_rotation_survives_reopen() {
    let (_temp, path) = setup_temp_dir();
    let config = Config::builder()
        .dir(&path)
        .max_file_size(128)
        .disable_auto_merge()
        .build();

    {
        let db = Db::open(config.clone()).unwrap();
        for i in 0..20 {
            db.set(format!("key{:02}", i).as_bytes(), b"value").unwrap();
        }
        assert!(db.segment_count(DataType::Str).unwrap() > 1);
        db.close().unwrap();
    }

    let db = Db::open(config).unwrap();
    for i in 0..20 {
        assert_eq!(db.get(format!("key{:02}", i).as_bytes()).unwrap(), b"value");
    }
    db.set(b"after", b"reopen").unwrap();
    assert_eq!(db.get(b"after").unwrap(), b"reopen");
}

#[test]
fn test_misplaced_record_does_not_block_open() {
    let (_temp, path) = setup_temp_dir();
    let config = Config::builder().dir(&path).disable_auto_merge().build();

    {
        let db = Db::open(config.clone()).unwrap();
        db.set(b"k", b"v").unwrap();
        db.rpush(b"l", &["a", "b"]).unwrap();
        db.close().unwrap();
    }

    // A well-formed list record in the string segment
    {
        let mut file =
            SegmentFile::open(&path, 0, DataType::Str, config.max_file_size).unwrap();
        SegmentRecovery::replay(&mut file, |_, _| Ok(())).unwrap();
        file.write(&Entry::new(Op::LPush, b"l".to_vec(), b"x".to_vec()))
            .unwrap();
        file.close(true).unwrap();
    }

    let db = Db::open(config).unwrap();
    assert_eq!(db.get(b"k").unwrap(), b"v");
    assert_eq!(db.llen(b"l").unwrap(), 2);
    assert_eq!(db.lindex(b"l", 0).unwrap(), b"a");
}

#[test]
fn test_invalid_config_rejected() {
    let (_temp, path) = setup_temp_dir();
    let config = Config::builder()
        .dir(&path)
        .max_file_size(10)
        .disable_auto_merge()
        .build();

    assert!(matches!(Db::open(config), Err(CaskError::Config(_))));
}

// =============================================================================
// Closed Database Tests
// =============================================================================

#[test]
fn test_operations_after_close() {
    let (_temp, path) = setup_temp_dir();
    let db = open_db(&path);
    db.set(b"k", b"v").unwrap();

    db.close().unwrap();

    assert!(db.is_closed());
    assert!(is_closed_error(db.get(b"k")));
    assert!(is_closed_error(db.set(b"k", b"v")));
    assert!(is_closed_error(db.remove(b"k")));
    assert!(is_closed_error(db.str_len()));
    assert!(is_closed_error(db.rpush(b"l", &["a"])));
    assert!(is_closed_error(db.lrange(b"l", 0, -1)));
    assert!(is_closed_error(db.linsert(b"l", InsertPosition::After, 0, b"x")));
    assert!(is_closed_error(db.hset(b"h", b"f", b"v")));
    assert!(is_closed_error(db.hget(b"h", b"f")));
    assert!(is_closed_error(db.sadd(b"s", &["m"])));
    assert!(is_closed_error(db.sunion(&["s"])));
    assert!(is_closed_error(db.zadd(b"z", 1.0, b"m")));
    assert!(is_closed_error(db.ztop(b"z", 1)));
    assert!(is_closed_error(db.segment_count(DataType::Str)));
    assert!(is_closed_error(db.merge()));
    assert!(is_closed_error(db.stop_merge()));
}

#[test]
fn test_double_close() {
    let (_temp, path) = setup_temp_dir();
    let db = open_db(&path);

    db.close().unwrap();
    assert!(is_closed_error(db.close()));
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_shared_across_threads() {
    let (_temp, path) = setup_temp_dir();
    let db = Arc::new(open_db(&path));

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let db = Arc::clone(&db);
            thread::spawn(move || {
                for i in 0..50 {
                    let key = format!("t{}-{}", t, i);
                    db.set(key.as_bytes(), key.as_bytes()).unwrap();
                    db.rpush(b"shared", &[key.as_bytes()]).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(db.str_len().unwrap(), 200);
    assert_eq!(db.llen(b"shared").unwrap(), 200);
    assert_eq!(db.get(b"t3-49").unwrap(), b"t3-49");
}
