//! Tests for the background merge timer
//!
//! These tests verify:
//! - The timer compacts on its own
//! - close and stop_merge shut the timer down

use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use caskkv::{Config, DataType, Db};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_dir() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().to_path_buf();
    (temp_dir, path)
}

fn open_with_timer(path: &Path, interval: Duration) -> Db {
    let config = Config::builder()
        .dir(path)
        .max_file_size(160)
        .merge_interval(interval)
        .build();
    Db::open(config).unwrap()
}

/// Poll until `cond` holds or `timeout` passes
fn wait_for(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(20));
    }
    cond()
}

// =============================================================================
// Timer Tests
// =============================================================================

#[test]
fn test_timer_compacts() {
    let (_temp, path) = setup_temp_dir();
    let db = open_with_timer(&path, Duration::from_millis(50));

    for i in 0..12 {
        db.set(b"k", format!("{}", i).as_bytes()).unwrap();
    }

    let compacted = wait_for(Duration::from_secs(5), || {
        db.segment_ids(DataType::Str).unwrap()[0] != 0
    });
    assert!(compacted);
    assert_eq!(db.get(b"k").unwrap(), b"11");

    db.close().unwrap();
}

#[test]
fn test_close_stops_timer() {
    let (_temp, path) = setup_temp_dir();
    let db = open_with_timer(&path, Duration::from_millis(10));
    db.set(b"k", b"v").unwrap();

    thread::sleep(Duration::from_millis(50));
    db.close().unwrap();

    assert!(db.is_closed());
}

#[test]
fn test_stop_merge_stops_timer() {
    let (_temp, path) = setup_temp_dir();
    let db = open_with_timer(&path, Duration::from_millis(10));
    db.stop_merge().unwrap();

    for i in 0..12 {
        db.set(b"k", format!("{}", i).as_bytes()).unwrap();
    }
    thread::sleep(Duration::from_millis(100));

    assert_eq!(db.segment_ids(DataType::Str).unwrap()[0], 0);
    assert_eq!(db.get(b"k").unwrap(), b"11");
}
