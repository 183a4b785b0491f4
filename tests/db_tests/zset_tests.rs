//! Tests for sorted-set operations
//!
//! These tests verify:
//! - ZAdd upsert and its no-op case
//! - ZScoreRange and ZTop ordering
//! - ZRem, ZCard and membership
//! - Sorted sets survive a reopen

use std::path::{Path, PathBuf};

use caskkv::{Config, Db};
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

fn setup_scores(db: &Db) {
    db.zadd(b"z", 90.0, b"a").unwrap();
    db.zadd(b"z", 85.0, b"b").unwrap();
    db.zadd(b"z", 90.0, b"c").unwrap();
}

fn members(pairs: Vec<(Vec<u8>, f64)>) -> Vec<String> {
    pairs
        .into_iter()
        .map(|(m, _)| String::from_utf8(m).unwrap())
        .collect()
}

// =============================================================================
// Add/Remove Tests
// =============================================================================

#[test]
fn test_zadd_upsert() {
    let (_temp, path) = setup_temp_dir();
    let db = open_db(&path);

    assert!(db.zadd(b"z", 1.0, b"m").unwrap());
    assert!(!db.zadd(b"z", 1.0, b"m").unwrap());
    assert!(db.zadd(b"z", 3.0, b"m").unwrap());

    assert_eq!(db.zscore(b"z", b"m").unwrap(), Some(3.0));
    assert_eq!(db.zcard(b"z").unwrap(), 1);
}

#[test]
fn test_zrem() {
    let (_temp, path) = setup_temp_dir();
    let db = open_db(&path);
    setup_scores(&db);

    assert!(db.zrem(b"z", b"a").unwrap());
    assert!(!db.zrem(b"z", b"a").unwrap());
    assert!(!db.zis_member(b"z", b"a").unwrap());
    assert_eq!(db.zscore(b"z", b"a").unwrap(), None);
    assert_eq!(db.zcard(b"z").unwrap(), 2);
}

// =============================================================================
// Ordering Tests
// =============================================================================

#[test]
fn test_ztop() {
    let (_temp, path) = setup_temp_dir();
    let db = open_db(&path);
    setup_scores(&db);

    assert_eq!(members(db.ztop(b"z", 1).unwrap()), vec!["b"]);
    assert_eq!(members(db.ztop(b"z", 5).unwrap()), vec!["b", "a", "c"]);
}

#[test]
fn test_zscore_range() {
    let (_temp, path) = setup_temp_dir();
    let db = open_db(&path);
    setup_scores(&db);

    assert_eq!(
        db.zscore_range(b"z", 85.0, 90.0).unwrap(),
        vec![
            (b"b".to_vec(), 85.0),
            (b"a".to_vec(), 90.0),
            (b"c".to_vec(), 90.0),
        ]
    );
    assert_eq!(members(db.zscore_range(b"z", 89.0, 95.0).unwrap()), vec!["a", "c"]);
    assert!(db.zscore_range(b"z", 95.0, 89.0).unwrap().is_empty());
    assert!(!db.zkey_exist(b"nope").unwrap());
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[test]
fn test_zset_survives_reopen() {
    let (_temp, path) = setup_temp_dir();

    {
        let db = open_db(&path);
        setup_scores(&db);
        db.zadd(b"z", 70.0, b"c").unwrap();
        db.zrem(b"z", b"b").unwrap();
        db.close().unwrap();
    }

    let db = open_db(&path);
    assert_eq!(
        db.ztop(b"z", 10).unwrap(),
        vec![(b"c".to_vec(), 70.0), (b"a".to_vec(), 90.0)]
    );
}
