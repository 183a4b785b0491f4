//! Tests for string operations
//!
//! These tests verify:
//! - Set/Get/Remove with KeyNotExist for absent keys
//! - SetNx, GetSet, MSet, MGet and MSetNx semantics
//! - Key and value validation

use std::path::{Path, PathBuf};

use caskkv::{CaskError, Config, Db};
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

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_set_get() {
    let (_temp, path) = setup_temp_dir();
    let db = open_db(&path);

    db.set(b"name", b"cask").unwrap();
    assert_eq!(db.get(b"name").unwrap(), b"cask");

    db.set(b"name", b"kv").unwrap();
    assert_eq!(db.get(b"name").unwrap(), b"kv");
}

#[test]
fn test_get_missing_key() {
    let (_temp, path) = setup_temp_dir();
    let db = open_db(&path);

    assert!(matches!(db.get(b"missing"), Err(CaskError::KeyNotExist)));
}

#[test]
fn test_empty_value_is_allowed() {
    let (_temp, path) = setup_temp_dir();
    let db = open_db(&path);

    db.set(b"k", b"").unwrap();
    assert_eq!(db.get(b"k").unwrap(), b"");
    assert!(db.str_key_exist(b"k").unwrap());
}

#[test]
fn test_remove() {
    let (_temp, path) = setup_temp_dir();
    let db = open_db(&path);

    db.set(b"k", b"v").unwrap();
    db.remove(b"k").unwrap();

    assert!(matches!(db.get(b"k"), Err(CaskError::KeyNotExist)));
    assert!(!db.str_key_exist(b"k").unwrap());

    // Removing again is a no-op
    db.remove(b"k").unwrap();
}

#[test]
fn test_str_len_counts_live_keys() {
    let (_temp, path) = setup_temp_dir();
    let db = open_db(&path);

    for i in 0..10 {
        db.set(format!("key{}", i).as_bytes(), b"v").unwrap();
    }
    db.remove(b"key3").unwrap();
    db.set(b"key4", b"again").unwrap();

    assert_eq!(db.str_len().unwrap(), 9);
}

// =============================================================================
// Conditional Set Tests
// =============================================================================

#[test]
fn test_set_nx() {
    let (_temp, path) = setup_temp_dir();
    let db = open_db(&path);

    assert!(db.set_nx(b"k", b"first").unwrap());
    assert!(!db.set_nx(b"k", b"second").unwrap());
    assert_eq!(db.get(b"k").unwrap(), b"first");
}

#[test]
fn test_get_set() {
    let (_temp, path) = setup_temp_dir();
    let db = open_db(&path);

    assert_eq!(db.get_set(b"k", b"1").unwrap(), None);
    assert_eq!(db.get_set(b"k", b"2").unwrap(), Some(b"1".to_vec()));
    assert_eq!(db.get(b"k").unwrap(), b"2");
}

// =============================================================================
// Multi-Key Tests
// =============================================================================

#[test]
fn test_mset_mget() {
    let (_temp, path) = setup_temp_dir();
    let db = open_db(&path);

    db.mset(&[("a", "1"), ("b", "2")]).unwrap();

    let values = db.mget(&["a", "missing", "b"]).unwrap();
    assert_eq!(
        values,
        vec![Some(b"1".to_vec()), None, Some(b"2".to_vec())]
    );
}

#[test]
fn test_mset_validates_before_writing() {
    let (_temp, path) = setup_temp_dir();
    let db = open_db(&path);

    let result = db.mset(&[("a", "1"), ("", "2")]);

    assert!(matches!(result, Err(CaskError::KeyEmpty)));
    assert!(!db.str_key_exist(b"a").unwrap());
}

#[test]
fn test_mset_nx_all_or_nothing() {
    let (_temp, path) = setup_temp_dir();
    let db = open_db(&path);

    assert!(db.mset_nx(&[("a", "1"), ("b", "2")]).unwrap());

    assert!(!db.mset_nx(&[("c", "3"), ("a", "9")]).unwrap());
    assert!(!db.str_key_exist(b"c").unwrap());
    assert_eq!(db.get(b"a").unwrap(), b"1");
}

#[test]
fn test_mset_nx_first_duplicate_wins() {
    let (_temp, path) = setup_temp_dir();
    let db = open_db(&path);

    assert!(db.mset_nx(&[("k", "first"), ("k", "second")]).unwrap());
    assert_eq!(db.get(b"k").unwrap(), b"first");
}

// =============================================================================
// Validation Tests
// =============================================================================

#[test]
fn test_empty_key_rejected() {
    let (_temp, path) = setup_temp_dir();
    let db = open_db(&path);

    assert!(matches!(db.set(b"", b"v"), Err(CaskError::KeyEmpty)));
    assert!(matches!(db.get(b""), Err(CaskError::KeyEmpty)));
}

#[test]
fn test_size_limits() {
    let (_temp, path) = setup_temp_dir();
    let config = Config::builder()
        .dir(&path)
        .max_key_size(8)
        .max_value_size(16)
        .disable_auto_merge()
        .build();
    let db = Db::open(config).unwrap();

    assert!(matches!(
        db.set(b"123456789", b"v"),
        Err(CaskError::KeySizeLimit)
    ));
    assert!(matches!(
        db.set(b"k", &[0u8; 17]),
        Err(CaskError::ValueSizeLimit)
    ));

    db.set(b"12345678", &[1u8; 16]).unwrap();
    assert_eq!(db.get(b"12345678").unwrap(), vec![1u8; 16]);
}
