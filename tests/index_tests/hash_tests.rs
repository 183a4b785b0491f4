//! Tests for HashIndex
//!
//! These tests verify:
//! - Field put/get/remove with previous values returned
//! - Empty hashes disappear
//! - get_all ordering

use caskkv::index::HashIndex;

#[test]
fn test_put_returns_previous_value() {
    let mut index = HashIndex::new();

    assert_eq!(index.put(b"user", b"name".to_vec(), b"ann".to_vec()), None);
    assert_eq!(
        index.put(b"user", b"name".to_vec(), b"bob".to_vec()),
        Some(b"ann".to_vec())
    );
    assert_eq!(index.get(b"user", b"name"), Some(&b"bob"[..]));
    assert_eq!(index.len(b"user"), 1);
}

#[test]
fn test_missing_key_and_field() {
    let mut index = HashIndex::new();
    index.put(b"user", b"name".to_vec(), b"ann".to_vec());

    assert_eq!(index.get(b"user", b"age"), None);
    assert_eq!(index.get(b"other", b"name"), None);
    assert!(!index.field_exists(b"user", b"age"));
    assert!(index.field_exists(b"user", b"name"));
    assert_eq!(index.len(b"other"), 0);
}

#[test]
fn test_remove_last_field_drops_key() {
    let mut index = HashIndex::new();
    index.put(b"user", b"a".to_vec(), b"1".to_vec());
    index.put(b"user", b"b".to_vec(), b"2".to_vec());

    assert_eq!(index.remove(b"user", b"a"), Some(b"1".to_vec()));
    assert!(index.key_exists(b"user"));

    assert_eq!(index.remove(b"user", b"b"), Some(b"2".to_vec()));
    assert!(!index.key_exists(b"user"));
    assert_eq!(index.len(b"user"), 0);

    assert_eq!(index.remove(b"user", b"b"), None);
}

#[test]
fn test_get_all_sorted_by_field() {
    let mut index = HashIndex::new();
    for (f, v) in [("c", "3"), ("a", "1"), ("b", "2")] {
        index.put(b"h", f.as_bytes().to_vec(), v.as_bytes().to_vec());
    }

    let all = index.get_all(b"h");
    assert_eq!(
        all,
        vec![
            (b"a".to_vec(), b"1".to_vec()),
            (b"b".to_vec(), b"2".to_vec()),
            (b"c".to_vec(), b"3".to_vec()),
        ]
    );
    assert!(index.get_all(b"nope").is_empty());
}
