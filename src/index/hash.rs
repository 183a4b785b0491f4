//! Hash index
//!
//! Per outer key, a field → value map held fully in memory.

use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct HashIndex {
    records: HashMap<Vec<u8>, HashMap<Vec<u8>, Vec<u8>>>,
}

impl HashIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `field`, returning the previous value
    pub fn put(&mut self, key: &[u8], field: Vec<u8>, value: Vec<u8>) -> Option<Vec<u8>> {
        self.records
            .entry(key.to_vec())
            .or_default()
            .insert(field, value)
    }

    pub fn get(&self, key: &[u8], field: &[u8]) -> Option<&[u8]> {
        self.records.get(key)?.get(field).map(Vec::as_slice)
    }

    pub fn remove(&mut self, key: &[u8], field: &[u8]) -> Option<Vec<u8>> {
        let fields = self.records.get_mut(key)?;
        let old = fields.remove(field);
        if fields.is_empty() {
            self.records.remove(key);
        }
        old
    }

    /// Every `(field, value)` pair of `key`, fields ascending
    pub fn get_all(&self, key: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        let Some(fields) = self.records.get(key) else {
            return Vec::new();
        };
        let mut out: Vec<_> = fields
            .iter()
            .map(|(f, v)| (f.clone(), v.clone()))
            .collect();
        out.sort();
        out
    }

    pub fn key_exists(&self, key: &[u8]) -> bool {
        self.records.contains_key(key)
    }

    pub fn field_exists(&self, key: &[u8], field: &[u8]) -> bool {
        self.get(key, field).is_some()
    }

    /// Number of fields under `key`
    pub fn len(&self, key: &[u8]) -> usize {
        self.records.get(key).map_or(0, HashMap::len)
    }
}
