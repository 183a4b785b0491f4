//! String index
//!
//! Maps each live string key to the location of its latest `Set` record.
//! Values stay on disk and are read on demand.

use crate::storage::Location;

use super::skiplist::SkipList;

#[derive(Debug, Default)]
pub struct StrIndex {
    entries: SkipList<Vec<u8>, Location>,
}

impl StrIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point `key` at `location`, returning the previous location
    pub fn put(&mut self, key: Vec<u8>, location: Location) -> Option<Location> {
        self.entries.insert(key, location)
    }

    pub fn get(&self, key: &[u8]) -> Option<Location> {
        self.entries.get(key).copied()
    }

    pub fn remove(&mut self, key: &[u8]) -> Option<Location> {
        self.entries.remove(key)
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
