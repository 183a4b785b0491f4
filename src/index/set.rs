//! Set index
//!
//! Per key, the set of member values.

use std::collections::{BTreeSet, HashMap, HashSet};

#[derive(Debug, Default)]
pub struct SetIndex {
    records: HashMap<Vec<u8>, HashSet<Vec<u8>>>,
}

impl SetIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a member, returning whether it was new
    pub fn add(&mut self, key: &[u8], member: Vec<u8>) -> bool {
        self.records.entry(key.to_vec()).or_default().insert(member)
    }

    /// Remove a member, returning whether it was present
    pub fn remove(&mut self, key: &[u8], member: &[u8]) -> bool {
        let Some(members) = self.records.get_mut(key) else {
            return false;
        };
        let removed = members.remove(member);
        if members.is_empty() {
            self.records.remove(key);
        }
        removed
    }

    /// Move `member` from `src` to `dst`
    ///
    /// Nothing happens unless `src` holds the member.
    pub fn move_member(&mut self, src: &[u8], dst: &[u8], member: &[u8]) -> bool {
        if !self.remove(src, member) {
            return false;
        }
        self.add(dst, member.to_vec());
        true
    }

    /// Members of any of `keys`, deduplicated and sorted
    pub fn union<K: AsRef<[u8]>>(&self, keys: &[K]) -> Vec<Vec<u8>> {
        let merged: BTreeSet<&Vec<u8>> = keys
            .iter()
            .filter_map(|k| self.records.get(k.as_ref()))
            .flatten()
            .collect();
        merged.into_iter().cloned().collect()
    }

    /// Members of `keys[1..]` that are not in `keys[0]`, sorted
    ///
    /// Empty when `keys[0]` does not exist.
    pub fn diff<K: AsRef<[u8]>>(&self, keys: &[K]) -> Vec<Vec<u8>> {
        let Some((first, rest)) = keys.split_first() else {
            return Vec::new();
        };
        let Some(base) = self.records.get(first.as_ref()) else {
            return Vec::new();
        };

        let out: BTreeSet<&Vec<u8>> = rest
            .iter()
            .filter_map(|k| self.records.get(k.as_ref()))
            .flatten()
            .filter(|m| !base.contains(*m))
            .collect();
        out.into_iter().cloned().collect()
    }

    /// Every member of `key`, sorted
    pub fn members(&self, key: &[u8]) -> Vec<Vec<u8>> {
        self.union(&[key])
    }

    pub fn is_member(&self, key: &[u8], member: &[u8]) -> bool {
        self.records.get(key).map_or(false, |m| m.contains(member))
    }

    pub fn card(&self, key: &[u8]) -> usize {
        self.records.get(key).map_or(0, HashSet::len)
    }

    pub fn key_exists(&self, key: &[u8]) -> bool {
        self.records.contains_key(key)
    }
}
