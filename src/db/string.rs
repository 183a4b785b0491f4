//! String operations
//!
//! Values live only in the log; the index keeps where each one is.

use std::collections::HashSet;

use crate::error::{CaskError, Result};
use crate::index::{StrIndex, TypeIndex};
use crate::segment::{DataType, Entry, Op};
use crate::storage::Location;

use super::{misplaced, Db, Keyspace};

impl TypeIndex for StrIndex {
    const DATA_TYPE: DataType = DataType::Str;
    const RELOCATES: bool = true;

    fn apply(&mut self, entry: Entry, location: Location) -> Result<()> {
        match entry.op {
            Op::Set => {
                self.put(entry.key, location);
            }
            Op::Remove => {
                self.remove(&entry.key);
            }
            _ => return Err(misplaced(&entry, Self::DATA_TYPE)),
        }
        Ok(())
    }

    /// Live iff the index still points at this exact record
    fn survivor(&self, entry: &Entry, location: Location) -> Result<Option<Entry>> {
        let live = entry.op == Op::Set && self.get(&entry.key) == Some(location);
        Ok(live.then(|| entry.clone()))
    }

    fn relocate(&mut self, key: &[u8], location: Location) {
        self.put(key.to_vec(), location);
    }
}

/// Read the current value of `key` from its segment
fn lookup(strs: &Keyspace<StrIndex>, key: &[u8]) -> Result<Option<Vec<u8>>> {
    let segments = strs.segments()?;
    match strs.index.get(key) {
        Some(location) => Ok(Some(segments.read(location)?.value)),
        None => Ok(None),
    }
}

impl Db {
    /// Store `value` under `key`
    pub fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.check_key(key)?;
        self.check_value(value)?;

        let mut strs = self.store.strs.write();
        strs.commit(Entry::new(Op::Set, key, value), self.sync())?;
        Ok(())
    }

    /// Get the value of `key`, `KeyNotExist` if absent
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        self.check_key(key)?;

        let strs = self.store.strs.read();
        lookup(&strs, key)?.ok_or(CaskError::KeyNotExist)
    }

    /// Remove `key`; removing an absent key writes nothing
    pub fn remove(&self, key: &[u8]) -> Result<()> {
        self.check_key(key)?;

        let mut strs = self.store.strs.write();
        strs.ensure_open()?;
        if !strs.index.contains(key) {
            return Ok(());
        }
        strs.commit(Entry::new(Op::Remove, key, Vec::new()), self.sync())?;
        Ok(())
    }

    /// Store `value` only if `key` is absent, returning whether it was stored
    pub fn set_nx(&self, key: &[u8], value: &[u8]) -> Result<bool> {
        self.check_key(key)?;
        self.check_value(value)?;

        let mut strs = self.store.strs.write();
        strs.ensure_open()?;
        if strs.index.contains(key) {
            return Ok(false);
        }
        strs.commit(Entry::new(Op::Set, key, value), self.sync())?;
        Ok(true)
    }

    /// Store `value` and return the value it replaced
    pub fn get_set(&self, key: &[u8], value: &[u8]) -> Result<Option<Vec<u8>>> {
        self.check_key(key)?;
        self.check_value(value)?;

        let mut strs = self.store.strs.write();
        let old = lookup(&strs, key)?;
        strs.commit(Entry::new(Op::Set, key, value), self.sync())?;
        Ok(old)
    }

    /// Store several pairs under one lock
    ///
    /// Every pair is validated before anything is written.
    pub fn mset<K, V>(&self, pairs: &[(K, V)]) -> Result<()>
    where
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        self.check_pairs(pairs)?;

        let mut strs = self.store.strs.write();
        for (key, value) in pairs {
            let entry = Entry::new(Op::Set, key.as_ref(), value.as_ref());
            strs.commit(entry, self.sync())?;
        }
        Ok(())
    }

    /// Values of `keys` in order, `None` for absent keys
    pub fn mget<K: AsRef<[u8]>>(&self, keys: &[K]) -> Result<Vec<Option<Vec<u8>>>> {
        for key in keys {
            self.check_key(key.as_ref())?;
        }

        let strs = self.store.strs.read();
        keys.iter().map(|key| lookup(&strs, key.as_ref())).collect()
    }

    /// Store every pair only if none of the keys exists
    ///
    /// When a key repeats, its first pair wins.
    pub fn mset_nx<K, V>(&self, pairs: &[(K, V)]) -> Result<bool>
    where
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        self.check_pairs(pairs)?;

        let mut strs = self.store.strs.write();
        strs.ensure_open()?;
        if pairs.iter().any(|(key, _)| strs.index.contains(key.as_ref())) {
            return Ok(false);
        }

        let mut written = HashSet::new();
        for (key, value) in pairs {
            if !written.insert(key.as_ref()) {
                continue;
            }
            let entry = Entry::new(Op::Set, key.as_ref(), value.as_ref());
            strs.commit(entry, self.sync())?;
        }
        Ok(true)
    }

    /// Number of live string keys
    pub fn str_len(&self) -> Result<usize> {
        let strs = self.store.strs.read();
        strs.ensure_open()?;
        Ok(strs.index.len())
    }

    pub fn str_key_exist(&self, key: &[u8]) -> Result<bool> {
        self.check_key(key)?;

        let strs = self.store.strs.read();
        strs.ensure_open()?;
        Ok(strs.index.contains(key))
    }

    fn check_pairs<K, V>(&self, pairs: &[(K, V)]) -> Result<()>
    where
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        for (key, value) in pairs {
            self.check_key(key.as_ref())?;
            self.check_value(value.as_ref())?;
        }
        Ok(())
    }
}
