//! Hash operations
//!
//! Records carry the field as the secondary key: `key | field`.

use crate::error::Result;
use crate::index::{HashIndex, TypeIndex};
use crate::segment::{DataType, Entry, Op};
use crate::storage::Location;

use super::{misplaced, secondary, Db};

impl TypeIndex for HashIndex {
    const DATA_TYPE: DataType = DataType::Hash;

    fn apply(&mut self, entry: Entry, _location: Location) -> Result<()> {
        match entry.op {
            Op::HSet => {
                let field = secondary(&entry)?.to_vec();
                self.put(&entry.key, field, entry.value);
            }
            Op::HDel => {
                self.remove(&entry.key, secondary(&entry)?);
            }
            _ => return Err(misplaced(&entry, Self::DATA_TYPE)),
        }
        Ok(())
    }

    /// Live iff the field still holds exactly this value
    fn survivor(&self, entry: &Entry, _location: Location) -> Result<Option<Entry>> {
        if entry.op != Op::HSet {
            return Ok(None);
        }
        let field = secondary(entry)?;
        let live = self.get(&entry.key, field) == Some(entry.value.as_slice());
        Ok(live.then(|| entry.clone()))
    }
}

impl Db {
    /// Set `field` of hash `key` to `value`
    pub fn hset(&self, key: &[u8], field: &[u8], value: &[u8]) -> Result<()> {
        self.check_key(key)?;
        self.check_key(field)?;
        self.check_value(value)?;

        let mut hashes = self.store.hashes.write();
        hashes.commit(Entry::with_secondary(Op::HSet, key, field, value), self.sync())?;
        Ok(())
    }

    /// Set `field` only if it is absent, returning whether it was set
    pub fn hset_nx(&self, key: &[u8], field: &[u8], value: &[u8]) -> Result<bool> {
        self.check_key(key)?;
        self.check_key(field)?;
        self.check_value(value)?;

        let mut hashes = self.store.hashes.write();
        hashes.ensure_open()?;
        if hashes.index.field_exists(key, field) {
            return Ok(false);
        }
        hashes.commit(Entry::with_secondary(Op::HSet, key, field, value), self.sync())?;
        Ok(true)
    }

    pub fn hget(&self, key: &[u8], field: &[u8]) -> Result<Option<Vec<u8>>> {
        self.check_key(key)?;
        self.check_key(field)?;

        let hashes = self.store.hashes.read();
        hashes.ensure_open()?;
        Ok(hashes.index.get(key, field).map(<[u8]>::to_vec))
    }

    /// Delete `field`, returning whether it existed
    pub fn hdel(&self, key: &[u8], field: &[u8]) -> Result<bool> {
        self.check_key(key)?;
        self.check_key(field)?;

        let mut hashes = self.store.hashes.write();
        hashes.ensure_open()?;
        if !hashes.index.field_exists(key, field) {
            return Ok(false);
        }
        hashes.commit(
            Entry::with_secondary(Op::HDel, key, field, Vec::new()),
            self.sync(),
        )?;
        Ok(true)
    }

    /// Every `(field, value)` pair, fields ascending
    pub fn hget_all(&self, key: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        self.check_key(key)?;

        let hashes = self.store.hashes.read();
        hashes.ensure_open()?;
        Ok(hashes.index.get_all(key))
    }

    /// Whether `field` exists in hash `key`
    pub fn hexist(&self, key: &[u8], field: &[u8]) -> Result<bool> {
        self.check_key(key)?;
        self.check_key(field)?;

        let hashes = self.store.hashes.read();
        hashes.ensure_open()?;
        Ok(hashes.index.field_exists(key, field))
    }

    pub fn hkey_exist(&self, key: &[u8]) -> Result<bool> {
        self.check_key(key)?;

        let hashes = self.store.hashes.read();
        hashes.ensure_open()?;
        Ok(hashes.index.key_exists(key))
    }

    /// Number of fields in hash `key`
    pub fn hlen(&self, key: &[u8]) -> Result<usize> {
        self.check_key(key)?;

        let hashes = self.store.hashes.read();
        hashes.ensure_open()?;
        Ok(hashes.index.len(key))
    }
}
