//! Set operations
//!
//! `SMove` records carry the destination as the secondary key:
//! `src | dst`, value = member.

use crate::error::Result;
use crate::index::{SetIndex, TypeIndex};
use crate::segment::{DataType, Entry, Op};
use crate::storage::Location;

use super::{misplaced, secondary, Db};

impl TypeIndex for SetIndex {
    const DATA_TYPE: DataType = DataType::Set;

    fn apply(&mut self, entry: Entry, _location: Location) -> Result<()> {
        match entry.op {
            Op::SAdd => {
                self.add(&entry.key, entry.value);
            }
            Op::SRem => {
                self.remove(&entry.key, &entry.value);
            }
            Op::SMove => {
                self.move_member(&entry.key, secondary(&entry)?, &entry.value);
            }
            _ => return Err(misplaced(&entry, Self::DATA_TYPE)),
        }
        Ok(())
    }

    /// Live iff the member still sits in the key it was added (or moved) to
    ///
    /// A live move is rewritten as an add into the destination, so replay of
    /// the compacted log never needs the source's records.
    fn survivor(&self, entry: &Entry, _location: Location) -> Result<Option<Entry>> {
        match entry.op {
            Op::SAdd if self.is_member(&entry.key, &entry.value) => Ok(Some(entry.clone())),
            Op::SMove => {
                let dst = secondary(entry)?;
                if !self.is_member(dst, &entry.value) {
                    return Ok(None);
                }
                Ok(Some(Entry {
                    op: Op::SAdd,
                    key: dst.to_vec(),
                    secondary: None,
                    value: entry.value.clone(),
                    timestamp: entry.timestamp,
                }))
            }
            _ => Ok(None),
        }
    }
}

impl Db {
    /// Add members, returning how many were not already present
    pub fn sadd<V: AsRef<[u8]>>(&self, key: &[u8], members: &[V]) -> Result<usize> {
        self.check_key(key)?;
        for member in members {
            self.check_value(member.as_ref())?;
        }

        let mut sets = self.store.sets.write();
        sets.ensure_open()?;
        let mut added = 0;
        for member in members {
            let member = member.as_ref();
            if sets.index.is_member(key, member) {
                continue;
            }
            sets.commit(Entry::new(Op::SAdd, key, member), self.sync())?;
            added += 1;
        }
        Ok(added)
    }

    /// Remove `member`, returning whether it was present
    pub fn srem(&self, key: &[u8], member: &[u8]) -> Result<bool> {
        self.check_key(key)?;
        self.check_value(member)?;

        let mut sets = self.store.sets.write();
        sets.ensure_open()?;
        if !sets.index.is_member(key, member) {
            return Ok(false);
        }
        sets.commit(Entry::new(Op::SRem, key, member), self.sync())?;
        Ok(true)
    }

    /// Move `member` from `src` to `dst`, returning whether `src` held it
    pub fn smove(&self, src: &[u8], dst: &[u8], member: &[u8]) -> Result<bool> {
        self.check_key(src)?;
        self.check_key(dst)?;
        self.check_value(member)?;

        let mut sets = self.store.sets.write();
        sets.ensure_open()?;
        if !sets.index.is_member(src, member) {
            return Ok(false);
        }
        sets.commit(Entry::with_secondary(Op::SMove, src, dst, member), self.sync())?;
        Ok(true)
    }

    /// Members of any of `keys`, deduplicated and sorted
    pub fn sunion<K: AsRef<[u8]>>(&self, keys: &[K]) -> Result<Vec<Vec<u8>>> {
        for key in keys {
            self.check_key(key.as_ref())?;
        }

        let sets = self.store.sets.read();
        sets.ensure_open()?;
        Ok(sets.index.union(keys))
    }

    /// Members of `keys[1..]` missing from `keys[0]`, sorted
    pub fn sdiff<K: AsRef<[u8]>>(&self, keys: &[K]) -> Result<Vec<Vec<u8>>> {
        for key in keys {
            self.check_key(key.as_ref())?;
        }

        let sets = self.store.sets.read();
        sets.ensure_open()?;
        Ok(sets.index.diff(keys))
    }

    /// Every member of `key`, sorted
    pub fn sscan(&self, key: &[u8]) -> Result<Vec<Vec<u8>>> {
        self.check_key(key)?;

        let sets = self.store.sets.read();
        sets.ensure_open()?;
        Ok(sets.index.members(key))
    }

    pub fn sis_member(&self, key: &[u8], member: &[u8]) -> Result<bool> {
        self.check_key(key)?;

        let sets = self.store.sets.read();
        sets.ensure_open()?;
        Ok(sets.index.is_member(key, member))
    }

    /// Number of members of `key`
    pub fn scard(&self, key: &[u8]) -> Result<usize> {
        self.check_key(key)?;

        let sets = self.store.sets.read();
        sets.ensure_open()?;
        Ok(sets.index.card(key))
    }

    pub fn skey_exist(&self, key: &[u8]) -> Result<bool> {
        self.check_key(key)?;

        let sets = self.store.sets.read();
        sets.ensure_open()?;
        Ok(sets.index.key_exists(key))
    }
}
