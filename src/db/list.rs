//! List operations
//!
//! ## Record Forms
//! ```text
//! LPush / RPush   key                     value
//! LPop / RPop     key                     (empty)
//! LInsert         key | pos(1) | n(8)     value
//! LSet            key | n(8)              value
//! LRem            key | n(8)              value
//! ```

use crate::codec::{self, WIDTH};
use crate::error::{CaskError, Result};
use crate::index::{InsertPosition, ListIndex, TypeIndex};
use crate::segment::{DataType, Entry, Op};
use crate::storage::Location;

use super::{misplaced, secondary, Db};

impl TypeIndex for ListIndex {
    const DATA_TYPE: DataType = DataType::List;

    fn apply(&mut self, entry: Entry, _location: Location) -> Result<()> {
        match entry.op {
            Op::LPush => {
                self.push_front(&entry.key, entry.value);
            }
            Op::RPush => {
                self.push_back(&entry.key, entry.value);
            }
            Op::LPop => {
                self.pop_front(&entry.key);
            }
            Op::RPop => {
                self.pop_back(&entry.key);
            }
            Op::LInsert => {
                let (position, n) = decode_insert(secondary(&entry)?)?;
                self.insert(&entry.key, position, n, entry.value);
            }
            Op::LSet => {
                let n = codec::decode_i64(secondary(&entry)?)?;
                self.set(&entry.key, n, entry.value);
            }
            Op::LRem => {
                let n = codec::decode_i64(secondary(&entry)?)?;
                self.remove(&entry.key, &entry.value, n);
            }
            _ => return Err(misplaced(&entry, Self::DATA_TYPE)),
        }
        Ok(())
    }

    /// A list record's liveness depends on its neighbours; compaction
    /// uses `snapshot` instead.
    fn survivor(&self, _entry: &Entry, _location: Location) -> Result<Option<Entry>> {
        Ok(None)
    }

    /// Every list as a run of `RPush` records, keys ascending
    fn snapshot(&self) -> Option<Vec<Entry>> {
        let entries = self
            .contents()
            .into_iter()
            .flat_map(|(key, values)| {
                values
                    .into_iter()
                    .map(move |value| Entry::new(Op::RPush, key, value))
            })
            .collect();
        Some(entries)
    }
}

fn encode_insert(position: InsertPosition, n: i64) -> Vec<u8> {
    let mut buf = Vec::with_capacity(1 + WIDTH);
    buf.push(position as u8);
    buf.extend_from_slice(&codec::encode_i64(n));
    buf
}

fn decode_insert(buf: &[u8]) -> Result<(InsertPosition, i64)> {
    let (tag, n) = buf
        .split_first()
        .ok_or_else(|| CaskError::SegmentCorruption("empty LInsert position".to_string()))?;
    let position = InsertPosition::from_tag(*tag).ok_or_else(|| {
        CaskError::SegmentCorruption(format!("unknown LInsert position {}", tag))
    })?;
    Ok((position, codec::decode_i64(n)?))
}

impl Db {
    /// Push values to the head one by one, returning the new length
    ///
    /// `lpush(k, &["a", "b"])` leaves `b` first.
    pub fn lpush<V: AsRef<[u8]>>(&self, key: &[u8], values: &[V]) -> Result<usize> {
        self.push(key, values, Op::LPush)
    }

    /// Push values to the tail, returning the new length
    pub fn rpush<V: AsRef<[u8]>>(&self, key: &[u8], values: &[V]) -> Result<usize> {
        self.push(key, values, Op::RPush)
    }

    fn push<V: AsRef<[u8]>>(&self, key: &[u8], values: &[V], op: Op) -> Result<usize> {
        self.check_key(key)?;
        for value in values {
            self.check_value(value.as_ref())?;
        }

        let mut lists = self.store.lists.write();
        lists.ensure_open()?;
        for value in values {
            lists.commit(Entry::new(op, key, value.as_ref()), self.sync())?;
        }
        Ok(lists.index.len(key))
    }

    /// Remove and return the head, `KeyNotExist` on a missing list
    pub fn lpop(&self, key: &[u8]) -> Result<Vec<u8>> {
        self.pop(key, Op::LPop)
    }

    /// Remove and return the tail, `KeyNotExist` on a missing list
    pub fn rpop(&self, key: &[u8]) -> Result<Vec<u8>> {
        self.pop(key, Op::RPop)
    }

    fn pop(&self, key: &[u8], op: Op) -> Result<Vec<u8>> {
        self.check_key(key)?;

        let mut lists = self.store.lists.write();
        lists.ensure_open()?;
        let value = match op {
            Op::LPop => lists.index.front(key),
            _ => lists.index.back(key),
        }
        .map(<[u8]>::to_vec)
        .ok_or(CaskError::KeyNotExist)?;

        lists.commit(Entry::new(op, key, Vec::new()), self.sync())?;
        Ok(value)
    }

    /// Value at position `n`, clamped into `[0, len - 1]`
    pub fn lindex(&self, key: &[u8], n: i64) -> Result<Vec<u8>> {
        self.check_key(key)?;

        let lists = self.store.lists.read();
        lists.ensure_open()?;
        lists
            .index
            .get(key, n)
            .map(<[u8]>::to_vec)
            .ok_or(CaskError::KeyNotExist)
    }

    /// Insert `value` before or after clamped position `n`, returning the
    /// new length
    ///
    /// A missing list is created holding just `value`.
    pub fn linsert(
        &self,
        key: &[u8],
        position: InsertPosition,
        n: i64,
        value: &[u8],
    ) -> Result<usize> {
        self.check_key(key)?;
        self.check_value(value)?;

        let mut lists = self.store.lists.write();
        let entry = Entry::with_secondary(Op::LInsert, key, encode_insert(position, n), value);
        lists.commit(entry, self.sync())?;
        Ok(lists.index.len(key))
    }

    /// Overwrite the value at clamped position `n`
    ///
    /// A missing list is created holding just `value`.
    pub fn lset(&self, key: &[u8], n: i64, value: &[u8]) -> Result<()> {
        self.check_key(key)?;
        self.check_value(value)?;

        let mut lists = self.store.lists.write();
        let entry = Entry::with_secondary(Op::LSet, key, codec::encode_i64(n), value);
        lists.commit(entry, self.sync())?;
        Ok(())
    }

    /// Values in `[start, stop]`; negative positions count from the tail
    pub fn lrange(&self, key: &[u8], start: i64, stop: i64) -> Result<Vec<Vec<u8>>> {
        self.check_key(key)?;

        let lists = self.store.lists.read();
        lists.ensure_open()?;
        Ok(lists.index.range(key, start, stop))
    }

    /// Remove occurrences of `value`, returning how many were removed
    ///
    /// `n > 0` scans from the head, `n < 0` from the tail, `n == 0` removes
    /// all of them.
    pub fn lrem(&self, key: &[u8], value: &[u8], n: i64) -> Result<usize> {
        self.check_key(key)?;
        self.check_value(value)?;

        let mut lists = self.store.lists.write();
        lists.ensure_open()?;
        if !lists.index.value_exists(key, value) {
            return Ok(0);
        }

        let before = lists.index.len(key);
        let entry = Entry::with_secondary(Op::LRem, key, codec::encode_i64(n), value);
        lists.commit(entry, self.sync())?;
        Ok(before - lists.index.len(key))
    }

    pub fn llen(&self, key: &[u8]) -> Result<usize> {
        self.check_key(key)?;

        let lists = self.store.lists.read();
        lists.ensure_open()?;
        Ok(lists.index.len(key))
    }

    pub fn lkey_exist(&self, key: &[u8]) -> Result<bool> {
        self.check_key(key)?;

        let lists = self.store.lists.read();
        lists.ensure_open()?;
        Ok(lists.index.key_exists(key))
    }

    /// Whether `value` occurs anywhere in the list
    pub fn lval_exist(&self, key: &[u8], value: &[u8]) -> Result<bool> {
        self.check_key(key)?;

        let lists = self.store.lists.read();
        lists.ensure_open()?;
        Ok(lists.index.value_exists(key, value))
    }
}
