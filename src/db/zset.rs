//! Sorted-set operations
//!
//! `ZAdd` records carry the score as the secondary key: `key | score(8)`,
//! value = member. `ZRem` records carry only the member.

use crate::codec;
use crate::error::Result;
use crate::index::{Score, TypeIndex, ZSetIndex};
use crate::segment::{DataType, Entry, Op};
use crate::storage::Location;

use super::{misplaced, secondary, Db};

impl TypeIndex for ZSetIndex {
    const DATA_TYPE: DataType = DataType::ZSet;

    fn apply(&mut self, entry: Entry, _location: Location) -> Result<()> {
        match entry.op {
            Op::ZAdd => {
                let score = codec::decode_f64(secondary(&entry)?)?;
                self.add(&entry.key, &entry.value, score);
            }
            Op::ZRem => {
                self.remove(&entry.key, &entry.value);
            }
            _ => return Err(misplaced(&entry, Self::DATA_TYPE)),
        }
        Ok(())
    }

    /// Live iff the member still has exactly this score
    fn survivor(&self, entry: &Entry, _location: Location) -> Result<Option<Entry>> {
        if entry.op != Op::ZAdd {
            return Ok(None);
        }
        let score = codec::decode_f64(secondary(entry)?)?;
        let live = self.score(&entry.key, &entry.value).map(Score) == Some(Score(score));
        Ok(live.then(|| entry.clone()))
    }
}

impl Db {
    /// Add `member` with `score`, or move it to the new score
    ///
    /// Returns false, writing nothing, when the member already has `score`.
    pub fn zadd(&self, key: &[u8], score: f64, member: &[u8]) -> Result<bool> {
        self.check_key(key)?;
        self.check_value(member)?;

        let mut zsets = self.store.zsets.write();
        zsets.ensure_open()?;
        if zsets.index.score(key, member).map(Score) == Some(Score(score)) {
            return Ok(false);
        }
        let entry = Entry::with_secondary(Op::ZAdd, key, codec::encode_f64(score), member);
        zsets.commit(entry, self.sync())?;
        Ok(true)
    }

    /// Remove `member`, returning whether it was present
    pub fn zrem(&self, key: &[u8], member: &[u8]) -> Result<bool> {
        self.check_key(key)?;
        self.check_value(member)?;

        let mut zsets = self.store.zsets.write();
        zsets.ensure_open()?;
        if !zsets.index.is_member(key, member) {
            return Ok(false);
        }
        zsets.commit(Entry::new(Op::ZRem, key, member), self.sync())?;
        Ok(true)
    }

    /// Members scored within `[lo, hi]`, by score then member
    pub fn zscore_range(&self, key: &[u8], lo: f64, hi: f64) -> Result<Vec<(Vec<u8>, f64)>> {
        self.check_key(key)?;

        let zsets = self.store.zsets.read();
        zsets.ensure_open()?;
        Ok(zsets.index.range_by_score(key, lo, hi))
    }

    /// The `n` lowest-scored members, ascending
    pub fn ztop(&self, key: &[u8], n: usize) -> Result<Vec<(Vec<u8>, f64)>> {
        self.check_key(key)?;

        let zsets = self.store.zsets.read();
        zsets.ensure_open()?;
        Ok(zsets.index.top(key, n))
    }

    pub fn zscore(&self, key: &[u8], member: &[u8]) -> Result<Option<f64>> {
        self.check_key(key)?;

        let zsets = self.store.zsets.read();
        zsets.ensure_open()?;
        Ok(zsets.index.score(key, member))
    }

    pub fn zcard(&self, key: &[u8]) -> Result<usize> {
        self.check_key(key)?;

        let zsets = self.store.zsets.read();
        zsets.ensure_open()?;
        Ok(zsets.index.card(key))
    }

    pub fn zis_member(&self, key: &[u8], member: &[u8]) -> Result<bool> {
        self.check_key(key)?;

        let zsets = self.store.zsets.read();
        zsets.ensure_open()?;
        Ok(zsets.index.is_member(key, member))
    }

    pub fn zkey_exist(&self, key: &[u8]) -> Result<bool> {
        self.check_key(key)?;

        let zsets = self.store.zsets.read();
        zsets.ensure_open()?;
        Ok(zsets.index.key_exists(key))
    }
}
