//! List index
//!
//! Per key, the value sequence plus a counting multiset of the values it
//! holds, so membership checks do not walk the sequence.

use std::collections::{HashMap, VecDeque};

/// Where `LInsert` places the new value relative to the pivot position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum InsertPosition {
    Before = 0,
    After = 1,
}

impl InsertPosition {
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(InsertPosition::Before),
            1 => Some(InsertPosition::After),
            _ => None,
        }
    }
}

/// One list: ordered values and how often each occurs
#[derive(Debug, Default)]
struct ListValues {
    items: VecDeque<Vec<u8>>,
    counts: HashMap<Vec<u8>, usize>,
}

impl ListValues {
    fn seeded(value: Vec<u8>) -> Self {
        let mut list = Self::default();
        list.push_back(value);
        list
    }

    fn push_front(&mut self, value: Vec<u8>) {
        self.count_in(&value);
        self.items.push_front(value);
    }

    fn push_back(&mut self, value: Vec<u8>) {
        self.count_in(&value);
        self.items.push_back(value);
    }

    fn count_in(&mut self, value: &[u8]) {
        match self.counts.get_mut(value) {
            Some(n) => *n += 1,
            None => {
                self.counts.insert(value.to_vec(), 1);
            }
        }
    }

    fn count_out(&mut self, value: &[u8]) {
        if let Some(n) = self.counts.get_mut(value) {
            *n -= 1;
            if *n == 0 {
                self.counts.remove(value);
            }
        }
    }

    /// Clamp a position into `[0, len - 1]`
    fn clamp(&self, n: i64) -> usize {
        let last = self.items.len().saturating_sub(1);
        if n < 0 {
            0
        } else {
            (n as usize).min(last)
        }
    }
}

#[derive(Debug, Default)]
pub struct ListIndex {
    lists: HashMap<Vec<u8>, ListValues>,
}

impl ListIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push to the head, returning the new length
    pub fn push_front(&mut self, key: &[u8], value: Vec<u8>) -> usize {
        let list = self.lists.entry(key.to_vec()).or_default();
        list.push_front(value);
        list.items.len()
    }

    /// Push to the tail, returning the new length
    pub fn push_back(&mut self, key: &[u8], value: Vec<u8>) -> usize {
        let list = self.lists.entry(key.to_vec()).or_default();
        list.push_back(value);
        list.items.len()
    }

    pub fn pop_front(&mut self, key: &[u8]) -> Option<Vec<u8>> {
        self.pop(key, true)
    }

    pub fn pop_back(&mut self, key: &[u8]) -> Option<Vec<u8>> {
        self.pop(key, false)
    }

    fn pop(&mut self, key: &[u8], front: bool) -> Option<Vec<u8>> {
        let list = self.lists.get_mut(key)?;
        let value = if front {
            list.items.pop_front()
        } else {
            list.items.pop_back()
        }?;
        list.count_out(&value);
        self.drop_if_empty(key);
        Some(value)
    }

    pub fn front(&self, key: &[u8]) -> Option<&[u8]> {
        self.lists.get(key)?.items.front().map(Vec::as_slice)
    }

    pub fn back(&self, key: &[u8]) -> Option<&[u8]> {
        self.lists.get(key)?.items.back().map(Vec::as_slice)
    }

    /// Value at position `n`, clamped into the list bounds
    pub fn get(&self, key: &[u8], n: i64) -> Option<&[u8]> {
        let list = self.lists.get(key)?;
        list.items.get(list.clamp(n)).map(Vec::as_slice)
    }

    /// Overwrite the value at clamped position `n`
    ///
    /// A missing list is created holding just `value`.
    pub fn set(&mut self, key: &[u8], n: i64, value: Vec<u8>) {
        let Some(list) = self.lists.get_mut(key) else {
            self.lists.insert(key.to_vec(), ListValues::seeded(value));
            return;
        };

        let at = list.clamp(n);
        list.count_in(&value);
        let old = std::mem::replace(&mut list.items[at], value);
        list.count_out(&old);
    }

    /// Insert `value` before or after clamped position `n`
    ///
    /// A missing list is created holding just `value`.
    pub fn insert(&mut self, key: &[u8], position: InsertPosition, n: i64, value: Vec<u8>) {
        let Some(list) = self.lists.get_mut(key) else {
            self.lists.insert(key.to_vec(), ListValues::seeded(value));
            return;
        };

        let at = match position {
            InsertPosition::Before => list.clamp(n),
            InsertPosition::After => list.clamp(n) + 1,
        };
        list.count_in(&value);
        list.items.insert(at, value);
    }

    /// Values in `[start, stop]` after Redis-style clamping
    ///
    /// Negative positions count from the tail. An inverted or out of range
    /// window yields nothing.
    pub fn range(&self, key: &[u8], start: i64, stop: i64) -> Vec<Vec<u8>> {
        let Some(list) = self.lists.get(key) else {
            return Vec::new();
        };
        let Some((start, stop)) = clamp_range(start, stop, list.items.len()) else {
            return Vec::new();
        };
        list.items.range(start..=stop).cloned().collect()
    }

    /// Remove occurrences of `value`, returning how many went
    ///
    /// `n > 0` removes up to `n` scanning from the head, `n < 0` up to `-n`
    /// from the tail, `n == 0` every occurrence.
    pub fn remove(&mut self, key: &[u8], value: &[u8], n: i64) -> usize {
        let Some(list) = self.lists.get_mut(key) else {
            return 0;
        };
        if !list.counts.contains_key(value) {
            return 0;
        }

        let limit = match n {
            0 => usize::MAX,
            n => n.unsigned_abs() as usize,
        };

        let mut removed = 0;
        if n >= 0 {
            let mut i = 0;
            while i < list.items.len() && removed < limit {
                if list.items[i] == value {
                    list.items.remove(i);
                    removed += 1;
                } else {
                    i += 1;
                }
            }
        } else {
            let mut i = list.items.len();
            while i > 0 && removed < limit {
                i -= 1;
                if list.items[i] == value {
                    list.items.remove(i);
                    removed += 1;
                }
            }
        }

        for _ in 0..removed {
            list.count_out(value);
        }
        self.drop_if_empty(key);
        removed
    }

    pub fn len(&self, key: &[u8]) -> usize {
        self.lists.get(key).map_or(0, |l| l.items.len())
    }

    pub fn key_exists(&self, key: &[u8]) -> bool {
        self.lists.contains_key(key)
    }

    pub fn value_exists(&self, key: &[u8], value: &[u8]) -> bool {
        self.lists
            .get(key)
            .map_or(false, |l| l.counts.contains_key(value))
    }

    /// Every key with its values in order, keys ascending
    pub fn contents(&self) -> Vec<(&[u8], Vec<&[u8]>)> {
        let mut out: Vec<_> = self
            .lists
            .iter()
            .map(|(k, l)| (k.as_slice(), l.items.iter().map(Vec::as_slice).collect()))
            .collect();
        out.sort_by(|a, b| a.0.cmp(b.0));
        out
    }

    fn drop_if_empty(&mut self, key: &[u8]) {
        if self.lists.get(key).map_or(false, |l| l.items.is_empty()) {
            self.lists.remove(key);
        }
    }
}

/// Resolve a Redis-style `[start, stop]` window against `len`
fn clamp_range(start: i64, stop: i64, len: usize) -> Option<(usize, usize)> {
    let len = len as i64;
    if len == 0 {
        return None;
    }

    let start = if start < 0 { (start + len).max(0) } else { start };
    let stop = if stop < 0 { stop + len } else { stop.min(len - 1) };

    if stop < 0 || start > stop {
        return None;
    }
    Some((start as usize, stop as usize))
}
