//! Skip List
//!
//! Ordered map with probabilistic levels, shared by the string index and the
//! sorted-set index.
//!
//! Nodes live in an arena and link to each other by slot number, so the
//! structure needs no unsafe code and freed slots are reused.

use std::borrow::Borrow;
use std::cmp::Ordering;

use rand::Rng;

/// Highest level a node can reach
pub const MAX_LEVEL: usize = 32;

/// Chance of promoting a node one level further
const PROBABILITY: f64 = 1.0 / std::f64::consts::E;

struct Node<K, V> {
    key: K,
    value: V,
    next: Vec<Option<usize>>,
}

/// Ordered map backed by a skip list
pub struct SkipList<K, V> {
    /// Forward links of the head sentinel, one per level
    head: [Option<usize>; MAX_LEVEL],

    /// Node arena; `None` marks a free slot
    nodes: Vec<Option<Node<K, V>>>,

    /// Free slots ready for reuse
    free: Vec<usize>,

    /// Number of levels currently in use
    level: usize,

    len: usize,
}

impl<K: Ord, V> SkipList<K, V> {
    pub fn new() -> Self {
        Self {
            head: [None; MAX_LEVEL],
            nodes: Vec::new(),
            free: Vec::new(),
            level: 1,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let slot = self.seek(key)?;
        let node = self.node(slot);
        (key.cmp(node.key.borrow()) == Ordering::Equal).then_some(&node.value)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get(key).is_some()
    }

    /// Insert or replace, returning the previous value
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let update = self.predecessors(&key);

        if let Some(slot) = self.forward(update[0], 0) {
            let node = self.node_mut(slot);
            if node.key == key {
                return Some(std::mem::replace(&mut node.value, value));
            }
        }

        let level = random_level();
        if level > self.level {
            // Levels above the old height start at the head, which `update`
            // already holds as `None`.
            self.level = level;
        }

        let next = (0..level).map(|l| self.forward(update[l], l)).collect();
        let slot = self.alloc(Node { key, value, next });
        for (l, pred) in update.iter().enumerate().take(level) {
            self.set_forward(*pred, l, Some(slot));
        }

        self.len += 1;
        None
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let update = self.predecessors(key);
        let target = self.forward(update[0], 0)?;
        if key.cmp(self.node(target).key.borrow()) != Ordering::Equal {
            return None;
        }

        for (l, pred) in update.iter().enumerate().take(self.level) {
            if self.forward(*pred, l) != Some(target) {
                break;
            }
            let next = self.node(target).next[l];
            self.set_forward(*pred, l, next);
        }
        while self.level > 1 && self.head[self.level - 1].is_none() {
            self.level -= 1;
        }

        let node = self.nodes[target].take()?;
        self.free.push(target);
        self.len -= 1;
        Some(node.value)
    }

    /// Iterate all entries in key order
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            list: self,
            cursor: self.head[0],
        }
    }

    /// Iterate entries whose key is `>= key`, in key order
    pub fn range_from<Q>(&self, key: &Q) -> Iter<'_, K, V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        Iter {
            list: self,
            cursor: self.seek(key),
        }
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// First node whose key is `>= key`
    fn seek<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let update = self.predecessors(key);
        self.forward(update[0], 0)
    }

    /// For every level, the last node with a key `< key` (`None` = head)
    fn predecessors<Q>(&self, key: &Q) -> [Option<usize>; MAX_LEVEL]
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut update = [None; MAX_LEVEL];
        let mut x: Option<usize> = None;
        for l in (0..self.level).rev() {
            while let Some(next) = self.forward(x, l) {
                if key.cmp(self.node(next).key.borrow()) != Ordering::Greater {
                    break;
                }
                x = Some(next);
            }
            update[l] = x;
        }
        update
    }

    fn forward(&self, from: Option<usize>, level: usize) -> Option<usize> {
        match from {
            None => self.head[level],
            Some(slot) => self.node(slot).next[level],
        }
    }

    fn set_forward(&mut self, from: Option<usize>, level: usize, to: Option<usize>) {
        match from {
            None => self.head[level] = to,
            Some(slot) => self.node_mut(slot).next[level] = to,
        }
    }

    fn node(&self, slot: usize) -> &Node<K, V> {
        match &self.nodes[slot] {
            Some(node) => node,
            None => unreachable!("skip list link to free slot {}", slot),
        }
    }

    fn node_mut(&mut self, slot: usize) -> &mut Node<K, V> {
        match &mut self.nodes[slot] {
            Some(node) => node,
            None => unreachable!("skip list link to free slot {}", slot),
        }
    }

    fn alloc(&mut self, node: Node<K, V>) -> usize {
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = Some(node);
                slot
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        }
    }
}

impl<K: Ord, V> Default for SkipList<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + std::fmt::Debug, V: std::fmt::Debug> std::fmt::Debug for SkipList<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// In-order iterator over a skip list
pub struct Iter<'a, K, V> {
    list: &'a SkipList<K, V>,
    cursor: Option<usize>,
}

impl<'a, K: Ord, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.cursor?;
        let node = self.list.node(slot);
        self.cursor = node.next[0];
        Some((&node.key, &node.value))
    }
}

fn random_level() -> usize {
    let mut rng = rand::thread_rng();
    let mut level = 1;
    while level < MAX_LEVEL && rng.gen::<f64>() < PROBABILITY {
        level += 1;
    }
    level
}
