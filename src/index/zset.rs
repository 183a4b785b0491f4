//! Sorted-set index
//!
//! Per key, members ordered by `(score, member)` in a skip list plus a
//! member → score map for direct score lookups.

use std::cmp::Ordering;
use std::collections::HashMap;

use super::skiplist::SkipList;

/// Total order over `f64` scores
#[derive(Debug, Clone, Copy)]
pub struct Score(pub f64);

impl PartialEq for Score {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Score {}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Skip list key: score first, member breaks ties
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ScoreKey {
    pub score: Score,
    pub member: Vec<u8>,
}

impl ScoreKey {
    fn new(score: f64, member: Vec<u8>) -> Self {
        Self {
            score: Score(score),
            member,
        }
    }
}

#[derive(Debug, Default)]
struct ZSet {
    ordered: SkipList<ScoreKey, ()>,
    scores: HashMap<Vec<u8>, f64>,
}

#[derive(Debug, Default)]
pub struct ZSetIndex {
    records: HashMap<Vec<u8>, ZSet>,
}

impl ZSetIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert `member` with `score`
    ///
    /// Returns false when the member already had exactly this score.
    pub fn add(&mut self, key: &[u8], member: &[u8], score: f64) -> bool {
        let zset = self.records.entry(key.to_vec()).or_default();

        if let Some(&old) = zset.scores.get(member) {
            if Score(old) == Score(score) {
                return false;
            }
            zset.ordered.remove(&ScoreKey::new(old, member.to_vec()));
        }

        zset.ordered.insert(ScoreKey::new(score, member.to_vec()), ());
        zset.scores.insert(member.to_vec(), score);
        true
    }

    /// Remove `member`, returning whether it was present
    pub fn remove(&mut self, key: &[u8], member: &[u8]) -> bool {
        let Some(zset) = self.records.get_mut(key) else {
            return false;
        };
        let Some(score) = zset.scores.remove(member) else {
            return false;
        };
        zset.ordered.remove(&ScoreKey::new(score, member.to_vec()));
        if zset.scores.is_empty() {
            self.records.remove(key);
        }
        true
    }

    pub fn score(&self, key: &[u8], member: &[u8]) -> Option<f64> {
        self.records.get(key)?.scores.get(member).copied()
    }

    /// Members with `lo <= score <= hi`, ordered by score then member
    pub fn range_by_score(&self, key: &[u8], lo: f64, hi: f64) -> Vec<(Vec<u8>, f64)> {
        if Score(lo) > Score(hi) {
            return Vec::new();
        }
        let Some(zset) = self.records.get(key) else {
            return Vec::new();
        };

        let floor = ScoreKey::new(lo, Vec::new());
        zset.ordered
            .range_from(&floor)
            .take_while(|(k, _)| k.score <= Score(hi))
            .map(|(k, _)| (k.member.clone(), k.score.0))
            .collect()
    }

    /// The `n` lowest-scored members, ascending
    pub fn top(&self, key: &[u8], n: usize) -> Vec<(Vec<u8>, f64)> {
        let Some(zset) = self.records.get(key) else {
            return Vec::new();
        };
        zset.ordered
            .iter()
            .take(n)
            .map(|(k, _)| (k.member.clone(), k.score.0))
            .collect()
    }

    pub fn card(&self, key: &[u8]) -> usize {
        self.records.get(key).map_or(0, |z| z.scores.len())
    }

    pub fn is_member(&self, key: &[u8], member: &[u8]) -> bool {
        self.score(key, member).is_some()
    }

    pub fn key_exists(&self, key: &[u8]) -> bool {
        self.records.contains_key(key)
    }
}
