//! Index Module
//!
//! In-memory state of every data type, rebuilt from the log on startup.
//!
//! ## Responsibilities
//! - Strings: key → location of the latest record (values stay on disk)
//! - Lists, hashes, sets, sorted sets: the values themselves
//! - Decide which records are still live during compaction
//!
//! ## Data Structure Choice
//! ```text
//! Str   SkipList<key, Location>
//! List  HashMap<key, VecDeque<value> + value counts>
//! Hash  HashMap<key, HashMap<field, value>>
//! Set   HashMap<key, HashSet<member>>
//! ZSet  HashMap<key, SkipList<(score, member)> + member → score>
//! ```

mod hash;
mod list;
mod set;
pub mod skiplist;
mod string;
mod zset;

pub use hash::HashIndex;
pub use list::{InsertPosition, ListIndex};
pub use set::SetIndex;
pub use skiplist::SkipList;
pub use string::StrIndex;
pub use zset::{Score, ScoreKey, ZSetIndex};

use crate::error::Result;
use crate::segment::{DataType, Entry};
use crate::storage::Location;

/// The index of one data type, as seen by replay and compaction
///
/// `apply` is the single place a record changes in-memory state, so live
/// writes and startup replay go through the same code.
pub trait TypeIndex: Default + Send + Sync {
    /// Segments this index is built from
    const DATA_TYPE: DataType;

    /// Whether compacted records must be re-pointed with `relocate`
    const RELOCATES: bool = false;

    /// Apply one record found at `location`
    fn apply(&mut self, entry: Entry, location: Location) -> Result<()>;

    /// The record compaction should write in place of `entry`, if it is
    /// still live
    fn survivor(&self, entry: &Entry, location: Location) -> Result<Option<Entry>>;

    /// Complete re-emission of the current state, for types whose records
    /// cannot be judged one at a time
    fn snapshot(&self) -> Option<Vec<Entry>> {
        None
    }

    /// Point `key` at the record compaction rewrote to `location`
    fn relocate(&mut self, _key: &[u8], _location: Location) {}
}
