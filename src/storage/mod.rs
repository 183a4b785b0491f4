//! Storage Module
//!
//! Groups segment files per data type.
//!
//! ## Responsibilities
//! - One active + many archived segments per data type
//! - Rotation on overflow, naming and discovery
//! - Physical record locations used by the string index
//!
//! ## Directory Layout
//! ```text
//! {dir}/
//!   ├── 0.data.str   1.data.str   ...
//!   ├── 0.data.list  ...
//!   ├── 0.data.hash  ...
//!   ├── 0.data.set   ...
//!   ├── 0.data.zset  ...
//!   └── merged/      (compaction staging)
//! ```

mod manager;

pub use manager::SegmentSet;

/// Physical position of a record: segment id + byte offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location {
    pub file_id: u32,
    pub offset: u64,
}
