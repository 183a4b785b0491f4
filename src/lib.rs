//! # CaskKV
//!
//! An embedded, log-structured key-value engine in the Bitcask style with:
//! - Five data models: strings, lists, hashes, sets and sorted sets
//! - Append-only, memory-mapped segment files per data type
//! - In-memory indexes rebuilt by replaying the log on startup
//! - Online compaction that rewrites only live records
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                            Db                               │
//! │           (validation, one RwLock per data type)            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!       ┌───────┬───────┼───────┬───────┐
//!       ▼       ▼       ▼       ▼       ▼
//!     ┌─────┐ ┌─────┐ ┌─────┐ ┌─────┐ ┌─────┐
//!     │ Str │ │List │ │Hash │ │ Set │ │ZSet │   Type Indexes
//!     └──┬──┘ └──┬──┘ └──┬──┘ └──┬──┘ └──┬──┘
//!        │       │       │       │       │
//!        ▼       ▼       ▼       ▼       ▼
//!   ┌─────────────────────────────────────────┐
//!   │   SegmentSet per type (active + archive) │ ◄── Merge (background)
//!   └─────────────────────────────────────────┘
//!                       │
//!                       ▼
//!            {dir}/{id}.data.{str|list|hash|set|zset}
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use caskkv::{Config, Db};
//!
//! let db = Db::open(Config::builder().dir("/tmp/caskkv").build())?;
//! db.set(b"name", b"cask")?;
//! db.rpush(b"queue", &["a", "b"])?;
//! db.zadd(b"scores", 90.0, b"alice")?;
//! assert_eq!(db.get(b"name")?, b"cask");
//! # Ok::<(), caskkv::CaskError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod codec;
pub mod config;
pub mod error;

pub mod index;
pub mod segment;
pub mod storage;

mod db;
mod merge;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::Config;
pub use db::{Db, DbState, MERGED_DIR};
pub use error::{CaskError, Result};
pub use index::InsertPosition;
pub use segment::DataType;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of CaskKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
