//! Segment Module
//!
//! The append-only log files and their record format.
//!
//! ## Responsibilities
//! - Encode/decode single records with CRC32 over the value
//! - Fixed-capacity, memory-mapped segment files
//! - Sequential scans that stop at the zero-filled tail
//! - Startup replay of a segment
//!
//! ## Record Format (big-endian)
//! ```text
//! ┌─────────┬───────────────┬───────────┬──────────────┬────────────────┬────────────────┬──────┬───────┐
//! │ CRC (4) │ Timestamp (8) │ State (2) │ KeySize (4)  │ ValueSize (4)  │ KeyOffset (4)  │ Key  │ Value │
//! └─────────┴───────────────┴───────────┴──────────────┴────────────────┴────────────────┴──────┴───────┘
//!   State = data type (high byte) | mark (low byte)
//!   KeyOffset > 0 splits Key into primary || secondary
//! ```
//!
//! ## File Layout
//! ```text
//! ┌──────────┬──────────┬─────┬──────────┬────────────────────────────┐
//! │ Record 0 │ Record 1 │ ... │ Record n │ 0x00 ... (pre-allocated)   │
//! └──────────┴──────────┴─────┴──────────┴────────────────────────────┘
//! ```

mod entry;
mod file;
mod reader;
mod recovery;

pub use entry::{DataType, Entry, EntryHeader, Op, HEADER_SIZE};
pub use file::SegmentFile;
pub use reader::SegmentIter;
pub use recovery::{RecoveryResult, SegmentRecovery};
