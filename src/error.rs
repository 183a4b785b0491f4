//! Error types for CaskKV
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using CaskError
pub type Result<T> = std::result::Result<T, CaskError>;

/// Unified error type for CaskKV operations
#[derive(Debug, Error)]
pub enum CaskError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Validation Errors (rejected before any I/O)
    // -------------------------------------------------------------------------
    #[error("the size of key can not be 0")]
    KeyEmpty,

    #[error("key size larger than max")]
    KeySizeLimit,

    #[error("value size larger than max")]
    ValueSizeLimit,

    // -------------------------------------------------------------------------
    // Lookup Errors
    // -------------------------------------------------------------------------
    #[error("key not found")]
    KeyNotExist,

    // -------------------------------------------------------------------------
    // Segment Errors
    // -------------------------------------------------------------------------
    #[error("entry too large for the segment")]
    WriteOverflow,

    #[error("read offset overflows the segment")]
    ReadOverflow,

    /// All-zero header: the unused tail of a pre-allocated segment.
    #[error("read an empty entry header")]
    EmptyHeader,

    #[error("crc check failed")]
    CrcCheckFailed,

    #[error("segment corruption detected: {0}")]
    SegmentCorruption(String),

    #[error("segment {0} is not in the archive")]
    NotInArchive(u32),

    // -------------------------------------------------------------------------
    // Lifecycle Errors
    // -------------------------------------------------------------------------
    #[error("using a closed database")]
    ClosedDatabaseUsed,

    #[error("merge started while another merge is running")]
    MergeAlreadyRunning,

    #[error("merge task failed: {0}")]
    MergeTask(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}
