//! Segment Recovery
//!
//! Replays the records of a segment on startup.

use crate::error::{CaskError, Result};

use super::entry::Entry;
use super::file::SegmentFile;
use super::reader::SegmentIter;

/// Replays segments into a callback
pub struct SegmentRecovery;

/// Result of a recovery operation
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Number of entries successfully replayed
    pub entries_recovered: u64,

    /// Number of corrupted entries skipped
    pub entries_corrupted: u64,

    /// Number of segments scanned
    pub segments_scanned: u64,
}

impl RecoveryResult {
    pub fn merge(&mut self, other: RecoveryResult) {
        self.entries_recovered += other.entries_recovered;
        self.entries_corrupted += other.entries_corrupted;
        self.segments_scanned += other.segments_scanned;
    }
}

impl SegmentRecovery {
    /// Replay every record of `file` in offset order
    ///
    /// A record with a bad CRC is skipped. Any other decode failure ends the
    /// scan of this segment, since the sizes after it cannot be trusted, and
    /// everything behind the last good record is zeroed so later appends
    /// never sit in front of stale bytes.
    ///
    /// A `SegmentCorruption` from `apply` skips that record; any other error
    /// aborts the replay. The segment's write offset is moved to the end of
    /// the last record read.
    pub fn replay<F>(file: &mut SegmentFile, mut apply: F) -> Result<RecoveryResult>
    where
        F: FnMut(Entry, u64) -> Result<()>,
    {
        let mut result = RecoveryResult {
            segments_scanned: 1,
            ..RecoveryResult::default()
        };

        let mut truncated = false;
        let mut iter = SegmentIter::new(file);
        for item in iter.by_ref() {
            match item {
                Ok((offset, entry)) => match apply(entry, offset) {
                    Ok(()) => result.entries_recovered += 1,
                    Err(CaskError::SegmentCorruption(reason)) => {
                        tracing::warn!(
                            "Skipping record at {} in segment {} of {:?}: {}",
                            offset,
                            file.id(),
                            file.data_type(),
                            reason
                        );
                        result.entries_corrupted += 1;
                    }
                    Err(e) => return Err(e),
                },
                Err(CaskError::CrcCheckFailed) => {
                    tracing::warn!(
                        "Skipping corrupt record in segment {} of {:?}",
                        file.id(),
                        file.data_type()
                    );
                    result.entries_corrupted += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        "Stopping replay of segment {} of {:?}: {}",
                        file.id(),
                        file.data_type(),
                        e
                    );
                    result.entries_corrupted += 1;
                    truncated = true;
                }
            }
        }
        let live_len = iter.offset();

        if truncated {
            file.zero_from(live_len);
        }
        file.set_write_offset(live_len);
        Ok(result)
    }
}
