//! Segment Reader
//!
//! Sequential iteration over the records of one segment.

use crate::error::{CaskError, Result};

use super::entry::{Entry, HEADER_SIZE};
use super::file::SegmentFile;

/// Iterator over `(offset, entry)` pairs in ascending offset order
///
/// Ends at the first all-zero header or when no complete header fits
/// before the end of the map. A CRC mismatch is yielded as an error and the
/// scan continues behind the bad record; any other failure is yielded once
/// and ends the scan.
pub struct SegmentIter<'a> {
    file: &'a SegmentFile,
    offset: u64,
    done: bool,
}

impl<'a> SegmentIter<'a> {
    pub fn new(file: &'a SegmentFile) -> Self {
        Self {
            file,
            offset: 0,
            done: false,
        }
    }

    /// Offset just past the last record yielded so far
    pub fn offset(&self) -> u64 {
        self.offset
    }
}

impl<'a> Iterator for SegmentIter<'a> {
    type Item = Result<(u64, Entry)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.offset + HEADER_SIZE as u64 > self.file.capacity() {
            self.done = true;
            return None;
        }

        let header = match self.file.read_header(self.offset) {
            Ok(header) => header,
            Err(CaskError::EmptyHeader) => {
                self.done = true;
                return None;
            }
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };

        let offset = self.offset;
        match self.file.read_at(offset) {
            Ok(entry) => {
                self.offset += header.record_size();
                Some(Ok((offset, entry)))
            }
            Err(CaskError::CrcCheckFailed) => {
                self.offset += header.record_size();
                Some(Err(CaskError::CrcCheckFailed))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
