//! List snapshot
//!
//! Lists cannot be compacted record by record: the same value can be
//! pushed, popped and pushed again, so no single record is "the" live one.
//! Instead the whole in-memory state is written out as `RPush` runs.

use crate::error::Result;
use crate::segment::Entry;
use crate::storage::{Location, SegmentSet};

use super::CancelToken;

/// Append `entries` to `staged`, checking for cancellation before the first
/// segment and each time the staged set rotates to a new one
///
/// Returns `None` if cancelled. Snapshot records are never re-pointed, so
/// the moved list is always empty.
pub(super) fn write(
    staged: &mut SegmentSet,
    entries: Vec<Entry>,
    cancel: &CancelToken,
) -> Result<Option<Vec<(Vec<u8>, Location)>>> {
    if cancel.is_cancelled() {
        return Ok(None);
    }
    let mut segment = staged.active_id();

    for entry in &entries {
        let location = staged.append(entry, false)?;
        if location.file_id != segment {
            segment = location.file_id;
            if cancel.is_cancelled() {
                return Ok(None);
            }
        }
    }

    staged.sync()?;
    tracing::debug!(
        "Wrote {} snapshot records over {} segments",
        entries.len(),
        staged.segment_count()
    );
    Ok(Some(Vec::new()))
}
