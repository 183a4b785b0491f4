//! Merge Module
//!
//! Online compaction: rewrite only the live records of each data type into
//! fresh segments and swap them in.
//!
//! ## Protocol (per data type, five types in parallel)
//! ```text
//! 1. take the type's write lock
//! 2. stage fresh segments in {dir}/merged/, numbered after the newest id
//!      list:   re-emit every list from memory (snapshot)
//!      others: copy each record the index still considers live
//! 3. write the commit marker
//! 4. rename the staged files into {dir}
//! 5. install them, delete the old segments, re-point moved strings
//! 6. raise the floor, drop the commit marker, release the lock
//! ```
//!
//! Cancellation is checked between segments. A cancelled type throws its
//! staged files away and keeps its old segments. A crash after step 3 is
//! finished on the next open (see `commit`).

mod commit;
mod scheduler;
mod snapshot;

pub(crate) use commit::recover;
pub(crate) use scheduler::MergeScheduler;

use std::collections::HashSet;
use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;

use crate::config::Config;
use crate::db::{DbState, Keyspace, Store, MERGED_DIR};
use crate::error::{CaskError, Result};
use crate::index::TypeIndex;
use crate::segment::{DataType, Entry, SegmentFile, SegmentIter};
use crate::storage::{Location, SegmentSet};

/// Shared stop flag for an in-flight merge
#[derive(Debug, Clone, Default)]
pub(crate) struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub(crate) fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Holds the `Merging` state for the duration of a run
struct MergeGuard<'a> {
    store: &'a Store,
}

impl<'a> MergeGuard<'a> {
    fn begin(store: &'a Store) -> Result<Self> {
        let mut state = store.state.lock();
        match *state {
            DbState::Active => {
                *state = DbState::Merging;
                store.cancel.reset();
                Ok(Self { store })
            }
            DbState::Merging => Err(CaskError::MergeAlreadyRunning),
            DbState::Closed => Err(CaskError::ClosedDatabaseUsed),
        }
    }
}

impl Drop for MergeGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.store.state.lock();
        if *state == DbState::Merging {
            *state = DbState::Active;
        }
    }
}

/// What happened to one data type during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    /// At most one segment, nothing to gain
    Skipped,
    Cancelled,
    Compacted { before: usize, after: usize },
}

/// Compact every data type, one task per type
///
/// All tasks run to completion; the first failure is returned.
pub(crate) fn run(store: &Store) -> Result<()> {
    let _guard = MergeGuard::begin(store)?;

    let started = Instant::now();
    tracing::info!("Merge started in {}", store.config.dir.display());

    let config = &store.config;
    let cancel = &store.cancel;
    let results = crossbeam::scope(|s| {
        let tasks = vec![
            (DataType::Str, s.spawn(|_| compact(&store.strs, config, cancel))),
            (DataType::List, s.spawn(|_| compact(&store.lists, config, cancel))),
            (DataType::Hash, s.spawn(|_| compact(&store.hashes, config, cancel))),
            (DataType::Set, s.spawn(|_| compact(&store.sets, config, cancel))),
            (DataType::ZSet, s.spawn(|_| compact(&store.zsets, config, cancel))),
        ];

        tasks
            .into_iter()
            .map(|(data_type, task)| {
                let result = task.join().unwrap_or_else(|_| {
                    Err(CaskError::MergeTask(format!(
                        "{:?} compaction panicked",
                        data_type
                    )))
                });
                (data_type, result)
            })
            .collect::<Vec<_>>()
    })
    .map_err(|_| CaskError::MergeTask("merge scope panicked".to_string()))?;

    let mut first_error = None;
    for (data_type, result) in results {
        match result {
            Ok(Outcome::Compacted { before, after }) => {
                tracing::info!("Merged {:?}: {} → {} segments", data_type, before, after);
            }
            Ok(Outcome::Skipped) => {
                tracing::debug!("Merge skipped {:?}", data_type);
            }
            Ok(Outcome::Cancelled) => {
                tracing::info!("Merge of {:?} cancelled", data_type);
            }
            Err(e) => {
                tracing::warn!("Merge of {:?} failed: {}", data_type, e);
                first_error.get_or_insert(e);
            }
        }
    }

    tracing::info!("Merge finished in {:?}", started.elapsed());
    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Compact one data type under its write lock
fn compact<I: TypeIndex>(
    keyspace: &RwLock<Keyspace<I>>,
    config: &Config,
    cancel: &CancelToken,
) -> Result<Outcome> {
    let data_type = I::DATA_TYPE;
    let mut ks = keyspace.write();

    // Closed while this task waited for the lock
    let Some(old) = ks.segments.as_ref() else {
        return Ok(Outcome::Cancelled);
    };
    let before = old.segment_count();
    if before <= 1 {
        return Ok(Outcome::Skipped);
    }

    // Step 1: Stage fresh segments after the newest existing id
    let merged_dir = config.dir.join(MERGED_DIR);
    fs::create_dir_all(&merged_dir)?;
    commit::clear_staged(&merged_dir, data_type)?;
    let first_id = old.active_id() + 1;
    let mut staged = SegmentSet::create(&merged_dir, data_type, config.max_file_size, first_id)?;
    tracing::debug!("Staging {:?} merge from segment {}", data_type, first_id);

    // Step 2: Write the live state
    let written = match ks.index.snapshot() {
        Some(entries) => snapshot::write(&mut staged, entries, cancel),
        None => rewrite(old, &ks.index, &mut staged, cancel),
    };
    let moved = match written {
        Ok(Some(moved)) => moved,
        Ok(None) => {
            staged.destroy()?;
            return Ok(Outcome::Cancelled);
        }
        Err(e) => {
            if let Err(cleanup) = staged.destroy() {
                tracing::warn!("Failed to discard staged {:?} segments: {}", data_type, cleanup);
            }
            return Err(e);
        }
    };

    // Step 3: From here on the staged segments replace the old ones
    commit::mark_staged(&merged_dir, data_type, first_id)?;

    // Step 4: Move the staged files next to the old ones
    let (ids, active_offset) = staged.move_to(&config.dir)?;
    let mut fresh = SegmentSet::open_ids(&config.dir, data_type, config.max_file_size, &ids)?;
    fresh.resume_at(active_offset);
    let after = fresh.segment_count();

    // Step 5: Install, re-point, drop the old segments
    let old = ks.segments.replace(fresh);
    for (key, location) in moved {
        ks.index.relocate(&key, location);
    }
    if let Some(old) = old {
        old.destroy()?;
    }

    // Step 6: Segments below first_id are now garbage
    commit::finish(&merged_dir, data_type, first_id)?;

    Ok(Outcome::Compacted { before, after })
}

/// Copy every record the index still considers live into `staged`
///
/// Returns the new location of each copied record, or `None` if cancelled.
fn rewrite<I: TypeIndex>(
    old: &SegmentSet,
    index: &I,
    staged: &mut SegmentSet,
    cancel: &CancelToken,
) -> Result<Option<Vec<(Vec<u8>, Location)>>> {
    let mut moved = Vec::new();
    let mut seen = HashSet::new();

    for file in old.files() {
        if cancel.is_cancelled() {
            return Ok(None);
        }

        for (offset, entry) in live_records(file) {
            if !entry.op.is_write() {
                continue;
            }
            let location = Location {
                file_id: file.id(),
                offset,
            };
            let survivor = match index.survivor(&entry, location) {
                Ok(Some(survivor)) => survivor,
                Ok(None) => continue,
                Err(CaskError::SegmentCorruption(reason)) => {
                    tracing::warn!(
                        "Merge dropping record at {} in {:?} segment {}: {}",
                        offset,
                        file.data_type(),
                        file.id(),
                        reason
                    );
                    continue;
                }
                Err(e) => return Err(e),
            };

            // Relocated survivors are unique by location already; the
            // others repeat when the same write was made twice
            if !I::RELOCATES {
                let identity = (
                    survivor.key.clone(),
                    survivor.secondary.clone(),
                    survivor.value.clone(),
                );
                if !seen.insert(identity) {
                    continue;
                }
            }

            let new_location = staged.append(&survivor, false)?;
            if I::RELOCATES {
                moved.push((survivor.key, new_location));
            }
        }
    }

    staged.sync()?;
    Ok(Some(moved))
}

/// Decodable records of one segment, skipping corrupt ones the same way
/// startup replay does
fn live_records(file: &SegmentFile) -> impl Iterator<Item = (u64, Entry)> + '_ {
    SegmentIter::new(file).filter_map(move |item| match item {
        Ok(record) => Some(record),
        Err(e) => {
            tracing::warn!(
                "Merge skipping unreadable record in {:?} segment {}: {}",
                file.data_type(),
                file.id(),
                e
            );
            None
        }
    })
}
