//! Database Module
//!
//! The handle callers use: lifecycle, validation, replay and the per-type
//! operations (one file per data type).
//!
//! ## Concurrency Model
//!
//! - Every data type has its own `RwLock<Keyspace>`
//!   - Reads take the read lock, anything that appends takes the write lock
//!   - An operation only ever holds one type's lock
//! - Compaction holds a type's write lock for the whole rewrite of that type
//! - Lifecycle state (`Active` / `Merging` / `Closed`) sits behind a `Mutex`

mod hash;
mod list;
mod set;
mod string;
mod zset;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::config::Config;
use crate::error::{CaskError, Result};
use crate::index::{HashIndex, ListIndex, SetIndex, StrIndex, TypeIndex, ZSetIndex};
use crate::merge::{self, CancelToken, MergeScheduler};
use crate::segment::{DataType, Entry, RecoveryResult, SegmentRecovery};
use crate::storage::{Location, SegmentSet};

/// Name of the compaction staging directory inside the data directory
pub const MERGED_DIR: &str = "merged";

/// Lifecycle of a database handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbState {
    /// Serving reads and writes
    Active,

    /// Serving reads and writes while a compaction runs
    Merging,

    /// Closed; every operation fails with `ClosedDatabaseUsed`
    Closed,
}

/// The segments and index of one data type
pub(crate) struct Keyspace<I> {
    /// `None` once the database is closed
    pub(crate) segments: Option<SegmentSet>,

    pub(crate) index: I,
}

impl<I: TypeIndex> Keyspace<I> {
    /// Open the type's segments and replay them into a fresh index
    fn open(config: &Config) -> Result<(Self, RecoveryResult)> {
        merge::recover(&config.dir, I::DATA_TYPE)?;
        let mut segments = SegmentSet::open(&config.dir, I::DATA_TYPE, config.max_file_size)?;
        let mut index = I::default();
        let mut stats = RecoveryResult::default();

        for file in segments.files_mut() {
            let file_id = file.id();
            let result = SegmentRecovery::replay(file, |entry, offset| {
                index.apply(entry, Location { file_id, offset })
            })?;
            stats.merge(result);
        }

        let keyspace = Self {
            segments: Some(segments),
            index,
        };
        Ok((keyspace, stats))
    }

    pub(crate) fn segments(&self) -> Result<&SegmentSet> {
        self.segments.as_ref().ok_or(CaskError::ClosedDatabaseUsed)
    }

    pub(crate) fn ensure_open(&self) -> Result<()> {
        self.segments().map(|_| ())
    }

    /// Append `entry` to the log, then apply it to the index
    pub(crate) fn commit(&mut self, entry: Entry, sync: bool) -> Result<Location> {
        let segments = self
            .segments
            .as_mut()
            .ok_or(CaskError::ClosedDatabaseUsed)?;
        let location = segments.append(&entry, sync)?;
        self.index.apply(entry, location)?;
        Ok(location)
    }

    fn close(&mut self) -> Result<()> {
        match self.segments.take() {
            Some(segments) => segments.close(true),
            None => Ok(()),
        }
    }
}

/// Shared state behind a `Db`, also held by the merge scheduler thread
pub(crate) struct Store {
    pub(crate) config: Config,
    pub(crate) strs: RwLock<Keyspace<StrIndex>>,
    pub(crate) lists: RwLock<Keyspace<ListIndex>>,
    pub(crate) hashes: RwLock<Keyspace<HashIndex>>,
    pub(crate) sets: RwLock<Keyspace<SetIndex>>,
    pub(crate) zsets: RwLock<Keyspace<ZSetIndex>>,
    pub(crate) state: Mutex<DbState>,

    /// Asks an in-flight compaction to stop at the next segment boundary
    pub(crate) cancel: CancelToken,
}

impl Store {
    /// Close every keyspace, continuing past failures
    fn close_all(&self) -> Result<()> {
        let results = [
            self.strs.write().close(),
            self.lists.write().close(),
            self.hashes.write().close(),
            self.sets.write().close(),
            self.zsets.write().close(),
        ];
        results.into_iter().collect()
    }

    /// Run `f` against the segment set of `data_type`
    fn with_segments<R>(&self, data_type: DataType, f: impl FnOnce(Option<&SegmentSet>) -> R) -> R {
        match data_type {
            DataType::Str => f(self.strs.read().segments.as_ref()),
            DataType::List => f(self.lists.read().segments.as_ref()),
            DataType::Hash => f(self.hashes.read().segments.as_ref()),
            DataType::Set => f(self.sets.read().segments.as_ref()),
            DataType::ZSet => f(self.zsets.read().segments.as_ref()),
        }
    }
}

/// An open database directory
///
/// All operations take `&self`; the handle is `Send + Sync` and can be
/// shared across threads behind an `Arc`.
pub struct Db {
    pub(crate) store: Arc<Store>,

    /// Background compaction timer, if enabled
    scheduler: Mutex<Option<MergeScheduler>>,
}

impl Db {
    /// Open or create a database with the given config
    ///
    /// On startup:
    /// 1. Create the data and staging directories
    /// 2. Finish or discard interrupted merges, then replay every segment
    ///    of every type into its index
    /// 3. Start the merge timer if an interval is configured
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        // Step 1: Directories
        fs::create_dir_all(&config.dir)?;
        fs::create_dir_all(config.dir.join(MERGED_DIR))?;

        // Step 2: Replay
        let mut stats = RecoveryResult::default();
        let (strs, s) = Keyspace::<StrIndex>::open(&config)?;
        stats.merge(s);
        let (lists, s) = Keyspace::<ListIndex>::open(&config)?;
        stats.merge(s);
        let (hashes, s) = Keyspace::<HashIndex>::open(&config)?;
        stats.merge(s);
        let (sets, s) = Keyspace::<SetIndex>::open(&config)?;
        stats.merge(s);
        let (zsets, s) = Keyspace::<ZSetIndex>::open(&config)?;
        stats.merge(s);

        tracing::info!(
            "Opened {}: {} records replayed, {} corrupt, {} segments",
            config.dir.display(),
            stats.entries_recovered,
            stats.entries_corrupted,
            stats.segments_scanned
        );

        let store = Arc::new(Store {
            config,
            strs: RwLock::new(strs),
            lists: RwLock::new(lists),
            hashes: RwLock::new(hashes),
            sets: RwLock::new(sets),
            zsets: RwLock::new(zsets),
            state: Mutex::new(DbState::Active),
            cancel: CancelToken::new(),
        });

        // Step 3: Merge timer
        let scheduler = match store.config.merge_interval {
            Some(interval) => Some(MergeScheduler::start(Arc::clone(&store), interval)?),
            None => None,
        };

        Ok(Self {
            store,
            scheduler: Mutex::new(scheduler),
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().dir(path).build())
    }

    /// Compact every data type now
    ///
    /// Fails with `MergeAlreadyRunning` if the timer (or another caller) is
    /// already compacting.
    pub fn merge(&self) -> Result<()> {
        merge::run(&self.store)
    }

    /// Stop the merge timer and ask an in-flight merge to wind down
    ///
    /// `merge` can still be called manually afterwards.
    pub fn stop_merge(&self) -> Result<()> {
        self.ensure_not_closed()?;
        self.store.cancel.cancel();
        if let Some(scheduler) = self.scheduler.lock().take() {
            scheduler.stop();
        }
        Ok(())
    }

    /// Flush and close every segment
    ///
    /// Later operations fail with `ClosedDatabaseUsed`.
    pub fn close(&self) -> Result<()> {
        {
            let mut state = self.store.state.lock();
            if *state == DbState::Closed {
                return Err(CaskError::ClosedDatabaseUsed);
            }
            *state = DbState::Closed;
        }

        self.store.cancel.cancel();
        if let Some(scheduler) = self.scheduler.lock().take() {
            scheduler.stop();
        }

        self.store.close_all()?;
        tracing::info!("Closed {}", self.store.config.dir.display());
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    pub fn state(&self) -> DbState {
        *self.store.state.lock()
    }

    pub fn is_merging(&self) -> bool {
        self.state() == DbState::Merging
    }

    pub fn is_closed(&self) -> bool {
        self.state() == DbState::Closed
    }

    /// Get the data directory path
    pub fn dir(&self) -> &Path {
        &self.store.config.dir
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.store.config
    }

    /// Number of segments (active included) of `data_type`
    pub fn segment_count(&self, data_type: DataType) -> Result<usize> {
        self.store.with_segments(data_type, |segments| {
            segments
                .map(SegmentSet::segment_count)
                .ok_or(CaskError::ClosedDatabaseUsed)
        })
    }

    /// Segment ids of `data_type`, ascending
    pub fn segment_ids(&self, data_type: DataType) -> Result<Vec<u32>> {
        self.store.with_segments(data_type, |segments| {
            segments
                .map(SegmentSet::ids)
                .ok_or(CaskError::ClosedDatabaseUsed)
        })
    }

    // =========================================================================
    // Validation
    // =========================================================================

    fn ensure_not_closed(&self) -> Result<()> {
        match self.state() {
            DbState::Closed => Err(CaskError::ClosedDatabaseUsed),
            _ => Ok(()),
        }
    }

    /// Keys, hash fields and set-move destinations
    fn check_key(&self, key: &[u8]) -> Result<()> {
        if key.is_empty() {
            return Err(CaskError::KeyEmpty);
        }
        if key.len() > self.store.config.max_key_size as usize {
            return Err(CaskError::KeySizeLimit);
        }
        Ok(())
    }

    fn check_value(&self, value: &[u8]) -> Result<()> {
        if value.len() > self.store.config.max_value_size as usize {
            return Err(CaskError::ValueSizeLimit);
        }
        Ok(())
    }

    fn sync(&self) -> bool {
        self.store.config.write_sync
    }
}

impl Drop for Db {
    fn drop(&mut self) {
        if self.is_closed() {
            return;
        }
        if let Err(e) = self.close() {
            tracing::warn!("Failed to close {} on drop: {}", self.dir().display(), e);
        }
    }
}

impl std::fmt::Debug for Db {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Db")
            .field("dir", &self.store.config.dir)
            .field("state", &self.state())
            .finish()
    }
}

// =============================================================================
// Record helpers shared by the type indexes
// =============================================================================

/// The secondary key component a record of this kind must carry
pub(crate) fn secondary(entry: &Entry) -> Result<&[u8]> {
    entry.secondary.as_deref().ok_or_else(|| {
        CaskError::SegmentCorruption(format!("{:?} record without secondary key", entry.op))
    })
}

/// Error for a record whose op belongs to another data type
pub(crate) fn misplaced(entry: &Entry, data_type: DataType) -> CaskError {
    CaskError::SegmentCorruption(format!(
        "{:?} record in a {:?} segment",
        entry.op, data_type
    ))
}
