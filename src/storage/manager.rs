//! Segment Set
//!
//! Manages the segments of one data type and routes appends and reads.
//!
//! ## Responsibilities
//! - Discover existing segment files on startup
//! - Keep exactly one active segment, archive the rest by id
//! - Rotate to a new active segment when an append does not fit
//! - Resolve a `Location` back to its record

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CaskError, Result};
use crate::segment::{DataType, Entry, SegmentFile};

use super::Location;

/// The active and archived segments of one data type
///
/// Not internally synchronized: the owning keyspace lock serializes access.
pub struct SegmentSet {
    /// Directory holding the segment files
    dir: PathBuf,

    data_type: DataType,

    /// Capacity of newly created segments
    capacity: u64,

    /// Append target, always the highest id
    active: SegmentFile,

    /// Sealed segments, keyed by id
    archived: BTreeMap<u32, SegmentFile>,
}

impl SegmentSet {
    /// Open every segment of `data_type` found in `dir`
    ///
    /// The highest id becomes active; an empty directory starts at id 0.
    pub fn open(dir: &Path, data_type: DataType, capacity: u64) -> Result<Self> {
        let ids = Self::discover(dir, data_type)?;
        Self::open_ids(dir, data_type, capacity, &ids)
    }

    /// Open exactly the given segment ids
    pub fn open_ids(dir: &Path, data_type: DataType, capacity: u64, ids: &[u32]) -> Result<Self> {
        let mut ids = ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let active_id = ids.pop().unwrap_or(0);

        let mut archived = BTreeMap::new();
        for id in ids {
            archived.insert(id, SegmentFile::open(dir, id, data_type, capacity)?);
        }
        let active = SegmentFile::open(dir, active_id, data_type, capacity)?;

        Ok(Self {
            dir: dir.to_path_buf(),
            data_type,
            capacity,
            active,
            archived,
        })
    }

    /// Start an empty set whose first segment is `first_id`
    ///
    /// A leftover file with the same name is replaced.
    pub fn create(dir: &Path, data_type: DataType, capacity: u64, first_id: u32) -> Result<Self> {
        let path = SegmentFile::path_for(dir, first_id, data_type);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Self::open_ids(dir, data_type, capacity, &[first_id])
    }

    /// List the segment ids of `data_type` in `dir`, ascending
    pub fn discover(dir: &Path, data_type: DataType) -> Result<Vec<u32>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            if let Some((id, ty)) = SegmentFile::parse_file_name(&name.to_string_lossy()) {
                if ty == data_type {
                    ids.push(id);
                }
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }

    /// Append an entry, rotating first if the active segment is full
    pub fn append(&mut self, entry: &Entry, sync: bool) -> Result<Location> {
        if entry.size() > self.capacity {
            return Err(CaskError::WriteOverflow);
        }
        if !self.active.fits(entry) {
            self.rotate()?;
        }

        let offset = self.active.write(entry)?;
        if sync {
            self.active.sync()?;
        }

        Ok(Location {
            file_id: self.active.id(),
            offset,
        })
    }

    /// Archive the active segment and open `id + 1` as the new one
    fn rotate(&mut self) -> Result<()> {
        self.active.sync()?;
        let next_id = self.active.id() + 1;
        let next = SegmentFile::open(&self.dir, next_id, self.data_type, self.capacity)?;
        let sealed = std::mem::replace(&mut self.active, next);

        tracing::debug!(
            "Rotated {:?} segment {} → {}",
            self.data_type,
            sealed.id(),
            next_id
        );
        self.archived.insert(sealed.id(), sealed);
        Ok(())
    }

    /// Read the record at `location`
    pub fn read(&self, location: Location) -> Result<Entry> {
        self.file(location.file_id)?.read_at(location.offset)
    }

    /// Look up a segment by id, active or archived
    pub fn file(&self, id: u32) -> Result<&SegmentFile> {
        if self.active.id() == id {
            return Ok(&self.active);
        }
        self.archived.get(&id).ok_or(CaskError::NotInArchive(id))
    }

    /// All segments in ascending id order (archived first, active last)
    pub fn files(&self) -> impl Iterator<Item = &SegmentFile> {
        self.archived.values().chain(std::iter::once(&self.active))
    }

    pub fn files_mut(&mut self) -> impl Iterator<Item = &mut SegmentFile> {
        self.archived
            .values_mut()
            .chain(std::iter::once(&mut self.active))
    }

    /// All segment ids, ascending
    pub fn ids(&self) -> Vec<u32> {
        self.files().map(SegmentFile::id).collect()
    }

    /// Number of segments, active included
    pub fn segment_count(&self) -> usize {
        self.archived.len() + 1
    }

    pub fn active_id(&self) -> u32 {
        self.active.id()
    }

    /// Write offset of the active segment
    pub fn active_offset(&self) -> u64 {
        self.active.write_offset()
    }

    /// Resume appending to the active segment at `offset`
    pub fn resume_at(&mut self, offset: u64) {
        self.active.set_write_offset(offset);
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Flush the active segment
    pub fn sync(&self) -> Result<()> {
        self.active.sync()
    }

    /// Unmap every segment, optionally flushing first
    pub fn close(self, sync: bool) -> Result<()> {
        for file in self.archived.into_values() {
            file.close(sync)?;
        }
        self.active.close(sync)
    }

    /// Close every segment and delete its file
    pub fn destroy(self) -> Result<()> {
        for file in self.archived.into_values().chain(std::iter::once(self.active)) {
            let path = file.path().to_path_buf();
            file.close(false)?;
            fs::remove_file(&path)?;
        }
        Ok(())
    }

    /// Flush and close every segment, then rename the files into `dir`
    ///
    /// Returns the moved ids and the active write offset.
    pub fn move_to(self, dir: &Path) -> Result<(Vec<u32>, u64)> {
        let ids = self.ids();
        let active_offset = self.active.write_offset();

        for file in self.archived.into_values().chain(std::iter::once(self.active)) {
            let from = file.path().to_path_buf();
            let to = SegmentFile::path_for(dir, file.id(), file.data_type());
            file.close(true)?;
            fs::rename(&from, &to)?;
        }
        Ok((ids, active_offset))
    }
}

impl std::fmt::Debug for SegmentSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentSet")
            .field("data_type", &self.data_type)
            .field("ids", &self.ids())
            .field("active_offset", &self.active.write_offset())
            .finish()
    }
}
