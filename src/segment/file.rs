//! Segment File
//!
//! One fixed-capacity, memory-mapped, append-only file.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use memmap2::MmapMut;

use crate::error::{CaskError, Result};

use super::entry::{DataType, Entry, EntryHeader, HEADER_SIZE};

/// A memory-mapped segment file
///
/// The file is pre-extended to its capacity when opened, so the unused tail
/// reads as zeros. Appends copy into the map; nothing is written through the
/// file handle.
pub struct SegmentFile {
    /// Segment id, unique per data type
    id: u32,

    data_type: DataType,

    path: PathBuf,

    /// Declared before `file` so the mapping is dropped first
    mmap: MmapMut,

    #[allow(dead_code)]
    file: File,

    /// Next append position
    write_offset: u64,
}

impl SegmentFile {
    /// Open or create the segment `id` of `data_type` inside `dir`
    ///
    /// The write offset starts at the file's size before extension. Replay
    /// moves it back to the true end of live data afterwards.
    pub fn open(dir: &Path, id: u32, data_type: DataType, capacity: u64) -> Result<Self> {
        let path = Self::path_for(dir, id, data_type);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        let existing_len = file.metadata()?.len();
        // Never shrink a segment written under a larger capacity
        file.set_len(capacity.max(existing_len))?;

        // Safety: the directory is owned by a single process and the file
        // handle lives as long as the map.
        let mmap = unsafe { MmapMut::map_mut(&file)? };

        Ok(Self {
            id,
            data_type,
            path,
            mmap,
            file,
            write_offset: existing_len,
        })
    }

    /// File path for a segment: `{dir}/{id}.data.{suffix}`
    pub fn path_for(dir: &Path, id: u32, data_type: DataType) -> PathBuf {
        dir.join(Self::file_name(id, data_type))
    }

    pub fn file_name(id: u32, data_type: DataType) -> String {
        format!("{}.data.{}", id, data_type.suffix())
    }

    /// Parse "42.data.str" → Some((42, DataType::Str))
    pub fn parse_file_name(name: &str) -> Option<(u32, DataType)> {
        let mut parts = name.split('.');
        let id = parts.next()?.parse().ok()?;
        if parts.next()? != "data" {
            return None;
        }
        let data_type = DataType::from_suffix(parts.next()?)?;
        if parts.next().is_some() {
            return None;
        }
        Some((id, data_type))
    }

    /// Read the record starting at `offset`
    pub fn read_at(&self, offset: u64) -> Result<Entry> {
        let header = self.read_header(offset)?;
        let key_start = offset + HEADER_SIZE as u64;
        let value_start = key_start + header.key_size as u64;
        let key = self.slice(key_start, header.key_size as u64)?;
        let value = self.slice(value_start, header.value_size as u64)?;
        header.into_entry(key, value)
    }

    /// Read only the header at `offset`
    pub fn read_header(&self, offset: u64) -> Result<EntryHeader> {
        EntryHeader::decode(self.slice(offset, HEADER_SIZE as u64)?)
    }

    /// Append an entry, returning the offset it was written at
    pub fn write(&mut self, entry: &Entry) -> Result<u64> {
        let bytes = entry.encode();
        let start = self.write_offset;
        let end = start + bytes.len() as u64;
        if end > self.capacity() {
            return Err(CaskError::WriteOverflow);
        }

        self.mmap[start as usize..end as usize].copy_from_slice(&bytes);
        self.write_offset = end;
        Ok(start)
    }

    /// Flush mapped pages to disk
    pub fn sync(&self) -> Result<()> {
        self.mmap.flush()?;
        Ok(())
    }

    /// Optionally flush, then unmap and release the file
    pub fn close(self, sync: bool) -> Result<()> {
        if sync {
            self.sync()?;
        }
        Ok(())
    }

    /// Whether `entry` still fits behind the current write offset
    pub fn fits(&self, entry: &Entry) -> bool {
        self.write_offset + entry.size() <= self.capacity()
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_offset(&self) -> u64 {
        self.write_offset
    }

    /// Move the append position, used once the live length is known
    pub fn set_write_offset(&mut self, offset: u64) {
        self.write_offset = offset.min(self.capacity());
    }

    /// Clear every byte from `offset` to the end of the map
    pub fn zero_from(&mut self, offset: u64) {
        let start = offset.min(self.capacity()) as usize;
        self.mmap[start..].fill(0);
    }

    /// Mapped size in bytes
    pub fn capacity(&self) -> u64 {
        self.mmap.len() as u64
    }

    fn slice(&self, offset: u64, len: u64) -> Result<&[u8]> {
        let end = offset.checked_add(len).ok_or(CaskError::ReadOverflow)?;
        if end > self.capacity() {
            return Err(CaskError::ReadOverflow);
        }
        Ok(&self.mmap[offset as usize..end as usize])
    }
}

impl std::fmt::Debug for SegmentFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentFile")
            .field("id", &self.id)
            .field("data_type", &self.data_type)
            .field("write_offset", &self.write_offset)
            .field("capacity", &self.capacity())
            .finish()
    }
}
