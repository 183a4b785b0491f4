//! Entry definitions
//!
//! Defines a single log record and its wire encoding.

use std::time::{SystemTime, UNIX_EPOCH};

use bytes::{Buf, BufMut};

use crate::error::{CaskError, Result};

/// Header size: crc(4) + timestamp(8) + state(2) + key_size(4) + value_size(4) + key_offset(4)
pub const HEADER_SIZE: usize = 26;

/// The logical data model a record belongs to (high byte of `state`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum DataType {
    Str = 0,
    List = 1,
    Hash = 2,
    Set = 3,
    ZSet = 4,
}

impl DataType {
    /// Every data type, in tag order
    pub const ALL: [DataType; 5] = [
        DataType::Str,
        DataType::List,
        DataType::Hash,
        DataType::Set,
        DataType::ZSet,
    ];

    /// File name suffix of this type's segments
    pub fn suffix(self) -> &'static str {
        match self {
            DataType::Str => "str",
            DataType::List => "list",
            DataType::Hash => "hash",
            DataType::Set => "set",
            DataType::ZSet => "zset",
        }
    }

    pub fn from_suffix(suffix: &str) -> Option<Self> {
        DataType::ALL.into_iter().find(|t| t.suffix() == suffix)
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        DataType::ALL.get(tag as usize).copied()
    }
}

/// The operation a record describes (low byte of `state`)
///
/// Tags restart at zero inside every data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Set,
    Remove,
    LPush,
    RPush,
    LPop,
    RPop,
    LInsert,
    LSet,
    LRem,
    HSet,
    HDel,
    SAdd,
    SRem,
    SMove,
    ZAdd,
    ZRem,
}

impl Op {
    pub fn data_type(self) -> DataType {
        match self {
            Op::Set | Op::Remove => DataType::Str,
            Op::LPush | Op::RPush | Op::LPop | Op::RPop | Op::LInsert | Op::LSet | Op::LRem => {
                DataType::List
            }
            Op::HSet | Op::HDel => DataType::Hash,
            Op::SAdd | Op::SRem | Op::SMove => DataType::Set,
            Op::ZAdd | Op::ZRem => DataType::ZSet,
        }
    }

    pub fn mark(self) -> u8 {
        match self {
            Op::Set | Op::LPush | Op::HSet | Op::SAdd | Op::ZAdd => 0,
            Op::Remove | Op::RPush | Op::HDel | Op::SRem | Op::ZRem => 1,
            Op::LPop | Op::SMove => 2,
            Op::RPop => 3,
            Op::LInsert => 4,
            Op::LSet => 5,
            Op::LRem => 6,
        }
    }

    /// Combined `state` field: data type in the high byte, mark in the low byte
    pub fn state(self) -> u16 {
        (self.data_type() as u16) << 8 | self.mark() as u16
    }

    pub fn from_state(state: u16) -> Result<Self> {
        let tag = (state >> 8) as u8;
        let mark = (state & 0xff) as u8;
        let data_type = DataType::from_tag(tag)
            .ok_or_else(|| CaskError::SegmentCorruption(format!("unknown data type {}", tag)))?;

        let op = match (data_type, mark) {
            (DataType::Str, 0) => Op::Set,
            (DataType::Str, 1) => Op::Remove,
            (DataType::List, 0) => Op::LPush,
            (DataType::List, 1) => Op::RPush,
            (DataType::List, 2) => Op::LPop,
            (DataType::List, 3) => Op::RPop,
            (DataType::List, 4) => Op::LInsert,
            (DataType::List, 5) => Op::LSet,
            (DataType::List, 6) => Op::LRem,
            (DataType::Hash, 0) => Op::HSet,
            (DataType::Hash, 1) => Op::HDel,
            (DataType::Set, 0) => Op::SAdd,
            (DataType::Set, 1) => Op::SRem,
            (DataType::Set, 2) => Op::SMove,
            (DataType::ZSet, 0) => Op::ZAdd,
            (DataType::ZSet, 1) => Op::ZRem,
            _ => {
                return Err(CaskError::SegmentCorruption(format!(
                    "unknown mark {} for {:?}",
                    mark, data_type
                )))
            }
        };
        Ok(op)
    }

    /// Whether records of this kind can still describe live state.
    /// Removals never survive compaction.
    pub fn is_write(self) -> bool {
        matches!(
            self,
            Op::Set | Op::LPush | Op::RPush | Op::HSet | Op::SAdd | Op::SMove | Op::ZAdd
        )
    }
}

/// A single record in a segment
///
/// `secondary` is the second half of a composite key (hash field, set-move
/// destination, encoded score or list position). On disk both halves are
/// spliced into one key buffer and `key_offset` marks the boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// The operation this record performs
    pub op: Op,

    /// Primary key
    pub key: Vec<u8>,

    /// Secondary key component, if any
    pub secondary: Option<Vec<u8>>,

    pub value: Vec<u8>,

    /// Timestamp (unix nanos) when the entry was created
    pub timestamp: u64,
}

impl Entry {
    pub fn new(op: Op, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            op,
            key: key.into(),
            secondary: None,
            value: value.into(),
            timestamp: now_nanos(),
        }
    }

    pub fn with_secondary(
        op: Op,
        key: impl Into<Vec<u8>>,
        secondary: impl Into<Vec<u8>>,
        value: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            secondary: Some(secondary.into()),
            ..Self::new(op, key, value)
        }
    }

    pub fn data_type(&self) -> DataType {
        self.op.data_type()
    }

    /// Length of the spliced key buffer
    pub fn key_size(&self) -> usize {
        self.key.len() + self.secondary.as_ref().map_or(0, Vec::len)
    }

    /// Encoded size in bytes: header + key + value
    pub fn size(&self) -> u64 {
        (HEADER_SIZE + self.key_size() + self.value.len()) as u64
    }

    pub fn crc(&self) -> u32 {
        crc32fast::hash(&self.value)
    }

    /// Encode to `header || key || secondary || value`
    pub fn encode(&self) -> Vec<u8> {
        let key_offset = match self.secondary {
            Some(_) => self.key.len() as u32,
            None => 0,
        };

        let mut buf = Vec::with_capacity(self.size() as usize);
        buf.put_u32(self.crc());
        buf.put_u64(self.timestamp);
        buf.put_u16(self.op.state());
        buf.put_u32(self.key_size() as u32);
        buf.put_u32(self.value.len() as u32);
        buf.put_u32(key_offset);
        buf.put_slice(&self.key);
        if let Some(secondary) = &self.secondary {
            buf.put_slice(secondary);
        }
        buf.put_slice(&self.value);
        buf
    }

    /// Decode one complete record, verifying its CRC
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let header = EntryHeader::decode(buf)?;
        let body = &buf[HEADER_SIZE..];
        let key_size = header.key_size as usize;
        let value_size = header.value_size as usize;
        if body.len() < key_size + value_size {
            return Err(CaskError::ReadOverflow);
        }
        let (key, rest) = body.split_at(key_size);
        header.into_entry(key, &rest[..value_size])
    }
}

/// The fixed 26 byte record header, big-endian
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryHeader {
    pub crc: u32,
    pub timestamp: u64,
    pub state: u16,
    pub key_size: u32,
    pub value_size: u32,
    pub key_offset: u32,
}

impl EntryHeader {
    /// Decode a header from the first `HEADER_SIZE` bytes of `buf`
    ///
    /// An all-zero header is the pre-allocated tail of a segment and is
    /// reported as `EmptyHeader`.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < HEADER_SIZE {
            return Err(CaskError::ReadOverflow);
        }
        let mut raw = &buf[..HEADER_SIZE];
        if raw.iter().all(|b| *b == 0) {
            return Err(CaskError::EmptyHeader);
        }

        Ok(Self {
            crc: raw.get_u32(),
            timestamp: raw.get_u64(),
            state: raw.get_u16(),
            key_size: raw.get_u32(),
            value_size: raw.get_u32(),
            key_offset: raw.get_u32(),
        })
    }

    /// Size of the whole record this header describes
    pub fn record_size(&self) -> u64 {
        HEADER_SIZE as u64 + self.key_size as u64 + self.value_size as u64
    }

    /// Rebuild the entry from its key buffer and value, checking the CRC
    pub fn into_entry(self, key: &[u8], value: &[u8]) -> Result<Entry> {
        if crc32fast::hash(value) != self.crc {
            return Err(CaskError::CrcCheckFailed);
        }
        let op = Op::from_state(self.state)?;

        let split = self.key_offset as usize;
        if split > key.len() {
            return Err(CaskError::SegmentCorruption(format!(
                "key offset {} beyond key of {} bytes",
                split,
                key.len()
            )));
        }
        let (key, secondary) = if split == 0 {
            (key.to_vec(), None)
        } else {
            (key[..split].to_vec(), Some(key[split..].to_vec()))
        };

        Ok(Entry {
            op,
            key,
            secondary,
            value: value.to_vec(),
            timestamp: self.timestamp,
        })
    }
}

fn now_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}
