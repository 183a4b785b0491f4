//! Fixed-width codec
//!
//! Big-endian 8 byte encodings for the numbers that travel inside composite
//! keys: list counts and indexes (`i64`) and sorted-set scores (`f64`).

use bytes::Buf;

use crate::error::{CaskError, Result};

/// Width of every fixed-width number
pub const WIDTH: usize = 8;

pub fn encode_i64(n: i64) -> [u8; WIDTH] {
    n.to_be_bytes()
}

pub fn decode_i64(buf: &[u8]) -> Result<i64> {
    let mut buf = exact(buf)?;
    Ok(buf.get_i64())
}

pub fn encode_f64(n: f64) -> [u8; WIDTH] {
    n.to_bits().to_be_bytes()
}

pub fn decode_f64(buf: &[u8]) -> Result<f64> {
    let mut buf = exact(buf)?;
    Ok(f64::from_bits(buf.get_u64()))
}

fn exact(buf: &[u8]) -> Result<&[u8]> {
    if buf.len() != WIDTH {
        return Err(CaskError::SegmentCorruption(format!(
            "fixed-width field has {} bytes, expected {}",
            buf.len(),
            WIDTH
        )));
    }
    Ok(buf)
}
