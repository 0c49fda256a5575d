//! # Little-Endian Scalar Reads
//!
//! Bounds-checked reads of 1/2/4/8-byte little-endian scalars. Every reader
//! returns `None` instead of indexing past the slice, so callers decide
//! whether a short read is a format error (when constructing a view) or a
//! zero fallback (inside an already-validated view).
//!
//! Widths other than 1, 2, 4 and 8 read as `None`.

use eyre::{ensure, Result};

use crate::error::FlexError;

pub fn read_uint(data: &[u8], offset: usize, byte_width: usize) -> Option<u64> {
    let end = offset.checked_add(byte_width)?;
    let bytes = data.get(offset..end)?;
    match byte_width {
        1 => Some(bytes[0] as u64),
        2 => Some(u16::from_le_bytes([bytes[0], bytes[1]]) as u64),
        4 => Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as u64),
        8 => {
            let arr: [u8; 8] = bytes.try_into().ok()?;
            Some(u64::from_le_bytes(arr))
        }
        _ => None,
    }
}

pub fn read_int(data: &[u8], offset: usize, byte_width: usize) -> Option<i64> {
    let end = offset.checked_add(byte_width)?;
    let bytes = data.get(offset..end)?;
    match byte_width {
        1 => Some(bytes[0] as i8 as i64),
        2 => Some(i16::from_le_bytes([bytes[0], bytes[1]]) as i64),
        4 => Some(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as i64),
        8 => {
            let arr: [u8; 8] = bytes.try_into().ok()?;
            Some(i64::from_le_bytes(arr))
        }
        _ => None,
    }
}

/// Floats are only ever written at 4 or 8 bytes; narrower slots hold a
/// signed integer and are widened.
pub fn read_float(data: &[u8], offset: usize, byte_width: usize) -> Option<f64> {
    match byte_width {
        4 => {
            let bits = read_uint(data, offset, 4)? as u32;
            Some(f32::from_bits(bits) as f64)
        }
        8 => Some(f64::from_bits(read_uint(data, offset, 8)?)),
        _ => read_int(data, offset, byte_width).map(|v| v as f64),
    }
}

/// Ensures `[start, start + len)` lies inside a buffer of `buf_len` bytes and
/// returns the exclusive end.
pub fn check_range(buf_len: usize, start: usize, len: usize, what: &str) -> Result<usize> {
    let end = start.checked_add(len);
    ensure!(
        matches!(end, Some(e) if e <= buf_len),
        FlexError::format(format!(
            "{} at offset {} with length {} exceeds buffer of {} bytes",
            what, start, len, buf_len
        ))
    );
    Ok(start + len)
}
