//! # Backing Byte Buffer
//!
//! `ByteBuffer` is the append-only store the builder writes into. It comes in
//! two flavours:
//!
//! - **Growable**: capacity doubles (at least [`MIN_GROWTH_BYTES`]) when a
//!   write does not fit. Growth copies the bytes into the new allocation, so
//!   every offset already handed out stays valid.
//! - **Fixed**: capacity is a hard bound. A write that does not fit fails with
//!   `FlexError::Overflow` before any byte of it is written, and the buffer
//!   stays marked as overflowed until `clear()`.
//!
//! ## Write Primitives
//!
//! | Method | Bytes written |
//! |--------|---------------|
//! | `put_u8` | 1 |
//! | `put_bytes` | slice length |
//! | `put_uint` / `put_int` | `byte_width` (1/2/4/8), little-endian |
//! | `put_float` | 4 (`f32`) or 8 (`f64`) |
//! | `pad_to` | zero bytes up to the next multiple of the width |
//!
//! ## Thread Safety
//!
//! `ByteBuffer` is a plain owned value with `&mut self` writers; it is owned by
//! exactly one builder.

use eyre::{bail, Result};

use crate::config::{MAX_BYTE_WIDTH, MIN_GROWTH_BYTES};
use crate::encoding::padding_bytes;
use crate::error::FlexError;

#[derive(Debug, Clone)]
pub struct ByteBuffer {
    data: Vec<u8>,
    limit: Option<usize>,
    overflowed: bool,
}

impl ByteBuffer {
    pub fn growable(initial_capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(initial_capacity),
            limit: None,
            overflowed: false,
        }
    }

    pub fn fixed(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            limit: Some(capacity),
            overflowed: false,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// `Some(limit)` for fixed buffers.
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn is_overflowed(&self) -> bool {
        self.overflowed
    }

    /// Drops the contents but keeps the allocation and the growth policy.
    pub fn clear(&mut self) {
        self.data.clear();
        self.overflowed = false;
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    fn reserve(&mut self, additional: usize) -> Result<()> {
        let requested = self.data.len().saturating_add(additional);
        match self.limit {
            Some(capacity) if requested > capacity => {
                self.overflowed = true;
                tracing::debug!(capacity, requested, "fixed flex buffer overflow");
                bail!(FlexError::Overflow {
                    capacity,
                    requested
                });
            }
            Some(_) => {}
            None => {
                let capacity = self.data.capacity();
                if requested > capacity {
                    let new_capacity = (capacity * 2).max(requested).max(MIN_GROWTH_BYTES);
                    tracing::trace!(
                        old_capacity = capacity,
                        new_capacity,
                        "growing flex buffer"
                    );
                    self.data.reserve_exact(new_capacity - self.data.len());
                }
            }
        }
        Ok(())
    }

    pub fn put_u8(&mut self, value: u8) -> Result<()> {
        self.reserve(1)?;
        self.data.push(value);
        Ok(())
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.reserve(bytes.len())?;
        self.data.extend_from_slice(bytes);
        Ok(())
    }

    pub fn put_uint(&mut self, value: u64, byte_width: usize) -> Result<()> {
        debug_assert!(byte_width <= MAX_BYTE_WIDTH && byte_width.is_power_of_two());
        self.put_bytes(&value.to_le_bytes()[..byte_width])
    }

    /// Truncating two's-complement write; the caller picked a width that
    /// holds the value.
    pub fn put_int(&mut self, value: i64, byte_width: usize) -> Result<()> {
        self.put_uint(value as u64, byte_width)
    }

    pub fn put_float(&mut self, value: f64, byte_width: usize) -> Result<()> {
        match byte_width {
            8 => self.put_bytes(&value.to_le_bytes()),
            4 => self.put_bytes(&(value as f32).to_le_bytes()),
            _ => bail!(FlexError::structural(format!(
                "floats need a 4 or 8 byte slot, got {}",
                byte_width
            ))),
        }
    }

    /// Writes zero bytes until the length is a multiple of `byte_width`.
    pub fn pad_to(&mut self, byte_width: usize) -> Result<()> {
        let padding = padding_bytes(self.data.len(), byte_width);
        if padding == 0 {
            return Ok(());
        }
        self.reserve(padding)?;
        self.data.resize(self.data.len() + padding, 0);
        Ok(())
    }
}

impl Default for ByteBuffer {
    fn default() -> Self {
        Self::growable(crate::config::DEFAULT_BUFFER_CAPACITY)
    }
}
