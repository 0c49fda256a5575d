//! # Reference - Lazy Typed View of One Value
//!
//! A `Reference` names a single value inside a finished buffer without
//! decoding anything around it:
//!
//! ```text
//! Reference { buf, slot, parent_width, byte_width, flex_type, target }
//!
//! slot          position of the value's slot in its parent (or the root slot)
//! parent_width  width of that slot; inline scalars are read at this width
//! byte_width    width from the packed type; for offset types it is the
//!               width of the pointed-to data (length prefix, vector slots)
//! target        slot - read_uint(slot, parent_width) for offset types,
//!               slot itself for inline ones
//! ```
//!
//! ## Validation
//!
//! Everything a later accessor could touch is checked when the reference is
//! built: the slot, the backward offset, and for sized or container types
//! the length prefix plus the full payload range. A corrupt buffer therefore
//! fails at `get_root` or at the `get` that reaches the bad value, and every
//! `as_*` conversion afterwards is total.
//!
//! ## Conversions
//!
//! Asking for the wrong type is not an error. Numbers convert with `as`
//! casts, strings are parsed, containers report their element count, and
//! anything else yields zero, `false`, `""` or an empty view.

use eyre::{bail, ensure, Result};

use crate::config::{MAP_PREFIX_SLOTS, MIN_ROOT_BUFFER_LEN, ROOT_TRAILER_LEN};
use crate::encoding::{check_range, read_float, read_int, read_uint, unpack_type, BitWidth, FlexType};
use crate::error::FlexError;
use crate::records::map::Map;
use crate::records::sized::{Blob, Key};
use crate::records::vector::Vector;

/// Returns the root value of a finished buffer.
///
/// Fails with `FlexError::Format` when the trailer is malformed or the root
/// points outside the buffer.
pub fn get_root(buf: &[u8]) -> Result<Reference<'_>> {
    match read_root(buf) {
        Ok(root) => Ok(root),
        Err(err) => {
            tracing::debug!(len = buf.len(), error = %err, "rejected flex buffer root");
            Err(err)
        }
    }
}

fn read_root(buf: &[u8]) -> Result<Reference<'_>> {
    ensure!(
        buf.len() >= MIN_ROOT_BUFFER_LEN,
        FlexError::format(format!(
            "buffer of {} bytes is too short for a root",
            buf.len()
        ))
    );
    let root_width = buf[buf.len() - 1] as usize;
    ensure!(
        BitWidth::from_byte_width(root_width).is_some(),
        FlexError::format(format!("invalid root width {}", root_width))
    );
    ensure!(
        buf.len() >= ROOT_TRAILER_LEN + root_width,
        FlexError::format(format!(
            "buffer of {} bytes cannot hold a {}-byte root",
            buf.len(),
            root_width
        ))
    );
    let packed = buf[buf.len() - 2];
    let slot = buf.len() - ROOT_TRAILER_LEN - root_width;
    Reference::new(buf, slot, root_width, packed)
}

enum Scalar {
    Int(i64),
    UInt(u64),
    Float(f64),
}

fn parse_scalar(text: &str) -> Scalar {
    let text = text.trim();
    if let Ok(v) = text.parse::<i64>() {
        Scalar::Int(v)
    } else if let Ok(v) = text.parse::<u64>() {
        Scalar::UInt(v)
    } else if let Ok(v) = text.parse::<f64>() {
        Scalar::Float(v)
    } else {
        Scalar::Int(0)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Reference<'a> {
    pub(crate) buf: &'a [u8],
    pub(crate) slot: usize,
    pub(crate) parent_width: usize,
    pub(crate) byte_width: usize,
    pub(crate) flex_type: FlexType,
    pub(crate) target: usize,
}

impl<'a> Reference<'a> {
    /// Reference for a slot whose type comes from a packed type byte.
    pub(crate) fn new(buf: &'a [u8], slot: usize, parent_width: usize, packed: u8) -> Result<Self> {
        let (flex_type, width) = unpack_type(packed)?;
        Self::with_type(buf, slot, parent_width, width.bytes(), flex_type)
    }

    pub(crate) fn with_type(
        buf: &'a [u8],
        slot: usize,
        parent_width: usize,
        byte_width: usize,
        flex_type: FlexType,
    ) -> Result<Self> {
        check_range(buf.len(), slot, parent_width, "value slot")?;
        let target = if flex_type.is_inline() {
            slot
        } else {
            let delta = read_uint(buf, slot, parent_width).unwrap_or(u64::MAX);
            match usize::try_from(delta).ok().and_then(|d| slot.checked_sub(d)) {
                Some(target) => target,
                None => bail!(FlexError::format(format!(
                    "{} at slot {} points {} bytes before the buffer start",
                    flex_type, slot, delta
                ))),
            }
        };
        let reference = Self {
            buf,
            slot,
            parent_width,
            byte_width,
            flex_type,
            target,
        };
        reference.validate()?;
        Ok(reference)
    }

    /// Null reference returned for absent map keys and out-of-range indices.
    pub(crate) fn null(buf: &'a [u8]) -> Self {
        Self {
            buf,
            slot: 0,
            parent_width: 1,
            byte_width: 1,
            flex_type: FlexType::Null,
            target: 0,
        }
    }

    /// Reads the length prefix stored `width` bytes before `target`.
    pub(crate) fn prefix_at(buf: &[u8], target: usize, width: usize, what: &str) -> Result<usize> {
        let Some(prefix) = target.checked_sub(width) else {
            bail!(FlexError::format(format!(
                "{} at offset {} has no room for its length prefix",
                what, target
            )));
        };
        let len = read_uint(buf, prefix, width).unwrap_or(u64::MAX);
        usize::try_from(len).map_err(|_| {
            eyre::Report::new(FlexError::format(format!("{} length {} too large", what, len)))
        })
    }

    fn slots_len(len: usize, width: usize) -> Result<usize> {
        len.checked_mul(width)
            .ok_or_else(|| eyre::Report::new(FlexError::format("vector length overflows")))
    }

    fn validate(&self) -> Result<()> {
        let buf = self.buf;
        let bw = self.byte_width;
        let t = self.target;
        match self.flex_type {
            FlexType::Null | FlexType::Bool | FlexType::Int | FlexType::UInt | FlexType::Float => {}
            FlexType::IndirectInt | FlexType::IndirectUInt | FlexType::IndirectFloat => {
                check_range(buf.len(), t, bw, "indirect scalar")?;
            }
            FlexType::String => {
                let len = Self::prefix_at(buf, t, bw, "string")?;
                let with_nul = len
                    .checked_add(1)
                    .ok_or_else(|| eyre::Report::new(FlexError::format("string length overflows")))?;
                check_range(buf.len(), t, with_nul, "string")?;
            }
            FlexType::Blob => {
                let len = Self::prefix_at(buf, t, bw, "blob")?;
                check_range(buf.len(), t, len, "blob")?;
            }
            FlexType::Key => {
                let tail = buf.get(t..).unwrap_or(&[]);
                ensure!(
                    tail.contains(&0),
                    FlexError::format(format!("key at offset {} is not NUL-terminated", t))
                );
            }
            FlexType::Vector => {
                let len = Self::prefix_at(buf, t, bw, "vector")?;
                let slots = Self::slots_len(len, bw)?;
                let types_at = check_range(buf.len(), t, slots, "vector slots")?;
                check_range(buf.len(), types_at, len, "vector types")?;
            }
            FlexType::Map => self.validate_map()?,
            ty if ty.is_typed_vector() => {
                let len = Self::prefix_at(buf, t, bw, "typed vector")?;
                let slots = Self::slots_len(len, bw)?;
                check_range(buf.len(), t, slots, "typed vector slots")?;
            }
            ty => {
                if let Some((_, len)) = ty.fixed_typed_vector_element() {
                    check_range(buf.len(), t, len * bw, "fixed typed vector")?;
                }
            }
        }
        Ok(())
    }

    fn validate_map(&self) -> Result<()> {
        let buf = self.buf;
        let bw = self.byte_width;
        let t = self.target;
        let len = Self::prefix_at(buf, t, bw, "map")?;
        let slots = Self::slots_len(len, bw)?;
        let types_at = check_range(buf.len(), t, slots, "map values")?;
        check_range(buf.len(), types_at, len, "map types")?;

        let (keys_target, keys_width) = Self::map_keys(buf, t, bw)?;
        let keys_len = Self::prefix_at(buf, keys_target, keys_width, "map keys")?;
        ensure!(
            keys_len == len,
            FlexError::format(format!(
                "map has {} values but {} keys",
                len, keys_len
            ))
        );
        check_range(
            buf.len(),
            keys_target,
            Self::slots_len(keys_len, keys_width)?,
            "map keys",
        )?;
        Ok(())
    }

    /// Resolves the keys vector of a map whose values start at `target`.
    pub(crate) fn map_keys(buf: &[u8], target: usize, byte_width: usize) -> Result<(usize, usize)> {
        let Some(prefix) = target.checked_sub(MAP_PREFIX_SLOTS * byte_width) else {
            bail!(FlexError::format(format!(
                "map at offset {} has no room for its prefix",
                target
            )));
        };
        let keys_delta = read_uint(buf, prefix, byte_width).unwrap_or(u64::MAX);
        let keys_target = usize::try_from(keys_delta)
            .ok()
            .and_then(|d| prefix.checked_sub(d));
        let keys_width = read_uint(buf, prefix + byte_width, byte_width).unwrap_or(0) as usize;
        match keys_target {
            Some(keys_target) if BitWidth::from_byte_width(keys_width).is_some() => {
                Ok((keys_target, keys_width))
            }
            _ => bail!(FlexError::format(format!(
                "map at offset {} has a corrupt keys reference",
                target
            ))),
        }
    }

    pub fn flex_type(&self) -> FlexType {
        self.flex_type
    }

    pub fn byte_width(&self) -> usize {
        self.byte_width
    }

    /// Offset of the value's data. For strings, blobs, keys and containers
    /// this is the shared location two deduplicated values resolve to.
    pub fn data_offset(&self) -> usize {
        self.target
    }

    pub fn is_null(&self) -> bool {
        self.flex_type == FlexType::Null
    }

    pub fn is_bool(&self) -> bool {
        self.flex_type == FlexType::Bool
    }

    pub fn is_int(&self) -> bool {
        matches!(self.flex_type, FlexType::Int | FlexType::IndirectInt)
    }

    pub fn is_uint(&self) -> bool {
        matches!(self.flex_type, FlexType::UInt | FlexType::IndirectUInt)
    }

    pub fn is_float(&self) -> bool {
        matches!(self.flex_type, FlexType::Float | FlexType::IndirectFloat)
    }

    pub fn is_numeric(&self) -> bool {
        self.is_int() || self.is_uint() || self.is_float()
    }

    pub fn is_string(&self) -> bool {
        self.flex_type == FlexType::String
    }

    pub fn is_key(&self) -> bool {
        self.flex_type == FlexType::Key
    }

    pub fn is_blob(&self) -> bool {
        self.flex_type == FlexType::Blob
    }

    /// Untyped vectors and maps (a map's values are an untyped vector).
    pub fn is_vector(&self) -> bool {
        matches!(self.flex_type, FlexType::Vector | FlexType::Map)
    }

    pub fn is_typed_vector(&self) -> bool {
        self.flex_type.is_typed_vector()
    }

    pub fn is_fixed_typed_vector(&self) -> bool {
        self.flex_type.is_fixed_typed_vector()
    }

    pub fn is_map(&self) -> bool {
        self.flex_type == FlexType::Map
    }

    fn scalar(&self) -> Scalar {
        let buf = self.buf;
        match self.flex_type {
            FlexType::Int => Scalar::Int(read_int(buf, self.slot, self.parent_width).unwrap_or(0)),
            FlexType::UInt | FlexType::Bool => {
                Scalar::UInt(read_uint(buf, self.slot, self.parent_width).unwrap_or(0))
            }
            FlexType::Float => {
                Scalar::Float(read_float(buf, self.slot, self.parent_width).unwrap_or(0.0))
            }
            FlexType::IndirectInt => {
                Scalar::Int(read_int(buf, self.target, self.byte_width).unwrap_or(0))
            }
            FlexType::IndirectUInt => {
                Scalar::UInt(read_uint(buf, self.target, self.byte_width).unwrap_or(0))
            }
            FlexType::IndirectFloat => {
                Scalar::Float(read_float(buf, self.target, self.byte_width).unwrap_or(0.0))
            }
            FlexType::String => parse_scalar(self.as_str()),
            ty if ty.is_vector_like() => Scalar::UInt(self.as_vector().len() as u64),
            _ => Scalar::Int(0),
        }
    }

    pub fn as_i64(&self) -> i64 {
        match self.scalar() {
            Scalar::Int(v) => v,
            Scalar::UInt(v) => v as i64,
            Scalar::Float(v) => v as i64,
        }
    }

    pub fn as_i32(&self) -> i32 {
        self.as_i64() as i32
    }

    pub fn as_u64(&self) -> u64 {
        match self.scalar() {
            Scalar::Int(v) => v as u64,
            Scalar::UInt(v) => v,
            Scalar::Float(v) => v as u64,
        }
    }

    pub fn as_u32(&self) -> u32 {
        self.as_u64() as u32
    }

    pub fn as_f64(&self) -> f64 {
        match self.scalar() {
            Scalar::Int(v) => v as f64,
            Scalar::UInt(v) => v as f64,
            Scalar::Float(v) => v,
        }
    }

    pub fn as_f32(&self) -> f32 {
        self.as_f64() as f32
    }

    pub fn as_bool(&self) -> bool {
        match self.flex_type {
            FlexType::Null | FlexType::Key | FlexType::Blob => false,
            _ => match self.scalar() {
                Scalar::Int(v) => v != 0,
                Scalar::UInt(v) => v != 0,
                Scalar::Float(v) => v != 0.0,
            },
        }
    }

    fn sized_bytes(&self) -> &'a [u8] {
        let len = Self::prefix_at(self.buf, self.target, self.byte_width, "value").unwrap_or(0);
        self.target
            .checked_add(len)
            .and_then(|end| self.buf.get(self.target..end))
            .unwrap_or(&[])
    }

    /// String contents or key text; `""` for anything else or for bytes that
    /// are not valid UTF-8.
    pub fn as_str(&self) -> &'a str {
        match self.flex_type {
            FlexType::String => std::str::from_utf8(self.sized_bytes()).unwrap_or(""),
            FlexType::Key => self.as_key().as_str(),
            _ => "",
        }
    }

    /// Blob bytes, or the raw bytes of a string.
    pub fn as_blob(&self) -> Blob<'a> {
        match self.flex_type {
            FlexType::Blob | FlexType::String => Blob::new(self.sized_bytes()),
            _ => Blob::empty(),
        }
    }

    pub fn as_key(&self) -> Key<'a> {
        match self.flex_type {
            FlexType::Key => Key::at(self.buf, self.target),
            _ => Key::empty(),
        }
    }

    /// Vector view over any vector shape; a map yields its values.
    pub fn as_vector(&self) -> Vector<'a> {
        Vector::from_reference(self)
    }

    pub fn as_map(&self) -> Map<'a> {
        Map::from_reference(self)
    }
}
