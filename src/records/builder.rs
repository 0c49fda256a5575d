//! # Builder - Incremental FlexBuffers Encoding
//!
//! `Builder` appends values to a [`ByteBuffer`] while tracking open
//! containers on a stack. Callers drive it top-down (open a container, put
//! leaves, close the container, finish); bytes are emitted bottom-up, because
//! a container can only write its slots once every child's final offset and
//! width are known.
//!
//! ## Usage
//!
//! ```
//! use flexbuf::{get_root, Builder};
//!
//! let mut builder = Builder::new();
//! let map = builder.start_map()?;
//! builder.put_int(Some("id"), 7)?;
//! let tags = builder.start_vector()?;
//! builder.put_string(None, "fast")?;
//! builder.put_string(None, "small")?;
//! builder.end_vector(Some("tags"), tags, false, false)?;
//! builder.end_map(None, map)?;
//! let bytes = builder.finish()?.to_vec();
//!
//! let root = get_root(&bytes)?.as_map();
//! assert_eq!(root.get("id")?.as_i64(), 7);
//! assert_eq!(root.get("tags")?.as_vector().get(1)?.as_str(), "small");
//!
//! // Reuse the builder for the next document
//! builder.clear();
//! # Ok::<(), eyre::Report>(())
//! ```
//!
//! ## The Value Stack
//!
//! Every finished value (leaf or closed container) sits on the stack as a
//! `StackValue` until its parent closes:
//!
//! ```text
//! StackValue { slot, type, min_width, key }
//!
//! slot = Int / UInt / Float   inline scalar, written into the parent's slot
//!      = Offset(pos)          absolute position of already-written bytes;
//!                             the parent stores (slot position - pos)
//! ```
//!
//! `start_*` records the stack height in a frame; `end_*` turns everything
//! above that height into one container value.
//!
//! ## Width Selection
//!
//! A container's slot width is the widest of: its length, every inline
//! child's minimal width, and every offset child's relative distance as it
//! will be once the container is aligned and laid out. Distances are measured
//! for each candidate width in turn, because the padding and slot position
//! depend on the width being tested.
//!
//! ## Maps
//!
//! `end_map` stable-sorts the entries by key bytes, writes the sorted key
//! vector, then writes the values as a vector prefixed by the keys offset
//! and the keys width. Equal keys keep their insertion order.
//!
//! ## Failure Model
//!
//! | Failure | State afterwards |
//! |---------|------------------|
//! | `Structural`, `Deprecated`, `InvalidKey` | unchanged, the call can be retried differently |
//! | `Overflow` | partially written; every later call fails until `clear()` |
//!
//! ## Thread Safety
//!
//! The builder is a single-writer state machine driven through `&mut self`.
//! Share it across threads only behind external synchronization; independent
//! builders share nothing.

use eyre::{bail, ensure, Result};
use smallvec::SmallVec;

use crate::config::{BuilderFlags, INLINE_FRAME_DEPTH, MAX_FIXED_TYPED_LEN, MIN_FIXED_TYPED_LEN};
use crate::encoding::{pack_type, padding_bytes, width_i, width_u, BitWidth, FlexType};
use crate::error::FlexError;
use crate::memory::ByteBuffer;
use crate::records::pool::{DedupPool, PoolKind};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Slot {
    Int(i64),
    UInt(u64),
    Float(f64),
    Offset(usize),
}

#[derive(Debug, Clone, Copy)]
struct StackValue {
    slot: Slot,
    flex_type: FlexType,
    min_width: BitWidth,
    key: Option<usize>,
}

impl StackValue {
    fn inline(flex_type: FlexType, min_width: BitWidth, slot: Slot) -> Self {
        Self {
            slot,
            flex_type,
            min_width,
            key: None,
        }
    }

    fn offset(flex_type: FlexType, min_width: BitWidth, offset: usize) -> Self {
        Self {
            slot: Slot::Offset(offset),
            flex_type,
            min_width,
            key: None,
        }
    }

    fn key_ref(offset: usize) -> Self {
        Self::offset(FlexType::Key, BitWidth::W8, offset)
    }

    /// Width this value needs as element `elem_index` of a container whose
    /// slots start after the current end of the buffer.
    fn elem_width(&self, buf_len: usize, elem_index: usize) -> BitWidth {
        let Slot::Offset(target) = self.slot else {
            return self.min_width;
        };
        for width in [BitWidth::W8, BitWidth::W16, BitWidth::W32] {
            let byte_width = width.bytes();
            let slot_pos = buf_len + padding_bytes(buf_len, byte_width) + elem_index * byte_width;
            if width_u((slot_pos - target) as u64) <= width {
                return width;
            }
        }
        BitWidth::W64
    }

    fn stored_width(&self, parent_width: BitWidth) -> BitWidth {
        if self.flex_type.is_inline() {
            self.min_width.max(parent_width)
        } else {
            self.min_width
        }
    }

    fn stored_packed_type(&self, parent_width: BitWidth) -> u8 {
        pack_type(self.flex_type, self.stored_width(parent_width))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Vector,
    Map,
}

impl FrameKind {
    fn name(self) -> &'static str {
        match self {
            FrameKind::Vector => "vector",
            FrameKind::Map => "map",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    start: usize,
    kind: FrameKind,
}

/// Returned by `start_vector`/`start_map`; must be passed to the matching
/// `end_vector`/`end_map`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHandle {
    start: usize,
    depth: usize,
}

fn key_at(data: &[u8], offset: usize) -> &[u8] {
    let tail = data.get(offset..).unwrap_or(&[]);
    let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
    &tail[..end]
}

#[derive(Debug)]
pub struct Builder {
    buf: ByteBuffer,
    stack: Vec<StackValue>,
    frames: SmallVec<[Frame; INLINE_FRAME_DEPTH]>,
    pool: DedupPool,
    flags: BuilderFlags,
    finished: bool,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    /// Growable buffer, keys shared.
    pub fn new() -> Self {
        Self::with_flags(BuilderFlags::default())
    }

    pub fn with_flags(flags: BuilderFlags) -> Self {
        Self::with_buffer(ByteBuffer::default(), flags)
    }

    pub(crate) fn with_buffer(buf: ByteBuffer, flags: BuilderFlags) -> Self {
        Self {
            buf,
            stack: Vec::new(),
            frames: SmallVec::new(),
            pool: DedupPool::new(),
            flags,
            finished: false,
        }
    }

    pub fn flags(&self) -> BuilderFlags {
        self.flags
    }

    pub fn fixed_capacity(&self) -> Option<usize> {
        self.buf.limit()
    }

    /// Bytes written so far.
    pub fn buffer(&self) -> &[u8] {
        self.buf.as_slice()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.buf.into_vec()
    }

    /// Resets the builder for a new document. Flags and allocations are kept;
    /// the buffer, value stack, open containers and sharing pool are emptied.
    pub fn clear(&mut self) {
        self.buf.clear();
        self.stack.clear();
        self.frames.clear();
        self.pool.clear();
        self.finished = false;
    }

    fn ensure_writable(&self) -> Result<()> {
        ensure!(
            !self.buf.is_overflowed(),
            FlexError::structural("builder overflowed its fixed buffer; call clear() first")
        );
        ensure!(
            !self.finished,
            FlexError::structural("buffer already finished; call clear() to build another")
        );
        Ok(())
    }

    fn check_key_placement(has_key: bool, parent: Option<&Frame>) -> Result<()> {
        if has_key && !matches!(parent, Some(f) if f.kind == FrameKind::Map) {
            bail!(FlexError::structural(
                "keys are only allowed for entries directly inside a map"
            ));
        }
        Ok(())
    }

    fn parent_of_top(&self) -> Option<&Frame> {
        let depth = self.frames.len();
        if depth < 2 {
            return None;
        }
        self.frames.get(depth - 2)
    }

    fn align(&mut self, width: BitWidth) -> Result<usize> {
        let byte_width = width.bytes();
        self.buf.pad_to(byte_width)?;
        Ok(byte_width)
    }

    fn write_key(&mut self, key: &str) -> Result<usize> {
        let bytes = key.as_bytes();
        ensure!(!bytes.contains(&0), FlexError::InvalidKey);
        let share = self.flags.shares_keys();
        if share {
            if let Some(offset) = self.pool.lookup(PoolKind::Key, bytes) {
                return Ok(offset);
            }
        }
        let offset = self.buf.len();
        self.buf.put_bytes(bytes)?;
        self.buf.put_u8(0)?;
        if share {
            self.pool.insert(PoolKind::Key, bytes, offset);
        }
        Ok(offset)
    }

    fn write_optional_key(&mut self, key: Option<&str>) -> Result<Option<usize>> {
        key.map(|k| self.write_key(k)).transpose()
    }

    /// Common prologue of every `put_*`: state and key checks, then the key
    /// bytes themselves.
    fn begin_entry(&mut self, key: Option<&str>) -> Result<Option<usize>> {
        self.ensure_writable()?;
        Self::check_key_placement(key.is_some(), self.frames.last())?;
        self.write_optional_key(key)
    }

    fn push(&mut self, mut value: StackValue, key: Option<usize>) {
        value.key = key;
        self.stack.push(value);
    }

    fn push_inline(
        &mut self,
        key: Option<&str>,
        flex_type: FlexType,
        min_width: BitWidth,
        slot: Slot,
    ) -> Result<()> {
        let key = self.begin_entry(key)?;
        self.push(StackValue::inline(flex_type, min_width, slot), key);
        Ok(())
    }

    pub fn put_null(&mut self, key: Option<&str>) -> Result<()> {
        self.push_inline(key, FlexType::Null, BitWidth::W8, Slot::Int(0))
    }

    pub fn put_bool(&mut self, key: Option<&str>, value: bool) -> Result<()> {
        self.push_inline(key, FlexType::Bool, BitWidth::W8, Slot::UInt(value as u64))
    }

    pub fn put_int(&mut self, key: Option<&str>, value: i64) -> Result<()> {
        self.push_inline(key, FlexType::Int, width_i(value), Slot::Int(value))
    }

    pub fn put_uint(&mut self, key: Option<&str>, value: u64) -> Result<()> {
        self.push_inline(key, FlexType::UInt, width_u(value), Slot::UInt(value))
    }

    /// Stored in 4 bytes unless the container is wider.
    pub fn put_float(&mut self, key: Option<&str>, value: f32) -> Result<()> {
        self.push_inline(key, FlexType::Float, BitWidth::W32, Slot::Float(value as f64))
    }

    pub fn put_double(&mut self, key: Option<&str>, value: f64) -> Result<()> {
        self.push_inline(key, FlexType::Float, BitWidth::W64, Slot::Float(value))
    }

    fn write_sized(&mut self, bytes: &[u8], terminate: bool) -> Result<(usize, BitWidth)> {
        let width = width_u(bytes.len() as u64);
        let byte_width = self.align(width)?;
        self.buf.put_uint(bytes.len() as u64, byte_width)?;
        let offset = self.buf.len();
        self.buf.put_bytes(bytes)?;
        if terminate {
            self.buf.put_u8(0)?;
        }
        Ok((offset, width))
    }

    pub fn put_string(&mut self, key: Option<&str>, value: &str) -> Result<()> {
        let key = self.begin_entry(key)?;
        let bytes = value.as_bytes();
        let share = self.flags.shares_strings();
        if share {
            if let Some(offset) = self.pool.lookup(PoolKind::String, bytes) {
                let width = width_u(bytes.len() as u64);
                self.push(StackValue::offset(FlexType::String, width, offset), key);
                return Ok(());
            }
        }
        let (offset, width) = self.write_sized(bytes, true)?;
        if share {
            self.pool.insert(PoolKind::String, bytes, offset);
        }
        self.push(StackValue::offset(FlexType::String, width, offset), key);
        Ok(())
    }

    pub fn put_blob(&mut self, key: Option<&str>, value: &[u8]) -> Result<()> {
        let key = self.begin_entry(key)?;
        let (offset, width) = self.write_sized(value, false)?;
        self.push(StackValue::offset(FlexType::Blob, width, offset), key);
        Ok(())
    }

    fn put_indirect(
        &mut self,
        key: Option<&str>,
        flex_type: FlexType,
        width: BitWidth,
        slot: Slot,
    ) -> Result<()> {
        let key = self.begin_entry(key)?;
        let byte_width = self.align(width)?;
        let offset = self.buf.len();
        match slot {
            Slot::Int(v) => self.buf.put_int(v, byte_width)?,
            Slot::UInt(v) => self.buf.put_uint(v, byte_width)?,
            Slot::Float(v) => self.buf.put_float(v, byte_width)?,
            Slot::Offset(_) => bail!(FlexError::structural("indirect values hold scalars only")),
        }
        self.push(StackValue::offset(flex_type, width, offset), key);
        Ok(())
    }

    /// Writes the integer out of line so the parent's slot only holds an
    /// offset; keeps a container narrow when one element is much wider.
    pub fn put_indirect_int(&mut self, key: Option<&str>, value: i64) -> Result<()> {
        self.put_indirect(key, FlexType::IndirectInt, width_i(value), Slot::Int(value))
    }

    pub fn put_indirect_uint(&mut self, key: Option<&str>, value: u64) -> Result<()> {
        self.put_indirect(key, FlexType::IndirectUInt, width_u(value), Slot::UInt(value))
    }

    pub fn put_indirect_float(&mut self, key: Option<&str>, value: f32) -> Result<()> {
        self.put_indirect(
            key,
            FlexType::IndirectFloat,
            BitWidth::W32,
            Slot::Float(value as f64),
        )
    }

    pub fn put_indirect_double(&mut self, key: Option<&str>, value: f64) -> Result<()> {
        self.put_indirect(key, FlexType::IndirectFloat, BitWidth::W64, Slot::Float(value))
    }

    pub fn start_vector(&mut self) -> Result<FrameHandle> {
        self.start_frame(FrameKind::Vector)
    }

    pub fn start_map(&mut self) -> Result<FrameHandle> {
        self.start_frame(FrameKind::Map)
    }

    fn start_frame(&mut self, kind: FrameKind) -> Result<FrameHandle> {
        self.ensure_writable()?;
        let handle = FrameHandle {
            start: self.stack.len(),
            depth: self.frames.len(),
        };
        self.frames.push(Frame {
            start: handle.start,
            kind,
        });
        Ok(handle)
    }

    fn check_frame(&self, handle: FrameHandle, kind: FrameKind) -> Result<Frame> {
        let Some(top) = self.frames.last().copied() else {
            bail!(FlexError::structural(format!(
                "end_{} called with no open container",
                kind.name()
            )));
        };
        ensure!(
            handle.depth + 1 == self.frames.len() && handle.start == top.start,
            FlexError::structural("handle does not belong to the innermost open container")
        );
        ensure!(
            top.kind == kind,
            FlexError::structural(format!(
                "container opened as a {} cannot be ended as a {}",
                top.kind.name(),
                kind.name()
            ))
        );
        Ok(top)
    }

    /// Element type of a typed vector over `stack[start..]`, validated
    /// before anything is written. `None` when the elements do not share one
    /// type that a typed vector can hold; the vector is then written untyped.
    fn typed_element_type(&self, start: usize, fixed: bool) -> Result<Option<FlexType>> {
        let elements = &self.stack[start..];
        let Some(first) = elements.first() else {
            ensure!(
                !fixed,
                FlexError::structural("fixed-length typed vectors need 2 to 4 elements")
            );
            return Ok(Some(FlexType::Key));
        };
        let element_type = first.flex_type;
        if elements.iter().any(|v| v.flex_type != element_type) {
            return Ok(None);
        }
        if element_type == FlexType::String {
            tracing::debug!(
                len = elements.len(),
                "refusing to build a typed vector of strings"
            );
            bail!(FlexError::Deprecated(
                "typed vectors of strings are no longer produced; end the vector untyped"
                    .to_string()
            ));
        }
        if !element_type.is_typed_vector_element() {
            return Ok(None);
        }
        if fixed {
            ensure!(
                (MIN_FIXED_TYPED_LEN..=MAX_FIXED_TYPED_LEN).contains(&elements.len()),
                FlexError::structural(format!(
                    "fixed-length typed vectors need 2 to 4 elements, got {}",
                    elements.len()
                ))
            );
            ensure!(
                matches!(
                    element_type,
                    FlexType::Int | FlexType::UInt | FlexType::Float
                ),
                FlexError::structural(format!(
                    "fixed-length typed vectors cannot hold {} elements",
                    element_type
                ))
            );
        }
        Ok(Some(element_type))
    }

    /// Closes the innermost vector. `typed` drops the per-element type bytes
    /// when every element has the same scalar type, and otherwise falls back
    /// to an untyped vector; `fixed` additionally drops the length prefix
    /// (2 to 4 int/uint/float elements). Strings cannot be typed.
    ///
    /// Returns the offset of the vector's first slot.
    pub fn end_vector(
        &mut self,
        key: Option<&str>,
        handle: FrameHandle,
        typed: bool,
        fixed: bool,
    ) -> Result<usize> {
        self.ensure_writable()?;
        let frame = self.check_frame(handle, FrameKind::Vector)?;
        Self::check_key_placement(key.is_some(), self.parent_of_top())?;
        let element_type = if typed || fixed {
            self.typed_element_type(frame.start, fixed)?
        } else {
            None
        };
        let key = self.write_optional_key(key)?;
        let fixed = fixed && element_type.is_some();
        let value = self.create_vector(frame.start, element_type, fixed, None)?;
        Ok(self.close_frame(frame, value, key))
    }

    /// Closes the innermost map, sorting its entries by key bytes.
    ///
    /// Returns the offset of the map's first value slot.
    pub fn end_map(&mut self, key: Option<&str>, handle: FrameHandle) -> Result<usize> {
        self.ensure_writable()?;
        let frame = self.check_frame(handle, FrameKind::Map)?;
        Self::check_key_placement(key.is_some(), self.parent_of_top())?;
        ensure!(
            self.stack[frame.start..].iter().all(|v| v.key.is_some()),
            FlexError::structural("every map entry needs a key")
        );
        let key = self.write_optional_key(key)?;

        let data = self.buf.as_slice();
        self.stack[frame.start..].sort_by(|a, b| {
            key_at(data, a.key.unwrap_or(0)).cmp(key_at(data, b.key.unwrap_or(0)))
        });

        let keys = self.create_key_vector(frame.start)?;
        let value = self.create_vector(frame.start, None, false, Some(keys))?;
        Ok(self.close_frame(frame, value, key))
    }

    fn close_frame(&mut self, frame: Frame, value: StackValue, key: Option<usize>) -> usize {
        self.stack.truncate(frame.start);
        self.frames.pop();
        let offset = match value.slot {
            Slot::Offset(offset) => offset,
            _ => 0,
        };
        self.push(value, key);
        offset
    }

    fn write_any(&mut self, value: &StackValue, byte_width: usize) -> Result<()> {
        match value.slot {
            Slot::Int(v) => self.buf.put_int(v, byte_width),
            Slot::UInt(v) => self.buf.put_uint(v, byte_width),
            Slot::Float(v) => self.buf.put_float(v, byte_width),
            Slot::Offset(target) => {
                let relative = (self.buf.len() - target) as u64;
                debug_assert!(byte_width == 8 || relative < 1u64 << (8 * byte_width));
                self.buf.put_uint(relative, byte_width)
            }
        }
    }

    fn create_key_vector(&mut self, start: usize) -> Result<StackValue> {
        let len = self.stack.len() - start;
        let buf_len = self.buf.len();
        let mut width = width_u(len as u64);
        for (i, value) in self.stack[start..].iter().enumerate() {
            let key = StackValue::key_ref(value.key.unwrap_or(0));
            width = width.max(key.elem_width(buf_len, i + 1));
        }
        let byte_width = self.align(width)?;
        self.buf.put_uint(len as u64, byte_width)?;
        let vloc = self.buf.len();
        for i in start..self.stack.len() {
            let key = StackValue::key_ref(self.stack[i].key.unwrap_or(0));
            self.write_any(&key, byte_width)?;
        }
        Ok(StackValue::offset(FlexType::VectorKey, width, vloc))
    }

    fn create_vector(
        &mut self,
        start: usize,
        element_type: Option<FlexType>,
        fixed: bool,
        keys: Option<StackValue>,
    ) -> Result<StackValue> {
        let len = self.stack.len() - start;
        let flex_type = match (keys.is_some(), element_type) {
            (true, _) => FlexType::Map,
            (false, None) => FlexType::Vector,
            (false, Some(element)) => {
                let fixed_len = if fixed { len } else { 0 };
                match FlexType::to_typed_vector(element, fixed_len) {
                    Some(ty) => ty,
                    None => bail!(FlexError::structural(format!(
                        "no typed vector of {} with length {}",
                        element, len
                    ))),
                }
            }
        };

        let buf_len = self.buf.len();
        let mut width = width_u(len as u64);
        let mut prefix_elems = 1;
        if let Some(keys) = &keys {
            width = width.max(keys.elem_width(buf_len, 0));
            prefix_elems += 2;
        }
        for (i, value) in self.stack[start..].iter().enumerate() {
            width = width.max(value.elem_width(buf_len, i + prefix_elems));
        }

        let byte_width = self.align(width)?;
        if let Some(keys) = &keys {
            self.write_any(keys, byte_width)?;
            self.buf.put_uint(keys.min_width.bytes() as u64, byte_width)?;
        }
        if !fixed {
            self.buf.put_uint(len as u64, byte_width)?;
        }
        let vloc = self.buf.len();
        for i in start..self.stack.len() {
            let value = self.stack[i];
            self.write_any(&value, byte_width)?;
        }
        if element_type.is_none() {
            for i in start..self.stack.len() {
                let packed = self.stack[i].stored_packed_type(width);
                self.buf.put_u8(packed)?;
            }
        }
        Ok(StackValue::offset(flex_type, width, vloc))
    }

    /// Writes the root slot and the two trailer bytes (root packed type, root
    /// width) and returns the finished buffer. Requires every container to be
    /// closed and exactly one value at the root.
    pub fn finish(&mut self) -> Result<&[u8]> {
        self.ensure_writable()?;
        ensure!(
            self.frames.is_empty(),
            FlexError::structural(format!(
                "cannot finish with {} container(s) still open",
                self.frames.len()
            ))
        );
        match self.stack.len() {
            1 => {}
            0 => bail!(FlexError::structural("cannot finish without a root value")),
            n => bail!(FlexError::structural(format!(
                "cannot finish with {} root values; wrap them in a vector or map",
                n
            ))),
        }

        let root = self.stack[0];
        let width = root.elem_width(self.buf.len(), 0);
        let byte_width = self.align(width)?;
        self.write_any(&root, byte_width)?;
        self.buf.put_u8(root.stored_packed_type(width))?;
        self.buf.put_u8(byte_width as u8)?;
        self.finished = true;
        tracing::trace!(
            bytes = self.buf.len(),
            root_type = %root.flex_type,
            "finished flex buffer"
        );
        Ok(self.buf.as_slice())
    }
}
