//! # Vector Views
//!
//! Read-only views over the three vector shapes:
//!
//! ```text
//! Vector:           [len : bw][slot 0 .. slot n-1 : bw each][type 0 .. type n-1 : 1 byte each]
//! TypedVector:      [len : bw][slot 0 .. slot n-1 : bw each]
//! FixedTypedVector:           [slot 0 .. slot n-1 : bw each]      n = 2, 3 or 4
//!                   ^
//!                   data (every view is anchored at the first slot)
//! ```
//!
//! Untyped elements carry their own packed type after the slots. Typed
//! elements share the element type implied by the vector's type code and are
//! read with a data width of one byte, which is also how the legacy typed
//! string vectors locate each string's length prefix.
//!
//! `get(i)` past the end returns a Null reference rather than an error; an
//! error means the element itself is malformed.

use eyre::{ensure, Result};

use crate::encoding::FlexType;
use crate::error::FlexError;
use crate::records::reference::Reference;
use crate::records::sized::Key;

/// Children are written before their container; an element resolving into
/// or past the container's data is corrupt.
fn check_precedes(element: &Reference<'_>, container: usize) -> Result<()> {
    ensure!(
        element.flex_type.is_inline() || element.target < container,
        FlexError::format(format!(
            "{} element at {} does not precede its container at {}",
            element.flex_type, element.target, container
        ))
    );
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VectorKind {
    Untyped,
    Typed(FlexType),
}

#[derive(Debug, Clone, Copy)]
pub struct Vector<'a> {
    buf: &'a [u8],
    data: usize,
    byte_width: usize,
    len: usize,
    kind: VectorKind,
}

impl<'a> Vector<'a> {
    pub(crate) fn from_reference(reference: &Reference<'a>) -> Self {
        let ty = reference.flex_type;
        let (kind, len) = if matches!(ty, FlexType::Vector | FlexType::Map) {
            (VectorKind::Untyped, None)
        } else if let Some(element) = ty.typed_vector_element() {
            (VectorKind::Typed(element), None)
        } else if let Some((element, len)) = ty.fixed_typed_vector_element() {
            (VectorKind::Typed(element), Some(len))
        } else {
            return Self::empty(reference.buf);
        };
        let len = match len {
            Some(len) => len,
            None => Reference::prefix_at(reference.buf, reference.target, reference.byte_width, "vector")
                .unwrap_or(0),
        };
        Self {
            buf: reference.buf,
            data: reference.target,
            byte_width: reference.byte_width,
            len,
            kind,
        }
    }

    pub(crate) fn empty(buf: &'a [u8]) -> Self {
        Self {
            buf,
            data: 0,
            byte_width: 1,
            len: 0,
            kind: VectorKind::Untyped,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// Same as `len`.
    pub fn size(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn byte_width(&self) -> usize {
        self.byte_width
    }

    /// Element type shared by every element of a typed vector; `None` for
    /// untyped vectors.
    pub fn element_type(&self) -> Option<FlexType> {
        match self.kind {
            VectorKind::Typed(element) => Some(element),
            VectorKind::Untyped => None,
        }
    }

    pub(crate) fn null_element(&self) -> Reference<'a> {
        Reference::null(self.buf)
    }

    pub fn get(&self, index: usize) -> Result<Reference<'a>> {
        if index >= self.len {
            return Ok(self.null_element());
        }
        let slot = self.data + index * self.byte_width;
        let element = match self.kind {
            VectorKind::Untyped => {
                let packed_at = self.data + self.len * self.byte_width + index;
                let packed = self.buf.get(packed_at).copied().unwrap_or(0);
                Reference::new(self.buf, slot, self.byte_width, packed)?
            }
            VectorKind::Typed(element) => {
                Reference::with_type(self.buf, slot, self.byte_width, 1, element)?
            }
        };
        check_precedes(&element, self.data)?;
        Ok(element)
    }

    pub fn iter(&self) -> VectorIter<'a> {
        VectorIter {
            vector: *self,
            index: 0,
        }
    }
}

impl<'a> IntoIterator for Vector<'a> {
    type Item = Result<Reference<'a>>;
    type IntoIter = VectorIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct VectorIter<'a> {
    vector: Vector<'a>,
    index: usize,
}

impl<'a> Iterator for VectorIter<'a> {
    type Item = Result<Reference<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.vector.len {
            return None;
        }
        let item = self.vector.get(self.index);
        self.index += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.vector.len - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for VectorIter<'_> {}

/// The sorted key column of a map.
#[derive(Debug, Clone, Copy)]
pub struct KeyVector<'a> {
    buf: &'a [u8],
    data: usize,
    byte_width: usize,
    len: usize,
}

impl<'a> KeyVector<'a> {
    pub(crate) fn new(buf: &'a [u8], data: usize, byte_width: usize, len: usize) -> Self {
        Self {
            buf,
            data,
            byte_width,
            len,
        }
    }

    pub(crate) fn empty(buf: &'a [u8]) -> Self {
        Self::new(buf, 0, 1, 0)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn size(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Past the end yields an empty key.
    pub fn get(&self, index: usize) -> Result<Key<'a>> {
        if index >= self.len {
            return Ok(Key::empty());
        }
        let slot = self.data + index * self.byte_width;
        let reference = Reference::with_type(self.buf, slot, self.byte_width, 1, FlexType::Key)?;
        check_precedes(&reference, self.data)?;
        Ok(reference.as_key())
    }

    pub fn iter(&self) -> impl Iterator<Item = Result<Key<'a>>> + 'a {
        let keys = *self;
        (0..keys.len).map(move |i| keys.get(i))
    }
}
