//! # Blob and Key Views
//!
//! Borrowed byte views for the two values that are neither scalars nor
//! containers. A `Blob` is the payload of a length-prefixed blob (or string);
//! a `Key` is a NUL-terminated map key and remembers where it starts, so two
//! keys deduplicated by the builder compare equal by offset as well as by
//! content.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Blob<'a> {
    bytes: &'a [u8],
}

impl<'a> Blob<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    pub fn empty() -> Self {
        Self { bytes: &[] }
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Key<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Key<'a> {
    /// Key starting at `offset`, ending before the first NUL.
    pub(crate) fn at(buf: &'a [u8], offset: usize) -> Self {
        let tail = buf.get(offset..).unwrap_or(&[]);
        let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
        Self {
            bytes: &tail[..end],
            offset,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// `""` when the key is not valid UTF-8.
    pub fn as_str(&self) -> &'a str {
        std::str::from_utf8(self.bytes).unwrap_or("")
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl PartialEq for Key<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for Key<'_> {}

impl PartialEq<str> for Key<'_> {
    fn eq(&self, other: &str) -> bool {
        self.bytes == other.as_bytes()
    }
}

impl PartialEq<&str> for Key<'_> {
    fn eq(&self, other: &&str) -> bool {
        self.bytes == other.as_bytes()
    }
}
