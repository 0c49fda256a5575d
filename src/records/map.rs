//! # Map View
//!
//! A map is an untyped vector of values with two extra prefix slots pointing
//! at a typed vector of keys:
//!
//! ```text
//! [keys offset : bw][keys width : bw][len : bw][values : len × bw][types : len]
//!       │                                       ^
//!       │                                       data
//!       └──> [len : kw][key offsets : len × kw]      (sorted by key bytes)
//! ```
//!
//! Keys and values share indices, so `get` is a binary search over the key
//! column followed by one indexed read of the value column. Keys compare as
//! unsigned bytes, which is the order the builder sorts them in.
//!
//! Equal keys are legal on the wire. Lookup returns the lowest index among
//! them, which is the entry put first.

use std::cmp::Ordering;

use eyre::Result;

use crate::records::reference::Reference;
use crate::records::sized::Key;
use crate::records::vector::{KeyVector, Vector};

#[derive(Debug, Clone, Copy)]
pub struct Map<'a> {
    keys: KeyVector<'a>,
    values: Vector<'a>,
}

impl<'a> Map<'a> {
    pub(crate) fn from_reference(reference: &Reference<'a>) -> Self {
        if !reference.is_map() {
            return Self::empty(reference.buf);
        }
        let values = Vector::from_reference(reference);
        // Key count was checked against the value count when `reference` was built.
        match Reference::map_keys(reference.buf, reference.target, reference.byte_width) {
            Ok((data, width)) => Self {
                keys: KeyVector::new(reference.buf, data, width, values.len()),
                values,
            },
            Err(_) => Self::empty(reference.buf),
        }
    }

    pub(crate) fn empty(buf: &'a [u8]) -> Self {
        Self {
            keys: KeyVector::empty(buf),
            values: Vector::empty(buf),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn size(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> KeyVector<'a> {
        self.keys
    }

    pub fn values(&self) -> Vector<'a> {
        self.values
    }

    /// Value at `index` in key order.
    pub fn get_index(&self, index: usize) -> Result<Reference<'a>> {
        self.values.get(index)
    }

    /// Value stored under `key`, or a Null reference when absent.
    pub fn get(&self, key: &str) -> Result<Reference<'a>> {
        self.get_bytes(key.as_bytes())
    }

    pub fn get_bytes(&self, key: &[u8]) -> Result<Reference<'a>> {
        match self.position(key)? {
            Some(index) => self.values.get(index),
            None => Ok(self.values.null_element()),
        }
    }

    /// Index of the first entry whose key equals `key`.
    pub fn position(&self, key: &[u8]) -> Result<Option<usize>> {
        let mut low = 0;
        let mut high = self.keys.len();
        while low < high {
            let mid = low + (high - low) / 2;
            match self.keys.get(mid)?.as_bytes().cmp(key) {
                Ordering::Less => low = mid + 1,
                _ => high = mid,
            }
        }
        if low < self.keys.len() && self.keys.get(low)?.as_bytes() == key {
            Ok(Some(low))
        } else {
            Ok(None)
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Result<(Key<'a>, Reference<'a>)>> + 'a {
        let map = *self;
        (0..map.len()).map(move |i| Ok((map.keys.get(i)?, map.values.get(i)?)))
    }
}
