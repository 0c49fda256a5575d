//! # Deduplication Pool
//!
//! Maps already-written key and string content to the buffer offset it was
//! written at, so a repeated key or string can point at the existing bytes
//! instead of being written again. Keys and strings live in separate tables
//! because they have different layouts (keys are NUL-terminated without a
//! length prefix, strings are length-prefixed).
//!
//! The pool belongs to one builder session. Entries are only meaningful for
//! the buffer they were recorded against, so `clear()` empties both tables
//! (keeping their allocations for the next build).

use hashbrown::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolKind {
    Key,
    String,
}

#[derive(Debug, Default)]
pub struct DedupPool {
    keys: HashMap<Box<[u8]>, usize>,
    strings: HashMap<Box<[u8]>, usize>,
}

impl DedupPool {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self, kind: PoolKind) -> &HashMap<Box<[u8]>, usize> {
        match kind {
            PoolKind::Key => &self.keys,
            PoolKind::String => &self.strings,
        }
    }

    pub fn lookup(&self, kind: PoolKind, content: &[u8]) -> Option<usize> {
        self.table(kind).get(content).copied()
    }

    /// Records the offset of the first copy; later inserts of the same
    /// content keep the original offset.
    pub fn insert(&mut self, kind: PoolKind, content: &[u8], offset: usize) {
        let table = match kind {
            PoolKind::Key => &mut self.keys,
            PoolKind::String => &mut self.strings,
        };
        table.entry(Box::from(content)).or_insert(offset);
    }

    pub fn len(&self) -> usize {
        self.keys.len() + self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.keys.clear();
        self.strings.clear();
    }
}
