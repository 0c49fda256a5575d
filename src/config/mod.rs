//! # flexbuf Configuration Module
//!
//! This module centralizes configuration for the crate:
//!
//! - [`constants`]: numeric layout and sizing values with dependency notes
//! - [`BuilderFlags`]: which content the builder deduplicates
//! - [`BuilderOptions`]: fluent construction of a configured [`Builder`]
//!
//! ## Sharing Flags
//!
//! | Flag | Keys shared | Strings shared |
//! |------|-------------|----------------|
//! | `NONE` | no | no |
//! | `SHARE_KEYS` (default) | yes | no |
//! | `SHARE_STRINGS` | no | yes |
//! | `SHARE_KEYS_AND_STRINGS` | yes | yes |
//!
//! Sharing trades a hash lookup per key/string for a smaller buffer. Shared
//! content resolves to one offset, which is how readers can tell two values
//! share storage.
//!
//! ## Usage
//!
//! ```
//! use flexbuf::{BuilderFlags, BuilderOptions};
//!
//! let builder = BuilderOptions::new()
//!     .flags(BuilderFlags::SHARE_KEYS_AND_STRINGS)
//!     .capacity(1024)
//!     .build();
//! assert!(builder.flags().shares_strings());
//! ```
//!
//! [`Builder`]: crate::records::Builder

pub mod constants;
pub use constants::*;

use crate::memory::ByteBuffer;
use crate::records::Builder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BuilderFlags(u8);

impl BuilderFlags {
    pub const NONE: BuilderFlags = BuilderFlags(0);
    pub const SHARE_KEYS: BuilderFlags = BuilderFlags(1);
    pub const SHARE_STRINGS: BuilderFlags = BuilderFlags(2);
    pub const SHARE_KEYS_AND_STRINGS: BuilderFlags = BuilderFlags(3);

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn shares_keys(&self) -> bool {
        self.0 & Self::SHARE_KEYS.0 != 0
    }

    pub fn shares_strings(&self) -> bool {
        self.0 & Self::SHARE_STRINGS.0 != 0
    }
}

impl Default for BuilderFlags {
    fn default() -> Self {
        BuilderFlags::SHARE_KEYS
    }
}

impl std::ops::BitOr for BuilderFlags {
    type Output = BuilderFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        BuilderFlags(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Capacity {
    Growable(usize),
    Fixed(usize),
}

/// Options for constructing a [`Builder`].
///
/// Defaults: `SHARE_KEYS`, growable buffer starting at
/// [`DEFAULT_BUFFER_CAPACITY`] bytes.
#[derive(Debug, Clone, Copy)]
pub struct BuilderOptions {
    flags: BuilderFlags,
    capacity: Capacity,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl BuilderOptions {
    pub fn new() -> Self {
        Self {
            flags: BuilderFlags::default(),
            capacity: Capacity::Growable(DEFAULT_BUFFER_CAPACITY),
        }
    }

    pub fn flags(mut self, flags: BuilderFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Initial capacity of a growable buffer.
    pub fn capacity(mut self, bytes: usize) -> Self {
        self.capacity = Capacity::Growable(bytes);
        self
    }

    /// Hard upper bound. Writes past it fail with `FlexError::Overflow`
    /// instead of reallocating.
    pub fn fixed_capacity(mut self, bytes: usize) -> Self {
        self.capacity = Capacity::Fixed(bytes);
        self
    }

    pub fn build(self) -> Builder {
        let buffer = match self.capacity {
            Capacity::Growable(bytes) => ByteBuffer::growable(bytes),
            Capacity::Fixed(bytes) => ByteBuffer::fixed(bytes),
        };
        Builder::with_buffer(buffer, self.flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_flags_share_keys_only() {
        let flags = BuilderFlags::default();
        assert!(flags.shares_keys());
        assert!(!flags.shares_strings());
    }

    #[test]
    fn combined_flags_share_both() {
        let flags = BuilderFlags::SHARE_KEYS | BuilderFlags::SHARE_STRINGS;
        assert_eq!(flags, BuilderFlags::SHARE_KEYS_AND_STRINGS);
        assert!(flags.shares_keys());
        assert!(flags.shares_strings());
    }

    #[test]
    fn none_shares_nothing() {
        assert!(!BuilderFlags::NONE.shares_keys());
        assert!(!BuilderFlags::NONE.shares_strings());
    }

    #[test]
    fn options_carry_flags_into_builder() {
        let builder = BuilderOptions::new()
            .flags(BuilderFlags::SHARE_STRINGS)
            .fixed_capacity(64)
            .build();
        assert_eq!(builder.flags(), BuilderFlags::SHARE_STRINGS);
        assert_eq!(builder.fixed_capacity(), Some(64));
    }
}
