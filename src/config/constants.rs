//! # flexbuf Configuration Constants
//!
//! All numeric layout and sizing constants live here, grouped by the part of
//! the format they belong to. Constants that depend on each other are
//! co-located and their relationships are checked at compile time.
//!
//! ## Dependency Graph
//!
//! ```text
//! MAX_BYTE_WIDTH (8)
//!       │
//!       └─> every slot, length prefix and offset is 1, 2, 4 or 8 bytes
//!
//! ROOT_TRAILER_LEN (2 bytes: packed type + root width)
//!       │
//!       └─> MIN_ROOT_BUFFER_LEN (derived: trailer + a 1-byte root slot)
//!
//! MIN_FIXED_TYPED_LEN (2) ..= MAX_FIXED_TYPED_LEN (4)
//!       Fixed-length typed vectors encode their length in the type code,
//!       so only these three lengths exist on the wire.
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use crate::config::{DEFAULT_BUFFER_CAPACITY, MIN_ROOT_BUFFER_LEN};
//! ```

// ============================================================================
// BUFFER SIZING
// ============================================================================

/// Initial capacity of a growable builder buffer.
pub const DEFAULT_BUFFER_CAPACITY: usize = 256;

/// Smallest reservation made when a growable buffer has to grow.
/// Keeps tiny builders from reallocating on every few bytes.
pub const MIN_GROWTH_BYTES: usize = 64;

// ============================================================================
// WIRE LAYOUT
// ============================================================================

/// Widest slot, offset or length prefix the format can express.
pub const MAX_BYTE_WIDTH: usize = 8;

/// Bytes after the root slot: the root's packed type, then the root width.
pub const ROOT_TRAILER_LEN: usize = 2;

/// Smallest buffer that can hold a root: a 1-byte slot plus the trailer.
pub const MIN_ROOT_BUFFER_LEN: usize = ROOT_TRAILER_LEN + 1;

/// Number of leading slots a map adds before its values: keys offset,
/// keys byte width, and the length prefix.
pub const MAP_PREFIX_SLOTS: usize = 3;

const _: () = assert!(
    MIN_ROOT_BUFFER_LEN == ROOT_TRAILER_LEN + 1,
    "MIN_ROOT_BUFFER_LEN derivation mismatch"
);

// ============================================================================
// TYPED VECTORS
// ============================================================================

/// Shortest fixed-length typed vector (VectorInt2 and friends).
pub const MIN_FIXED_TYPED_LEN: usize = 2;

/// Longest fixed-length typed vector (VectorInt4 and friends).
pub const MAX_FIXED_TYPED_LEN: usize = 4;

const _: () = assert!(
    MIN_FIXED_TYPED_LEN <= MAX_FIXED_TYPED_LEN,
    "fixed typed vector length range is empty"
);

// ============================================================================
// BUILDER STACK
// ============================================================================

/// Open containers tracked inline before the frame stack spills to the heap.
pub const INLINE_FRAME_DEPTH: usize = 8;

// ============================================================================
// READER LIMITS
// ============================================================================

/// Deepest container nesting that recursive readers (`Display`,
/// `to_json_value`) descend into. Backward offsets can still form cycles in
/// a corrupt buffer, so recursion is bounded here rather than by the data.
pub const MAX_NESTING_DEPTH: usize = 64;
