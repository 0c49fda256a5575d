//! # flexbuf - Schema-less Binary Serialization
//!
//! flexbuf implements the FlexBuffers format: hierarchical, heterogeneous
//! data (null, booleans, integers, floats, strings, blobs, vectors, typed
//! vectors, maps) packed into one contiguous little-endian buffer that can be
//! read in place, one field at a time, without a parse step.
//!
//! - **Minimal widths**: every container picks the narrowest 1/2/4/8-byte
//!   slot width that holds its elements and offsets
//! - **Zero-copy reads**: every accessor borrows from the input slice
//! - **Validated views**: malformed buffers fail when a value is reached,
//!   never with a panic or an out-of-bounds read
//!
//! ## Quick Start
//!
//! ```
//! use flexbuf::{get_root, Builder};
//!
//! let mut builder = Builder::new();
//! let map = builder.start_map()?;
//! builder.put_int(Some("myInt"), 9_223_371_743_723_257_855)?;
//! builder.put_string(Some("myString"), "wow")?;
//! let vec = builder.start_vector()?;
//! builder.put_int(None, 99)?;
//! builder.put_string(None, "wow")?;
//! builder.end_vector(Some("myVec"), vec, false, false)?;
//! builder.end_map(None, map)?;
//! let bytes = builder.finish()?;
//!
//! let root = get_root(bytes)?.as_map();
//! assert_eq!(root.size(), 3);
//! assert_eq!(root.get("myInt")?.as_i64(), 9_223_371_743_723_257_855);
//! assert_eq!(root.get("myVec")?.as_vector().get(0)?.as_i32(), 99);
//! # Ok::<(), eyre::Report>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────┐   ┌──────────────────────────────┐
//! │ Builder (records::builder)   │   │ Reference / Vector / Map     │
//! │   value stack + frames       │   │   (records::reference, ...)  │
//! ├──────────────────────────────┤   ├──────────────────────────────┤
//! │ DedupPool │ ByteBuffer       │   │ bounds-checked scalar reads  │
//! ├──────────────────────────────┴───┴──────────────────────────────┤
//! │     encoding: FlexType, packed types, BitWidth selection        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`config`]: constants, sharing flags, `BuilderOptions`
//! - [`encoding`]: type codes, width selection, scalar reads
//! - [`memory`]: growable and fixed-capacity backing buffers
//! - [`records`]: builder, reader views, rendering, JSON bridge
//! - [`error`]: the `FlexError` taxonomy carried inside `eyre::Report`

pub mod config;
pub mod encoding;
pub mod error;
pub mod memory;
pub mod records;

pub use config::{BuilderFlags, BuilderOptions};
pub use encoding::{BitWidth, FlexType};
pub use error::FlexError;
pub use records::{
    from_json_str, get_root, Blob, Builder, FrameHandle, Key, KeyVector, Map, Reference, Vector,
};
