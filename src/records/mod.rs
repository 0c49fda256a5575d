//! # FlexBuffers Records: Builder and Lazy Reader
//!
//! This module holds both halves of the format: the stack-based `Builder`
//! that writes a buffer, and the `Reference` family of views that read one
//! value at a time without a parse pass.
//!
//! ## Buffer Layout
//!
//! A finished buffer is a sequence of child values followed by the root:
//!
//! ```text
//! +-----------------------------+-----------+-------------+------------+
//! | values, children first      | root slot | packed type | root width |
//! | (aligned to their widths)   | (1/2/4/8) | (1 byte)    | (1 byte)   |
//! +-----------------------------+-----------+-------------+------------+
//! ```
//!
//! Every non-inline value is reached through an unsigned backward offset
//! from the slot that refers to it, so children always precede parents.
//!
//! ## Value Shapes
//!
//! | Shape | Bytes | Reference points at |
//! |-------|-------|---------------------|
//! | Inline scalar | slot only | the slot |
//! | Indirect scalar | `[value : bw]` | the value |
//! | String | `[len : bw][utf-8][0]` | first payload byte |
//! | Blob | `[len : bw][bytes]` | first payload byte |
//! | Key | `[bytes][0]` | first byte |
//! | Vector | `[len][slots][types]` | first slot |
//! | Typed vector | `[len][slots]` | first slot |
//! | Fixed typed vector | `[slots]` | first slot |
//! | Map | `[keys off][keys bw][len][slots][types]` | first value slot |
//!
//! ## Module Structure
//!
//! - `builder`: `Builder` and `FrameHandle`
//! - `pool`: key/string deduplication for the builder
//! - `reference`: `get_root` and `Reference`
//! - `vector`: `Vector`, `KeyVector`
//! - `map`: `Map`
//! - `sized`: `Blob`, `Key`
//! - `display`: `Display` for every view
//! - `json`: conversion to and from `serde_json::Value`

pub mod builder;
pub mod display;
pub mod json;
pub mod map;
pub mod pool;
pub mod reference;
pub mod sized;
pub mod vector;

#[cfg(test)]
mod tests;

pub use builder::{Builder, FrameHandle};
pub use json::from_json_str;
pub use map::Map;
pub use pool::{DedupPool, PoolKind};
pub use reference::{get_root, Reference};
pub use sized::{Blob, Key};
pub use vector::{KeyVector, Vector, VectorIter};
