//! # Encoding Module
//!
//! Wire-level building blocks shared by the builder and the reader:
//!
//! - **Type tags**: the `FlexType` codes and packed type bytes
//! - **Width selection**: narrowest 1/2/4/8-byte width for values and offsets
//! - **Scalar reads**: bounds-checked little-endian integer and float reads

pub mod scalar;
pub mod types;
pub mod width;

pub use scalar::{check_range, read_float, read_int, read_uint};
pub use types::{pack_type, unpack_type, FlexType};
pub use width::{padding_bytes, width_f, width_i, width_u, BitWidth};
