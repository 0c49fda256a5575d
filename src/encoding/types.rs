//! # Type Tags and Packed Types
//!
//! Every FlexBuffers value is described by a 6-bit type code and a 2-bit
//! width code packed into one byte:
//!
//! ```text
//!   7             2 1   0
//! +-----------------+-----+
//! |   type code     |width|
//! +-----------------+-----+
//!
//! width: 0 = 1 byte, 1 = 2 bytes, 2 = 4 bytes, 3 = 8 bytes
//! ```
//!
//! For inline scalars the width code is the width of the scalar itself; for
//! everything else it is the width of the pointed-to data (the string's length
//! prefix, the vector's slots, the indirect scalar's bytes).
//!
//! ## Typed Vector Algebra
//!
//! | Element | Typed | Fixed 2 | Fixed 3 | Fixed 4 |
//! |---------|-------|---------|---------|---------|
//! | Int     | 11    | 16      | 19      | 22      |
//! | UInt    | 12    | 17      | 20      | 23      |
//! | Float   | 13    | 18      | 21      | 24      |
//! | Key     | 14    | -       | -       | -       |
//! | String  | 15 (deprecated, read-only) | - | - | - |
//! | Bool    | 36    | -       | -       | -       |

use eyre::{bail, Result};

use crate::config::{MAX_FIXED_TYPED_LEN, MIN_FIXED_TYPED_LEN};
use crate::encoding::width::BitWidth;
use crate::error::FlexError;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FlexType {
    Null = 0,
    Int = 1,
    UInt = 2,
    Float = 3,
    Key = 4,
    String = 5,
    IndirectInt = 6,
    IndirectUInt = 7,
    IndirectFloat = 8,
    Map = 9,
    Vector = 10,
    VectorInt = 11,
    VectorUInt = 12,
    VectorFloat = 13,
    VectorKey = 14,
    VectorStringDeprecated = 15,
    VectorInt2 = 16,
    VectorUInt2 = 17,
    VectorFloat2 = 18,
    VectorInt3 = 19,
    VectorUInt3 = 20,
    VectorFloat3 = 21,
    VectorInt4 = 22,
    VectorUInt4 = 23,
    VectorFloat4 = 24,
    Blob = 25,
    Bool = 26,
    VectorBool = 36,
}

impl FlexType {
    /// Stored directly in the parent's slot rather than behind an offset.
    pub fn is_inline(self) -> bool {
        matches!(
            self,
            FlexType::Null | FlexType::Int | FlexType::UInt | FlexType::Float | FlexType::Bool
        )
    }

    /// Types a typed vector may be built from.
    pub fn is_typed_vector_element(self) -> bool {
        matches!(
            self,
            FlexType::Int | FlexType::UInt | FlexType::Float | FlexType::Key | FlexType::Bool
        )
    }

    pub fn is_typed_vector(self) -> bool {
        matches!(
            self,
            FlexType::VectorInt
                | FlexType::VectorUInt
                | FlexType::VectorFloat
                | FlexType::VectorKey
                | FlexType::VectorStringDeprecated
                | FlexType::VectorBool
        )
    }

    pub fn is_fixed_typed_vector(self) -> bool {
        (FlexType::VectorInt2 as u8..=FlexType::VectorFloat4 as u8).contains(&(self as u8))
    }

    /// Any shape readable through a vector view, maps included.
    pub fn is_vector_like(self) -> bool {
        matches!(self, FlexType::Vector | FlexType::Map)
            || self.is_typed_vector()
            || self.is_fixed_typed_vector()
    }

    /// Vector type for a typed vector of `element`. `fixed_len` of 0 means
    /// a length-prefixed typed vector; 2..=4 selects the fixed variants.
    pub fn to_typed_vector(element: FlexType, fixed_len: usize) -> Option<FlexType> {
        match fixed_len {
            0 => match element {
                FlexType::Int => Some(FlexType::VectorInt),
                FlexType::UInt => Some(FlexType::VectorUInt),
                FlexType::Float => Some(FlexType::VectorFloat),
                FlexType::Key => Some(FlexType::VectorKey),
                FlexType::Bool => Some(FlexType::VectorBool),
                _ => None,
            },
            MIN_FIXED_TYPED_LEN..=MAX_FIXED_TYPED_LEN => {
                let column = match element {
                    FlexType::Int => 0,
                    FlexType::UInt => 1,
                    FlexType::Float => 2,
                    _ => return None,
                };
                let code = FlexType::VectorInt2 as usize + (fixed_len - MIN_FIXED_TYPED_LEN) * 3 + column;
                FlexType::try_from(code as u8).ok()
            }
            _ => None,
        }
    }

    /// Element type of a length-prefixed typed vector.
    pub fn typed_vector_element(self) -> Option<FlexType> {
        match self {
            FlexType::VectorInt => Some(FlexType::Int),
            FlexType::VectorUInt => Some(FlexType::UInt),
            FlexType::VectorFloat => Some(FlexType::Float),
            FlexType::VectorKey => Some(FlexType::Key),
            FlexType::VectorStringDeprecated => Some(FlexType::String),
            FlexType::VectorBool => Some(FlexType::Bool),
            _ => None,
        }
    }

    /// Element type and length of a fixed-length typed vector.
    pub fn fixed_typed_vector_element(self) -> Option<(FlexType, usize)> {
        if !self.is_fixed_typed_vector() {
            return None;
        }
        let rel = (self as u8 - FlexType::VectorInt2 as u8) as usize;
        let element = match rel % 3 {
            0 => FlexType::Int,
            1 => FlexType::UInt,
            _ => FlexType::Float,
        };
        Some((element, rel / 3 + MIN_FIXED_TYPED_LEN))
    }

    pub fn name(self) -> &'static str {
        match self {
            FlexType::Null => "null",
            FlexType::Int => "int",
            FlexType::UInt => "uint",
            FlexType::Float => "float",
            FlexType::Key => "key",
            FlexType::String => "string",
            FlexType::IndirectInt => "indirect_int",
            FlexType::IndirectUInt => "indirect_uint",
            FlexType::IndirectFloat => "indirect_float",
            FlexType::Map => "map",
            FlexType::Vector => "vector",
            FlexType::VectorInt => "vector_int",
            FlexType::VectorUInt => "vector_uint",
            FlexType::VectorFloat => "vector_float",
            FlexType::VectorKey => "vector_key",
            FlexType::VectorStringDeprecated => "vector_string_deprecated",
            FlexType::VectorInt2 => "vector_int2",
            FlexType::VectorUInt2 => "vector_uint2",
            FlexType::VectorFloat2 => "vector_float2",
            FlexType::VectorInt3 => "vector_int3",
            FlexType::VectorUInt3 => "vector_uint3",
            FlexType::VectorFloat3 => "vector_float3",
            FlexType::VectorInt4 => "vector_int4",
            FlexType::VectorUInt4 => "vector_uint4",
            FlexType::VectorFloat4 => "vector_float4",
            FlexType::Blob => "blob",
            FlexType::Bool => "bool",
            FlexType::VectorBool => "vector_bool",
        }
    }
}

impl TryFrom<u8> for FlexType {
    type Error = eyre::Report;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(FlexType::Null),
            1 => Ok(FlexType::Int),
            2 => Ok(FlexType::UInt),
            3 => Ok(FlexType::Float),
            4 => Ok(FlexType::Key),
            5 => Ok(FlexType::String),
            6 => Ok(FlexType::IndirectInt),
            7 => Ok(FlexType::IndirectUInt),
            8 => Ok(FlexType::IndirectFloat),
            9 => Ok(FlexType::Map),
            10 => Ok(FlexType::Vector),
            11 => Ok(FlexType::VectorInt),
            12 => Ok(FlexType::VectorUInt),
            13 => Ok(FlexType::VectorFloat),
            14 => Ok(FlexType::VectorKey),
            15 => Ok(FlexType::VectorStringDeprecated),
            16 => Ok(FlexType::VectorInt2),
            17 => Ok(FlexType::VectorUInt2),
            18 => Ok(FlexType::VectorFloat2),
            19 => Ok(FlexType::VectorInt3),
            20 => Ok(FlexType::VectorUInt3),
            21 => Ok(FlexType::VectorFloat3),
            22 => Ok(FlexType::VectorInt4),
            23 => Ok(FlexType::VectorUInt4),
            24 => Ok(FlexType::VectorFloat4),
            25 => Ok(FlexType::Blob),
            26 => Ok(FlexType::Bool),
            36 => Ok(FlexType::VectorBool),
            _ => bail!(FlexError::format(format!("unknown type code: {}", value))),
        }
    }
}

impl std::fmt::Display for FlexType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

pub fn pack_type(flex_type: FlexType, width: BitWidth) -> u8 {
    ((flex_type as u8) << 2) | width as u8
}

pub fn unpack_type(packed: u8) -> Result<(FlexType, BitWidth)> {
    let flex_type = FlexType::try_from(packed >> 2)?;
    Ok((flex_type, BitWidth::from_code(packed & 0x03)))
}
