//! # Width Selection
//!
//! Pure functions choosing the narrowest byte width (1/2/4/8) that holds a
//! value or an offset without loss, plus the alignment padding the builder
//! inserts before each write.
//!
//! ## Boundary Values
//!
//! | Function | W8 up to | W16 up to | W32 up to | W64 |
//! |----------|----------|-----------|-----------|-----|
//! | `width_u` | 255 | 65535 | 4294967295 | above |
//! | `width_i` | -128..=127 | -32768..=32767 | i32 range | above |
//! | `width_f` | - | - | exactly representable as f32 | otherwise |
//!
//! All functions are pure and allocation free.

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum BitWidth {
    #[default]
    W8 = 0,
    W16 = 1,
    W32 = 2,
    W64 = 3,
}

impl BitWidth {
    pub fn from_code(code: u8) -> BitWidth {
        match code & 0x03 {
            0 => BitWidth::W8,
            1 => BitWidth::W16,
            2 => BitWidth::W32,
            _ => BitWidth::W64,
        }
    }

    pub fn from_byte_width(byte_width: usize) -> Option<BitWidth> {
        match byte_width {
            1 => Some(BitWidth::W8),
            2 => Some(BitWidth::W16),
            4 => Some(BitWidth::W32),
            8 => Some(BitWidth::W64),
            _ => None,
        }
    }

    pub fn bytes(self) -> usize {
        1 << self as u8
    }
}

pub fn width_u(value: u64) -> BitWidth {
    if value <= u8::MAX as u64 {
        BitWidth::W8
    } else if value <= u16::MAX as u64 {
        BitWidth::W16
    } else if value <= u32::MAX as u64 {
        BitWidth::W32
    } else {
        BitWidth::W64
    }
}

/// Zig-zag the value so a negative number costs the same as its magnitude.
pub fn width_i(value: i64) -> BitWidth {
    let zigzag = ((value << 1) ^ (value >> 63)) as u64;
    width_u(zigzag)
}

pub fn width_f(value: f64) -> BitWidth {
    if (value as f32) as f64 == value {
        BitWidth::W32
    } else {
        BitWidth::W64
    }
}

/// Zero bytes needed so that `len` becomes a multiple of `byte_width`.
pub fn padding_bytes(len: usize, byte_width: usize) -> usize {
    (byte_width - (len % byte_width)) % byte_width
}
