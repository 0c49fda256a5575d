//! Human-readable rendering of reader views.
//!
//! ```text
//! map     { "a" : 1, "b" : [ 2, "x" ] }
//! vector  [ 99, "wow" ]
//! string  "escaped \"text\""
//! blob    "lossy utf-8"      (bare when a `Blob` is printed on its own)
//! float   2.5, 1.7976894783391937E308
//! ```
//!
//! Floats with a magnitude below 1e-3 or at least 1e7 print in exponent
//! form. Values that fail validation, and containers nested deeper than
//! `MAX_NESTING_DEPTH`, print as `null`.

use std::fmt;

use crate::config::MAX_NESTING_DEPTH;
use crate::encoding::FlexType;
use crate::records::map::Map;
use crate::records::reference::Reference;
use crate::records::sized::{Blob, Key};
use crate::records::vector::Vector;

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if c.is_control() => write!(f, "\\u{:04x}", c as u32)?,
            c => write!(f, "{}", c)?,
        }
    }
    f.write_str("\"")
}

fn write_float(f: &mut fmt::Formatter<'_>, value: f64) -> fmt::Result {
    let magnitude = value.abs();
    if value.is_finite() && magnitude != 0.0 && !(1e-3..1e7).contains(&magnitude) {
        write!(f, "{:E}", value)
    } else {
        write!(f, "{}", value)
    }
}

fn write_reference(f: &mut fmt::Formatter<'_>, value: &Reference<'_>, depth: usize) -> fmt::Result {
    match value.flex_type() {
        FlexType::Null => f.write_str("null"),
        FlexType::Bool => write!(f, "{}", value.as_bool()),
        FlexType::Int | FlexType::IndirectInt => write!(f, "{}", value.as_i64()),
        FlexType::UInt | FlexType::IndirectUInt => write!(f, "{}", value.as_u64()),
        FlexType::Float | FlexType::IndirectFloat => write_float(f, value.as_f64()),
        FlexType::String => write_quoted(f, value.as_str()),
        FlexType::Key => write_quoted(f, value.as_key().as_str()),
        FlexType::Blob => write_quoted(f, &String::from_utf8_lossy(value.as_blob().as_bytes())),
        FlexType::Map => write_map(f, &value.as_map(), depth),
        _ => write_vector(f, &value.as_vector(), depth),
    }
}

fn write_vector(f: &mut fmt::Formatter<'_>, vector: &Vector<'_>, depth: usize) -> fmt::Result {
    if depth > MAX_NESTING_DEPTH {
        return f.write_str("null");
    }
    f.write_str("[ ")?;
    for (i, element) in vector.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        match element {
            Ok(element) => write_reference(f, &element, depth + 1)?,
            Err(_) => f.write_str("null")?,
        }
    }
    f.write_str(" ]")
}

fn write_map(f: &mut fmt::Formatter<'_>, map: &Map<'_>, depth: usize) -> fmt::Result {
    if depth > MAX_NESTING_DEPTH {
        return f.write_str("null");
    }
    f.write_str("{ ")?;
    for (i, entry) in map.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        match entry {
            Ok((key, value)) => {
                write_quoted(f, key.as_str())?;
                f.write_str(" : ")?;
                write_reference(f, &value, depth + 1)?;
            }
            Err(_) => f.write_str("null")?,
        }
    }
    f.write_str(" }")
}

impl fmt::Display for Reference<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_reference(f, self, 0)
    }
}

impl fmt::Display for Vector<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_vector(f, self, 0)
    }
}

impl fmt::Display for Map<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_map(f, self, 0)
    }
}

impl fmt::Display for Key<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Blob<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.as_bytes()))
    }
}
