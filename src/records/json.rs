//! # JSON Bridge
//!
//! Converts between `serde_json::Value` trees and FlexBuffers.
//!
//! ## JSON to FlexBuffers
//!
//! | JSON | Written as |
//! |------|------------|
//! | `null` | Null |
//! | `true`/`false` | Bool |
//! | integer fitting i64 | Int |
//! | integer above i64::MAX | UInt |
//! | other number | Float (4 bytes when exact as f32, else 8) |
//! | string | String |
//! | array | untyped Vector |
//! | object | Map |
//!
//! ## FlexBuffers to JSON
//!
//! The reverse mapping, plus: keys become strings, blobs become arrays of
//! byte values, typed vectors become arrays, and NaN or infinite floats
//! become `null` because JSON cannot express them.

use eyre::{ensure, Result};
use serde_json::Value;

use crate::config::{BuilderFlags, MAX_NESTING_DEPTH};
use crate::encoding::{width_f, BitWidth, FlexType};
use crate::error::FlexError;
use crate::records::builder::Builder;
use crate::records::reference::Reference;

impl Builder {
    /// Writes a JSON value, recursing into arrays and objects. On error the
    /// builder may hold partially opened containers; `clear()` before reuse.
    pub fn put_json(&mut self, key: Option<&str>, value: &Value) -> Result<()> {
        match value {
            Value::Null => self.put_null(key),
            Value::Bool(b) => self.put_bool(key, *b),
            Value::Number(n) => {
                if let Some(v) = n.as_i64() {
                    self.put_int(key, v)
                } else if let Some(v) = n.as_u64() {
                    self.put_uint(key, v)
                } else {
                    let v = n.as_f64().unwrap_or(0.0);
                    match width_f(v) {
                        BitWidth::W32 => self.put_float(key, v as f32),
                        _ => self.put_double(key, v),
                    }
                }
            }
            Value::String(s) => self.put_string(key, s),
            Value::Array(items) => {
                let handle = self.start_vector()?;
                for item in items {
                    self.put_json(None, item)?;
                }
                self.end_vector(key, handle, false, false)?;
                Ok(())
            }
            Value::Object(fields) => {
                let handle = self.start_map()?;
                for (name, field) in fields {
                    self.put_json(Some(name), field)?;
                }
                self.end_map(key, handle)?;
                Ok(())
            }
        }
    }
}

/// Parses JSON text and encodes it as a finished FlexBuffer.
pub fn from_json_str(text: &str, flags: BuilderFlags) -> Result<Vec<u8>> {
    let value: Value = serde_json::from_str(text)?;
    let mut builder = Builder::with_flags(flags);
    builder.put_json(None, &value)?;
    builder.finish()?;
    Ok(builder.into_vec())
}

impl Reference<'_> {
    /// Fails with `FlexError::Format` when a child is malformed or nesting
    /// exceeds [`MAX_NESTING_DEPTH`].
    pub fn to_json_value(&self) -> Result<Value> {
        self.to_json_at_depth(0)
    }

    fn to_json_at_depth(&self, depth: usize) -> Result<Value> {
        ensure!(
            depth <= MAX_NESTING_DEPTH,
            FlexError::format(format!(
                "nesting exceeds maximum depth {}",
                MAX_NESTING_DEPTH
            ))
        );
        let value = match self.flex_type() {
            FlexType::Null => Value::Null,
            FlexType::Bool => Value::Bool(self.as_bool()),
            FlexType::Int | FlexType::IndirectInt => Value::from(self.as_i64()),
            FlexType::UInt | FlexType::IndirectUInt => Value::from(self.as_u64()),
            FlexType::Float | FlexType::IndirectFloat => serde_json::Number::from_f64(self.as_f64())
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FlexType::String => {
                Value::String(String::from_utf8_lossy(self.as_blob().as_bytes()).into_owned())
            }
            FlexType::Key => {
                Value::String(String::from_utf8_lossy(self.as_key().as_bytes()).into_owned())
            }
            FlexType::Blob => Value::Array(
                self.as_blob()
                    .as_bytes()
                    .iter()
                    .map(|&b| Value::from(b))
                    .collect(),
            ),
            FlexType::Map => {
                let mut object = serde_json::Map::new();
                for entry in self.as_map().iter() {
                    let (key, value) = entry?;
                    object.insert(
                        String::from_utf8_lossy(key.as_bytes()).into_owned(),
                        value.to_json_at_depth(depth + 1)?,
                    );
                }
                Value::Object(object)
            }
            _ => Value::Array(
                self.as_vector()
                    .iter()
                    .map(|element| element?.to_json_at_depth(depth + 1))
                    .collect::<Result<Vec<_>>>()?,
            ),
        };
        Ok(value)
    }
}
