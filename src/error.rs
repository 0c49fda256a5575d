//! # Error Taxonomy
//!
//! Every fallible operation in this crate returns `eyre::Result`. The concrete
//! failure is always a [`FlexError`], raised with `bail!(FlexError::...)`, so
//! callers that need to branch on the kind of failure can downcast:
//!
//! ```
//! use flexbuf::{Builder, BuilderOptions, FlexError};
//!
//! let mut builder = BuilderOptions::new().fixed_capacity(1).build();
//! let err = builder.put_string(None, "too long for one byte").unwrap_err();
//! assert!(matches!(
//!     err.downcast_ref::<FlexError>(),
//!     Some(FlexError::Overflow { .. })
//! ));
//! ```
//!
//! ## Kinds
//!
//! | Kind | Raised by | Effect |
//! |------|-----------|--------|
//! | `Overflow` | fixed-capacity buffer write | builder unusable until `clear()` |
//! | `Structural` | mismatched start/end, bad keys, bad `finish()` | call rejected, state unchanged |
//! | `Deprecated` | building a typed vector of strings | call rejected, state unchanged |
//! | `InvalidKey` | map key containing a NUL byte | call rejected, state unchanged |
//! | `Format` | reading a truncated or corrupt buffer | only that access fails |
//!
//! Reading a value as the wrong type is not an error: every `as_*` accessor on
//! `Reference` returns a documented empty/zero value instead.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlexError {
    Overflow { capacity: usize, requested: usize },
    Structural(String),
    Deprecated(String),
    InvalidKey,
    Format(String),
}

impl FlexError {
    pub fn structural(msg: impl Into<String>) -> Self {
        FlexError::Structural(msg.into())
    }

    pub fn format(msg: impl Into<String>) -> Self {
        FlexError::Format(msg.into())
    }

    pub fn is_overflow(&self) -> bool {
        matches!(self, FlexError::Overflow { .. })
    }
}

impl std::fmt::Display for FlexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlexError::Overflow {
                capacity,
                requested,
            } => write!(
                f,
                "buffer overflow: write needs {} bytes but fixed capacity is {}",
                requested, capacity
            ),
            FlexError::Structural(msg) => write!(f, "structural error: {}", msg),
            FlexError::Deprecated(msg) => write!(f, "deprecated encoding: {}", msg),
            FlexError::InvalidKey => write!(f, "map keys must not contain NUL bytes"),
            FlexError::Format(msg) => write!(f, "malformed buffer: {}", msg),
        }
    }
}

impl std::error::Error for FlexError {}
