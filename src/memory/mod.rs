//! # Buffer Memory Management
//!
//! The only resource flexbuf manages explicitly is the builder's backing
//! buffer. [`ByteBuffer`] enforces one of two policies:
//!
//! ```text
//! Growable:  [ written bytes | spare capacity ]  --full-->  copy into 2x allocation
//! Fixed:     [ written bytes | spare capacity ]  --full-->  FlexError::Overflow
//! ```
//!
//! Growth is append/copy: offsets are measured from the start of the buffer,
//! so a reallocation never invalidates an offset already recorded by the
//! builder.
//!
//! ## Configuration
//!
//! ```rust
//! use flexbuf::BuilderOptions;
//!
//! // Growable, starting at 1 KB
//! let growable = BuilderOptions::new().capacity(1024).build();
//!
//! // Hard 64-byte bound
//! let bounded = BuilderOptions::new().fixed_capacity(64).build();
//! assert_eq!(bounded.fixed_capacity(), Some(64));
//! # drop(growable);
//! ```

pub mod buffer;

pub use buffer::ByteBuffer;
