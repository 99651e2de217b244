//! A seekable binary buffer with endian-aware primitives, base-128 varints and an adaptive decimal
//! float encoding.
//!
//! [`BinaryBuffer`] reads and writes at a single cursor. Multi-byte numbers are big-endian unless
//! the buffer is switched to [`Endian::Little`]. Strings are UTF-8 with a 16-bit length prefix.
//! Bit arrays are packed least significant bit first.
//!
//! [`BinaryBuffer::write_var_double`] stores a double in 1, 2, 4 or 8 bytes, choosing the
//! narrowest width that round-trips the value exactly. Short decimal fractions such as `12.34`
//! fit in 2 bytes. See [`varlen`] for the layout.
//!
//! ```
//! use jetbuf::BinaryBuffer;
//!
//! let mut buf = BinaryBuffer::new();
//! buf.write_string("price").unwrap();
//! buf.write_var_double(12.34, false);
//! buf.write_var_i32(-5);
//!
//! buf.set_position(0).unwrap();
//! assert_eq!(buf.read_string().unwrap(), "price");
//! assert_eq!(buf.read_var_double(false).unwrap(), 12.34);
//! assert_eq!(buf.read_var_i32().unwrap(), -5);
//! ```

#![cfg_attr(not(any(feature = "std", test)), no_std)]
#![forbid(unsafe_code)]
#![forbid(unused_must_use)]
#![warn(missing_docs)]

extern crate alloc;

mod buffer;
mod error;
mod reader;
pub mod varlen;
mod writer;


pub use buffer::{BinaryBuffer, Endian};
pub use error::{BufferError, Result};
pub use varlen::VarDouble;
