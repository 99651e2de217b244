use thiserror::Error;

/// Result type for fallible `BinaryBuffer` operations.
pub type Result<T> = core::result::Result<T, BufferError>;

/// Error type for `BinaryBuffer`
#[derive(Copy, Clone, Eq, PartialEq, Debug, Error)]
pub enum BufferError {
    /// A `read_*` method (or an indexed byte access) reached the end of the buffer before it had
    /// all of the bytes it needed. The cursor is not moved when this is returned.
    #[error("read of {needed} bytes at position {position} exceeds buffer length {len}")]
    OutOfRange {
        /// Where the read started.
        position: usize,
        /// How many bytes the read needed.
        needed: usize,
        /// The buffer length at the time of the read.
        len: usize,
    },

    /// The cursor cannot be moved beyond the end of the buffer. Buffers never contain gaps.
    #[error("position {position} is beyond the end of the buffer (length {len})")]
    InvalidPosition {
        /// The requested position.
        position: usize,
        /// The buffer length.
        len: usize,
    },

    /// A caller-supplied slice is too short for the requested `offset` and `count`.
    #[error("range {offset}+{count} does not fit in a slice of length {len}")]
    SliceRange {
        /// Offset into the caller's slice.
        offset: usize,
        /// Number of bytes requested.
        count: usize,
        /// Length of the caller's slice.
        len: usize,
    },

    /// A string body is not well-formed UTF-8.
    #[error("string of {len} bytes is not valid UTF-8")]
    InvalidUtf8 {
        /// Length of the string body, after any trailing NUL was removed.
        len: usize,
    },

    /// A string is too long for its 16-bit length prefix.
    #[error("string of {len} bytes does not fit a 16-bit length prefix")]
    StringTooLong {
        /// UTF-8 length of the string.
        len: usize,
    },

    /// Single-byte characters are Latin-1; this code point has no single-byte form.
    #[error("character {ch:?} cannot be written as a single byte")]
    CharOutOfRange {
        /// The rejected character.
        ch: char,
    },

    /// A variable-length double started with a width selector other than 1, 2, 4 or 8.
    #[error("invalid variable-length double width selector {selector}")]
    InvalidWidth {
        /// The selector byte that was read.
        selector: u8,
    },
}
