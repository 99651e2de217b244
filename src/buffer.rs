use alloc::borrow::Cow;
use alloc::vec::Vec;
use core::fmt;

use crate::error::{BufferError, Result};

/// Byte order used by every multi-byte numeric read and write.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum Endian {
    /// Most significant byte first. This is the default.
    #[default]
    Big,
    /// Least significant byte first.
    Little,
}

/// A seekable, growable byte buffer with a single read/write cursor.
///
/// Reads and writes both happen at [`position`](Self::position) and advance it. Writing in the
/// middle of the buffer overwrites the existing bytes in place; writing past the end grows the
/// buffer. The cursor can never be placed beyond the end, so a buffer never contains gaps.
///
/// The buffer usually owns its bytes. [`BinaryBuffer::view`] instead borrows the caller's bytes
/// without copying them; the first write to a view copies the bytes into owned storage, so the
/// caller's slice is never modified.
///
/// There is no schema or type tag in the encoded stream. Producer and consumer must agree on the
/// order and type of every field.
///
/// There is no internal synchronization. Every mutating method takes `&mut self`, so sharing a
/// buffer across threads requires the caller to provide exclusive access.
#[derive(Clone, Debug)]
pub struct BinaryBuffer<'a> {
    pub(crate) data: Cow<'a, [u8]>,
    pub(crate) pos: usize,
    pub(crate) endian: Endian,
}

impl BinaryBuffer<'static> {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    /// Creates an empty buffer with the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_vec(Vec::with_capacity(capacity))
    }

    /// Takes ownership of an existing `Vec<u8>`. The cursor starts at 0.
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self {
            data: Cow::Owned(bytes),
            pos: 0,
            endian: Endian::default(),
        }
    }

    /// Copies `bytes` into a new owned buffer. The cursor starts at 0.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::from_vec(bytes.to_vec())
    }

    /// Deep-copies the contents of `other`. The cursor of the copy starts at 0; the byte order
    /// is carried over.
    pub fn copy_of(other: &BinaryBuffer<'_>) -> Self {
        Self::from_vec(other.to_vec()).with_endian(other.endian)
    }
}

impl<'a> BinaryBuffer<'a> {
    /// Creates a read-only view over `bytes` without copying them.
    ///
    /// Reads come straight from `bytes`. A write detaches the view by copying `bytes` into owned
    /// storage first.
    pub fn view(bytes: &'a [u8]) -> Self {
        Self {
            data: Cow::Borrowed(bytes),
            pos: 0,
            endian: Endian::default(),
        }
    }

    /// Returns `true` if this buffer still borrows the bytes passed to [`BinaryBuffer::view`].
    pub fn is_view(&self) -> bool {
        matches!(self.data, Cow::Borrowed(_))
    }

    /// Converts this buffer into one that owns its bytes, keeping the cursor and byte order.
    pub fn into_owned(self) -> BinaryBuffer<'static> {
        BinaryBuffer {
            data: Cow::Owned(self.data.into_owned()),
            pos: self.pos,
            endian: self.endian,
        }
    }

    /// Sets the byte order, returning the buffer.
    pub fn with_endian(mut self, endian: Endian) -> Self {
        self.endian = endian;
        self
    }

    /// The byte order used by multi-byte reads and writes.
    pub fn endian(&self) -> Endian {
        self.endian
    }

    /// Changes the byte order used by subsequent multi-byte reads and writes.
    pub fn set_endian(&mut self, endian: Endian) {
        self.endian = endian;
    }

    /// The number of bytes in the buffer.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the buffer contains no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The cursor offset, in bytes.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Moves the cursor. `position` may equal [`len`](Self::len) but not exceed it.
    pub fn set_position(&mut self, position: usize) -> Result<()> {
        if position > self.data.len() {
            return Err(BufferError::InvalidPosition {
                position,
                len: self.data.len(),
            });
        }
        self.pos = position;
        Ok(())
    }

    /// The number of bytes between the cursor and the end of the buffer.
    pub fn bytes_available(&self) -> usize {
        self.data.len() - self.pos
    }

    /// The full contents of the buffer, regardless of the cursor.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Copies the full contents of the buffer, regardless of the cursor.
    pub fn to_vec(&self) -> Vec<u8> {
        self.data.to_vec()
    }

    /// Extracts the full contents of the buffer.
    pub fn into_vec(self) -> Vec<u8> {
        self.data.into_owned()
    }

    /// Reads the byte at `index` without moving the cursor.
    pub fn byte_at(&self, index: usize) -> Result<u8> {
        self.data
            .get(index)
            .copied()
            .ok_or(BufferError::OutOfRange {
                position: index,
                needed: 1,
                len: self.data.len(),
            })
    }

    /// Returns a new buffer holding the bytes of `self` followed by `other`.
    ///
    /// If `position_to_end` is true, the cursor of the new buffer is at its end. Otherwise it is
    /// at the cursor position of `self`.
    pub fn append(&self, other: &[u8], position_to_end: bool) -> BinaryBuffer<'static> {
        let mut joined = Vec::with_capacity(self.data.len() + other.len());
        joined.extend_from_slice(&self.data);
        joined.extend_from_slice(other);
        let pos = if position_to_end { joined.len() } else { self.pos };
        BinaryBuffer {
            data: Cow::Owned(joined),
            pos,
            endian: self.endian,
        }
    }

    /// Same as [`append`](Self::append), taking the bytes of another buffer.
    pub fn append_buffer(&self, other: &BinaryBuffer<'_>, position_to_end: bool) -> BinaryBuffer<'static> {
        self.append(&other.data, position_to_end)
    }

    /// Returns a new buffer whose bytes are `self[i] ^ other[i]`, for every byte of `self`.
    ///
    /// Both operands are read from offset 0 and neither cursor moves. The cursor of the result is
    /// at its end. Bytes of `other` beyond the length of `self` are ignored; if `other` is shorter
    /// than `self`, this fails the same way reading past its end would.
    pub fn xor(&self, other: &BinaryBuffer<'_>) -> Result<BinaryBuffer<'static>> {
        if other.len() < self.len() {
            return Err(BufferError::OutOfRange {
                position: other.len(),
                needed: self.len() - other.len(),
                len: other.len(),
            });
        }

        let bytes: Vec<u8> = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| a ^ b)
            .collect();

        Ok(BinaryBuffer {
            pos: bytes.len(),
            data: Cow::Owned(bytes),
            endian: self.endian,
        })
    }
}

impl Default for BinaryBuffer<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vec<u8>> for BinaryBuffer<'static> {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_vec(bytes)
    }
}

/// Formats the contents as upper-case hex pairs separated by spaces, e.g. `0A FF 00`.
impl fmt::Display for BinaryBuffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.data.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{b:02X}")?;
        }
        Ok(())
    }
}

#[cfg(feature = "std")]
mod io_impls {
    use super::BinaryBuffer;
    use std::io;

    impl io::Read for BinaryBuffer<'_> {
        fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
            let n = out.len().min(self.bytes_available());
            out[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    impl io::Write for BinaryBuffer<'_> {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.write_bytes(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl io::Seek for BinaryBuffer<'_> {
        /// Seeking beyond either end of the buffer fails with `InvalidInput`.
        fn seek(&mut self, from: io::SeekFrom) -> io::Result<u64> {
            let target = match from {
                io::SeekFrom::Start(n) => usize::try_from(n).ok(),
                io::SeekFrom::End(delta) => offset(self.len(), delta),
                io::SeekFrom::Current(delta) => offset(self.pos, delta),
            };

            let Some(target) = target.filter(|&t| t <= self.len()) else {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "seek outside of buffer",
                ));
            };

            self.pos = target;
            Ok(target as u64)
        }
    }

    fn offset(base: usize, delta: i64) -> Option<usize> {
        let base = i64::try_from(base).ok()?;
        usize::try_from(base.checked_add(delta)?).ok()
    }
}
